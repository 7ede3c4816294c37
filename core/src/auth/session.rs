// shopfront/src/auth/session.rs

//! Stateless, signed session tokens.
//!
//! Validity is purely cryptographic plus expiry; there is no server-side
//! session store. Signing out only clears the client's cookie, so a copied
//! token stays usable until it expires. That is an accepted limitation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{CommerceError, CommerceResult};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: Uuid,
  iat: i64,
  exp: i64,
}

/// A freshly issued token plus what the transport needs to set the cookie.
#[derive(Debug, Clone)]
pub struct SessionToken {
  pub token: String,
  pub expires_at: DateTime<Utc>,
  pub max_age: Duration,
}

#[derive(Clone)]
pub struct SessionManager {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validity: Duration,
}

impl std::fmt::Debug for SessionManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionManager").field("validity", &self.validity).finish_non_exhaustive()
  }
}

impl SessionManager {
  pub fn new(secret: &[u8], validity: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validity,
    }
  }

  pub fn validity(&self) -> Duration {
    self.validity
  }

  #[instrument(name = "session::issue", skip(self))]
  pub fn issue(&self, user_id: Uuid) -> CommerceResult<SessionToken> {
    self.issue_at(user_id, Utc::now())
  }

  pub(crate) fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> CommerceResult<SessionToken> {
    let expires_at = now + self.validity;
    let claims = Claims {
      sub: user_id,
      iat: now.timestamp(),
      exp: expires_at.timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| CommerceError::Internal(format!("session signing failed: {e}")))?;
    debug!(%user_id, %expires_at, "Session issued.");
    Ok(SessionToken {
      token,
      expires_at,
      max_age: self.validity,
    })
  }

  /// The user id bound into `token`, or `None` if the token is forged,
  /// malformed or expired.
  pub fn verify(&self, token: &str) -> Option<Uuid> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    match decode::<Claims>(token, &self.decoding, &validation) {
      Ok(data) => Some(data.claims.sub),
      Err(e) => {
        debug!(error = %e, "Rejected session token.");
        None
      }
    }
  }
}
