// shopfront/src/auth/actor.rs

//! The identity performing an operation, resolved once per request.

use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::session::SessionManager;
use crate::error::{CommerceError, CommerceResult};
use crate::model::{Permission, PermissionSet, User};
use crate::ports::Store;

/// An authenticated user together with the permission set read from the
/// store while resolving this request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorContext {
  pub user_id: Uuid,
  pub permissions: PermissionSet,
}

impl ActorContext {
  pub fn from_user(user: &User) -> Self {
    Self {
      user_id: user.id,
      permissions: user.permissions.clone(),
    }
  }

  pub fn has_any(&self, required: &[Permission]) -> bool {
    required.iter().any(|p| self.permissions.contains(p))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
  Anonymous,
  User(ActorContext),
}

impl Actor {
  /// The authenticated context, or `Unauthenticated`.
  pub fn require(&self) -> CommerceResult<&ActorContext> {
    match self {
      Actor::User(ctx) => Ok(ctx),
      Actor::Anonymous => Err(CommerceError::Unauthenticated),
    }
  }

  pub fn user_id(&self) -> Option<Uuid> {
    match self {
      Actor::User(ctx) => Some(ctx.user_id),
      Actor::Anonymous => None,
    }
  }

  /// Resolves the actor for a request carrying `token` (if any).
  ///
  /// A missing, invalid or expired token, or a token for a deleted user, all
  /// mean `Anonymous`; none of them is an error. Only a store failure is.
  #[instrument(name = "actor::resolve", skip_all)]
  pub async fn resolve(store: &dyn Store, sessions: &SessionManager, token: Option<&str>) -> CommerceResult<Actor> {
    let Some(user_id) = token.and_then(|t| sessions.verify(t)) else {
      return Ok(Actor::Anonymous);
    };
    match store.get_user(user_id).await? {
      Some(user) => {
        debug!(%user_id, "Resolved actor.");
        Ok(Actor::User(ActorContext::from_user(&user)))
      }
      None => {
        warn!(%user_id, "Valid session for a user that no longer exists.");
        Ok(Actor::Anonymous)
      }
    }
  }
}
