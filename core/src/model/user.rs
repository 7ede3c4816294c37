// shopfront/src/model/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::permission::PermissionSet;

#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub permissions: PermissionSet,
  #[serde(skip_serializing)]
  pub reset_token: Option<String>,
  #[serde(skip_serializing)]
  pub reset_token_expires_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub permissions: PermissionSet,
}

/// Single-use credential-recovery secret with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
  pub token: String,
  pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetTokenPatch {
  Set(ResetToken),
  Clear,
}

/// Fields a user update may touch. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub password_hash: Option<String>,
  pub permissions: Option<PermissionSet>,
  pub reset_token: Option<ResetTokenPatch>,
}

impl UserPatch {
  pub(crate) fn apply(&self, user: &mut User, now: DateTime<Utc>) {
    if let Some(hash) = &self.password_hash {
      user.password_hash = hash.clone();
    }
    if let Some(permissions) = &self.permissions {
      user.permissions = permissions.clone();
    }
    match &self.reset_token {
      Some(ResetTokenPatch::Set(rt)) => {
        user.reset_token = Some(rt.token.clone());
        user.reset_token_expires_at = Some(rt.expires_at);
      }
      Some(ResetTokenPatch::Clear) => {
        user.reset_token = None;
        user.reset_token_expires_at = None;
      }
      None => {}
    }
    user.updated_at = now;
  }
}
