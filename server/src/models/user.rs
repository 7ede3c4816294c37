// shopfront-server/src/models/user.rs

use chrono::{DateTime, Utc};
use shopfront::model::{Permission, PermissionSet, User};
use shopfront::ports::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub permissions: Vec<String>,
  pub reset_token: Option<String>,
  pub reset_token_expires_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Stored tags for a permission set, in the set's canonical order.
pub fn permission_tags(permissions: &PermissionSet) -> Vec<String> {
  permissions.iter().map(|p| p.as_str().to_string()).collect()
}

impl TryFrom<UserRow> for User {
  type Error = StoreError;

  fn try_from(row: UserRow) -> Result<Self, Self::Error> {
    let permissions = row
      .permissions
      .iter()
      .map(|tag| tag.parse::<Permission>())
      .collect::<Result<PermissionSet, _>>()
      .map_err(StoreError::backend)?;
    Ok(User {
      id: row.id,
      name: row.name,
      email: row.email,
      password_hash: row.password_hash,
      permissions,
      reset_token: row.reset_token,
      reset_token_expires_at: row.reset_token_expires_at,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}
