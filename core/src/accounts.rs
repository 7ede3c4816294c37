// shopfront/src/accounts.rs

//! Account operations: signup, signin, the current user, user listing and
//! permission updates.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{hash_credential, verify_credential, Actor, SessionManager, SessionToken};
use crate::error::{CommerceError, CommerceResult};
use crate::guard;
use crate::model::{NewUser, Permission, PermissionSet, User, UserPatch};
use crate::ownership::PERMISSION_UPDATE_GRANTS;
use crate::ports::{Store, StoreError, UserFilter};

#[derive(Debug, Clone)]
pub struct SignupInput {
  pub name: String,
  pub email: String,
  pub password: String,
}

pub struct Accounts {
  store: Arc<dyn Store>,
  sessions: SessionManager,
}

pub(crate) fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

fn validate_email(email: &str) -> CommerceResult<()> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
    _ => Err(CommerceError::Validation(format!("'{email}' is not a valid email address."))),
  }
}

impl Accounts {
  pub fn new(store: Arc<dyn Store>, sessions: SessionManager) -> Self {
    Self { store, sessions }
  }

  #[instrument(name = "accounts::signup", skip(self, input), fields(email = %input.email))]
  pub async fn signup(&self, input: SignupInput) -> CommerceResult<(User, SessionToken)> {
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    let name = input.name.trim();
    if name.is_empty() {
      return Err(CommerceError::Validation("Name cannot be empty.".to_string()));
    }
    let password_hash = hash_credential(&input.password)?;

    let new_user = NewUser {
      name: name.to_string(),
      email: email.clone(),
      password_hash,
      permissions: Permission::defaults(),
    };
    let user = match self.store.create_user(new_user).await {
      Ok(user) => user,
      Err(StoreError::UniqueViolation { .. }) => return Err(CommerceError::EmailTaken { email }),
      Err(e) => return Err(e.into()),
    };

    let session = self.sessions.issue(user.id)?;
    info!(user_id = %user.id, "User signed up.");
    Ok((user, session))
  }

  /// Unknown email and wrong password are indistinguishable to the caller.
  #[instrument(name = "accounts::signin", skip(self, password))]
  pub async fn signin(&self, email: &str, password: &str) -> CommerceResult<(User, SessionToken)> {
    let email = normalize_email(email);
    let mut found = self.store.find_users(&UserFilter::by_email(&email)).await?;
    if found.is_empty() {
      return Err(CommerceError::InvalidCredential);
    }
    let user = found.swap_remove(0);
    verify_credential(&user.password_hash, password)?;

    let session = self.sessions.issue(user.id)?;
    info!(user_id = %user.id, "User signed in.");
    Ok((user, session))
  }

  /// The signed-in user, or `None` for an anonymous actor.
  pub async fn me(&self, actor: &Actor) -> CommerceResult<Option<User>> {
    match actor.user_id() {
      Some(id) => Ok(self.store.get_user(id).await?),
      None => Ok(None),
    }
  }

  #[instrument(name = "accounts::list_users", skip_all)]
  pub async fn list_users(&self, actor: &Actor) -> CommerceResult<Vec<User>> {
    guard::authorize_current(self.store.as_ref(), actor, &PERMISSION_UPDATE_GRANTS).await?;
    Ok(self.store.list_users().await?)
  }

  /// Replaces `target`'s permission set with `permissions`.
  ///
  /// The actor's own grant is re-read from the store first. An actor may not
  /// strip USER from themselves.
  #[instrument(name = "accounts::update_permissions", skip(self, actor), fields(actor_id = ?actor.user_id()))]
  pub async fn update_permissions(
    &self,
    actor: &Actor,
    target: Uuid,
    permissions: PermissionSet,
  ) -> CommerceResult<User> {
    let current = guard::authorize_current(self.store.as_ref(), actor, &PERMISSION_UPDATE_GRANTS).await?;
    if permissions.is_empty() {
      return Err(CommerceError::Validation("A user must keep at least one permission.".to_string()));
    }
    if target == current.user_id && !permissions.contains(&Permission::User) {
      return Err(CommerceError::Validation("You cannot remove USER from yourself.".to_string()));
    }

    let patch = UserPatch {
      permissions: Some(permissions),
      ..Default::default()
    };
    let mut updated = self.store.update_users(&UserFilter::by_id(target), &patch).await?;
    if updated.is_empty() {
      return Err(CommerceError::NotFound("User".to_string()));
    }
    let user = updated.swap_remove(0);
    info!(actor_id = %current.user_id, target_id = %target, permissions = ?user.permissions, "Permissions replaced.");
    Ok(user)
  }
}
