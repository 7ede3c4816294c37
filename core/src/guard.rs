// shopfront/src/guard.rs

//! Permission Guard.
//!
//! Required permissions are OR'd: holding any one of them is enough.
//! An anonymous actor always fails with `Unauthenticated` before any
//! `Forbidden` check.

use tracing::{debug, warn};

use crate::auth::{Actor, ActorContext};
use crate::error::{CommerceError, CommerceResult};
use crate::model::Permission;
use crate::ports::Store;

fn describe(required: &[Permission]) -> String {
  required.iter().map(Permission::as_str).collect::<Vec<_>>().join(", ")
}

/// Checks `actor` against `required_any_of` using the permissions resolved
/// for this request.
pub fn authorize<'a>(actor: &'a Actor, required_any_of: &[Permission]) -> CommerceResult<&'a ActorContext> {
  let ctx = actor.require()?;
  if ctx.has_any(required_any_of) {
    Ok(ctx)
  } else {
    debug!(user_id = %ctx.user_id, required = %describe(required_any_of), "Permission check failed.");
    Err(CommerceError::forbidden(format!(
      "requires one of [{}]",
      describe(required_any_of)
    )))
  }
}

/// Like [`authorize`], but re-reads the actor's permission set from the store
/// first, so a revocation that landed after the request was resolved is
/// honoured. Used in front of privilege-changing mutations.
pub async fn authorize_current(
  store: &dyn Store,
  actor: &Actor,
  required_any_of: &[Permission],
) -> CommerceResult<ActorContext> {
  let ctx = actor.require()?;
  let Some(user) = store.get_user(ctx.user_id).await? else {
    warn!(user_id = %ctx.user_id, "Actor disappeared between resolution and authorization.");
    return Err(CommerceError::Unauthenticated);
  };
  let current = ActorContext::from_user(&user);
  authorize(&Actor::User(current.clone()), required_any_of)?;
  Ok(current)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use std::collections::BTreeSet;
  use uuid::Uuid;

  fn actor(perms: &[Permission]) -> Actor {
    Actor::User(ActorContext {
      user_id: Uuid::new_v4(),
      permissions: perms.iter().copied().collect::<BTreeSet<_>>(),
    })
  }

  #[test]
  fn any_single_match_is_enough() {
    let a = actor(&[Permission::User, Permission::ItemDelete]);
    assert!(authorize(&a, &[Permission::Admin, Permission::ItemDelete]).is_ok());
  }

  #[test]
  fn no_overlap_is_forbidden() {
    let a = actor(&[Permission::User]);
    let err = authorize(&a, &[Permission::Admin, Permission::PermissionUpdate]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
  }

  #[test]
  fn anonymous_is_unauthenticated_not_forbidden() {
    let err = authorize(&Actor::Anonymous, &[Permission::Admin]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
  }

  #[test]
  fn empty_requirement_never_grants() {
    assert_eq!(
      authorize(&actor(&Permission::ALL), &[]).unwrap_err().kind(),
      ErrorKind::Forbidden
    );
  }
}
