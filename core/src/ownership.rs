// shopfront/src/ownership.rs

//! Item and order ownership rules: ownership OR a permission grant.

use crate::auth::{Actor, ActorContext};
use crate::error::{CommerceError, CommerceResult};
use crate::guard;
use crate::model::{Item, Order, Permission};

pub const ITEM_DELETE_GRANTS: [Permission; 2] = [Permission::Admin, Permission::ItemDelete];
pub const ITEM_UPDATE_GRANTS: [Permission; 2] = [Permission::Admin, Permission::ItemUpdate];
pub const ORDER_VIEW_GRANTS: [Permission; 1] = [Permission::Admin];
pub const PERMISSION_UPDATE_GRANTS: [Permission; 2] = [Permission::Admin, Permission::PermissionUpdate];

fn owner_or<'a>(actor: &'a Actor, owner_id: uuid::Uuid, grants: &[Permission]) -> CommerceResult<&'a ActorContext> {
  let ctx = actor.require()?;
  if ctx.user_id == owner_id {
    return Ok(ctx);
  }
  // The guard's verdict is the answer here; it is never ignored.
  guard::authorize(actor, grants)
}

pub fn authorize_item_delete<'a>(actor: &'a Actor, item: &Item) -> CommerceResult<&'a ActorContext> {
  owner_or(actor, item.owner_id, &ITEM_DELETE_GRANTS)
}

pub fn authorize_item_update<'a>(actor: &'a Actor, item: &Item) -> CommerceResult<&'a ActorContext> {
  owner_or(actor, item.owner_id, &ITEM_UPDATE_GRANTS)
}

pub fn authorize_order_view<'a>(actor: &'a Actor, order: &Order) -> CommerceResult<&'a ActorContext> {
  owner_or(actor, order.user_id, &ORDER_VIEW_GRANTS)
}

pub fn authorize_update_permissions(actor: &Actor) -> CommerceResult<&ActorContext> {
  guard::authorize(actor, &PERMISSION_UPDATE_GRANTS)
}

/// Turns "found but not yours" into `Forbidden` uniformly for cart rows.
pub(crate) fn require_owner(ctx: &ActorContext, owner_id: uuid::Uuid, what: &str) -> CommerceResult<()> {
  if ctx.user_id == owner_id {
    Ok(())
  } else {
    Err(CommerceError::forbidden(format!("{what} belongs to another user")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use chrono::Utc;
  use uuid::Uuid;

  fn actor(id: Uuid, perms: &[Permission]) -> Actor {
    Actor::User(ActorContext {
      user_id: id,
      permissions: perms.iter().copied().collect(),
    })
  }

  fn item(owner: Uuid) -> Item {
    Item {
      id: Uuid::new_v4(),
      title: "Hat".into(),
      description: String::new(),
      price_cents: 1000,
      image: None,
      large_image: None,
      owner_id: owner,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn owner_may_delete_without_any_grant() {
    let me = Uuid::new_v4();
    assert!(authorize_item_delete(&actor(me, &[Permission::User]), &item(me)).is_ok());
  }

  #[test]
  fn item_delete_grant_allows_non_owner() {
    let a = actor(Uuid::new_v4(), &[Permission::User, Permission::ItemDelete]);
    assert!(authorize_item_delete(&a, &item(Uuid::new_v4())).is_ok());
  }

  #[test]
  fn non_owner_without_grant_is_forbidden() {
    let a = actor(Uuid::new_v4(), &[Permission::User, Permission::ItemUpdate]);
    let err = authorize_item_delete(&a, &item(Uuid::new_v4())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
  }

  #[test]
  fn anonymous_never_passes_ownership_rules() {
    let err = authorize_item_delete(&Actor::Anonymous, &item(Uuid::new_v4())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
  }

  #[test]
  fn update_needs_item_update_not_item_delete() {
    let a = actor(Uuid::new_v4(), &[Permission::ItemDelete]);
    assert_eq!(
      authorize_item_update(&a, &item(Uuid::new_v4())).unwrap_err().kind(),
      ErrorKind::Forbidden
    );
    let b = actor(Uuid::new_v4(), &[Permission::ItemUpdate]);
    assert!(authorize_item_update(&b, &item(Uuid::new_v4())).is_ok());
  }

  #[test]
  fn permission_updates_need_admin_or_permissionupdate() {
    assert!(authorize_update_permissions(&actor(Uuid::new_v4(), &[Permission::PermissionUpdate])).is_ok());
    assert!(authorize_update_permissions(&actor(Uuid::new_v4(), &[Permission::Admin])).is_ok());
    assert_eq!(
      authorize_update_permissions(&actor(Uuid::new_v4(), &[Permission::User]))
        .unwrap_err()
        .kind(),
      ErrorKind::Forbidden
    );
  }
}
