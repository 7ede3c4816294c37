// shopfront/src/memory.rs

//! In-process [`Store`] used for local development and tests.
//!
//! All state sits behind one `parking_lot::Mutex`, so every trait method is
//! atomic with respect to the others, which is what the store contract
//! requires of a real database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::{
  CartItem, Item, ItemPatch, NewItem, NewOrder, NewUser, Order, OrderLine, User, UserPatch,
};
use crate::ports::{Store, StoreError, StoreResult, UserFilter};

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  items: HashMap<Uuid, Item>,
  cart: HashMap<Uuid, CartItem>,
  orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn sorted_users<'a>(users: impl Iterator<Item = &'a User>) -> Vec<User> {
  let mut out: Vec<User> = users.cloned().collect();
  out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
  out
}

#[async_trait]
impl Store for MemoryStore {
  async fn create_user(&self, new: NewUser) -> StoreResult<User> {
    let mut t = self.tables.lock();
    if t.users.values().any(|u| u.email == new.email) {
      return Err(StoreError::UniqueViolation {
        constraint: "users_email_key".to_string(),
      });
    }
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      name: new.name,
      email: new.email,
      password_hash: new.password_hash,
      permissions: new.permissions,
      reset_token: None,
      reset_token_expires_at: None,
      created_at: now,
      updated_at: now,
    };
    t.users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
    Ok(self.tables.lock().users.get(&id).cloned())
  }

  async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
    let t = self.tables.lock();
    Ok(sorted_users(t.users.values().filter(|u| filter.matches(u))))
  }

  async fn list_users(&self) -> StoreResult<Vec<User>> {
    let t = self.tables.lock();
    Ok(sorted_users(t.users.values()))
  }

  async fn update_users(&self, filter: &UserFilter, patch: &UserPatch) -> StoreResult<Vec<User>> {
    let mut t = self.tables.lock();
    let now = Utc::now();
    let mut updated = Vec::new();
    for user in t.users.values_mut().filter(|u| filter.matches(u)) {
      patch.apply(user, now);
      updated.push(user.clone());
    }
    Ok(sorted_users(updated.iter()))
  }

  async fn create_item(&self, owner_id: Uuid, new: NewItem) -> StoreResult<Item> {
    let now = Utc::now();
    let item = Item {
      id: Uuid::new_v4(),
      title: new.title,
      description: new.description,
      price_cents: new.price_cents,
      image: new.image,
      large_image: new.large_image,
      owner_id,
      created_at: now,
      updated_at: now,
    };
    self.tables.lock().items.insert(item.id, item.clone());
    Ok(item)
  }

  async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    Ok(self.tables.lock().items.get(&id).cloned())
  }

  async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>> {
    let t = self.tables.lock();
    Ok(ids.iter().filter_map(|id| t.items.get(id).cloned()).collect())
  }

  async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> StoreResult<Option<Item>> {
    let mut t = self.tables.lock();
    Ok(t.items.get_mut(&id).map(|item| {
      patch.apply(item, Utc::now());
      item.clone()
    }))
  }

  async fn delete_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    let mut t = self.tables.lock();
    let removed = t.items.remove(&id);
    if removed.is_some() {
      t.cart.retain(|_, row| row.item_id != id);
    }
    Ok(removed)
  }

  async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    Ok(self.tables.lock().cart.get(&id).cloned())
  }

  async fn find_open_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let t = self.tables.lock();
    Ok(
      t.cart
        .values()
        .find(|r| r.user_id == user_id && r.item_id == item_id && !r.is_claimed())
        .cloned(),
    )
  }

  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let t = self.tables.lock();
    let mut rows: Vec<CartItem> = t.cart.values().filter(|r| r.user_id == user_id).cloned().collect();
    rows.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
    Ok(rows)
  }

  async fn create_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<CartItem> {
    let mut t = self.tables.lock();
    if t
      .cart
      .values()
      .any(|r| r.user_id == user_id && r.item_id == item_id && !r.is_claimed())
    {
      return Err(StoreError::UniqueViolation {
        constraint: "cart_items_open_user_item_key".to_string(),
      });
    }
    let row = CartItem {
      id: Uuid::new_v4(),
      user_id,
      item_id,
      quantity: 1,
      checkout_claim: None,
      claimed_at: None,
      charge_id: None,
      added_at: Utc::now(),
    };
    t.cart.insert(row.id, row.clone());
    Ok(row)
  }

  async fn increment_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    let mut t = self.tables.lock();
    Ok(match t.cart.get_mut(&id) {
      Some(row) if !row.is_claimed() => {
        row.quantity += 1;
        Some(row.clone())
      }
      _ => None,
    })
  }

  async fn delete_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    Ok(self.tables.lock().cart.remove(&id))
  }

  async fn claim_cart(
    &self,
    user_id: Uuid,
    claim: Uuid,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
  ) -> StoreResult<Vec<CartItem>> {
    let mut t = self.tables.lock();
    let mut claimed = Vec::new();
    for row in t.cart.values_mut().filter(|r| r.user_id == user_id) {
      let claimable = match row.claimed_at {
        None => true,
        Some(at) => at < stale_before && !row.is_settled(),
      };
      if claimable {
        row.checkout_claim = Some(claim);
        row.claimed_at = Some(now);
        claimed.push(row.clone());
      }
    }
    claimed.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
    Ok(claimed)
  }

  async fn settle_cart_claim(&self, claim: Uuid, charge_id: &str) -> StoreResult<u64> {
    let mut t = self.tables.lock();
    let mut settled = 0;
    for row in t.cart.values_mut().filter(|r| r.checkout_claim == Some(claim)) {
      row.charge_id = Some(charge_id.to_string());
      settled += 1;
    }
    Ok(settled)
  }

  async fn release_cart_claim(&self, claim: Uuid) -> StoreResult<u64> {
    let mut t = self.tables.lock();
    let held: Vec<CartItem> = t
      .cart
      .values()
      .filter(|r| r.checkout_claim == Some(claim))
      .cloned()
      .collect();
    for row in &held {
      let open_id = t
        .cart
        .values()
        .find(|r| r.user_id == row.user_id && r.item_id == row.item_id && !r.is_claimed())
        .map(|r| r.id);
      match open_id {
        Some(open_id) => {
          if let Some(open) = t.cart.get_mut(&open_id) {
            open.quantity += row.quantity;
          }
          t.cart.remove(&row.id);
        }
        None => {
          if let Some(r) = t.cart.get_mut(&row.id) {
            r.checkout_claim = None;
            r.claimed_at = None;
          }
        }
      }
    }
    Ok(held.len() as u64)
  }

  async fn delete_claimed_cart_items(&self, ids: &[Uuid], claim: Uuid) -> StoreResult<u64> {
    let mut t = self.tables.lock();
    let mut deleted = 0;
    for id in ids {
      if t.cart.get(id).map_or(false, |r| r.checkout_claim == Some(claim)) {
        t.cart.remove(id);
        deleted += 1;
      }
    }
    Ok(deleted)
  }

  async fn create_order(&self, new: NewOrder) -> StoreResult<Order> {
    let order = Order {
      id: Uuid::new_v4(),
      user_id: new.user_id,
      total_cents: new.total_cents,
      currency: new.currency,
      charge_id: new.charge_id,
      items: new
        .lines
        .into_iter()
        .map(|l| OrderLine {
          id: Uuid::new_v4(),
          item_id: l.item_id,
          title: l.title,
          description: l.description,
          price_cents: l.price_cents,
          image: l.image,
          large_image: l.large_image,
          quantity: l.quantity,
        })
        .collect(),
      created_at: Utc::now(),
    };
    self.tables.lock().orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(&id).cloned())
  }

  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let t = self.tables.lock();
    let mut orders: Vec<Order> = t.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(orders)
  }
}
