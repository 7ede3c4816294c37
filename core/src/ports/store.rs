// shopfront/src/ports/store.rs

//! The Data Store Adapter interface.
//!
//! Every method is a suspension point. Implementations must enforce the
//! uniqueness of *unclaimed* cart rows per (user, item) and report a clash as
//! [`StoreError::UniqueViolation`]. Conditional writes (filters on updates,
//! claim-scoped deletes) are evaluated atomically by the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{CartItem, Item, ItemPatch, NewItem, NewOrder, NewUser, Order, User, UserPatch};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("uniqueness constraint '{constraint}' violated")]
  UniqueViolation { constraint: String },

  #[error("store backend failure: {0}")]
  Backend(#[source] anyhow::Error),
}

impl StoreError {
  pub fn backend(err: impl Into<anyhow::Error>) -> Self {
    StoreError::Backend(err.into())
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Equality and comparison predicates over users. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
  pub id: Option<Uuid>,
  pub email: Option<String>,
  pub reset_token: Option<String>,
  pub reset_token_expires_at_gte: Option<DateTime<Utc>>,
}

impl UserFilter {
  pub fn by_id(id: Uuid) -> Self {
    Self { id: Some(id), ..Default::default() }
  }

  pub fn by_email(email: impl Into<String>) -> Self {
    Self { email: Some(email.into()), ..Default::default() }
  }

  pub fn matches(&self, user: &User) -> bool {
    self.id.map_or(true, |id| user.id == id)
      && self.email.as_deref().map_or(true, |e| user.email == e)
      && self
        .reset_token
        .as_deref()
        .map_or(true, |t| user.reset_token.as_deref() == Some(t))
      && self
        .reset_token_expires_at_gte
        .map_or(true, |min| user.reset_token_expires_at.map_or(false, |exp| exp >= min))
  }
}

#[async_trait]
pub trait Store: Send + Sync {
  // --- users ---
  async fn create_user(&self, new: NewUser) -> StoreResult<User>;
  async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
  /// Matching users ordered by `(created_at, id)`.
  async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>>;
  async fn list_users(&self) -> StoreResult<Vec<User>>;
  /// Applies `patch` to every user matching `filter` and returns the updated rows.
  async fn update_users(&self, filter: &UserFilter, patch: &UserPatch) -> StoreResult<Vec<User>>;

  // --- items ---
  async fn create_item(&self, owner_id: Uuid, new: NewItem) -> StoreResult<Item>;
  async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>>;
  async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>>;
  async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> StoreResult<Option<Item>>;
  /// Deletes the item and every cart row that references it.
  async fn delete_item(&self, id: Uuid) -> StoreResult<Option<Item>>;

  // --- cart ---
  async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>>;
  /// The unclaimed row for (user, item), if any.
  async fn find_open_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>>;
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>>;
  /// Inserts a quantity=1 row. Fails with `UniqueViolation` if an unclaimed row exists.
  async fn create_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<CartItem>;
  /// `quantity += 1` on a row that still exists and is unclaimed; `None` otherwise.
  async fn increment_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>>;
  async fn delete_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>>;
  /// Marks every unclaimed row of `user_id` with `claim`, returning the claimed
  /// rows. A row whose claim was taken before `stale_before` is taken over,
  /// unless that claim was settled by a charge.
  async fn claim_cart(
    &self,
    user_id: Uuid,
    claim: Uuid,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
  ) -> StoreResult<Vec<CartItem>>;
  /// Records `charge_id` on the rows held by `claim`, returning how many.
  async fn settle_cart_claim(&self, claim: Uuid, charge_id: &str) -> StoreResult<u64>;
  /// Un-claims the rows held by `claim`, folding their quantity into an existing
  /// unclaimed row for the same item where one appeared meanwhile.
  async fn release_cart_claim(&self, claim: Uuid) -> StoreResult<u64>;
  /// Deletes the rows in `ids` that are still held by `claim`.
  async fn delete_claimed_cart_items(&self, ids: &[Uuid], claim: Uuid) -> StoreResult<u64>;

  // --- orders ---
  async fn create_order(&self, new: NewOrder) -> StoreResult<Order>;
  async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
  /// Orders of `user_id`, newest first.
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
}
