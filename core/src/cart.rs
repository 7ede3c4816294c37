// shopfront/src/cart.rs

//! Cart Aggregator: one open row per (user, item), grown by increments.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::model::{CartItem, CartLine};
use crate::ownership;
use crate::ports::{Store, StoreError};

/// Attempts before a create/increment race is given up as an internal error.
const ADD_ATTEMPTS: usize = 3;

pub struct CartAggregator {
  store: Arc<dyn Store>,
}

impl CartAggregator {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  /// Adds one unit of `item_id` to the actor's cart.
  ///
  /// A concurrent add that wins the create turns our create into an increment;
  /// a row that vanishes (removed or claimed by checkout) before our increment
  /// turns it into a create.
  #[instrument(name = "cart::add", skip(self, actor), fields(user_id = ?actor.user_id()))]
  pub async fn add_to_cart(&self, actor: &Actor, item_id: Uuid) -> CommerceResult<CartItem> {
    let ctx = actor.require()?;
    if self.store.get_item(item_id).await?.is_none() {
      return Err(CommerceError::NotFound("Item".to_string()));
    }

    for attempt in 1..=ADD_ATTEMPTS {
      if let Some(open) = self.store.find_open_cart_item(ctx.user_id, item_id).await? {
        match self.store.increment_cart_item(open.id).await? {
          Some(row) => {
            debug!(cart_item_id = %row.id, quantity = row.quantity, "Incremented cart row.");
            return Ok(row);
          }
          None => {
            debug!(attempt, "Cart row vanished before increment; retrying.");
            continue;
          }
        }
      }

      match self.store.create_cart_item(ctx.user_id, item_id).await {
        Ok(row) => {
          info!(cart_item_id = %row.id, %item_id, "Added new cart row.");
          return Ok(row);
        }
        Err(StoreError::UniqueViolation { .. }) => {
          debug!(attempt, "Lost create race; retrying as increment.");
        }
        Err(e) => return Err(e.into()),
      }
    }

    warn!(%item_id, "addToCart kept racing; giving up.");
    Err(CommerceError::Internal("cart row contention".to_string()))
  }

  /// Removes a cart row. A missing row is `NotFound`; an existing row of
  /// another user is `Forbidden`; a row held by a checkout is `Validation`.
  #[instrument(name = "cart::remove", skip(self, actor), fields(user_id = ?actor.user_id()))]
  pub async fn remove_from_cart(&self, actor: &Actor, cart_item_id: Uuid) -> CommerceResult<CartItem> {
    let ctx = actor.require()?;
    let Some(row) = self.store.get_cart_item(cart_item_id).await? else {
      return Err(CommerceError::NotFound("Cart item".to_string()));
    };
    ownership::require_owner(ctx, row.user_id, "cart item")?;
    if row.is_claimed() {
      return Err(CommerceError::Validation(
        "This item is part of a checkout in progress.".to_string(),
      ));
    }

    let removed = self
      .store
      .delete_cart_item(cart_item_id)
      .await?
      .ok_or_else(|| CommerceError::NotFound("Cart item".to_string()))?;
    info!(%cart_item_id, "Removed cart row.");
    Ok(removed)
  }

  /// The actor's cart joined with live catalog data.
  pub async fn view_cart(&self, actor: &Actor) -> CommerceResult<Vec<CartLine>> {
    let ctx = actor.require()?;
    let rows = self.store.list_cart(ctx.user_id).await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.item_id).collect();
    let items: HashMap<Uuid, _> = self
      .store
      .get_items(&ids)
      .await?
      .into_iter()
      .map(|item| (item.id, item))
      .collect();

    Ok(
      rows
        .into_iter()
        .map(|row| CartLine {
          id: row.id,
          quantity: row.quantity,
          pending_checkout: row.is_claimed(),
          item: items.get(&row.item_id).cloned(),
        })
        .collect(),
    )
  }
}
