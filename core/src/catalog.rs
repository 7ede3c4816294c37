// shopfront/src/catalog.rs

//! Item mutations gated by the ownership rules.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::model::{Item, ItemPatch, NewItem};
use crate::ownership;
use crate::ports::Store;

pub struct Catalog {
  store: Arc<dyn Store>,
}

fn validate_title(title: &str) -> CommerceResult<()> {
  if title.trim().is_empty() {
    return Err(CommerceError::Validation("Title cannot be empty.".to_string()));
  }
  Ok(())
}

fn validate_price(price_cents: i64) -> CommerceResult<()> {
  if price_cents < 0 {
    return Err(CommerceError::Validation("Price cannot be negative.".to_string()));
  }
  Ok(())
}

impl Catalog {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  pub async fn get_item(&self, id: Uuid) -> CommerceResult<Item> {
    self
      .store
      .get_item(id)
      .await?
      .ok_or_else(|| CommerceError::NotFound("Item".to_string()))
  }

  #[instrument(name = "catalog::create_item", skip(self, actor, new), fields(title = %new.title))]
  pub async fn create_item(&self, actor: &Actor, new: NewItem) -> CommerceResult<Item> {
    let ctx = actor.require()?;
    validate_title(&new.title)?;
    validate_price(new.price_cents)?;

    let item = self.store.create_item(ctx.user_id, new).await?;
    info!(item_id = %item.id, owner_id = %ctx.user_id, "Item created.");
    Ok(item)
  }

  #[instrument(name = "catalog::update_item", skip(self, actor, patch))]
  pub async fn update_item(&self, actor: &Actor, id: Uuid, patch: ItemPatch) -> CommerceResult<Item> {
    actor.require()?;
    let item = self.get_item(id).await?;
    ownership::authorize_item_update(actor, &item)?;

    if patch.is_empty() {
      return Ok(item);
    }
    if let Some(title) = &patch.title {
      validate_title(title)?;
    }
    if let Some(price) = patch.price_cents {
      validate_price(price)?;
    }

    let updated = self
      .store
      .update_item(id, &patch)
      .await?
      .ok_or_else(|| CommerceError::NotFound("Item".to_string()))?;
    info!(item_id = %id, "Item updated.");
    Ok(updated)
  }

  /// Deletes the item and drops it from every cart. Past orders keep their copy.
  #[instrument(name = "catalog::delete_item", skip(self, actor))]
  pub async fn delete_item(&self, actor: &Actor, id: Uuid) -> CommerceResult<Item> {
    actor.require()?;
    let item = self.get_item(id).await?;
    let ctx = ownership::authorize_item_delete(actor, &item)?;

    let deleted = self
      .store
      .delete_item(id)
      .await?
      .ok_or_else(|| CommerceError::NotFound("Item".to_string()))?;
    info!(item_id = %id, actor_id = %ctx.user_id, "Item deleted.");
    Ok(deleted)
  }
}
