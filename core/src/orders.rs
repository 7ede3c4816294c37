// shopfront/src/orders.rs

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::model::Order;
use crate::ownership;
use crate::ports::Store;

pub struct Orders {
  store: Arc<dyn Store>,
}

impl Orders {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  /// One order, visible to its owner or an ADMIN.
  #[instrument(name = "orders::get", skip(self, actor))]
  pub async fn get_order(&self, actor: &Actor, id: Uuid) -> CommerceResult<Order> {
    actor.require()?;
    let order = self
      .store
      .get_order(id)
      .await?
      .ok_or_else(|| CommerceError::NotFound("Order".to_string()))?;
    ownership::authorize_order_view(actor, &order)?;
    Ok(order)
  }

  /// The actor's own orders, newest first.
  pub async fn list_orders(&self, actor: &Actor) -> CommerceResult<Vec<Order>> {
    let ctx = actor.require()?;
    Ok(self.store.list_orders(ctx.user_id).await?)
  }
}
