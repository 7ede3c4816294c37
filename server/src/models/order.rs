// shopfront-server/src/models/order.rs

use chrono::{DateTime, Utc};
use shopfront::model::{Order, OrderLine};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_cents: i64,
  pub currency: String,
  pub charge_id: String,
  pub created_at: DateTime<Utc>,
}

impl OrderRow {
  pub fn into_order(self, items: Vec<OrderLine>) -> Order {
    Order {
      id: self.id,
      user_id: self.user_id,
      total_cents: self.total_cents,
      currency: self.currency,
      charge_id: self.charge_id,
      items,
      created_at: self.created_at,
    }
  }
}
