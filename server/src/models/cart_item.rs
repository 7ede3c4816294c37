// shopfront-server/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use shopfront::model::CartItem;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub item_id: Uuid,
  pub quantity: i32,
  pub checkout_claim: Option<Uuid>,
  pub claimed_at: Option<DateTime<Utc>>,
  pub charge_id: Option<String>,
  pub added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
  fn from(row: CartItemRow) -> Self {
    CartItem {
      id: row.id,
      user_id: row.user_id,
      item_id: row.item_id,
      quantity: row.quantity,
      checkout_claim: row.checkout_claim,
      claimed_at: row.claimed_at,
      charge_id: row.charge_id,
      added_at: row.added_at,
    }
  }
}
