// shopfront-server/src/models/order_item.rs

use shopfront::model::OrderLine;
use sqlx::FromRow;
use uuid::Uuid;

/// A line copied from the catalog at purchase time. Immutable once written.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub position: i32,
  pub item_id: Uuid,
  pub title: String,
  pub description: String,
  pub price_cents: i64,
  pub image: Option<String>,
  pub large_image: Option<String>,
  pub quantity: i32,
}

impl From<OrderItemRow> for OrderLine {
  fn from(row: OrderItemRow) -> Self {
    OrderLine {
      id: row.id,
      item_id: row.item_id,
      title: row.title,
      description: row.description,
      price_cents: row.price_cents,
      image: row.image,
      large_image: row.large_image,
      quantity: row.quantity,
    }
  }
}
