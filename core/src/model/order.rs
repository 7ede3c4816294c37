// shopfront/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Immutable purchase record. Line items are copies of the catalog entry at
/// purchase time, so later catalog edits never change history.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_cents: i64,
  pub currency: String,
  pub charge_id: String,
  pub items: Vec<OrderLine>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
  pub id: Uuid,
  /// Catalog id at purchase time. The item itself may since have been deleted.
  pub item_id: Uuid,
  pub title: String,
  pub description: String,
  pub price_cents: i64,
  pub image: Option<String>,
  pub large_image: Option<String>,
  pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub total_cents: i64,
  pub currency: String,
  pub charge_id: String,
  pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
  pub item_id: Uuid,
  pub title: String,
  pub description: String,
  pub price_cents: i64,
  pub image: Option<String>,
  pub large_image: Option<String>,
  pub quantity: i32,
}
