// shopfront/src/model/cart_item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::item::Item;

/// A (user, item, quantity) row.
///
/// `checkout_claim` is set while a checkout is pricing and charging the row.
/// `charge_id` is set once that checkout's charge is confirmed; from then on
/// the row belongs to the charge and is never claimed again.
/// At most one *unclaimed* row exists per (user, item).
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub item_id: Uuid,
  pub quantity: i32,
  #[serde(skip_serializing)]
  pub checkout_claim: Option<Uuid>,
  #[serde(skip_serializing)]
  pub claimed_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing)]
  pub charge_id: Option<String>,
  pub added_at: DateTime<Utc>,
}

impl CartItem {
  pub fn is_claimed(&self) -> bool {
    self.checkout_claim.is_some()
  }

  pub fn is_settled(&self) -> bool {
    self.charge_id.is_some()
  }
}

/// Cart row joined with the live catalog entry. `item` is `None` only if the
/// item vanished between the two reads.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
  pub id: Uuid,
  pub quantity: i32,
  pub pending_checkout: bool,
  pub item: Option<Item>,
}
