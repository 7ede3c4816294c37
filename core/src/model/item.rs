// shopfront/src/model/item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry. Owned by the user who created it.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
  pub id: Uuid,
  pub title: String,
  pub description: String,
  pub price_cents: i64,
  pub image: Option<String>,
  pub large_image: Option<String>,
  pub owner_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewItem {
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub price_cents: i64,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub large_image: Option<String>,
}

/// The mutable fields of an item. Identity and ownership are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
}

impl ItemPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.description.is_none() && self.price_cents.is_none()
  }

  pub(crate) fn apply(&self, item: &mut Item, now: DateTime<Utc>) {
    if let Some(title) = &self.title {
      item.title = title.clone();
    }
    if let Some(description) = &self.description {
      item.description = description.clone();
    }
    if let Some(price) = self.price_cents {
      item.price_cents = price;
    }
    item.updated_at = now;
  }
}
