// shopfront-server/src/models/item.rs

use chrono::{DateTime, Utc};
use shopfront::model::Item;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
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

impl From<ItemRow> for Item {
  fn from(row: ItemRow) -> Self {
    Item {
      id: row.id,
      title: row.title,
      description: row.description,
      price_cents: row.price_cents,
      image: row.image,
      large_image: row.large_image,
      owner_id: row.owner_id,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}
