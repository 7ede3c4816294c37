// shopfront-server/src/db/mod.rs

//! Postgres implementation of the engine's [`Store`] port.
//!
//! Conditional writes are single statements so Postgres evaluates the
//! predicate and the write under the same row lock. The open-row uniqueness of
//! cart items is the partial index `cart_items_open_user_item_key`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopfront::model::{
  CartItem, Item, ItemPatch, NewItem, NewOrder, NewUser, Order, OrderLine, ResetTokenPatch, User, UserPatch,
};
use shopfront::ports::{Store, StoreError, StoreResult, UserFilter};
use sqlx::migrate::Migrator;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::user::permission_tags;
use crate::models::{CartItemRow, ItemRow, OrderItemRow, OrderRow, UserRow};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const RELEASE_ATTEMPTS: usize = 3;

// --- claim release, run in order inside one transaction ---

const COLLAPSE_CLAIMED_SQL: &str = "UPDATE cart_items k SET quantity = s.total
   FROM (
     SELECT (array_agg(id ORDER BY added_at, id))[1] AS keeper, SUM(quantity)::INTEGER AS total
     FROM cart_items
     WHERE checkout_claim = $1
     GROUP BY user_id, item_id
     HAVING COUNT(*) > 1
   ) s
   WHERE k.id = s.keeper";

const DROP_COLLAPSED_SQL: &str = "DELETE FROM cart_items c
   WHERE c.checkout_claim = $1
     AND c.id <> (
       SELECT (array_agg(d.id ORDER BY d.added_at, d.id))[1]
       FROM cart_items d
       WHERE d.checkout_claim = $1 AND d.user_id = c.user_id AND d.item_id = c.item_id
     )";

const MERGE_INTO_OPEN_SQL: &str = "UPDATE cart_items o SET quantity = o.quantity + c.quantity
   FROM cart_items c
   WHERE c.checkout_claim = $1
     AND o.checkout_claim IS NULL
     AND o.user_id = c.user_id
     AND o.item_id = c.item_id";

const DROP_MERGED_SQL: &str = "DELETE FROM cart_items c
   WHERE c.checkout_claim = $1
     AND EXISTS (
       SELECT 1 FROM cart_items o
       WHERE o.checkout_claim IS NULL AND o.user_id = c.user_id AND o.item_id = c.item_id
     )";

const REOPEN_SQL: &str = "UPDATE cart_items SET checkout_claim = NULL, claimed_at = NULL WHERE checkout_claim = $1";

fn store_err(e: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(ref db_err) = e {
    if db_err.is_unique_violation() {
      return StoreError::UniqueViolation {
        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
      };
    }
  }
  StoreError::backend(e)
}

fn users_from(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
  rows.into_iter().map(User::try_from).collect()
}

fn push_user_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
  qb.push(" WHERE TRUE");
  if let Some(id) = filter.id {
    qb.push(" AND id = ").push_bind(id);
  }
  if let Some(email) = &filter.email {
    qb.push(" AND email = ").push_bind(email.clone());
  }
  if let Some(token) = &filter.reset_token {
    qb.push(" AND reset_token = ").push_bind(token.clone());
  }
  if let Some(min) = filter.reset_token_expires_at_gte {
    qb.push(" AND reset_token_expires_at >= ").push_bind(min);
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects and applies pending migrations.
  pub async fn connect(database_url: &str) -> crate::errors::Result<Self> {
    let pool = PgPool::connect(database_url).await?;
    MIGRATOR.run(&pool).await?;
    debug!("Database migrations applied.");
    Ok(Self::new(pool))
  }

  async fn order_lines(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderLine>>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
      "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(store_err)?;

    let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in rows {
      lines.entry(row.order_id).or_default().push(row.into());
    }
    Ok(lines)
  }

  async fn release_once(&self, claim: Uuid) -> Result<u64, sqlx::Error> {
    let mut tx = self.pool.begin().await?;

    // A stale takeover can put two rows of one item under the same claim.
    // Collapse them into the oldest row first so each item has one claimed row.
    sqlx::query(COLLAPSE_CLAIMED_SQL)
      .bind(claim)
      .execute(&mut *tx)
      .await?;
    let collapsed = sqlx::query(DROP_COLLAPSED_SQL)
      .bind(claim)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    // Fold claimed quantities into an open row that appeared meanwhile.
    sqlx::query(MERGE_INTO_OPEN_SQL)
      .bind(claim)
      .execute(&mut *tx)
      .await?;
    let merged = sqlx::query(DROP_MERGED_SQL)
      .bind(claim)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    let reopened = sqlx::query(REOPEN_SQL)
      .bind(claim)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    tx.commit().await?;
    Ok(collapsed + merged + reopened)
  }
}

#[async_trait]
impl Store for PgStore {
  #[instrument(name = "pg::create_user", skip(self, new), fields(email = %new.email))]
  async fn create_user(&self, new: NewUser) -> StoreResult<User> {
    let row = sqlx::query_as::<_, UserRow>(
      "INSERT INTO users (id, name, email, password_hash, permissions)
       VALUES ($1, $2, $3, $4, $5)
       RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(permission_tags(&new.permissions))
    .fetch_one(&self.pool)
    .await
    .map_err(store_err)?;
    row.try_into()
  }

  async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?
      .map(User::try_from)
      .transpose()
  }

  async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users");
    push_user_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at, id");
    let rows = qb
      .build_query_as::<UserRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(store_err)?;
    users_from(rows)
  }

  async fn list_users(&self) -> StoreResult<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at, id")
      .fetch_all(&self.pool)
      .await
      .map_err(store_err)?;
    users_from(rows)
  }

  #[instrument(name = "pg::update_users", skip(self, filter, patch))]
  async fn update_users(&self, filter: &UserFilter, patch: &UserPatch) -> StoreResult<Vec<User>> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
    if let Some(hash) = &patch.password_hash {
      qb.push(", password_hash = ").push_bind(hash.clone());
    }
    if let Some(permissions) = &patch.permissions {
      qb.push(", permissions = ").push_bind(permission_tags(permissions));
    }
    match &patch.reset_token {
      Some(ResetTokenPatch::Set(rt)) => {
        qb.push(", reset_token = ").push_bind(rt.token.clone());
        qb.push(", reset_token_expires_at = ").push_bind(rt.expires_at);
      }
      Some(ResetTokenPatch::Clear) => {
        qb.push(", reset_token = NULL, reset_token_expires_at = NULL");
      }
      None => {}
    }
    push_user_filter(&mut qb, filter);
    qb.push(" RETURNING *");

    let rows = qb
      .build_query_as::<UserRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(store_err)?;
    let mut users = users_from(rows)?;
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(users)
  }

  async fn create_item(&self, owner_id: Uuid, new: NewItem) -> StoreResult<Item> {
    let row = sqlx::query_as::<_, ItemRow>(
      "INSERT INTO items (id, title, description, price_cents, image, large_image, owner_id)
       VALUES ($1, $2, $3, $4, $5, $6, $7)
       RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.price_cents)
    .bind(&new.image)
    .bind(&new.large_image)
    .bind(owner_id)
    .fetch_one(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(row.into())
  }

  async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(row.map(Item::from))
  }

  async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>> {
    let rows = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = ANY($1)")
      .bind(ids)
      .fetch_all(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(rows.into_iter().map(Item::from).collect())
  }

  async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> StoreResult<Option<Item>> {
    let row = sqlx::query_as::<_, ItemRow>(
      "UPDATE items SET
         title = COALESCE($2, title),
         description = COALESCE($3, description),
         price_cents = COALESCE($4, price_cents),
         updated_at = now()
       WHERE id = $1
       RETURNING *",
    )
    .bind(id)
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.price_cents)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(row.map(Item::from))
  }

  #[instrument(name = "pg::delete_item", skip(self))]
  async fn delete_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    // cart_items references items with ON DELETE CASCADE.
    let row = sqlx::query_as::<_, ItemRow>("DELETE FROM items WHERE id = $1 RETURNING *")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(row.map(Item::from))
  }

  async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    let row = sqlx::query_as::<_, CartItemRow>("SELECT * FROM cart_items WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(row.map(CartItem::from))
  }

  async fn find_open_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let row = sqlx::query_as::<_, CartItemRow>(
      "SELECT * FROM cart_items WHERE user_id = $1 AND item_id = $2 AND checkout_claim IS NULL",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(row.map(CartItem::from))
  }

  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let rows = sqlx::query_as::<_, CartItemRow>(
      "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY added_at, id",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(rows.into_iter().map(CartItem::from).collect())
  }

  async fn create_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<CartItem> {
    let row = sqlx::query_as::<_, CartItemRow>(
      "INSERT INTO cart_items (id, user_id, item_id, quantity)
       VALUES ($1, $2, $3, 1)
       RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(item_id)
    .fetch_one(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(row.into())
  }

  async fn increment_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    let row = sqlx::query_as::<_, CartItemRow>(
      "UPDATE cart_items SET quantity = quantity + 1
       WHERE id = $1 AND checkout_claim IS NULL
       RETURNING *",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(row.map(CartItem::from))
  }

  async fn delete_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    let row = sqlx::query_as::<_, CartItemRow>("DELETE FROM cart_items WHERE id = $1 RETURNING *")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(row.map(CartItem::from))
  }

  #[instrument(name = "pg::claim_cart", skip(self, now, stale_before))]
  async fn claim_cart(
    &self,
    user_id: Uuid,
    claim: Uuid,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
  ) -> StoreResult<Vec<CartItem>> {
    let rows = sqlx::query_as::<_, CartItemRow>(
      "UPDATE cart_items SET checkout_claim = $2, claimed_at = $3
       WHERE user_id = $1
         AND (checkout_claim IS NULL OR (claimed_at < $4 AND charge_id IS NULL))
       RETURNING *",
    )
    .bind(user_id)
    .bind(claim)
    .bind(now)
    .bind(stale_before)
    .fetch_all(&self.pool)
    .await
    .map_err(store_err)?;
    Ok(rows.into_iter().map(CartItem::from).collect())
  }

  async fn settle_cart_claim(&self, claim: Uuid, charge_id: &str) -> StoreResult<u64> {
    let done = sqlx::query("UPDATE cart_items SET charge_id = $2 WHERE checkout_claim = $1")
      .bind(claim)
      .bind(charge_id)
      .execute(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(done.rows_affected())
  }

  #[instrument(name = "pg::release_cart_claim", skip(self))]
  async fn release_cart_claim(&self, claim: Uuid) -> StoreResult<u64> {
    // A concurrent add can open a row between the merge and the un-claim; the
    // index rejects the un-claim and the next attempt merges instead.
    let mut attempt = 1;
    loop {
      match self.release_once(claim).await.map_err(store_err) {
        Err(StoreError::UniqueViolation { constraint }) if attempt < RELEASE_ATTEMPTS => {
          warn!(%constraint, attempt, "Release raced with an add; retrying.");
          attempt += 1;
        }
        other => return other,
      }
    }
  }

  async fn delete_claimed_cart_items(&self, ids: &[Uuid], claim: Uuid) -> StoreResult<u64> {
    let done = sqlx::query("DELETE FROM cart_items WHERE id = ANY($1) AND checkout_claim = $2")
      .bind(ids)
      .bind(claim)
      .execute(&self.pool)
      .await
      .map_err(store_err)?;
    Ok(done.rows_affected())
  }

  #[instrument(name = "pg::create_order", skip(self, new), fields(user_id = %new.user_id, lines = new.lines.len()))]
  async fn create_order(&self, new: NewOrder) -> StoreResult<Order> {
    let mut tx = self.pool.begin().await.map_err(store_err)?;

    let order = sqlx::query_as::<_, OrderRow>(
      "INSERT INTO orders (id, user_id, total_cents, currency, charge_id)
       VALUES ($1, $2, $3, $4, $5)
       RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.total_cents)
    .bind(&new.currency)
    .bind(&new.charge_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(store_err)?;

    let mut lines = Vec::with_capacity(new.lines.len());
    for (position, line) in new.lines.into_iter().enumerate() {
      let row = sqlx::query_as::<_, OrderItemRow>(
        "INSERT INTO order_items
           (id, order_id, position, item_id, title, description, price_cents, image, large_image, quantity)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(order.id)
      .bind(position as i32)
      .bind(line.item_id)
      .bind(&line.title)
      .bind(&line.description)
      .bind(line.price_cents)
      .bind(&line.image)
      .bind(&line.large_image)
      .bind(line.quantity)
      .fetch_one(&mut *tx)
      .await
      .map_err(store_err)?;
      lines.push(OrderLine::from(row));
    }

    tx.commit().await.map_err(store_err)?;
    Ok(order.into_order(lines))
  }

  async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err)?;
    let Some(row) = row else {
      return Ok(None);
    };
    let mut lines = self.order_lines(&[row.id]).await?;
    let items = lines.remove(&row.id).unwrap_or_default();
    Ok(Some(row.into_order(items)))
  }

  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(
      "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(store_err)?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut lines = self.order_lines(&ids).await?;
    Ok(
      rows
        .into_iter()
        .map(|row| {
          let items = lines.remove(&row.id).unwrap_or_default();
          row.into_order(items)
        })
        .collect(),
    )
  }
}
