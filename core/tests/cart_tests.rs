// tests/cart_tests.rs
mod common;

use std::sync::Arc;

use common::*;
use serial_test::serial;
use shopfront::{Actor, ErrorKind};
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_adding_twice_grows_one_row() {
  let h = harness();
  let (wes, actor) = h.user("Wes").await;
  let hat = h.item(&actor, "Hat", 1000).await;

  h.engine.add_to_cart(&actor, hat.id).await.unwrap();
  let second = h.engine.add_to_cart(&actor, hat.id).await.unwrap();

  let rows = h.cart_rows(wes.id).await;
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].id, second.id);
  assert_eq!(rows[0].quantity, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_adds_never_duplicate_rows() {
  let h = harness();
  let (wes, actor) = h.user("Wes").await;
  let hat = h.item(&actor, "Hat", 1000).await;

  let mut tasks = Vec::new();
  for _ in 0..8 {
    let engine = Arc::clone(&h.engine);
    let actor = actor.clone();
    tasks.push(tokio::spawn(async move { engine.add_to_cart(&actor, hat.id).await }));
  }
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let rows = h.cart_rows(wes.id).await;
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].quantity, 8);
}

#[tokio::test]
#[serial]
async fn test_adding_a_missing_item_is_not_found() {
  let h = harness();
  let (_, actor) = h.user("Wes").await;
  let err = h.engine.add_to_cart(&actor, Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_cart_requires_a_session() {
  let h = harness();
  let (_, actor) = h.user("Wes").await;
  let hat = h.item(&actor, "Hat", 1000).await;

  let err = h.engine.add_to_cart(&Actor::Anonymous, hat.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthenticated);
  let err = h.engine.view_cart(&Actor::Anonymous).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
#[serial]
async fn test_non_owner_cannot_remove_a_cart_row() {
  let h = harness();
  let (wes, owner) = h.user("Wes").await;
  let (_, intruder) = h.user("Mallory").await;
  let hat = h.item(&owner, "Hat", 1000).await;
  let row = h.engine.add_to_cart(&owner, hat.id).await.unwrap();

  let err = h.engine.remove_from_cart(&intruder, row.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);
  assert_eq!(h.cart_rows(wes.id).await.len(), 1);

  let err = h.engine.remove_from_cart(&owner, Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  h.engine.remove_from_cart(&owner, row.id).await.unwrap();
  assert!(h.cart_rows(wes.id).await.is_empty());
}

#[tokio::test]
#[serial]
async fn test_cart_view_shows_live_catalog_data() {
  let h = harness();
  let (_, actor) = h.user("Wes").await;
  let hat = h.item(&actor, "Hat", 1000).await;
  h.engine.add_to_cart(&actor, hat.id).await.unwrap();

  h.engine
    .update_item(
      &actor,
      hat.id,
      shopfront::model::ItemPatch {
        price_cents: Some(1500),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  let lines = h.engine.view_cart(&actor).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].quantity, 1);
  assert!(!lines[0].pending_checkout);
  assert_eq!(lines[0].item.as_ref().map(|i| i.price_cents), Some(1500));
}

#[tokio::test]
#[serial]
async fn test_deleting_an_item_removes_it_from_carts() {
  let h = harness();
  let (seller, seller_actor) = h.user("Seller").await;
  let (buyer, buyer_actor) = h.user("Buyer").await;
  let hat = h.item(&seller_actor, "Hat", 1000).await;
  h.engine.add_to_cart(&buyer_actor, hat.id).await.unwrap();

  h.engine.delete_item(&seller_actor, hat.id).await.unwrap();

  assert!(h.cart_rows(buyer.id).await.is_empty());
  assert!(h.cart_rows(seller.id).await.is_empty());
}
