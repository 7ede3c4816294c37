// shopfront-server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::RequestActor;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub item_id: Uuid,
}

#[instrument(name = "handler::view_cart", skip(app_state, actor))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, actor: RequestActor) -> Result<HttpResponse, AppError> {
  let lines = app_state.engine.view_cart(&actor.0).await?;
  Ok(HttpResponse::Ok().json(lines))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, actor, req_payload),
  fields(item_id = %req_payload.item_id)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let row = app_state.engine.add_to_cart(&actor.0, req_payload.item_id).await?;
  info!(cart_item_id = %row.id, quantity = row.quantity, "Item added to cart.");
  Ok(HttpResponse::Ok().json(row))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, actor), fields(cart_item_id = %path))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let row = app_state.engine.remove_from_cart(&actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(row))
}
