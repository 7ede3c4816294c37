// shopfront-server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::RequestActor;

#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  /// Opaque token from the payment provider's client-side tokenisation.
  pub token: String,
}

#[instrument(name = "handler::checkout", skip(app_state, actor, req_payload))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.engine.checkout(&actor.0, &req_payload.token).await?;
  info!(order_id = %order.id, total_cents = order.total_cents, "Checkout completed.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::list_orders", skip(app_state, actor))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, actor: RequestActor) -> Result<HttpResponse, AppError> {
  let orders = app_state.engine.list_orders(&actor.0).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, actor), fields(order_id = %path))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.engine.get_order(&actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}
