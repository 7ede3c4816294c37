// shopfront-server/src/web/handlers/item_handlers.rs

use actix_web::{web, HttpResponse};
use shopfront::model::{ItemPatch, NewItem};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::RequestActor;

#[instrument(name = "handler::get_item", skip(app_state), fields(item_id = %path))]
pub async fn get_item_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let item = app_state.engine.get_item(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::create_item", skip(app_state, actor, req_payload))]
pub async fn create_item_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  req_payload: web::Json<NewItem>,
) -> Result<HttpResponse, AppError> {
  let item = app_state.engine.create_item(&actor.0, req_payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(item))
}

#[instrument(name = "handler::update_item", skip(app_state, actor, req_payload), fields(item_id = %path))]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  path: web::Path<Uuid>,
  req_payload: web::Json<ItemPatch>,
) -> Result<HttpResponse, AppError> {
  let item = app_state
    .engine
    .update_item(&actor.0, path.into_inner(), req_payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::delete_item", skip(app_state, actor), fields(item_id = %path))]
pub async fn delete_item_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let item = app_state.engine.delete_item(&actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(item))
}
