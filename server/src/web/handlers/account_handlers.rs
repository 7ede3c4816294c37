// shopfront-server/src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shopfront::model::PermissionSet;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::RequestActor;

#[derive(Deserialize, Debug)]
pub struct UpdatePermissionsPayload {
  pub permissions: PermissionSet,
}

/// The current user, or `null` when nobody is signed in.
#[instrument(name = "handler::me", skip(app_state, actor))]
pub async fn me_handler(app_state: web::Data<AppState>, actor: RequestActor) -> Result<HttpResponse, AppError> {
  let user = app_state.engine.me(&actor.0).await?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::list_users", skip(app_state, actor))]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
) -> Result<HttpResponse, AppError> {
  let users = app_state.engine.list_users(&actor.0).await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::update_permissions", skip(app_state, actor, req_payload), fields(target = %path))]
pub async fn update_permissions_handler(
  app_state: web::Data<AppState>,
  actor: RequestActor,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdatePermissionsPayload>,
) -> Result<HttpResponse, AppError> {
  let target = path.into_inner();
  let payload = req_payload.into_inner();
  let user = app_state
    .engine
    .update_permissions(&actor.0, target, payload.permissions)
    .await?;
  info!(user_id = %user.id, permissions = ?user.permissions, "Permissions replaced.");
  Ok(HttpResponse::Ok().json(user))
}
