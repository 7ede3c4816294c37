// shopfront-server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopfront::model::User;
use shopfront::{SessionToken, SignupInput};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::{clear_cookie, session_cookie};

// --- Request DTOs ---
// Password-bearing payloads do not derive Debug.

#[derive(Deserialize)]
pub struct SignupRequestPayload {
  pub name: String,
  pub email: String,
  pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct PasswordResetRequestPayload {
  pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirmPayload {
  pub reset_token: String,
  pub password: String,
  pub confirm_password: String,
}

fn signed_in(app_state: &AppState, mut response: actix_web::HttpResponseBuilder, user: User, session: SessionToken) -> HttpResponse {
  response
    .cookie(session_cookie(&session, app_state.config.cookie_secure))
    .json(user)
}

// --- Handler Implementations ---

#[instrument(name = "handler::signup", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let (user, session) = app_state
    .engine
    .signup(SignupInput {
      name: payload.name,
      email: payload.email,
      password: payload.password,
    })
    .await?;
  info!(user_id = %user.id, "Signup successful.");
  Ok(signed_in(&app_state, HttpResponse::Created(), user, session))
}

#[instrument(name = "handler::signin", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let (user, session) = app_state
    .engine
    .signin(&req_payload.email, &req_payload.password)
    .await?;
  info!(user_id = %user.id, "Signin successful.");
  Ok(signed_in(&app_state, HttpResponse::Ok(), user, session))
}

#[instrument(name = "handler::signout", skip(app_state))]
pub async fn signout_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok()
    .cookie(clear_cookie(app_state.config.cookie_secure))
    .json(json!({ "message": app_state.engine.signout() }))
}

#[instrument(name = "handler::request_password_reset", skip(app_state, req_payload))]
pub async fn request_password_reset_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PasswordResetRequestPayload>,
) -> Result<HttpResponse, AppError> {
  app_state.engine.request_password_reset(&req_payload.email).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Thanks!" })))
}

#[instrument(name = "handler::reset_password", skip(app_state, req_payload))]
pub async fn reset_password_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PasswordResetConfirmPayload>,
) -> Result<HttpResponse, AppError> {
  let (user, session) = app_state
    .engine
    .reset_credential(&req_payload.reset_token, &req_payload.password, &req_payload.confirm_password)
    .await?;
  info!(user_id = %user.id, "Password reset completed.");
  Ok(signed_in(&app_state, HttpResponse::Ok(), user, session))
}
