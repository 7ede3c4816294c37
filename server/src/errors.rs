// shopfront-server/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use shopfront::{CommerceError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Commerce(#[from] CommerceError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(err.to_string())
  }
}

fn commerce_status(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Unauthenticated | ErrorKind::InvalidCredential => StatusCode::UNAUTHORIZED,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::NotFound | ErrorKind::UserNotFound => StatusCode::NOT_FOUND,
    ErrorKind::PasswordMismatch | ErrorKind::Validation | ErrorKind::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
    ErrorKind::EmailTaken | ErrorKind::EmptyCart => StatusCode::CONFLICT,
    ErrorKind::PaymentFailed => StatusCode::PAYMENT_REQUIRED,
    ErrorKind::DeliveryFailed
    | ErrorKind::OrderPersistFailedAfterCharge
    | ErrorKind::DataIntegrityAnomaly
    | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Commerce(e) => commerce_status(e.kind()),
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (kind, message) = match self {
      AppError::Commerce(e) => (e.kind().as_str(), e.public_message()),
      _ => (ErrorKind::Internal.as_str(), "Something went wrong on our side.".to_string()),
    };
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "kind": kind, "message": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn commerce_kinds_map_to_http_statuses() {
    let cases = [
      (CommerceError::Unauthenticated, 401),
      (CommerceError::Forbidden("x".into()), 403),
      (CommerceError::NotFound("Item".into()), 404),
      (CommerceError::EmptyCart, 409),
      (CommerceError::PaymentFailed { reason: "declined".into() }, 402),
      (CommerceError::InvalidOrExpiredToken, 400),
      (CommerceError::Internal("db down".into()), 500),
    ];
    for (err, status) in cases {
      assert_eq!(AppError::from(err).status_code().as_u16(), status);
    }
  }

  #[actix_web::test]
  async fn internal_details_do_not_leak_into_the_body() {
    let resp = AppError::from(CommerceError::Internal("connection refused at 10.0.0.3".into())).error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["kind"], "INTERNAL");
    assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
  }
}
