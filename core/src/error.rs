// shopfront/src/error.rs

//! The error taxonomy surfaced by every engine operation.
//!
//! Each `CommerceError` maps to a stable [`ErrorKind`] (machine readable) and a
//! public message that never carries store or gateway internals.

use thiserror::Error;
use uuid::Uuid;

use crate::ports::{DeliveryError, GatewayError, StoreError};

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Unauthenticated,
  Forbidden,
  NotFound,
  UserNotFound,
  InvalidCredential,
  PasswordMismatch,
  InvalidOrExpiredToken,
  EmailTaken,
  Validation,
  EmptyCart,
  PaymentFailed,
  OrderPersistFailedAfterCharge,
  DeliveryFailed,
  DataIntegrityAnomaly,
  Internal,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::Unauthenticated => "UNAUTHENTICATED",
      ErrorKind::Forbidden => "FORBIDDEN",
      ErrorKind::NotFound => "NOT_FOUND",
      ErrorKind::UserNotFound => "USER_NOT_FOUND",
      ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
      ErrorKind::PasswordMismatch => "PASSWORD_MISMATCH",
      ErrorKind::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
      ErrorKind::EmailTaken => "EMAIL_TAKEN",
      ErrorKind::Validation => "VALIDATION",
      ErrorKind::EmptyCart => "EMPTY_CART",
      ErrorKind::PaymentFailed => "PAYMENT_FAILED",
      ErrorKind::OrderPersistFailedAfterCharge => "ORDER_PERSIST_FAILED_AFTER_CHARGE",
      ErrorKind::DeliveryFailed => "DELIVERY_FAILED",
      ErrorKind::DataIntegrityAnomaly => "DATA_INTEGRITY_ANOMALY",
      ErrorKind::Internal => "INTERNAL",
    }
  }
}

impl std::fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum CommerceError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{0} not found")]
  NotFound(String),

  #[error("no account found for email {email}")]
  UserNotFound { email: String },

  #[error("invalid credential")]
  InvalidCredential,

  #[error("passwords do not match")]
  PasswordMismatch,

  #[error("reset token is invalid or expired")]
  InvalidOrExpiredToken,

  #[error("an account already exists for {email}")]
  EmailTaken { email: String },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("cart is empty")]
  EmptyCart,

  #[error("payment failed: {reason}")]
  PaymentFailed { reason: String },

  /// Money was taken but no order row exists. Needs operator reconciliation.
  #[error("order could not be persisted after charge {charge_id} ({settled_cents} {currency}) for user {user_id}")]
  OrderPersistFailedAfterCharge {
    user_id: Uuid,
    charge_id: String,
    settled_cents: i64,
    currency: String,
    #[source]
    source: StoreError,
  },

  #[error("mail delivery failed: {0}")]
  DeliveryFailed(#[from] DeliveryError),

  #[error("data integrity anomaly: {0}")]
  DataIntegrityAnomaly(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl CommerceError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      CommerceError::Unauthenticated => ErrorKind::Unauthenticated,
      CommerceError::Forbidden(_) => ErrorKind::Forbidden,
      CommerceError::NotFound(_) => ErrorKind::NotFound,
      CommerceError::UserNotFound { .. } => ErrorKind::UserNotFound,
      CommerceError::InvalidCredential => ErrorKind::InvalidCredential,
      CommerceError::PasswordMismatch => ErrorKind::PasswordMismatch,
      CommerceError::InvalidOrExpiredToken => ErrorKind::InvalidOrExpiredToken,
      CommerceError::EmailTaken { .. } => ErrorKind::EmailTaken,
      CommerceError::Validation(_) => ErrorKind::Validation,
      CommerceError::EmptyCart => ErrorKind::EmptyCart,
      CommerceError::PaymentFailed { .. } => ErrorKind::PaymentFailed,
      CommerceError::OrderPersistFailedAfterCharge { .. } => ErrorKind::OrderPersistFailedAfterCharge,
      CommerceError::DeliveryFailed(_) => ErrorKind::DeliveryFailed,
      CommerceError::DataIntegrityAnomaly(_) => ErrorKind::DataIntegrityAnomaly,
      CommerceError::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Message safe to show to an end user.
  pub fn public_message(&self) -> String {
    match self {
      CommerceError::Unauthenticated => "You must be logged in to do that.".to_string(),
      CommerceError::Forbidden(_) => "You do not have permission to do that.".to_string(),
      CommerceError::NotFound(what) => format!("{what} not found."),
      CommerceError::UserNotFound { email } => format!("No such user found for email {email}."),
      CommerceError::InvalidCredential => "Invalid email or password.".to_string(),
      CommerceError::PasswordMismatch => "Passwords do not match.".to_string(),
      CommerceError::InvalidOrExpiredToken => "This reset token is either invalid or expired.".to_string(),
      CommerceError::EmailTaken { .. } => "An account with that email already exists.".to_string(),
      CommerceError::Validation(msg) => msg.clone(),
      CommerceError::EmptyCart => "Your cart is empty.".to_string(),
      CommerceError::PaymentFailed { .. } => "Payment could not be completed. Your cart has been kept.".to_string(),
      CommerceError::OrderPersistFailedAfterCharge { .. } => {
        "Your payment was received but the order could not be recorded. Support has been notified.".to_string()
      }
      CommerceError::DeliveryFailed(_) => "The email could not be delivered.".to_string(),
      CommerceError::DataIntegrityAnomaly(_) | CommerceError::Internal(_) => {
        "Something went wrong on our side.".to_string()
      }
    }
  }

  pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
    CommerceError::Forbidden(msg.into())
  }
}

impl From<StoreError> for CommerceError {
  fn from(err: StoreError) -> Self {
    CommerceError::Internal(format!("store: {err}"))
  }
}

impl From<GatewayError> for CommerceError {
  fn from(err: GatewayError) -> Self {
    CommerceError::PaymentFailed { reason: err.to_string() }
  }
}

pub type CommerceResult<T, E = CommerceError> = std::result::Result<T, E>;
