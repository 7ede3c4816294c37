// shopfront/src/ports/payment.rs

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
  pub amount_cents: i64,
  pub currency: String,
  /// Opaque client-supplied payment token.
  pub source_token: String,
  /// One key per checkout attempt; lets the gateway dedupe and lets us ask
  /// whether a timed-out charge actually happened.
  pub idempotency_key: Uuid,
}

/// Gateway confirmation. `settled_cents` is authoritative for the order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
  pub charge_id: String,
  pub settled_cents: i64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
  #[error("payment declined: {0}")]
  Declined(String),

  #[error("payment gateway unavailable: {0}")]
  Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn charge(&self, request: &ChargeRequest) -> Result<Charge, GatewayError>;

  /// Looks up a charge previously placed under `idempotency_key`.
  async fn find_charge(&self, idempotency_key: Uuid) -> Result<Option<Charge>, GatewayError>;
}
