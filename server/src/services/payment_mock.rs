// shopfront-server/src/services/payment_mock.rs

//! An in-process stand-in for a card processor.
//!
//! Tokens drive the outcome the way test cards do:
//! `tok_chargeDeclined` declines, `tok_gatewayDown` reports the gateway
//! unavailable, anything else succeeds. Charges are remembered by idempotency
//! key, so a repeated request returns the original charge.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shopfront::ports::{Charge, ChargeRequest, GatewayError, PaymentGateway};
use tracing::{info, instrument};
use uuid::Uuid;

pub const DECLINED_TOKEN: &str = "tok_chargeDeclined";
pub const UNAVAILABLE_TOKEN: &str = "tok_gatewayDown";

pub struct MockPaymentGateway {
  latency: Duration,
  charges: Mutex<HashMap<Uuid, Charge>>,
}

impl MockPaymentGateway {
  pub fn new(latency: Duration) -> Self {
    Self {
      latency,
      charges: Mutex::new(HashMap::new()),
    }
  }
}

impl Default for MockPaymentGateway {
  fn default() -> Self {
    Self::new(Duration::from_millis(50))
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(
    name = "mock_gateway::charge",
    skip(self, request),
    fields(amount = request.amount_cents, currency = %request.currency, idempotency_key = %request.idempotency_key)
  )]
  async fn charge(&self, request: &ChargeRequest) -> Result<Charge, GatewayError> {
    tokio::time::sleep(self.latency).await; // Simulate network latency

    let existing = self.charges.lock().get(&request.idempotency_key).cloned();
    if let Some(existing) = existing {
      info!(charge_id = %existing.charge_id, "Replayed idempotent charge.");
      return Ok(existing);
    }
    if request.amount_cents <= 0 {
      return Err(GatewayError::Declined("amount must be greater than zero".to_string()));
    }
    match request.source_token.as_str() {
      DECLINED_TOKEN => return Err(GatewayError::Declined("card_declined".to_string())),
      UNAVAILABLE_TOKEN => return Err(GatewayError::Unavailable("simulated outage".to_string())),
      _ => {}
    }

    let charge = Charge {
      charge_id: format!("ch_{}", Uuid::new_v4().simple()),
      settled_cents: request.amount_cents,
    };
    self.charges.lock().insert(request.idempotency_key, charge.clone());
    info!(charge_id = %charge.charge_id, "Mock charge succeeded.");
    Ok(charge)
  }

  async fn find_charge(&self, idempotency_key: Uuid) -> Result<Option<Charge>, GatewayError> {
    Ok(self.charges.lock().get(&idempotency_key).cloned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(token: &str, key: Uuid) -> ChargeRequest {
    ChargeRequest {
      amount_cents: 2500,
      currency: "USD".into(),
      source_token: token.into(),
      idempotency_key: key,
    }
  }

  #[tokio::test]
  async fn repeated_key_returns_the_same_charge() {
    let gateway = MockPaymentGateway::new(Duration::ZERO);
    let key = Uuid::new_v4();
    let first = gateway.charge(&request("tok_visa", key)).await.unwrap();
    let second = gateway.charge(&request("tok_visa", key)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(gateway.find_charge(key).await.unwrap(), Some(first));
  }

  #[tokio::test]
  async fn magic_tokens_fail() {
    let gateway = MockPaymentGateway::new(Duration::ZERO);
    assert!(matches!(
      gateway.charge(&request(DECLINED_TOKEN, Uuid::new_v4())).await,
      Err(GatewayError::Declined(_))
    ));
    assert!(matches!(
      gateway.charge(&request(UNAVAILABLE_TOKEN, Uuid::new_v4())).await,
      Err(GatewayError::Unavailable(_))
    ));
  }
}
