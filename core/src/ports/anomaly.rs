// shopfront/src/ports/anomaly.rs

//! Conditions that need a human: money taken without a record, or data that
//! breaks an invariant the engine relies on.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
  /// The gateway confirmed a charge but the order row could not be written.
  ChargeWithoutOrder {
    user_id: Uuid,
    charge_id: String,
    settled_cents: i64,
    currency: String,
    idempotency_key: Uuid,
    cart_item_ids: Vec<Uuid>,
  },
  /// More than one user holds the same reset token.
  SharedResetToken { user_ids: Vec<Uuid> },
}

pub trait AnomalyReporter: Send + Sync {
  fn report(&self, anomaly: &Anomaly);
}

/// Emits anomalies as `error` events on the `shopfront::anomaly` target, which
/// alerting is expected to watch.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnomalyReporter;

impl AnomalyReporter for TracingAnomalyReporter {
  fn report(&self, anomaly: &Anomaly) {
    match anomaly {
      Anomaly::ChargeWithoutOrder {
        user_id,
        charge_id,
        settled_cents,
        currency,
        idempotency_key,
        cart_item_ids,
      } => tracing::error!(
        target: "shopfront::anomaly",
        %user_id,
        %charge_id,
        settled_cents,
        %currency,
        %idempotency_key,
        cart_items = ?cart_item_ids,
        "RECONCILIATION REQUIRED: charge captured without an order record"
      ),
      Anomaly::SharedResetToken { user_ids } => tracing::error!(
        target: "shopfront::anomaly",
        users = ?user_ids,
        "reset token shared by multiple users"
      ),
    }
  }
}
