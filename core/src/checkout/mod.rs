// shopfront/src/checkout/mod.rs

//! Checkout Orchestrator.
//!
//! `Validating -> Pricing -> Charging -> Persisting -> CleaningUp -> Completed`,
//! with `Aborted(kind)` reachable from every stage. Pricing claims the cart
//! rows it prices, so a concurrent checkout of the same cart finds nothing to
//! claim, and rows added while the charge is in flight are never cleaned up.
//!
//! Recovery by stage:
//! - before a charge is confirmed, the claim is released and the cart is left
//!   as it was;
//! - a persist failure after a confirmed charge is reported as an anomaly and
//!   the claimed rows stay claimed until an operator reconciles them;
//! - a cleanup failure is logged and the order is returned anyway.

mod context;
mod stages;

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

pub use context::{CheckoutCtxData, CheckoutStage, CheckoutState};

use self::context::CheckoutDeps;
use self::stages::{build_workflow, CheckoutWorkflow};
use crate::auth::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::model::Order;
use crate::ports::{AnomalyReporter, PaymentGateway, Store};
use crate::settings::Settings;
use crate::workflow::{ContextData, Halted, WorkflowOutcome};

pub struct CheckoutOrchestrator {
  deps: Arc<CheckoutDeps>,
  workflow: CheckoutWorkflow,
}

impl CheckoutOrchestrator {
  pub fn new(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    anomalies: Arc<dyn AnomalyReporter>,
    settings: Settings,
  ) -> Self {
    Self {
      deps: Arc::new(CheckoutDeps {
        store,
        gateway,
        anomalies,
        settings,
      }),
      workflow: build_workflow(),
    }
  }

  /// Charges the actor's cart with `payment_token` and records the order.
  #[instrument(name = "checkout", skip(self, actor, payment_token), fields(user_id = ?actor.user_id()))]
  pub async fn checkout(&self, actor: &Actor, payment_token: &str) -> CommerceResult<Order> {
    let ctx = ContextData::new(CheckoutCtxData::new(
      self.deps.clone(),
      actor.clone(),
      payment_token.to_string(),
    ));

    match self.workflow.run(ctx.clone()).await {
      Ok(WorkflowOutcome::Completed) => {
        let order = ctx.update(|d| {
          d.state = CheckoutState::Completed;
          d.order.take()
        });
        let order = order.ok_or_else(|| CommerceError::Internal("checkout finished without an order".to_string()))?;
        info!(order_id = %order.id, total_cents = order.total_cents, "Checkout completed.");
        Ok(order)
      }
      Ok(WorkflowOutcome::Stopped { at }) => {
        self.release_claim(&ctx).await;
        Err(CommerceError::Internal(format!("checkout stopped at {at:?}")))
      }
      Err(Halted { stage, error }) => {
        let charged = ctx.with(|d| d.charge.is_some());
        if !charged {
          self.release_claim(&ctx).await;
        }
        ctx.write().state = CheckoutState::Aborted(error.kind());
        match &error {
          CommerceError::OrderPersistFailedAfterCharge { .. } => {
            error!(?stage, error = %error, "Checkout aborted after the charge was taken.");
          }
          _ => info!(?stage, kind = %error.kind(), "Checkout aborted."),
        }
        Err(error)
      }
    }
  }

  async fn release_claim(&self, ctx: &ContextData<CheckoutCtxData>) {
    let (checkout_id, claimed) = ctx.with(|d| (d.checkout_id, d.claimed_ids.len()));
    if claimed == 0 {
      return;
    }
    match self.deps.store.release_cart_claim(checkout_id).await {
      Ok(released) => info!(%checkout_id, released, "Cart claim released."),
      // Rows stay claimed until the claim goes stale.
      Err(e) => warn!(%checkout_id, error = %e, "Failed to release cart claim."),
    }
  }
}
