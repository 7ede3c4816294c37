// shopfront/src/checkout/stages.rs

//! Stage handlers of the checkout workflow.
//!
//! Every handler copies what it needs out of the context before its first
//! `.await` and writes results back afterwards; no lock is held across a
//! store or gateway call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::context::{CheckoutCtxData, CheckoutDeps, CheckoutStage, PricedLine};
use crate::error::{CommerceError, CommerceResult};
use crate::model::{NewOrder, NewOrderLine};
use crate::ports::{Anomaly, Charge, ChargeRequest, GatewayError};
use crate::workflow::{ContextData, StepControl, Workflow};

pub(crate) type CheckoutWorkflow = Workflow<CheckoutCtxData, CheckoutStage, CommerceError>;

pub(crate) fn build_workflow() -> CheckoutWorkflow {
  let mut wf = Workflow::new(
    "checkout",
    &[
      (CheckoutStage::Validating, false),
      (CheckoutStage::Pricing, false),
      (CheckoutStage::Charging, false),
      (CheckoutStage::Persisting, false),
      // The order exists by now; a failed cleanup must not fail the checkout.
      (CheckoutStage::CleaningUp, true),
    ],
  );
  let stages: Vec<CheckoutStage> = wf.stages().collect();
  for stage in stages {
    wf.on(stage, move |ctx: ContextData<CheckoutCtxData>| {
      ctx.write().state = stage.into();
      std::future::ready(Ok::<_, CommerceError>(StepControl::Continue))
    });
  }
  wf.on(CheckoutStage::Validating, validate);
  wf.on(CheckoutStage::Pricing, price_cart);
  wf.on(CheckoutStage::Charging, charge);
  wf.on(CheckoutStage::Persisting, persist_order);
  wf.on(CheckoutStage::CleaningUp, clean_up);
  wf
}

fn deps(ctx: &ContextData<CheckoutCtxData>) -> Arc<CheckoutDeps> {
  ctx.read().deps.clone()
}

async fn validate(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<StepControl> {
  ctx.update(|d| {
    let user_id = d.actor.require()?.user_id;
    if d.payment_token.trim().is_empty() {
      return Err(CommerceError::Validation("A payment token is required.".to_string()));
    }
    d.user_id = Some(user_id);
    Ok(StepControl::Continue)
  })
}

fn line_total(line: &PricedLine) -> Option<i64> {
  line.item.price_cents.checked_mul(i64::from(line.quantity))
}

async fn price_cart(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<StepControl> {
  let deps = deps(&ctx);
  let (user_id, checkout_id) = ctx.with(|d| (d.user_id, d.checkout_id));
  let user_id = user_id.ok_or(CommerceError::Unauthenticated)?;

  let now = Utc::now();
  let stale_before = now - deps.settings.checkout_claim_ttl;
  let claimed = deps.store.claim_cart(user_id, checkout_id, now, stale_before).await?;
  ctx.write().claimed_ids = claimed.iter().map(|r| r.id).collect();
  if claimed.is_empty() {
    return Err(CommerceError::EmptyCart);
  }

  let item_ids: Vec<Uuid> = claimed.iter().map(|r| r.item_id).collect();
  let items: HashMap<Uuid, _> = deps
    .store
    .get_items(&item_ids)
    .await?
    .into_iter()
    .map(|item| (item.id, item))
    .collect();

  let mut snapshot = Vec::with_capacity(claimed.len());
  for row in claimed {
    match items.get(&row.item_id) {
      Some(item) if row.quantity > 0 => snapshot.push(PricedLine {
        cart_item_id: row.id,
        item: item.clone(),
        quantity: row.quantity,
      }),
      Some(_) => warn!(cart_item_id = %row.id, quantity = row.quantity, "Skipping cart row with non-positive quantity."),
      None => debug!(cart_item_id = %row.id, item_id = %row.item_id, "Item vanished before pricing; skipping."),
    }
  }
  if snapshot.is_empty() {
    return Err(CommerceError::EmptyCart);
  }

  let total = snapshot
    .iter()
    .try_fold(0i64, |acc, line| line_total(line).and_then(|t| acc.checked_add(t)))
    .ok_or_else(|| CommerceError::Validation("Order total is too large.".to_string()))?;
  if total <= 0 {
    return Err(CommerceError::Validation("There is nothing to charge for.".to_string()));
  }

  info!(%checkout_id, lines = snapshot.len(), total_cents = total, "Cart priced.");
  ctx.update(|d| {
    d.snapshot = snapshot;
    d.total_cents = total;
  });
  Ok(StepControl::Continue)
}

async fn charge(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<StepControl> {
  let deps = deps(&ctx);
  let request = ctx.with(|d| ChargeRequest {
    amount_cents: d.total_cents,
    currency: deps.settings.currency.clone(),
    source_token: d.payment_token.clone(),
    idempotency_key: d.checkout_id,
  });
  let timeout = deps.settings.gateway_timeout;

  let outcome = match tokio::time::timeout(timeout, deps.gateway.charge(&request)).await {
    Ok(result) => result,
    Err(_) => Err(GatewayError::Unavailable(format!("no answer within {timeout:?}"))),
  };

  let confirmed: Charge = match outcome {
    Ok(charge) => charge,
    Err(GatewayError::Declined(reason)) => {
      info!(checkout_id = %request.idempotency_key, %reason, "Charge declined.");
      return Err(CommerceError::PaymentFailed { reason });
    }
    Err(GatewayError::Unavailable(reason)) => {
      warn!(checkout_id = %request.idempotency_key, %reason, "Gateway unavailable; checking whether the charge landed.");
      match tokio::time::timeout(timeout, deps.gateway.find_charge(request.idempotency_key)).await {
        Ok(Ok(Some(charge))) => {
          warn!(checkout_id = %request.idempotency_key, charge_id = %charge.charge_id, "Charge found by idempotency key.");
          charge
        }
        Ok(Ok(None)) => return Err(CommerceError::PaymentFailed { reason }),
        Ok(Err(lookup_err)) => {
          warn!(error = %lookup_err, "Charge lookup failed; treating as not charged.");
          return Err(CommerceError::PaymentFailed { reason });
        }
        Err(_) => {
          warn!("Charge lookup timed out; treating as not charged.");
          return Err(CommerceError::PaymentFailed { reason });
        }
      }
    }
  };

  if confirmed.settled_cents != request.amount_cents {
    warn!(
      charge_id = %confirmed.charge_id,
      computed_cents = request.amount_cents,
      settled_cents = confirmed.settled_cents,
      "Gateway settled a different amount; recording the settled amount."
    );
  }
  info!(charge_id = %confirmed.charge_id, settled_cents = confirmed.settled_cents, "Charge confirmed.");
  let charge_id = confirmed.charge_id.clone();
  let claimed = ctx.update(|d| {
    d.charge = Some(confirmed);
    d.claimed_ids.len()
  });

  // Settled rows are never taken over by a later checkout, even if neither
  // the order nor the cleanup below succeeds.
  match deps.store.settle_cart_claim(request.idempotency_key, &charge_id).await {
    Ok(settled) if settled as usize == claimed => {}
    Ok(settled) => warn!(%charge_id, settled, claimed, "Claim was only partly settled."),
    Err(e) => error!(%charge_id, error = %e, "Failed to settle the cart claim for a confirmed charge."),
  }
  Ok(StepControl::Continue)
}

async fn persist_order(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<StepControl> {
  let deps = deps(&ctx);
  let (user_id, checkout_id, charge, lines, claimed_ids) = ctx.with(|d| {
    (
      d.user_id,
      d.checkout_id,
      d.charge.clone(),
      d.snapshot
        .iter()
        .map(|l| NewOrderLine {
          item_id: l.item.id,
          title: l.item.title.clone(),
          description: l.item.description.clone(),
          price_cents: l.item.price_cents,
          image: l.item.image.clone(),
          large_image: l.item.large_image.clone(),
          quantity: l.quantity,
        })
        .collect::<Vec<_>>(),
      d.claimed_ids.clone(),
    )
  });
  let user_id = user_id.ok_or(CommerceError::Unauthenticated)?;
  let charge = charge.ok_or_else(|| CommerceError::Internal("persisting without a charge".to_string()))?;

  let new_order = NewOrder {
    user_id,
    total_cents: charge.settled_cents,
    currency: deps.settings.currency.clone(),
    charge_id: charge.charge_id.clone(),
    lines,
  };
  match deps.store.create_order(new_order).await {
    Ok(order) => {
      info!(order_id = %order.id, charge_id = %order.charge_id, "Order persisted.");
      ctx.write().order = Some(order);
      Ok(StepControl::Continue)
    }
    Err(source) => {
      deps.anomalies.report(&Anomaly::ChargeWithoutOrder {
        user_id,
        charge_id: charge.charge_id.clone(),
        settled_cents: charge.settled_cents,
        currency: deps.settings.currency.clone(),
        idempotency_key: checkout_id,
        cart_item_ids: claimed_ids,
      });
      Err(CommerceError::OrderPersistFailedAfterCharge {
        user_id,
        charge_id: charge.charge_id,
        settled_cents: charge.settled_cents,
        currency: deps.settings.currency.clone(),
        source,
      })
    }
  }
}

async fn clean_up(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<StepControl> {
  let deps = deps(&ctx);
  let (checkout_id, claimed_ids) = ctx.with(|d| (d.checkout_id, d.claimed_ids.clone()));
  let deleted = deps.store.delete_claimed_cart_items(&claimed_ids, checkout_id).await?;
  if deleted as usize != claimed_ids.len() {
    debug!(deleted, claimed = claimed_ids.len(), "Some claimed rows were already gone.");
  }
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn workflow_runs_stages_in_checkout_order() {
    let wf = build_workflow();
    assert_eq!(
      wf.stages().collect::<Vec<_>>(),
      vec![
        CheckoutStage::Validating,
        CheckoutStage::Pricing,
        CheckoutStage::Charging,
        CheckoutStage::Persisting,
        CheckoutStage::CleaningUp,
      ]
    );
  }
}
