// shopfront/src/checkout/context.rs

//! Data threaded through one checkout run.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::Actor;
use crate::error::ErrorKind;
use crate::model::{Item, Order};
use crate::ports::{AnomalyReporter, Charge, PaymentGateway, Store};
use crate::settings::Settings;
use crate::workflow::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStage {
  Validating,
  Pricing,
  Charging,
  Persisting,
  CleaningUp,
}

impl Stage for CheckoutStage {
  fn name(&self) -> &'static str {
    match self {
      CheckoutStage::Validating => "validating",
      CheckoutStage::Pricing => "pricing",
      CheckoutStage::Charging => "charging",
      CheckoutStage::Persisting => "persisting",
      CheckoutStage::CleaningUp => "cleaning_up",
    }
  }
}

/// Where a checkout run currently is. `Aborted` is reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
  Validating,
  Pricing,
  Charging,
  Persisting,
  CleaningUp,
  Completed,
  Aborted(ErrorKind),
}

impl From<CheckoutStage> for CheckoutState {
  fn from(stage: CheckoutStage) -> Self {
    match stage {
      CheckoutStage::Validating => CheckoutState::Validating,
      CheckoutStage::Pricing => CheckoutState::Pricing,
      CheckoutStage::Charging => CheckoutState::Charging,
      CheckoutStage::Persisting => CheckoutState::Persisting,
      CheckoutStage::CleaningUp => CheckoutState::CleaningUp,
    }
  }
}

/// Collaborators shared by every run of the orchestrator.
pub(crate) struct CheckoutDeps {
  pub store: Arc<dyn Store>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub anomalies: Arc<dyn AnomalyReporter>,
  pub settings: Settings,
}

/// A claimed cart row priced against the live catalog entry.
#[derive(Debug, Clone)]
pub struct PricedLine {
  pub cart_item_id: Uuid,
  pub item: Item,
  pub quantity: i32,
}

pub struct CheckoutCtxData {
  pub(crate) deps: Arc<CheckoutDeps>,
  pub actor: Actor,
  pub payment_token: String,
  /// Claim id on the cart rows and idempotency key at the gateway.
  pub checkout_id: Uuid,
  pub state: CheckoutState,
  pub user_id: Option<Uuid>,
  /// Every row the claim took, including rows whose item has since vanished.
  pub claimed_ids: Vec<Uuid>,
  pub snapshot: Vec<PricedLine>,
  pub total_cents: i64,
  pub charge: Option<Charge>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub(crate) fn new(deps: Arc<CheckoutDeps>, actor: Actor, payment_token: String) -> Self {
    Self {
      deps,
      actor,
      payment_token,
      checkout_id: Uuid::new_v4(),
      state: CheckoutState::Validating,
      user_id: None,
      claimed_ids: Vec::new(),
      snapshot: Vec::new(),
      total_cents: 0,
      charge: None,
      order: None,
    }
  }
}
