// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::Level;
use uuid::Uuid;

use shopfront::model::{
  CartItem, Item, ItemPatch, NewItem, NewOrder, NewUser, Order, Permission, PermissionSet, User, UserPatch,
};
use shopfront::ports::{
  Anomaly, AnomalyReporter, Charge, ChargeRequest, DeliveryError, Email, GatewayError, MailTransport, PaymentGateway,
  Store, StoreError, StoreResult, UserFilter,
};
use shopfront::{Actor, MemoryStore, Settings, Shopfront, SignupInput};

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Payment gateway ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
  Approve,
  Decline,
  Unavailable,
  /// Never answers. Pair with a short `gateway_timeout`.
  Hang,
  /// Takes the money, then never answers.
  ChargeThenHang,
  /// Approves but settles a fixed amount regardless of the request.
  SettleAs(i64),
}

pub type Interleave = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct ScriptedGateway {
  mode: Mutex<GatewayMode>,
  calls: AtomicUsize,
  issued: AtomicUsize,
  requests: Mutex<Vec<ChargeRequest>>,
  charges: Mutex<HashMap<Uuid, Charge>>,
  during_charge: Mutex<Option<Interleave>>,
}

impl ScriptedGateway {
  pub fn new(mode: GatewayMode) -> Self {
    Self {
      mode: Mutex::new(mode),
      calls: AtomicUsize::new(0),
      issued: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
      charges: Mutex::new(HashMap::new()),
      during_charge: Mutex::new(None),
    }
  }

  pub fn set_mode(&self, mode: GatewayMode) {
    *self.mode.lock() = mode;
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requests(&self) -> Vec<ChargeRequest> {
    self.requests.lock().clone()
  }

  /// Runs `fut` inside the next `charge` call, before it answers.
  pub fn interleave(&self, fut: impl Future<Output = ()> + Send + 'static) {
    *self.during_charge.lock() = Some(Box::pin(fut));
  }

  fn record(&self, request: &ChargeRequest, settled_cents: i64) -> Charge {
    let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let charge = Charge {
      charge_id: format!("ch_{n}"),
      settled_cents,
    };
    self.charges.lock().insert(request.idempotency_key, charge.clone());
    charge
  }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
  async fn charge(&self, request: &ChargeRequest) -> Result<Charge, GatewayError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().push(request.clone());
    let hook = self.during_charge.lock().take();
    if let Some(hook) = hook {
      hook.await;
    }

    let mode = *self.mode.lock();
    match mode {
      GatewayMode::Approve => Ok(self.record(request, request.amount_cents)),
      GatewayMode::SettleAs(cents) => Ok(self.record(request, cents)),
      GatewayMode::Decline => Err(GatewayError::Declined("card_declined".to_string())),
      GatewayMode::Unavailable => Err(GatewayError::Unavailable("connection reset".to_string())),
      GatewayMode::Hang => std::future::pending().await,
      GatewayMode::ChargeThenHang => {
        self.record(request, request.amount_cents);
        std::future::pending().await
      }
    }
  }

  async fn find_charge(&self, idempotency_key: Uuid) -> Result<Option<Charge>, GatewayError> {
    Ok(self.charges.lock().get(&idempotency_key).cloned())
  }
}

// --- Mail ---

#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<Email>>,
  pub fail: AtomicBool,
}

impl RecordingMailer {
  pub fn sent(&self) -> Vec<Email> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl MailTransport for RecordingMailer {
  async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(DeliveryError {
        to: email.to.clone(),
        reason: "smtp relay refused".to_string(),
      });
    }
    self.sent.lock().push(email.clone());
    Ok(())
  }
}

// --- Anomalies ---

#[derive(Default)]
pub struct RecordingAnomalies {
  pub reported: Mutex<Vec<Anomaly>>,
}

impl AnomalyReporter for RecordingAnomalies {
  fn report(&self, anomaly: &Anomaly) {
    self.reported.lock().push(anomaly.clone());
  }
}

// --- Store with switchable failures ---

/// Delegates to a `MemoryStore`, failing selected operations on demand.
#[derive(Default)]
pub struct FlakyStore {
  pub inner: MemoryStore,
  pub fail_create_order: AtomicBool,
  pub fail_cart_cleanup: AtomicBool,
}

fn injected() -> StoreError {
  StoreError::backend(anyhow::anyhow!("injected failure"))
}

#[async_trait]
impl Store for FlakyStore {
  async fn create_user(&self, new: NewUser) -> StoreResult<User> {
    self.inner.create_user(new).await
  }
  async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
    self.inner.get_user(id).await
  }
  async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
    self.inner.find_users(filter).await
  }
  async fn list_users(&self) -> StoreResult<Vec<User>> {
    self.inner.list_users().await
  }
  async fn update_users(&self, filter: &UserFilter, patch: &UserPatch) -> StoreResult<Vec<User>> {
    self.inner.update_users(filter, patch).await
  }
  async fn create_item(&self, owner_id: Uuid, new: NewItem) -> StoreResult<Item> {
    self.inner.create_item(owner_id, new).await
  }
  async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    self.inner.get_item(id).await
  }
  async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>> {
    self.inner.get_items(ids).await
  }
  async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> StoreResult<Option<Item>> {
    self.inner.update_item(id, patch).await
  }
  async fn delete_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
    self.inner.delete_item(id).await
  }
  async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    self.inner.get_cart_item(id).await
  }
  async fn find_open_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    self.inner.find_open_cart_item(user_id, item_id).await
  }
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
    self.inner.list_cart(user_id).await
  }
  async fn create_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<CartItem> {
    self.inner.create_cart_item(user_id, item_id).await
  }
  async fn increment_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    self.inner.increment_cart_item(id).await
  }
  async fn delete_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
    self.inner.delete_cart_item(id).await
  }
  async fn claim_cart(
    &self,
    user_id: Uuid,
    claim: Uuid,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
  ) -> StoreResult<Vec<CartItem>> {
    self.inner.claim_cart(user_id, claim, now, stale_before).await
  }
  async fn settle_cart_claim(&self, claim: Uuid, charge_id: &str) -> StoreResult<u64> {
    self.inner.settle_cart_claim(claim, charge_id).await
  }
  async fn release_cart_claim(&self, claim: Uuid) -> StoreResult<u64> {
    self.inner.release_cart_claim(claim).await
  }
  async fn delete_claimed_cart_items(&self, ids: &[Uuid], claim: Uuid) -> StoreResult<u64> {
    if self.fail_cart_cleanup.load(Ordering::SeqCst) {
      return Err(injected());
    }
    self.inner.delete_claimed_cart_items(ids, claim).await
  }
  async fn create_order(&self, new: NewOrder) -> StoreResult<Order> {
    if self.fail_create_order.load(Ordering::SeqCst) {
      return Err(injected());
    }
    self.inner.create_order(new).await
  }
  async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
    self.inner.get_order(id).await
  }
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    self.inner.list_orders(user_id).await
  }
}

// --- Harness ---

pub const PASSWORD: &str = "correct horse battery staple";

pub struct Harness {
  pub engine: Arc<Shopfront>,
  pub store: Arc<FlakyStore>,
  pub gateway: Arc<ScriptedGateway>,
  pub mailer: Arc<RecordingMailer>,
  pub anomalies: Arc<RecordingAnomalies>,
}

pub fn test_settings() -> Settings {
  Settings {
    gateway_timeout: std::time::Duration::from_millis(100),
    ..Settings::default()
  }
}

pub fn harness() -> Harness {
  harness_with(test_settings())
}

pub fn harness_with(settings: Settings) -> Harness {
  setup_tracing();
  let store = Arc::new(FlakyStore::default());
  let gateway = Arc::new(ScriptedGateway::new(GatewayMode::Approve));
  let mailer = Arc::new(RecordingMailer::default());
  let anomalies = Arc::new(RecordingAnomalies::default());
  let engine = Shopfront::new(store.clone(), gateway.clone(), mailer.clone(), settings, b"test-app-secret")
    .with_anomaly_reporter(anomalies.clone());
  Harness {
    engine: Arc::new(engine),
    store,
    gateway,
    mailer,
    anomalies,
  }
}

impl Harness {
  /// Signs a user up and returns them with a freshly resolved actor.
  pub async fn user(&self, name: &str) -> (User, Actor) {
    let (user, session) = self
      .engine
      .signup(SignupInput {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: PASSWORD.to_string(),
      })
      .await
      .expect("signup");
    let actor = self.engine.resolve_actor(Some(&session.token)).await.expect("resolve actor");
    (user, actor)
  }

  /// Sets `user_id`'s permissions directly in the store.
  pub async fn grant(&self, user_id: Uuid, permissions: &[Permission]) {
    let patch = UserPatch {
      permissions: Some(permissions.iter().copied().collect::<PermissionSet>()),
      ..Default::default()
    };
    self.store.update_users(&UserFilter::by_id(user_id), &patch).await.expect("grant");
  }

  /// Re-resolves `user_id`'s actor from a new session.
  pub async fn actor(&self, user_id: Uuid) -> Actor {
    let session = self.engine.sessions().issue(user_id).expect("issue");
    self.engine.resolve_actor(Some(&session.token)).await.expect("resolve actor")
  }

  pub async fn item(&self, owner: &Actor, title: &str, price_cents: i64) -> Item {
    self
      .engine
      .create_item(
        owner,
        NewItem {
          title: title.to_string(),
          description: format!("A fine {title}"),
          price_cents,
          image: Some(format!("{}.jpg", title.to_lowercase())),
          large_image: None,
        },
      )
      .await
      .expect("create item")
  }

  pub async fn cart_rows(&self, user_id: Uuid) -> Vec<CartItem> {
    self.store.list_cart(user_id).await.expect("list cart")
  }

  pub fn anomalies(&self) -> Vec<Anomaly> {
    self.anomalies.reported.lock().clone()
  }
}
