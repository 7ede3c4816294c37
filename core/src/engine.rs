// shopfront/src/engine.rs

//! `Shopfront`: the engine facade. One instance is built at startup and
//! shared by every request; it holds no per-request state.

use std::sync::Arc;

use uuid::Uuid;

use crate::accounts::{Accounts, SignupInput};
use crate::auth::{Actor, PasswordResets, SessionManager, SessionToken};
use crate::cart::CartAggregator;
use crate::catalog::Catalog;
use crate::checkout::CheckoutOrchestrator;
use crate::error::CommerceResult;
use crate::model::{CartItem, CartLine, Item, ItemPatch, NewItem, Order, PermissionSet, User};
use crate::orders::Orders;
use crate::ports::{AnomalyReporter, MailTransport, PaymentGateway, Store, TracingAnomalyReporter};
use crate::settings::Settings;

pub struct Shopfront {
  store: Arc<dyn Store>,
  gateway: Arc<dyn PaymentGateway>,
  mailer: Arc<dyn MailTransport>,
  settings: Settings,
  sessions: SessionManager,
  accounts: Accounts,
  resets: PasswordResets,
  catalog: Catalog,
  cart: CartAggregator,
  checkout: CheckoutOrchestrator,
  orders: Orders,
}

impl Shopfront {
  pub fn new(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn MailTransport>,
    settings: Settings,
    session_secret: &[u8],
  ) -> Self {
    let sessions = SessionManager::new(session_secret, settings.session_validity);
    Self::assemble(store, gateway, mailer, settings, sessions, Arc::new(TracingAnomalyReporter))
  }

  /// Replaces the default tracing-based anomaly sink.
  pub fn with_anomaly_reporter(self, anomalies: Arc<dyn AnomalyReporter>) -> Self {
    Self::assemble(self.store, self.gateway, self.mailer, self.settings, self.sessions, anomalies)
  }

  fn assemble(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn MailTransport>,
    settings: Settings,
    sessions: SessionManager,
    anomalies: Arc<dyn AnomalyReporter>,
  ) -> Self {
    Self {
      accounts: Accounts::new(store.clone(), sessions.clone()),
      resets: PasswordResets::new(
        store.clone(),
        mailer.clone(),
        anomalies.clone(),
        sessions.clone(),
        settings.clone(),
      ),
      catalog: Catalog::new(store.clone()),
      cart: CartAggregator::new(store.clone()),
      checkout: CheckoutOrchestrator::new(store.clone(), gateway.clone(), anomalies, settings.clone()),
      orders: Orders::new(store.clone()),
      store,
      gateway,
      mailer,
      settings,
      sessions,
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn sessions(&self) -> &SessionManager {
    &self.sessions
  }

  /// Resolves the request actor from an optional session token.
  pub async fn resolve_actor(&self, token: Option<&str>) -> CommerceResult<Actor> {
    Actor::resolve(self.store.as_ref(), &self.sessions, token).await
  }

  // --- accounts ---

  pub async fn signup(&self, input: SignupInput) -> CommerceResult<(User, SessionToken)> {
    self.accounts.signup(input).await
  }

  pub async fn signin(&self, email: &str, password: &str) -> CommerceResult<(User, SessionToken)> {
    self.accounts.signin(email, password).await
  }

  /// Sessions are stateless; the transport clears the client's token.
  pub fn signout(&self) -> &'static str {
    "Goodbye!"
  }

  pub async fn me(&self, actor: &Actor) -> CommerceResult<Option<User>> {
    self.accounts.me(actor).await
  }

  pub async fn list_users(&self, actor: &Actor) -> CommerceResult<Vec<User>> {
    self.accounts.list_users(actor).await
  }

  pub async fn update_permissions(&self, actor: &Actor, target: Uuid, permissions: PermissionSet) -> CommerceResult<User> {
    self.accounts.update_permissions(actor, target, permissions).await
  }

  pub async fn request_password_reset(&self, email: &str) -> CommerceResult<()> {
    self.resets.request_password_reset(email).await
  }

  pub async fn reset_credential(&self, token: &str, new_plain: &str, confirm_plain: &str) -> CommerceResult<(User, SessionToken)> {
    self.resets.reset_credential(token, new_plain, confirm_plain).await
  }

  // --- catalog ---

  pub async fn get_item(&self, id: Uuid) -> CommerceResult<Item> {
    self.catalog.get_item(id).await
  }

  pub async fn create_item(&self, actor: &Actor, new: NewItem) -> CommerceResult<Item> {
    self.catalog.create_item(actor, new).await
  }

  pub async fn update_item(&self, actor: &Actor, id: Uuid, patch: ItemPatch) -> CommerceResult<Item> {
    self.catalog.update_item(actor, id, patch).await
  }

  pub async fn delete_item(&self, actor: &Actor, id: Uuid) -> CommerceResult<Item> {
    self.catalog.delete_item(actor, id).await
  }

  // --- cart ---

  pub async fn view_cart(&self, actor: &Actor) -> CommerceResult<Vec<CartLine>> {
    self.cart.view_cart(actor).await
  }

  pub async fn add_to_cart(&self, actor: &Actor, item_id: Uuid) -> CommerceResult<CartItem> {
    self.cart.add_to_cart(actor, item_id).await
  }

  pub async fn remove_from_cart(&self, actor: &Actor, cart_item_id: Uuid) -> CommerceResult<CartItem> {
    self.cart.remove_from_cart(actor, cart_item_id).await
  }

  // --- checkout & orders ---

  pub async fn checkout(&self, actor: &Actor, payment_token: &str) -> CommerceResult<Order> {
    self.checkout.checkout(actor, payment_token).await
  }

  pub async fn get_order(&self, actor: &Actor, id: Uuid) -> CommerceResult<Order> {
    self.orders.get_order(actor, id).await
  }

  pub async fn list_orders(&self, actor: &Actor) -> CommerceResult<Vec<Order>> {
    self.orders.list_orders(actor).await
  }
}
