// shopfront-server/src/state.rs
use crate::config::AppConfig;
use shopfront::Shopfront;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub engine: Arc<Shopfront>,
  pub config: Arc<AppConfig>,
}
