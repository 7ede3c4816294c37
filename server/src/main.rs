// shopfront-server/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::errors::Result as AppResult;
use crate::services::email::{LogMailer, SmtpMailer};
use crate::services::payment_mock::MockPaymentGateway;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use shopfront::ports::{MailTransport, PaymentGateway, Store};
use shopfront::{MemoryStore, Shopfront};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

/// Wires the engine to its adapters as selected by the config.
async fn build_state(config: Arc<AppConfig>) -> AppResult<AppState> {
  let store: Arc<dyn Store> = match &config.database_url {
    Some(url) => {
      let store = PgStore::connect(url).await?;
      tracing::info!("Connected to the database.");
      Arc::new(store)
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  let mailer: Arc<dyn MailTransport> = match &config.smtp {
    Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail_sender)?),
    None => Arc::new(LogMailer::new(config.mail_sender.clone())),
  };

  let gateway: Arc<dyn PaymentGateway> = Arc::new(MockPaymentGateway::default());

  let engine = Shopfront::new(store, gateway, mailer, config.settings(), config.app_secret.as_bytes());
  Ok(AppState {
    engine: Arc::new(engine),
    config,
  })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      init_tracing(false);
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_json);
  tracing::info!(config = ?app_config, "Starting shopfront server...");

  let app_state = build_state(app_config.clone()).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise application state.");
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
  })?;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
