// shopfront-server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use shopfront::Settings;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
  pub host: String,
  pub port: u16,
  pub username: Option<String>,
  pub password: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// When absent the in-memory store is used.
  pub database_url: Option<String>,
  pub app_secret: String,
  pub frontend_url: String,
  pub currency: String,
  pub mail_sender: String,
  pub smtp: Option<SmtpConfig>,
  pub gateway_timeout_ms: u64,
  pub checkout_claim_ttl_secs: i64,
  pub cookie_secure: bool,
  pub log_json: bool,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("frontend_url", &self.frontend_url)
      .field("currency", &self.currency)
      .field("mail_sender", &self.mail_sender)
      .field("smtp_host", &self.smtp.as_ref().map(|s| &s.host))
      .field("gateway_timeout_ms", &self.gateway_timeout_ms)
      .field("checkout_claim_ttl_secs", &self.checkout_claim_ttl_secs)
      .field("cookie_secure", &self.cookie_secure)
      .field("log_json", &self.log_json)
      .finish_non_exhaustive()
  }
}

fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match optional_env(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let server_host = optional_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed_env("SERVER_PORT", 8080u16)?;
    let database_url = optional_env("DATABASE_URL");
    let app_secret = optional_env("APP_SECRET")
      .ok_or_else(|| AppError::Config("Missing environment variable 'APP_SECRET'".to_string()))?;

    let defaults = Settings::default();
    let frontend_url = optional_env("FRONTEND_URL").unwrap_or(defaults.frontend_url);
    let currency = optional_env("CURRENCY").unwrap_or(defaults.currency).to_uppercase();
    let mail_sender = optional_env("MAIL_SENDER").unwrap_or(defaults.mail_sender);

    let smtp = match optional_env("SMTP_HOST") {
      Some(host) => Some(SmtpConfig {
        host,
        port: parsed_env("SMTP_PORT", 587u16)?,
        username: optional_env("SMTP_USERNAME"),
        password: optional_env("SMTP_PASSWORD"),
      }),
      None => None,
    };

    let gateway_timeout_ms = parsed_env("GATEWAY_TIMEOUT_MS", 10_000u64)?;
    let checkout_claim_ttl_secs = parsed_env("CHECKOUT_CLAIM_TTL_SECS", 900i64)?;
    if checkout_claim_ttl_secs <= 0 {
      return Err(AppError::Config("CHECKOUT_CLAIM_TTL_SECS must be positive".to_string()));
    }
    let cookie_secure = parsed_env("COOKIE_SECURE", false)?;
    let log_json = parsed_env("LOG_JSON", false)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_secret,
      frontend_url,
      currency,
      mail_sender,
      smtp,
      gateway_timeout_ms,
      checkout_claim_ttl_secs,
      cookie_secure,
      log_json,
    })
  }

  /// Engine settings derived from this config.
  pub fn settings(&self) -> Settings {
    Settings {
      currency: self.currency.clone(),
      frontend_url: self.frontend_url.clone(),
      mail_sender: self.mail_sender.clone(),
      gateway_timeout: std::time::Duration::from_millis(self.gateway_timeout_ms),
      checkout_claim_ttl: chrono::Duration::seconds(self.checkout_claim_ttl_secs),
      ..Settings::default()
    }
  }
}
