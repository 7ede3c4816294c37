// shopfront/src/settings.rs

use chrono::Duration;

/// Engine-level knobs. The server fills these from its environment config.
#[derive(Debug, Clone)]
pub struct Settings {
  /// ISO currency code charged at checkout.
  pub currency: String,
  /// Lifetime of a session token (and of the cookie carrying it).
  pub session_validity: Duration,
  /// How long a password-reset token stays usable.
  pub reset_token_ttl: Duration,
  /// Base URL used to build the reset link.
  pub frontend_url: String,
  pub mail_sender: String,
  /// Upper bound on a single gateway call.
  pub gateway_timeout: std::time::Duration,
  /// Age after which a checkout claim on cart rows is considered abandoned.
  pub checkout_claim_ttl: Duration,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      currency: "USD".to_string(),
      session_validity: Duration::days(365),
      reset_token_ttl: Duration::hours(1),
      frontend_url: "http://localhost:7777".to_string(),
      mail_sender: "noreply@example.com".to_string(),
      gateway_timeout: std::time::Duration::from_secs(10),
      checkout_claim_ttl: Duration::minutes(15),
    }
  }
}
