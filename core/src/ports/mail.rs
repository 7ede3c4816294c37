// shopfront/src/ports/mail.rs

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
  pub to: String,
  pub subject: String,
  pub html_body: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("delivery to {to} failed: {reason}")]
pub struct DeliveryError {
  pub to: String,
  pub reason: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
  async fn send(&self, email: &Email) -> Result<(), DeliveryError>;
}
