// shopfront-server/src/services/email.rs

//! Mail transports: SMTP via lettre, or a log-only fallback for development.

use async_trait::async_trait;
use lettre::{
  message::{header::ContentType, Mailbox},
  transport::smtp::authentication::Credentials,
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shopfront::ports::{DeliveryError, Email, MailTransport};
use tracing::{info, instrument, warn};

use crate::config::SmtpConfig;
use crate::errors::{AppError, Result as AppResult};

/// Logs every message instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
  from: String,
}

impl LogMailer {
  pub fn new(from: impl Into<String>) -> Self {
    Self { from: from.into() }
  }
}

#[async_trait]
impl MailTransport for LogMailer {
  async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
    let body_preview = email.html_body.chars().take(80).collect::<String>();
    info!(
      to = %email.to,
      from = %self.from,
      subject = %email.subject,
      body_preview = %body_preview,
      "Mail transport not configured; logging email instead of sending."
    );
    Ok(())
  }
}

#[derive(Clone)]
pub struct SmtpMailer {
  mailer: AsyncSmtpTransport<Tokio1Executor>,
  from: Mailbox,
}

impl SmtpMailer {
  pub fn new(config: &SmtpConfig, from: &str) -> AppResult<Self> {
    let from: Mailbox = from
      .parse()
      .map_err(|e| AppError::Config(format!("Invalid MAIL_SENDER '{}': {}", from, e)))?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
      .map_err(|e| AppError::Config(format!("Invalid SMTP_HOST '{}': {}", config.host, e)))?
      .port(config.port);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
      builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(Self {
      mailer: builder.build(),
      from,
    })
  }
}

#[async_trait]
impl MailTransport for SmtpMailer {
  #[instrument(name = "smtp::send", skip(self, email), fields(to = %email.to, subject = %email.subject))]
  async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
    let failed = |reason: String| DeliveryError {
      to: email.to.clone(),
      reason,
    };

    let to: Mailbox = email.to.parse().map_err(|e| failed(format!("invalid recipient: {e}")))?;
    let message = Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(email.subject.clone())
      .header(ContentType::TEXT_HTML)
      .body(email.html_body.clone())
      .map_err(|e| failed(format!("failed to build message: {e}")))?;

    match self.mailer.send(message).await {
      Ok(_) => {
        info!("Email sent.");
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "SMTP delivery failed.");
        Err(failed(e.to_string()))
      }
    }
  }
}
