// shopfront/src/auth/reset.rs

//! Password-reset token lifecycle: issue, mail, consume once.

use std::sync::Arc;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Utc;
use tracing::{info, instrument, warn};

use super::credential::hash_credential;
use super::session::{SessionManager, SessionToken};
use crate::error::{CommerceError, CommerceResult};
use crate::model::{ResetToken, ResetTokenPatch, User, UserPatch};
use crate::ports::{Anomaly, AnomalyReporter, Email, MailTransport, Store, UserFilter};
use crate::settings::Settings;

const RESET_TOKEN_BYTES: usize = 20;
pub const RESET_EMAIL_SUBJECT: &str = "Your Password Reset Token";

pub struct PasswordResets {
  store: Arc<dyn Store>,
  mailer: Arc<dyn MailTransport>,
  anomalies: Arc<dyn AnomalyReporter>,
  sessions: SessionManager,
  settings: Settings,
}

fn generate_token() -> String {
  let mut bytes = [0u8; RESET_TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

pub(crate) fn reset_link(frontend_url: &str, token: &str) -> String {
  format!("{}/reset?resetToken={}", frontend_url.trim_end_matches('/'), token)
}

fn reset_email(to: &str, link: &str) -> Email {
  let html_body = format!(
    r#"<div style="border: 1px solid black; padding: 20px; font-family: sans-serif; line-height: 2; font-size: 20px;">
  <h2>Hello There!</h2>
  <p>Your password reset token is here!</p>
  <p><a href="{link}">Click Here to Reset</a></p>
</div>"#
  );
  Email {
    to: to.to_string(),
    subject: RESET_EMAIL_SUBJECT.to_string(),
    html_body,
  }
}

impl PasswordResets {
  pub fn new(
    store: Arc<dyn Store>,
    mailer: Arc<dyn MailTransport>,
    anomalies: Arc<dyn AnomalyReporter>,
    sessions: SessionManager,
    settings: Settings,
  ) -> Self {
    Self {
      store,
      mailer,
      anomalies,
      sessions,
      settings,
    }
  }

  /// Issues a fresh reset token for `email` and mails the reset link.
  ///
  /// A mail failure is logged and swallowed: the token stays valid for its
  /// window either way.
  #[instrument(name = "reset::request", skip(self))]
  pub async fn request_password_reset(&self, email: &str) -> CommerceResult<()> {
    let email = email.trim().to_lowercase();
    let token = ResetToken {
      token: generate_token(),
      expires_at: Utc::now() + self.settings.reset_token_ttl,
    };
    let patch = UserPatch {
      reset_token: Some(ResetTokenPatch::Set(token.clone())),
      ..Default::default()
    };

    let updated = self.store.update_users(&UserFilter::by_email(&email), &patch).await?;
    let Some(user) = updated.first() else {
      return Err(CommerceError::UserNotFound { email });
    };
    info!(user_id = %user.id, expires_at = %token.expires_at, "Reset token issued.");

    let link = reset_link(&self.settings.frontend_url, &token.token);
    if let Err(delivery_err) = self.mailer.send(&reset_email(&user.email, &link)).await {
      let err = CommerceError::from(delivery_err);
      warn!(user_id = %user.id, error = %err, "Reset email not delivered; token remains valid.");
    }
    Ok(())
  }

  /// Consumes `token` to set a new credential and signs the user in.
  ///
  /// The final write is conditional on the token still being present and
  /// unexpired, so two concurrent resets with one token cannot both succeed.
  #[instrument(name = "reset::consume", skip_all)]
  pub async fn reset_credential(
    &self,
    token: &str,
    new_plain: &str,
    confirm_plain: &str,
  ) -> CommerceResult<(User, SessionToken)> {
    if new_plain != confirm_plain {
      return Err(CommerceError::PasswordMismatch);
    }
    if token.is_empty() {
      return Err(CommerceError::InvalidOrExpiredToken);
    }

    let now = Utc::now();
    let token_filter = UserFilter {
      reset_token: Some(token.to_string()),
      reset_token_expires_at_gte: Some(now),
      ..Default::default()
    };
    let matches = self.store.find_users(&token_filter).await?;
    let Some(target) = matches.first() else {
      return Err(CommerceError::InvalidOrExpiredToken);
    };
    if matches.len() > 1 {
      self.anomalies.report(&Anomaly::SharedResetToken {
        user_ids: matches.iter().map(|u| u.id).collect(),
      });
    }

    let password_hash = hash_credential(new_plain)?;
    let patch = UserPatch {
      password_hash: Some(password_hash),
      reset_token: Some(ResetTokenPatch::Clear),
      ..Default::default()
    };
    let consume_filter = UserFilter {
      id: Some(target.id),
      ..token_filter
    };
    let mut updated = self.store.update_users(&consume_filter, &patch).await?;
    if updated.is_empty() {
      // Consumed or expired between the lookup and the write.
      return Err(CommerceError::InvalidOrExpiredToken);
    }
    let user = updated.swap_remove(0);

    let session = self.sessions.issue(user.id)?;
    info!(user_id = %user.id, "Credential reset; reset token cleared.");
    Ok((user, session))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_forty_hex_chars_and_distinct() {
    let a = generate_token();
    let b = generate_token();
    assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  #[test]
  fn link_carries_the_token_as_query_parameter() {
    assert_eq!(
      reset_link("http://localhost:7777/", "abc"),
      "http://localhost:7777/reset?resetToken=abc"
    );
  }

  #[test]
  fn email_embeds_the_link() {
    let email = reset_email("a@b.c", "http://x/reset?resetToken=t");
    assert_eq!(email.subject, RESET_EMAIL_SUBJECT);
    assert!(email.html_body.contains("href=\"http://x/reset?resetToken=t\""));
  }
}
