// shopfront-server/src/web/session.rs

//! Session cookie handling and the per-request actor extractor.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use shopfront::{Actor, SessionToken};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "token";

/// The actor behind a request. Resolved from the `token` cookie with the
/// user's current permissions; a missing or bad token yields `Anonymous`.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl FromRequest for RequestActor {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("application state is not registered".to_string()))?;
      let actor = state.engine.resolve_actor(token.as_deref()).await?;
      if let Actor::User(ctx) = &actor {
        debug!(user_id = %ctx.user_id, "Resolved request actor.");
      }
      Ok(RequestActor(actor))
    })
  }
}

pub fn session_cookie(session: &SessionToken, secure: bool) -> Cookie<'static> {
  Cookie::build(SESSION_COOKIE, session.token.clone())
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(secure)
    .max_age(CookieDuration::seconds(session.max_age.num_seconds()))
    .finish()
}

/// An already-expired cookie that makes the client drop its token.
pub fn clear_cookie(secure: bool) -> Cookie<'static> {
  let mut cookie = Cookie::build(SESSION_COOKIE, "")
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(secure)
    .finish();
  cookie.make_removal();
  cookie
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};

  #[test]
  fn session_cookie_is_http_only_and_lax() {
    let session = SessionToken {
      token: "abc".into(),
      expires_at: Utc::now() + Duration::days(365),
      max_age: Duration::days(365),
    };
    let cookie = session_cookie(&session, true);
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "abc");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.max_age(), Some(CookieDuration::days(365)));
  }

  #[test]
  fn clearing_cookie_expires_it() {
    let cookie = clear_cookie(false);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
  }
}
