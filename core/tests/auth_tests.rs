// tests/auth_tests.rs
mod common;

use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use common::*;
use serial_test::serial;
use shopfront::model::{Permission, ResetToken, ResetTokenPatch, UserPatch};
use shopfront::ports::{Anomaly, Store, UserFilter};
use shopfront::{Actor, ErrorKind, SignupInput};

async fn reset_token_of(h: &Harness, email: &str) -> Option<String> {
  let users = h.store.find_users(&UserFilter::by_email(email)).await.expect("find users");
  users.first().and_then(|u| u.reset_token.clone())
}

#[tokio::test]
#[serial]
async fn test_signup_normalizes_email_and_grants_user() {
  let h = harness();
  let (user, session) = h
    .engine
    .signup(SignupInput {
      name: "Wes".to_string(),
      email: "  Wes@Example.com ".to_string(),
      password: PASSWORD.to_string(),
    })
    .await
    .unwrap();

  assert_eq!(user.email, "wes@example.com");
  assert_eq!(user.permissions.iter().copied().collect::<Vec<_>>(), vec![Permission::User]);
  assert_ne!(user.password_hash, PASSWORD);
  assert_eq!(session.max_age, Duration::days(365));

  let actor = h.engine.resolve_actor(Some(&session.token)).await.unwrap();
  assert_eq!(actor.user_id(), Some(user.id));
}

#[tokio::test]
#[serial]
async fn test_duplicate_signup_is_email_taken() {
  let h = harness();
  h.user("Wes").await;
  let err = h
    .engine
    .signup(SignupInput {
      name: "Other".to_string(),
      email: "WES@example.com".to_string(),
      password: PASSWORD.to_string(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::EmailTaken);
}

#[tokio::test]
#[serial]
async fn test_signin_does_not_reveal_which_part_was_wrong() {
  let h = harness();
  h.user("Wes").await;

  let wrong_password = h.engine.signin("wes@example.com", "nope").await.unwrap_err();
  let unknown_email = h.engine.signin("nobody@example.com", PASSWORD).await.unwrap_err();
  assert_eq!(wrong_password.kind(), ErrorKind::InvalidCredential);
  assert_eq!(unknown_email.kind(), ErrorKind::InvalidCredential);
  assert_eq!(wrong_password.public_message(), unknown_email.public_message());

  let (user, _) = h.engine.signin("WES@example.com", PASSWORD).await.unwrap();
  assert_eq!(user.email, "wes@example.com");
}

#[tokio::test]
#[serial]
async fn test_invalid_or_missing_session_is_anonymous_not_an_error() {
  let h = harness();
  assert_eq!(h.engine.resolve_actor(None).await.unwrap(), Actor::Anonymous);
  assert_eq!(h.engine.resolve_actor(Some("not-a-token")).await.unwrap(), Actor::Anonymous);
  assert!(h.engine.me(&Actor::Anonymous).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_session_reflects_permissions_changed_after_issuance() {
  let h = harness();
  let (admin, _) = h.user("Admin").await;
  h.grant(admin.id, &[Permission::User, Permission::Admin]).await;
  let admin_actor = h.actor(admin.id).await;

  let (wes, _) = h.user("Wes").await;
  let session = h.engine.sessions().issue(wes.id).unwrap();

  h.engine
    .update_permissions(
      &admin_actor,
      wes.id,
      [Permission::User, Permission::ItemDelete].into_iter().collect(),
    )
    .await
    .unwrap();

  match h.engine.resolve_actor(Some(&session.token)).await.unwrap() {
    Actor::User(ctx) => assert!(ctx.permissions.contains(&Permission::ItemDelete)),
    Actor::Anonymous => panic!("session should still be valid"),
  }
}

#[tokio::test]
#[serial]
async fn test_revoked_grant_is_honoured_even_with_a_stale_actor() {
  let h = harness();
  let (manager, _) = h.user("Manager").await;
  h.grant(manager.id, &[Permission::User, Permission::PermissionUpdate]).await;
  let stale = h.actor(manager.id).await;
  let (target, _) = h.user("Target").await;

  // Revoked after the request's actor was resolved.
  h.grant(manager.id, &[Permission::User]).await;

  let err = h
    .engine
    .update_permissions(&stale, target.id, [Permission::User, Permission::Admin].into_iter().collect())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);
  let target_now = h.store.get_user(target.id).await.unwrap().unwrap();
  assert!(!target_now.permissions.contains(&Permission::Admin));
}

#[tokio::test]
#[serial]
async fn test_update_permissions_replaces_the_whole_set() {
  let h = harness();
  let (admin, _) = h.user("Admin").await;
  h.grant(admin.id, &[Permission::User, Permission::Admin]).await;
  let admin_actor = h.actor(admin.id).await;
  let (wes, _) = h.user("Wes").await;
  h.grant(wes.id, &[Permission::User, Permission::ItemCreate, Permission::ItemUpdate]).await;

  let updated = h
    .engine
    .update_permissions(&admin_actor, wes.id, [Permission::ItemDelete].into_iter().collect())
    .await
    .unwrap();
  assert_eq!(updated.permissions.into_iter().collect::<Vec<_>>(), vec![Permission::ItemDelete]);

  let empty = h
    .engine
    .update_permissions(&admin_actor, wes.id, Default::default())
    .await
    .unwrap_err();
  assert_eq!(empty.kind(), ErrorKind::Validation);

  let self_strip = h
    .engine
    .update_permissions(&admin_actor, admin.id, [Permission::Admin].into_iter().collect())
    .await
    .unwrap_err();
  assert_eq!(self_strip.kind(), ErrorKind::Validation);
}

#[tokio::test]
#[serial]
async fn test_list_users_requires_admin_or_permission_update() {
  let h = harness();
  let (_, plain) = h.user("Wes").await;
  let (manager, _) = h.user("Manager").await;
  h.grant(manager.id, &[Permission::User, Permission::PermissionUpdate]).await;
  let manager_actor = h.actor(manager.id).await;

  assert_eq!(h.engine.list_users(&plain).await.unwrap_err().kind(), ErrorKind::Forbidden);
  assert_eq!(
    h.engine.list_users(&Actor::Anonymous).await.unwrap_err().kind(),
    ErrorKind::Unauthenticated
  );
  assert_eq!(h.engine.list_users(&manager_actor).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_request_reset_issues_token_and_mails_link() {
  let h = harness();
  h.user("Wes").await;

  h.engine.request_password_reset("wes@example.com").await.unwrap();

  let token = reset_token_of(&h, "wes@example.com").await.expect("token stored");
  assert_eq!(token.len(), 40);
  let sent = h.mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to, "wes@example.com");
  assert_eq!(sent[0].subject, "Your Password Reset Token");
  assert!(sent[0].html_body.contains(&format!("/reset?resetToken={token}")));
}

#[tokio::test]
#[serial]
async fn test_request_reset_for_unknown_email_is_user_not_found() {
  let h = harness();
  let err = h.engine.request_password_reset("ghost@example.com").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::UserNotFound);
  assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
#[serial]
async fn test_mail_failure_keeps_the_token_valid() {
  let h = harness();
  h.user("Wes").await;
  h.mailer.fail.store(true, Ordering::SeqCst);

  h.engine.request_password_reset("wes@example.com").await.unwrap();
  let token = reset_token_of(&h, "wes@example.com").await.expect("token stored");

  let (user, _) = h.engine.reset_credential(&token, "new-secret", "new-secret").await.unwrap();
  assert_eq!(user.email, "wes@example.com");
}

#[tokio::test]
#[serial]
async fn test_reset_token_works_exactly_once() {
  let h = harness();
  h.user("Wes").await;
  h.engine.request_password_reset("wes@example.com").await.unwrap();
  let token = reset_token_of(&h, "wes@example.com").await.unwrap();

  let (user, session) = h.engine.reset_credential(&token, "new-secret", "new-secret").await.unwrap();
  assert!(user.reset_token.is_none());
  assert!(user.reset_token_expires_at.is_none());
  assert_eq!(h.engine.resolve_actor(Some(&session.token)).await.unwrap().user_id(), Some(user.id));

  let replay = h.engine.reset_credential(&token, "other", "other").await.unwrap_err();
  assert_eq!(replay.kind(), ErrorKind::InvalidOrExpiredToken);

  assert!(h.engine.signin("wes@example.com", "new-secret").await.is_ok());
  assert_eq!(
    h.engine.signin("wes@example.com", PASSWORD).await.unwrap_err().kind(),
    ErrorKind::InvalidCredential
  );
}

#[tokio::test]
#[serial]
async fn test_expired_reset_token_is_rejected() {
  let h = harness();
  let (wes, _) = h.user("Wes").await;
  let patch = UserPatch {
    reset_token: Some(ResetTokenPatch::Set(ResetToken {
      token: "deadbeef".to_string(),
      expires_at: Utc::now() - Duration::seconds(1),
    })),
    ..Default::default()
  };
  h.store.update_users(&UserFilter::by_id(wes.id), &patch).await.unwrap();

  let err = h.engine.reset_credential("deadbeef", "x1", "x1").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidOrExpiredToken);
}

#[tokio::test]
#[serial]
async fn test_mismatched_confirmation_is_checked_first() {
  let h = harness();
  let err = h.engine.reset_credential("whatever", "a", "b").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PasswordMismatch);
}

#[tokio::test]
#[serial]
async fn test_shared_reset_token_is_reported_and_only_one_user_is_reset() {
  let h = harness();
  let (first, _) = h.user("First").await;
  let (second, _) = h.user("Second").await;
  let shared = UserPatch {
    reset_token: Some(ResetTokenPatch::Set(ResetToken {
      token: "cafebabe".to_string(),
      expires_at: Utc::now() + Duration::hours(1),
    })),
    ..Default::default()
  };
  for id in [first.id, second.id] {
    h.store.update_users(&UserFilter::by_id(id), &shared).await.unwrap();
  }

  let (reset, _) = h.engine.reset_credential("cafebabe", "pw", "pw").await.unwrap();
  assert!(reset.id == first.id || reset.id == second.id);

  let anomalies = h.anomalies();
  assert_eq!(anomalies.len(), 1);
  assert!(matches!(&anomalies[0], Anomaly::SharedResetToken { user_ids } if user_ids.len() == 2));

  let other = if reset.id == first.id { second.id } else { first.id };
  let untouched = h.store.get_user(other).await.unwrap().unwrap();
  assert_eq!(untouched.reset_token.as_deref(), Some("cafebabe"));
}
