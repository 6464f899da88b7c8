// tests/account_tests.rs

mod common;

use common::{test_app, TestApp, GOOD_CARD, TEST_PASSWORD};
use serial_test::serial;
use storefront::errors::{AppError, Result as AppResult};
use storefront::models::User;
use storefront::pipelines::contexts::{SigninCtxData, SignupCtxData, VerifyOtpCtxData};
use storefront::pipelines::require_completed;
use storefront::services::auth_service;
use storefront::store::{AccountRepository, NotificationRepository};
use storefront_flow::ContextData;

async fn signup(app: &TestApp, email: &str, password: &str) -> AppResult<User> {
  let ctx = ContextData::new(SignupCtxData {
    app_state: app.state.clone(),
    email: email.to_string(),
    full_name: "Ada Lovelace".to_string(),
    password: password.to_string(),
    created_user: None,
    otp_sent: false,
  });
  require_completed(app.state.flows.run(ctx.clone()).await?)?;
  let user = ctx.read().created_user.clone();
  user.ok_or_else(|| AppError::Internal("no user".to_string()))
}

async fn signin(app: &TestApp, email: &str, password: &str) -> AppResult<String> {
  let ctx = ContextData::new(SigninCtxData {
    app_state: app.state.clone(),
    email: email.to_string(),
    password: password.to_string(),
    user: None,
    session_token: None,
    refresh_token: None,
  });
  require_completed(app.state.flows.run(ctx.clone()).await?)?;
  let token = ctx.read().session_token.clone();
  token.ok_or_else(|| AppError::Internal("no token".to_string()))
}

async fn verify(app: &TestApp, email: &str, code: &str) -> AppResult<()> {
  let ctx = ContextData::new(VerifyOtpCtxData {
    app_state: app.state.clone(),
    email: email.to_string(),
    code: code.to_string(),
    user: None,
  });
  require_completed(app.state.flows.run(ctx).await?)
}

fn last_code(app: &TestApp) -> String {
  let outbox = app.mailer.outbox();
  let mail = outbox.last().expect("an email was sent");
  mail.context["code"].as_str().expect("code in context").to_string()
}

#[tokio::test]
#[serial]
async fn signup_mails_a_code_and_welcomes_the_user() {
  let app = test_app();
  let user = signup(&app, "Ada@Example.com", TEST_PASSWORD).await.unwrap();
  assert_eq!(user.email, "ada@example.com");
  assert!(!user.is_verified);

  let outbox = app.mailer.outbox();
  assert_eq!(outbox.len(), 1);
  assert_eq!(outbox[0].subject, "Complete your registration");
  assert_eq!(outbox[0].template, "email/registration.html");
  assert_eq!(outbox[0].to, vec!["ada@example.com".to_string()]);
  assert_eq!(outbox[0].context["name"], "Ada Lovelace");
  assert_eq!(last_code(&app).len(), 6);

  let notes = app.store.notifications_for(user.id).await.unwrap();
  assert!(notes.iter().any(|n| n.title == "Welcome" && n.desc.contains("Ada Lovelace")));
}

#[tokio::test]
#[serial]
async fn signin_waits_for_email_verification() {
  let app = test_app();
  signup(&app, "ada@example.com", TEST_PASSWORD).await.unwrap();

  let err = signin(&app, "ada@example.com", TEST_PASSWORD).await.unwrap_err();
  assert!(matches!(err, AppError::Forbidden(_)));

  let err = verify(&app, "ada@example.com", "000000x").await.unwrap_err();
  assert!(matches!(err, AppError::Otp(_)));

  verify(&app, "ada@example.com", &last_code(&app)).await.unwrap();
  let token = signin(&app, "ada@example.com", TEST_PASSWORD).await.unwrap();

  let user = app.store.find_user_by_email("ada@example.com").await.unwrap().unwrap();
  assert!(user.is_verified);
  assert_eq!(auth_service::validate_token(&app.state.config, &token).unwrap(), user.id);

  // Codes are single use.
  let err = verify(&app, "ada@example.com", &last_code(&app)).await.unwrap_err();
  assert!(matches!(err, AppError::Otp(_)));
}

#[tokio::test]
#[serial]
async fn wrong_password_and_unknown_email_look_the_same() {
  let app = test_app();
  app.user("ada@example.com", false).await;

  let wrong = signin(&app, "ada@example.com", "not-the-password").await.unwrap_err();
  let unknown = signin(&app, "nobody@example.com", TEST_PASSWORD).await.unwrap_err();
  assert!(matches!(wrong, AppError::Auth(_)));
  assert_eq!(wrong.to_string(), unknown.to_string());

  let err = verify(&app, "nobody@example.com", "123456").await.unwrap_err();
  assert_eq!(err.to_string(), "Invalid otp");
}

#[tokio::test]
#[serial]
async fn signup_rejects_duplicates_and_weak_input() {
  let app = test_app();
  signup(&app, "ada@example.com", TEST_PASSWORD).await.unwrap();

  let err = signup(&app, "ADA@example.com", TEST_PASSWORD).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let err = signup(&app, "grace@example.com", "short").await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let err = signup(&app, "not-an-email", TEST_PASSWORD).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));

  assert_eq!(app.mailer.outbox().len(), 1);
}

#[tokio::test]
#[serial]
async fn the_same_card_cannot_be_saved_twice() {
  let app = test_app();
  let user = app.user("ada@example.com", false).await;

  app.save_card(&user, GOOD_CARD).await.unwrap();
  let err = app.save_card(&user, GOOD_CARD).await.unwrap_err();
  assert_eq!(err.to_string(), "A payment method with the same card details already exists");

  let stored = app.store.get_user(user.id).await.unwrap().unwrap();
  assert!(stored.gateway_customer_id.is_some());
}
