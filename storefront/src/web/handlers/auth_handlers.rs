// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_flow::ContextData;
use tracing::{debug, info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{SendOtpEmailCtxData, SigninCtxData, SignupCtxData, VerifyOtpCtxData};
use crate::pipelines::require_completed;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::envelope;

#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub full_name: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct OtpRequestPayload {
  pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshTokenPayload {
  pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
pub struct OtpVerifyPayload {
  pub email: String,
  pub code: String,
}

#[instrument(name = "handler::signup", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = ContextData::new(SignupCtxData {
    app_state: app_state.get_ref().clone(),
    email: req.email,
    full_name: req.full_name,
    password: req.password,
    created_user: None,
    otp_sent: false,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  let user = guard
    .created_user
    .as_ref()
    .ok_or_else(|| AppError::Internal("Signup completed without creating a user.".to_string()))?;
  info!(user_id = %user.id, otp_sent = guard.otp_sent, "Signup successful.");

  Ok(HttpResponse::Created().json(envelope("Registered successfully. Check email for OTP", user)))
}

#[instrument(name = "handler::signin", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = ContextData::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    email: req.email,
    password: req.password,
    user: None,
    session_token: None,
    refresh_token: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  let (user, token, refresh) = match (guard.user.as_ref(), guard.session_token.as_ref(), guard.refresh_token.as_ref()) {
    (Some(user), Some(token), Some(refresh)) => (user, token, refresh),
    _ => {
      warn!("Signin pipeline completed without a session.");
      return Err(AppError::Auth("Authentication process was unexpectedly halted.".to_string()));
    }
  };

  Ok(HttpResponse::Ok().json(envelope(
    "Signin successful.",
    json!({ "token": token, "refresh_token": refresh, "token_type": "Bearer", "user": user }),
  )))
}

/// Trades a refresh token for a new access token. The account must still be
/// active and verified.
#[instrument(name = "handler::refresh_token", skip(app_state, req_payload))]
pub async fn refresh_token_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RefreshTokenPayload>,
) -> Result<HttpResponse, AppError> {
  let config = &app_state.config;
  let user_id = auth_service::validate_refresh_token(config, req_payload.refresh_token.trim())?;
  let user = app_state
    .store
    .get_user(user_id)
    .await?
    .ok_or_else(|| AppError::Auth("User not found".to_string()))?;
  if !user.is_active || !user.is_verified {
    warn!(%user_id, "Refresh attempted for an inactive or unverified account.");
    return Err(AppError::Auth("Account is not active, contact the admin".to_string()));
  }

  let token = auth_service::issue_token(config, user.id, &user.email)?;
  info!(%user_id, "Access token refreshed.");
  Ok(HttpResponse::Ok().json(envelope("Token refreshed", json!({ "token": token, "token_type": "Bearer" }))))
}

/// Sends a fresh verification code to an unverified account. The reply is
/// the same whether or not the email names such an account.
#[instrument(name = "handler::request_otp", skip(app_state, req_payload))]
pub async fn request_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OtpRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let user = app_state.store.find_user_by_email(req_payload.email.trim()).await?;
  match user {
    Some(user) if !user.is_verified => {
      let otp_ctx = ContextData::new(SendOtpEmailCtxData {
        app_state: app_state.get_ref().clone(),
        user_id: user.id,
        recipient_email: user.email.clone(),
        recipient_name: user.full_name.clone(),
      });
      if let Err(e) = common_steps::send_otp_email_step(otp_ctx).await {
        warn!(user_id = %user.id, error = %e, "Could not send a requested otp.");
      }
    }
    _ => debug!("Otp requested for an unknown or verified email; nothing sent."),
  }

  Ok(HttpResponse::Ok().json(json!({
    "message": "If that email belongs to an unverified account, a new otp has been sent to it",
    "status": true
  })))
}

#[instrument(name = "handler::verify_otp", skip(app_state, req_payload))]
pub async fn verify_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OtpVerifyPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = ContextData::new(VerifyOtpCtxData {
    app_state: app_state.get_ref().clone(),
    email: req.email,
    code: req.code,
    user: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  Ok(HttpResponse::Ok().json(envelope("Account verified successfully", &guard.user)))
}
