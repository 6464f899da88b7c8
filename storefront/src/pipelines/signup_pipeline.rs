// storefront/src/pipelines/signup_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::events::DomainEvent;
use crate::models::User;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{SendOtpEmailCtxData, SignupCtxData};
use crate::services::auth_service;
use crate::state::AppState;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Registers the sign-up pipeline.
pub fn register_signup_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut signup_p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("check_existing_user_signup", false, None),
    ("create_user_record", false, None),
    ("send_registration_otp", true, None),
    ("publish_user_registered", true, None),
  ]);

  signup_p.on_root("validate_signup_input", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (email, full_name, password_len) = {
        let guard = ctx_data.read();
        (guard.email.trim().to_string(), guard.full_name.trim().to_string(), guard.password.len())
      };

      event!(Level::DEBUG, %email, "Validating signup input.");
      if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Valid email is required.".to_string()));
      }
      if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required.".to_string()));
      }
      if password_len < MIN_PASSWORD_LEN {
        warn!(password_len, "Password too short for signup.");
        return Err(AppError::Validation(format!(
          "Password must be at least {} characters long.",
          MIN_PASSWORD_LEN
        )));
      }

      let mut guard = ctx_data.write();
      guard.email = email;
      guard.full_name = full_name;
      Ok(PipelineControl::Continue)
    })
  });

  signup_p.on_root("check_existing_user_signup", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (email, app_state) = {
        let guard = ctx_data.read();
        (guard.email.clone(), guard.app_state.clone())
      };

      if app_state.store.find_user_by_email(&email).await?.is_some() {
        warn!(%email, "Attempt to signup with existing email.");
        return Err(AppError::Validation("An account with this email already exists.".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signup_p.on_root("create_user_record", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (email, full_name, password, app_state) = {
        let guard = ctx_data.read();
        (guard.email.clone(), guard.full_name.clone(), guard.password.clone(), guard.app_state.clone())
      };

      let password_hash = auth_service::hash_password(&password)?;
      let user = User::new(&email, &full_name, password_hash);
      app_state.store.insert_user(&user).await?;
      info!(user_id = %user.id, "User created.");

      ctx_data.write().created_user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Optional: the account exists either way and a code can be re-requested.
  signup_p.on_root("send_registration_otp", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let otp_ctx = {
        let guard = ctx_data.read();
        let user = guard
          .created_user
          .as_ref()
          .ok_or_else(|| AppError::Internal("User missing before OTP delivery".to_string()))?;
        SendOtpEmailCtxData {
          app_state: guard.app_state.clone(),
          user_id: user.id,
          recipient_email: user.email.clone(),
          recipient_name: user.full_name.clone(),
        }
      };

      match common_steps::send_otp_email_step(ContextData::new(otp_ctx)).await {
        Ok(control) => {
          ctx_data.write().otp_sent = true;
          Ok(control)
        }
        Err(e) => {
          warn!(error = %e, "Registration code could not be sent; continuing.");
          Ok::<_, AppError>(PipelineControl::Continue)
        }
      }
    })
  });

  signup_p.on_root("publish_user_registered", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move { super::tolerate_failure("publish_user_registered", publish_user_registered(ctx_data).await) })
  });

  flows.register_pipeline(signup_p);
  info!("Sign-up pipeline registered.");
}

async fn publish_user_registered(ctx_data: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (app_state, user) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.created_user.clone())
  };
  let Some(user) = user else {
    return Ok(PipelineControl::Continue);
  };

  app_state
    .events
    .publish(DomainEvent::UserRegistered {
      user_id: user.id,
      email: user.email,
      full_name: user.full_name,
    })
    .await?;
  Ok(PipelineControl::Continue)
}
