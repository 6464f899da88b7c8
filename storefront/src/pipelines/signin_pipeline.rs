// storefront/src/pipelines/signin_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use crate::state::AppState;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registers the sign-in pipeline.
pub fn register_signin_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut signin_p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user_by_email_signin", false, None),
    ("verify_user_password_signin", false, None),
    ("check_account_state_signin", false, None),
    ("issue_session_token_signin", false, None),
  ]);

  signin_p.on_root("validate_signin_input", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (email, password_is_empty) = {
        let guard = ctx_data.read();
        (guard.email.trim().to_string(), guard.password.is_empty())
      };

      if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Valid email is required.".to_string()));
      }
      if password_is_empty {
        return Err(AppError::Validation("Password is required.".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signin_p.on_root("fetch_user_by_email_signin", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (email, app_state) = {
        let guard = ctx_data.read();
        (guard.email.trim().to_string(), guard.app_state.clone())
      };

      event!(Level::DEBUG, %email, "Fetching user by email for signin.");
      match app_state.store.find_user_by_email(&email).await? {
        Some(user) => {
          ctx_data.write().user = Some(user);
          Ok(PipelineControl::Continue)
        }
        None => {
          warn!(%email, "Signin for unknown email.");
          Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
        }
      }
    })
  });

  signin_p.on_root("verify_user_password_signin", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let user = guard
        .user
        .as_ref()
        .ok_or_else(|| AppError::Internal("User missing before password check".to_string()))?;
      if !auth_service::verify_password(&user.password_hash, &guard.password)? {
        warn!(user_id = %user.id, "Password mismatch on signin.");
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signin_p.on_root("check_account_state_signin", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let user = guard
        .user
        .as_ref()
        .ok_or_else(|| AppError::Internal("User missing before account check".to_string()))?;
      if !user.is_active {
        return Err(AppError::Forbidden("This account has been deactivated".to_string()));
      }
      if !user.is_verified {
        return Err(AppError::Forbidden("Verify your email before signing in".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signin_p.on_root("issue_session_token_signin", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (token, refresh) = {
        let guard = ctx_data.read();
        let user = guard
          .user
          .as_ref()
          .ok_or_else(|| AppError::Internal("User missing before token issue".to_string()))?;
        let config = &guard.app_state.config;
        (
          auth_service::issue_token(config, user.id, &user.email)?,
          auth_service::issue_refresh_token(config, user.id, &user.email)?,
        )
      };
      let mut guard = ctx_data.write();
      guard.session_token = Some(token);
      guard.refresh_token = Some(refresh);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(signin_p);
  info!("Sign-in pipeline registered.");
}
