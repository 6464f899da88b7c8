// storefront/src/pipelines/otp_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::VerifyOtpCtxData;
use crate::services::otp;
use crate::state::AppState;
use chrono::Utc;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::info;

/// Registers the email verification pipeline.
pub fn register_verify_otp_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut verify_p = Pipeline::<VerifyOtpCtxData, AppError>::new(&[
    ("find_user_for_otp", false, None),
    ("check_otp_code", false, None),
    ("mark_user_verified", false, None),
  ]);

  verify_p.on_root("find_user_for_otp", |ctx_data: ContextData<VerifyOtpCtxData>| {
    Box::pin(async move {
      let (email, app_state) = {
        let guard = ctx_data.read();
        (guard.email.trim().to_string(), guard.app_state.clone())
      };
      // Unknown emails get the same answer as wrong codes.
      let user = app_state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Otp("Invalid otp".to_string()))?;
      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  verify_p.on_root("check_otp_code", |ctx_data: ContextData<VerifyOtpCtxData>| {
    Box::pin(async move {
      let (user_id, code, app_state) = {
        let guard = ctx_data.read();
        let user_id = guard.user.as_ref().map(|u| u.id);
        (user_id, guard.code.clone(), guard.app_state.clone())
      };
      let user_id = user_id.ok_or_else(|| AppError::Internal("User missing before OTP check".to_string()))?;
      otp::verify(app_state.store.as_ref(), &app_state.config, user_id, &code, Utc::now()).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  verify_p.on_root("mark_user_verified", |ctx_data: ContextData<VerifyOtpCtxData>| {
    Box::pin(async move {
      let (user, app_state) = {
        let guard = ctx_data.read();
        (guard.user.clone(), guard.app_state.clone())
      };
      let mut user = user.ok_or_else(|| AppError::Internal("User missing before verification".to_string()))?;
      if !user.is_verified {
        user.is_verified = true;
        app_state.store.update_user(&user).await?;
        info!(user_id = %user.id, "Email verified.");
      }
      // Verified accounts have no further use for a code.
      app_state.store.clear_otp(user.id).await?;
      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(verify_p);
  info!("OTP verification pipeline registered.");
}
