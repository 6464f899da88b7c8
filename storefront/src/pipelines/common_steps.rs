// storefront/src/pipelines/common_steps.rs

use crate::errors::Result as AppResult;
use crate::pipelines::contexts::SendOtpEmailCtxData;
use crate::services::otp;
use chrono::Utc;
use serde_json::json;
use storefront_flow::{ContextData, PipelineControl};
use tracing::{info, instrument};

/// Issues a fresh one-time code and mails it to the user.
#[instrument(name = "common_step::send_otp_email", skip(ctx_data), err(Display))]
pub async fn send_otp_email_step(ctx_data: ContextData<SendOtpEmailCtxData>) -> AppResult<PipelineControl> {
  let (app_state, user_id, recipient_email, recipient_name) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.user_id, guard.recipient_email.clone(), guard.recipient_name.clone())
  };

  let code = otp::issue(app_state.store.as_ref(), &app_state.config, user_id, Utc::now()).await?;
  let message_id = app_state
    .mailer
    .send(
      "Complete your registration",
      "email/registration.html",
      json!({ "code": code, "name": recipient_name }),
      &[recipient_email],
    )
    .await?;

  info!(%message_id, "Registration code sent.");
  Ok(PipelineControl::Continue)
}
