// storefront/src/pipelines/mod.rs

//! Defines and registers every pipeline the storefront runs.

use crate::errors::{AppError, Result as AppResult};
use crate::state::AppState;
use storefront_flow::{FlowRegistry, PipelineControl, PipelineResult};
use tracing::warn;

pub mod common_steps;
pub mod contexts;

pub mod card_pipeline;
pub mod cart_pipeline;
pub mod order_pipeline;
pub mod otp_pipeline;
pub mod payment_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;
pub mod tracking_pipeline;

/// Registers all pipelines. Called once from `AppState::build`.
pub fn register_all_pipelines(flows: &FlowRegistry<AppError>, app_state: &AppState) {
  tracing::info!("Registering pipelines...");

  signup_pipeline::register_signup_pipeline(flows, app_state);
  signin_pipeline::register_signin_pipeline(flows, app_state);
  otp_pipeline::register_verify_otp_pipeline(flows, app_state);
  cart_pipeline::register_add_to_cart_pipeline(flows, app_state);
  cart_pipeline::register_update_cart_item_pipeline(flows, app_state);
  order_pipeline::register_place_order_pipeline(flows, app_state);
  payment_pipeline::register_payment_pipeline(flows, app_state);
  tracking_pipeline::register_tracking_update_pipeline(flows, app_state);
  card_pipeline::register_add_card_pipeline(flows, app_state);

  tracing::info!(pipelines = flows.len(), "All application pipelines registered.");
}

/// Follow-up steps after a commit: a failure is logged and the run goes on.
pub(crate) fn tolerate_failure(step_name: &str, result: AppResult<PipelineControl>) -> AppResult<PipelineControl> {
  match result {
    Ok(control) => Ok(control),
    Err(e) => {
      warn!(%step_name, error = %e, "Follow-up step failed; the committed work stands.");
      Ok(PipelineControl::Continue)
    }
  }
}

/// Maps a run that stopped early to `PipelineHaltedByHandler`.
pub fn require_completed(result: PipelineResult) -> AppResult<()> {
  if result.is_completed() {
    Ok(())
  } else {
    Err(AppError::PipelineHaltedByHandler)
  }
}
