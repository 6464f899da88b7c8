// storefront/src/web/handlers/tracking_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_flow::ContextData;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::TrackingStatus;
use crate::pipelines::contexts::TrackingUpdateCtxData;
use crate::pipelines::require_completed;
use crate::state::AppState;
use crate::web::handlers::order_handlers::visible_order;
use crate::web::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct UpdateTrackingPayload {
  pub status: TrackingStatus,
}

#[instrument(name = "handler::get_tracking", skip(app_state, path, auth_user), fields(order_id = %path.as_ref()))]
pub async fn get_tracking_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = visible_order(&app_state, &auth_user, &path.into_inner()).await?;
  let tracking = app_state
    .store
    .get_tracking(&order.id)
    .await?
    .ok_or(AppError::TrackingNotFound(order.id))?;
  Ok(HttpResponse::Ok().json(json!({ "data": tracking, "status": true })))
}

#[instrument(name = "handler::update_tracking", skip(app_state, path, req_payload, auth_user), fields(order_id = %path.as_ref(), status = %req_payload.status))]
pub async fn update_tracking_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  req_payload: web::Json<UpdateTrackingPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  if !auth_user.is_staff() {
    return Err(AppError::Forbidden("Only staff can update order tracking".to_string()));
  }

  let ctx_data = ContextData::new(TrackingUpdateCtxData {
    app_state: app_state.get_ref().clone(),
    order_id: path.into_inner(),
    next_status: req_payload.status,
    order: None,
    tracking: None,
  });
  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  Ok(HttpResponse::Ok().json(json!({ "data": guard.tracking, "status": true })))
}
