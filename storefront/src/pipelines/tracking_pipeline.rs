// storefront/src/pipelines/tracking_pipeline.rs

use crate::errors::AppError;
use crate::events::DomainEvent;
use crate::models::TrackingStatus;
use crate::pipelines::contexts::TrackingUpdateCtxData;
use crate::state::AppState;
use chrono::Utc;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::info;

/// Registers the staff-side tracking update pipeline.
pub fn register_tracking_update_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let not_delivered: SkipCondition<TrackingUpdateCtxData> =
    Arc::new(|ctx_data: ContextData<TrackingUpdateCtxData>| ctx_data.read().next_status != TrackingStatus::Delivered);

  let mut tracking_p = Pipeline::<TrackingUpdateCtxData, AppError>::new(&[
    ("load_order_for_tracking", false, None),
    ("load_tracking_record", false, None),
    ("apply_tracking_transition", false, None),
    ("publish_delivery", true, Some(not_delivered)),
  ]);

  tracking_p.on_root("load_order_for_tracking", |ctx_data: ContextData<TrackingUpdateCtxData>| {
    Box::pin(async move {
      let (order_id, app_state) = {
        let guard = ctx_data.read();
        (guard.order_id.clone(), guard.app_state.clone())
      };
      let order = app_state
        .store
        .get_order(&order_id)
        .await?
        .ok_or(AppError::OrderNotFound(order_id))?;
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  tracking_p.on_root("load_tracking_record", |ctx_data: ContextData<TrackingUpdateCtxData>| {
    Box::pin(async move {
      let (order_id, app_state) = {
        let guard = ctx_data.read();
        (guard.order_id.clone(), guard.app_state.clone())
      };
      let tracking = app_state
        .store
        .get_tracking(&order_id)
        .await?
        .ok_or(AppError::TrackingNotFound(order_id))?;
      ctx_data.write().tracking = Some(tracking);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  tracking_p.on_root("apply_tracking_transition", |ctx_data: ContextData<TrackingUpdateCtxData>| {
    Box::pin(async move {
      let (tracking, next_status, app_state) = {
        let guard = ctx_data.read();
        (guard.tracking.clone(), guard.next_status, guard.app_state.clone())
      };
      let mut tracking = tracking.ok_or_else(|| AppError::Internal("Tracking missing before transition".to_string()))?;
      let from = tracking.status;
      tracking.advance(next_status, Utc::now())?;
      app_state.store.save_tracking(&tracking).await?;

      info!(order_id = %tracking.order_id, %from, to = %next_status, "Tracking advanced.");
      ctx_data.write().tracking = Some(tracking);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  tracking_p.on_root("publish_delivery", |ctx_data: ContextData<TrackingUpdateCtxData>| {
    Box::pin(async move {
      let (order, app_state) = {
        let guard = ctx_data.read();
        (guard.order.clone(), guard.app_state.clone())
      };
      let Some(order) = order else {
        return Ok(PipelineControl::Continue);
      };
      let published = app_state
        .events
        .publish(DomainEvent::OrderDelivered {
          order_id: order.id,
          customer_id: order.customer_id,
        })
        .await
        .map(|_| PipelineControl::Continue);
      super::tolerate_failure("publish_delivery", published)
    })
  });

  flows.register_pipeline(tracking_p);
  info!("Tracking update pipeline registered.");
}
