// storefront/src/pipelines/order_pipeline.rs

//! Cart -> order conversion. Stock is checked and reserved here, once.

use crate::errors::{AppError, Result as AppResult};
use crate::events::DomainEvent;
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::services::inventory;
use crate::state::AppState;
use crate::store::{OrderPlacement, PlacementLine};
use chrono::Utc;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{event, info, instrument, Level};

/// Registers the place-order pipeline.
pub fn register_place_order_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut order_p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    ("load_cart_for_order", false, None),
    ("resolve_order_lines", false, None),
    ("reserve_and_place_order", false, None),
    ("publish_order_created", true, None),
  ]);

  order_p.on_root("load_cart_for_order", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (cart_id, app_state) = {
        let guard = ctx_data.read();
        (guard.cart_id, guard.app_state.clone())
      };

      let cart = app_state
        .store
        .get_cart(cart_id)
        .await?
        .ok_or_else(|| AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()))?;
      if cart.items.is_empty() {
        return Err(AppError::EmptyOrMissingCart("The cart is empty.".to_string()));
      }

      event!(Level::DEBUG, %cart_id, lines = cart.items.len(), "Cart loaded for order.");
      ctx_data.write().cart = Some(cart);
      Ok(PipelineControl::Continue)
    })
  });

  order_p.on_root("resolve_order_lines", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move { resolve_order_lines(ctx_data).await })
  });

  order_p.on_root("reserve_and_place_order", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (placement, app_state) = {
        let guard = ctx_data.read();
        (
          OrderPlacement {
            cart_id: guard.cart_id,
            customer_id: guard.customer_id,
            placed_at: Utc::now(),
            lines: guard.lines.clone(),
          },
          guard.app_state.clone(),
        )
      };

      let order = app_state.store.place_order(&placement, app_state.order_ids.as_ref()).await?;
      info!(order_id = %order.id, total_cents = order.items_total_cents(), "Order created from cart.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  order_p.on_root("publish_order_created", |ctx_data: ContextData<PlaceOrderCtxData>| {
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
        .publish(DomainEvent::OrderCreated {
          order_id: order.id.clone(),
          customer_id: order.customer_id,
          placed_at: order.placed_at,
        })
        .await
        .map(|_| PipelineControl::Continue);
      super::tolerate_failure("publish_order_created", published)
    })
  });

  flows.register_pipeline(order_p);
  info!("Place-order pipeline registered.");
}

/// Prices every cart line and records which stock rows it draws from.
#[instrument(name = "order_pipeline::resolve_order_lines", skip(ctx_data), err(Display))]
async fn resolve_order_lines(ctx_data: ContextData<PlaceOrderCtxData>) -> AppResult<PipelineControl> {
  let (cart, app_state) = {
    let guard = ctx_data.read();
    (guard.cart.clone(), guard.app_state.clone())
  };
  let cart = cart.ok_or_else(|| AppError::Internal("Cart missing before line resolution".to_string()))?;

  let mut lines = Vec::with_capacity(cart.items.len());
  for item in &cart.items {
    let product = app_state
      .store
      .get_product(item.product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Product {} no longer exists", item.product_id)))?;
    let resolution =
      inventory::resolve_selection(app_state.store.as_ref(), &product, item.color.as_deref(), item.size.as_deref()).await?;

    lines.push(PlacementLine {
      product_id: product.id,
      product_title: product.title.clone(),
      quantity: item.quantity,
      unit_price_cents: resolution.unit_price_cents,
      color: item.color.clone(),
      size: item.size.clone(),
      variant_ids: resolution.variant_ids(),
    });
  }

  ctx_data.write().lines = lines;
  Ok(PipelineControl::Continue)
}
