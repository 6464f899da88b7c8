// storefront/src/pipelines/payment_pipeline.rs

//! Pays one or more pending orders with a saved card in a single charge.
//!
//! The batch is all-or-nothing: one gateway call covers every order plus a
//! single shipping fee, and every order ends up `complete` or `failed`
//! together. The orders are claimed (`processing`) before the charge so a
//! concurrent run for any of them fails instead of charging twice. Stock
//! was reserved when the orders were placed and is not touched here.

use crate::errors::{AppError, Result as AppResult};
use crate::events::DomainEvent;
use crate::models::PaymentStatus;
use crate::pipelines::contexts::PaymentCtxData;
use crate::services::gateway::IntentStatus;
use crate::state::AppState;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{error, info, instrument, warn};

/// Registers the payment pipeline.
pub fn register_payment_pipeline(flows: &FlowRegistry<AppError>, _app_state: &AppState) {
  let mut payment_p = Pipeline::<PaymentCtxData, AppError>::new(&[
    ("validate_payment_request", false, None),
    ("load_orders_for_payment", false, None),
    ("resolve_shipping_address", false, None),
    ("resolve_payment_method", false, None),
    ("attach_shipping_address", false, None),
    ("compute_amount_payable", false, None),
    ("claim_orders_for_payment", false, None),
    ("charge_payment_gateway", false, None),
    ("settle_paid_orders", false, None),
    ("notify_payment_success", true, None),
  ]);

  payment_p.on_root("validate_payment_request", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let mut unique: Vec<String> = Vec::with_capacity(guard.order_ids.len());
      for id in guard.order_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !unique.iter().any(|seen| seen == id) {
          unique.push(id.to_string());
        }
      }
      if unique.is_empty() {
        return Err(AppError::Validation("At least one order id is required".to_string()));
      }
      if guard.card_id.trim().is_empty() {
        return Err(AppError::Validation("A card id is required".to_string()));
      }
      guard.order_ids = unique;
      Ok(PipelineControl::Continue)
    })
  });

  payment_p.on_root("load_orders_for_payment", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move { load_orders_for_payment(ctx_data).await })
  });

  payment_p.on_root("resolve_shipping_address", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (customer_id, address_id, app_state) = {
        let guard = ctx_data.read();
        (guard.customer.id, guard.address_id, guard.app_state.clone())
      };
      let address = app_state
        .store
        .get_address(customer_id, address_id)
        .await?
        .ok_or(AppError::AddressNotFound(address_id))?;
      ctx_data.write().shipping_address = Some(address);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  payment_p.on_root("resolve_payment_method", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (customer_id, card_id, app_state) = {
        let guard = ctx_data.read();
        (guard.customer.id, guard.card_id.clone(), guard.app_state.clone())
      };

      let saved = app_state.store.find_payment_method(customer_id, &card_id).await?;
      // The token user may predate its gateway customer; read it fresh.
      let gateway_customer_id = app_state
        .store
        .get_user(customer_id)
        .await?
        .and_then(|u| u.gateway_customer_id);
      let gateway_customer_id = match (saved, gateway_customer_id) {
        (Some(_), Some(cus)) => cus,
        _ => {
          warn!(%card_id, "Payment method is not saved for this customer.");
          return Err(AppError::PaymentMethodNotFound(card_id));
        }
      };
      ctx_data.write().gateway_customer_id = Some(gateway_customer_id);
      Ok(PipelineControl::Continue)
    })
  });

  payment_p.on_root("attach_shipping_address", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (order_ids, address, app_state) = {
        let guard = ctx_data.read();
        (guard.order_ids.clone(), guard.shipping_address.clone(), guard.app_state.clone())
      };
      let snapshot = address
        .ok_or_else(|| AppError::Internal("Address missing before attaching it".to_string()))?
        .snapshot();

      app_state.store.set_shipping_address(&order_ids, &snapshot).await?;
      let mut guard = ctx_data.write();
      for order in guard.orders.iter_mut() {
        order.shipping_address = Some(snapshot.clone());
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  payment_p.on_root("compute_amount_payable", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let items_total: i64 = guard.orders.iter().map(|o| o.items_total_cents()).sum();
      let fee = guard.app_state.config.shipping_fee_cents;
      guard.items_total_cents = items_total;
      guard.shipping_fee_cents = fee;
      guard.amount_payable_cents = items_total + fee;
      info!(items_total, fee, amount_payable = items_total + fee, "Amount payable computed.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  payment_p.on_root("claim_orders_for_payment", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (order_ids, app_state) = {
        let guard = ctx_data.read();
        (guard.order_ids.clone(), guard.app_state.clone())
      };
      app_state.store.claim_for_payment(&order_ids).await?;
      let mut guard = ctx_data.write();
      for order in guard.orders.iter_mut() {
        order.payment_status = PaymentStatus::Processing;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  payment_p.on_root("charge_payment_gateway", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move { charge_payment_gateway(ctx_data).await })
  });

  payment_p.on_root("settle_paid_orders", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (order_ids, app_state) = {
        let guard = ctx_data.read();
        (guard.order_ids.clone(), guard.app_state.clone())
      };
      app_state.store.set_payment_status(&order_ids, PaymentStatus::Complete).await?;
      let mut guard = ctx_data.write();
      for order in guard.orders.iter_mut() {
        order.payment_status = PaymentStatus::Complete;
      }
      info!(orders = ?order_ids, "Orders marked complete.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  payment_p.on_root("notify_payment_success", |ctx_data: ContextData<PaymentCtxData>| {
    Box::pin(async move {
      let (event, app_state) = {
        let guard = ctx_data.read();
        let mut product_titles: Vec<String> = Vec::new();
        for item in guard.orders.iter().flat_map(|o| o.items.iter()) {
          if !product_titles.contains(&item.product_title) {
            product_titles.push(item.product_title.clone());
          }
        }
        (
          DomainEvent::PaymentCompleted {
            customer_id: guard.customer.id,
            order_ids: guard.order_ids.clone(),
            product_titles,
            amount_cents: guard.amount_payable_cents,
          },
          guard.app_state.clone(),
        )
      };
      let published = app_state.events.publish(event).await.map(|_| PipelineControl::Continue);
      super::tolerate_failure("notify_payment_success", published)
    })
  });

  flows.register_pipeline(payment_p);
  info!("Payment pipeline registered.");
}

/// Every id must name one of the caller's orders, and none may be paid.
#[instrument(name = "payment_pipeline::load_orders", skip(ctx_data), err(Display))]
async fn load_orders_for_payment(ctx_data: ContextData<PaymentCtxData>) -> AppResult<PipelineControl> {
  let (customer_id, order_ids, app_state) = {
    let guard = ctx_data.read();
    (guard.customer.id, guard.order_ids.clone(), guard.app_state.clone())
  };

  let mut found = app_state.store.find_customer_orders(customer_id, &order_ids).await?;
  let mut orders = Vec::with_capacity(order_ids.len());
  for id in &order_ids {
    let pos = found
      .iter()
      .position(|o| &o.id == id)
      .ok_or_else(|| AppError::OrderNotFound(id.clone()))?;
    orders.push(found.swap_remove(pos));
  }
  if let Some(paid) = orders.iter().find(|o| o.is_paid()) {
    warn!(order_id = %paid.id, "Payment attempted on a paid order.");
    return Err(AppError::AlreadyPaid(paid.id.clone()));
  }
  if let Some(busy) = orders.iter().find(|o| o.payment_status == PaymentStatus::Processing) {
    warn!(order_id = %busy.id, "Payment attempted while another is in progress.");
    return Err(AppError::PaymentInProgress(busy.id.clone()));
  }

  ctx_data.write().orders = orders;
  Ok(PipelineControl::Continue)
}

/// One charge for the whole batch. Any outcome other than success marks
/// every order in the batch `failed`.
#[instrument(name = "payment_pipeline::charge", skip(ctx_data), err(Display))]
async fn charge_payment_gateway(ctx_data: ContextData<PaymentCtxData>) -> AppResult<PipelineControl> {
  let (amount, customer, card_id, order_ids, app_state) = {
    let guard = ctx_data.read();
    (
      guard.amount_payable_cents,
      guard.gateway_customer_id.clone(),
      guard.card_id.clone(),
      guard.order_ids.clone(),
      guard.app_state.clone(),
    )
  };
  let customer = customer.ok_or_else(|| AppError::Internal("Gateway customer missing before charge".to_string()))?;

  let outcome = app_state
    .gateway
    .create_payment_intent(amount, &app_state.config.currency, &customer, &card_id)
    .await;

  let failure = match outcome {
    Ok(intent) if intent.status == IntentStatus::Succeeded => {
      info!(intent_id = %intent.id, amount, "Charge succeeded.");
      ctx_data.write().intent = Some(intent);
      return Ok(PipelineControl::Continue);
    }
    Ok(intent) => {
      warn!(intent_id = %intent.id, "Charge declined.");
      AppError::PaymentDeclined("Payment failed".to_string())
    }
    Err(e) => {
      warn!(error = %e, "Gateway rejected the charge.");
      e
    }
  };

  if let Err(mark_err) = app_state.store.set_payment_status(&order_ids, PaymentStatus::Failed).await {
    error!(error = %mark_err, orders = ?order_ids, "Could not mark orders failed after a failed charge.");
  }
  let mut guard = ctx_data.write();
  for order in guard.orders.iter_mut() {
    order.payment_status = PaymentStatus::Failed;
  }
  Err(failure)
}
