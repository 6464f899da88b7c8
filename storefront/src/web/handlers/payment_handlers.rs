// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_flow::ContextData;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::{AddCardCtxData, PaymentCtxData};
use crate::pipelines::require_completed;
use crate::services::gateway::CardDetails;
use crate::state::AppState;
use crate::web::{envelope, AuthenticatedUser};

/// Accepts a batch (`order_ids`) or a single `order_id`.
#[derive(Deserialize, Debug)]
pub struct MakePaymentPayload {
  #[serde(default)]
  pub order_ids: Vec<String>,
  pub order_id: Option<String>,
  pub address_id: Uuid,
  pub card_id: String,
}

#[instrument(name = "handler::make_payment", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn make_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<MakePaymentPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let mut order_ids = req.order_ids;
  order_ids.extend(req.order_id);

  let ctx_data = ContextData::new(PaymentCtxData {
    app_state: app_state.get_ref().clone(),
    customer: auth_user.0,
    order_ids,
    address_id: req.address_id,
    card_id: req.card_id,
    orders: Vec::new(),
    shipping_address: None,
    gateway_customer_id: None,
    items_total_cents: 0,
    shipping_fee_cents: 0,
    amount_payable_cents: 0,
    intent: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  let tx_ref = guard.intent.as_ref().map(|i| i.id.clone());
  info!(orders = ?guard.order_ids, amount = guard.amount_payable_cents, "Payment completed.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Payment successful",
    "payment_data": {
      "tx_ref": tx_ref,
      "order_ids": guard.order_ids,
      "amount": guard.items_total_cents,
      "shipping_fees": guard.shipping_fee_cents,
      "amount_paid": guard.amount_payable_cents,
    },
    "status": true,
  })))
}

#[instrument(name = "handler::add_payment_method", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id()))]
pub async fn add_payment_method_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CardDetails>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(AddCardCtxData {
    app_state: app_state.get_ref().clone(),
    user: auth_user.0,
    card: req_payload.into_inner(),
    gateway_customer_id: None,
    method: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let guard = ctx_data.read();
  Ok(HttpResponse::Created().json(envelope("Card added successfully", &guard.method)))
}

/// Lists cards straight from the gateway. Without a gateway customer, or
/// when the gateway cannot be reached, the answer is an empty list.
#[instrument(name = "handler::list_payment_methods", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_payment_methods_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let Some(customer_id) = auth_user.0.gateway_customer_id.as_deref() else {
    return Ok(HttpResponse::Ok().json(json!({ "message": "No payment methods yet", "data": [], "status": false })));
  };

  match app_state.gateway.list_payment_methods(customer_id).await {
    Ok(methods) => Ok(HttpResponse::Ok().json(envelope("Payment methods returned!", methods))),
    Err(e) => {
      warn!(error = %e, "Listing payment methods failed.");
      Ok(HttpResponse::Ok().json(json!({ "message": "Network error!", "data": [], "status": false })))
    }
  }
}
