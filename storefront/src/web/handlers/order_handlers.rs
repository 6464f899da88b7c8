// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use storefront_flow::ContextData;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Order;
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::pipelines::require_completed;
use crate::state::AppState;
use crate::web::{envelope, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct PlaceOrderRequestPayload {
  pub cart_id: Uuid,
}

/// Owners see their own orders and staff see every order; anyone else is
/// told the order does not exist.
pub(crate) async fn visible_order(app_state: &AppState, auth_user: &AuthenticatedUser, order_id: &str) -> Result<Order, AppError> {
  match app_state.store.get_order(order_id).await? {
    Some(order) if auth_user.is_staff() || order.customer_id == auth_user.id() => Ok(order),
    _ => Err(AppError::OrderNotFound(order_id.to_string())),
  }
}

#[instrument(name = "handler::place_order", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.id(), cart_id = %req_payload.cart_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PlaceOrderRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(PlaceOrderCtxData {
    app_state: app_state.get_ref().clone(),
    customer_id: auth_user.id(),
    cart_id: req_payload.cart_id,
    cart: None,
    lines: Vec::new(),
    order: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let order = ctx_data
    .read()
    .order
    .clone()
    .ok_or_else(|| AppError::Internal("Order pipeline completed without an order.".to_string()))?;
  info!(order_id = %order.id, "Order placed.");
  Ok(HttpResponse::Created().json(envelope("Order created", order)))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let scope = if auth_user.is_staff() { None } else { Some(auth_user.id()) };
  let orders = app_state.store.list_orders(scope).await?;
  Ok(HttpResponse::Ok().json(envelope("Orders fetched", orders)))
}

#[instrument(name = "handler::get_order", skip(app_state, path, auth_user), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = visible_order(&app_state, &auth_user, &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(envelope("Order fetched", order)))
}
