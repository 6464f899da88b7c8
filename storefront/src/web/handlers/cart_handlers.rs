// storefront/src/web/handlers/cart_handlers.rs

//! Carts are anonymous: whoever holds the id can use it.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storefront_flow::ContextData;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Cart;
use crate::pipelines::contexts::{AddToCartCtxData, UpdateCartItemCtxData};
use crate::pipelines::require_completed;
use crate::services::inventory;
use crate::state::AppState;
use crate::web::envelope;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: i32,
  pub color: Option<String>,
  pub size: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartItemPayload {
  pub quantity: i32,
}

#[derive(Serialize, Debug)]
pub struct CartLineView {
  pub id: Uuid,
  pub product_id: Uuid,
  pub product_title: String,
  pub color: Option<String>,
  pub size: Option<String>,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub total_price_cents: i64,
}

#[derive(Serialize, Debug)]
pub struct CartView {
  pub id: Uuid,
  pub items: Vec<CartLineView>,
  pub total_price_cents: i64,
}

/// Prices every line at today's price, variant surcharges included.
async fn price_cart(app_state: &AppState, cart: Cart) -> Result<CartView, AppError> {
  let mut items = Vec::with_capacity(cart.items.len());
  for item in cart.items {
    let product = app_state
      .store
      .get_product(item.product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", item.product_id)))?;
    let resolution =
      inventory::resolve_selection(app_state.store.as_ref(), &product, item.color.as_deref(), item.size.as_deref()).await?;
    items.push(CartLineView {
      id: item.id,
      product_id: product.id,
      product_title: product.title,
      color: item.color,
      size: item.size,
      quantity: item.quantity,
      unit_price_cents: resolution.unit_price_cents,
      total_price_cents: resolution.unit_price_cents * i64::from(item.quantity),
    });
  }
  let total_price_cents = items.iter().map(|l| l.total_price_cents).sum();
  Ok(CartView {
    id: cart.id,
    items,
    total_price_cents,
  })
}

async fn load_cart(app_state: &AppState, cart_id: Uuid) -> Result<Cart, AppError> {
  app_state
    .store
    .get_cart(cart_id)
    .await?
    .ok_or_else(|| AppError::NotFound("No cart with the given ID was found.".to_string()))
}

#[instrument(name = "handler::create_cart", skip(app_state))]
pub async fn create_cart_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let cart = app_state.store.create_cart().await?;
  info!(cart_id = %cart.id, "Cart created.");
  Ok(HttpResponse::Created().json(envelope("Cart created", price_cart(&app_state, cart).await?)))
}

#[instrument(name = "handler::get_cart", skip(app_state, path), fields(cart_id = %path.as_ref()))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let cart = load_cart(&app_state, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(envelope("Cart fetched", price_cart(&app_state, cart).await?)))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, path, req_payload),
  fields(cart_id = %path.as_ref(), product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = ContextData::new(AddToCartCtxData {
    app_state: app_state.get_ref().clone(),
    cart_id: path.into_inner(),
    product_id: req.product_id,
    quantity: req.quantity,
    color: req.color,
    size: req.size,
    product: None,
    cart: None,
    cart_item: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let item = ctx_data
    .read()
    .cart_item
    .clone()
    .ok_or_else(|| AppError::Internal("Add to cart completed without a cart line.".to_string()))?;
  Ok(HttpResponse::Created().json(envelope("Item added to cart", item)))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, path, req_payload))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, Uuid)>,
  req_payload: web::Json<UpdateCartItemPayload>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  let ctx_data = ContextData::new(UpdateCartItemCtxData {
    app_state: app_state.get_ref().clone(),
    cart_id,
    item_id,
    quantity: req_payload.quantity,
    line: None,
    product: None,
    cart_item: None,
  });

  require_completed(app_state.flows.run(ctx_data.clone()).await?)?;

  let item = ctx_data
    .read()
    .cart_item
    .clone()
    .ok_or_else(|| AppError::Internal("Cart update completed without a cart line.".to_string()))?;
  Ok(HttpResponse::Ok().json(envelope("Cart item updated", item)))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, path))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  if !app_state.store.remove_cart_item(cart_id, item_id).await? {
    return Err(AppError::NotFound("No cart item with the given ID was found.".to_string()));
  }
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::delete_cart", skip(app_state, path))]
pub async fn delete_cart_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_cart(path.into_inner()).await? {
    return Err(AppError::NotFound("No cart with the given ID was found.".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Cart deleted", "status": true })))
}
