// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `storefront_flow::ContextData`; fields left `None` are filled in by steps.

use crate::models::{Cart, CartItem, Order, OrderTracking, Product, ShippingAddress, TrackingStatus, User};
use crate::services::gateway::{CardDetails, GatewayPaymentMethod, PaymentIntent};
use crate::state::AppState;
use crate::store::PlacementLine;
use uuid::Uuid;

// --- Accounts ---

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub email: String,
  pub full_name: String,
  pub password: String,
  pub created_user: Option<User>,
  pub otp_sent: bool,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user: Option<User>,
  pub session_token: Option<String>,
  pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct VerifyOtpCtxData {
  pub app_state: AppState,
  pub email: String,
  pub code: String,
  pub user: Option<User>,
}

// --- Cart ---

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub color: Option<String>,
  pub size: Option<String>,
  pub product: Option<Product>,
  pub cart: Option<Cart>,
  pub cart_item: Option<CartItem>,
}

#[derive(Clone)]
pub struct UpdateCartItemCtxData {
  pub app_state: AppState,
  pub cart_id: Uuid,
  pub item_id: Uuid,
  pub quantity: i32,
  pub line: Option<CartItem>,
  pub product: Option<Product>,
  pub cart_item: Option<CartItem>,
}

// --- Orders ---

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub customer_id: Uuid,
  pub cart_id: Uuid,
  pub cart: Option<Cart>,
  pub lines: Vec<PlacementLine>,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct PaymentCtxData {
  pub app_state: AppState,
  pub customer: User,
  pub order_ids: Vec<String>,
  pub address_id: Uuid,
  pub card_id: String,
  pub orders: Vec<Order>,
  pub shipping_address: Option<ShippingAddress>,
  pub gateway_customer_id: Option<String>,
  pub items_total_cents: i64,
  pub shipping_fee_cents: i64,
  pub amount_payable_cents: i64,
  pub intent: Option<PaymentIntent>,
}

#[derive(Clone)]
pub struct TrackingUpdateCtxData {
  pub app_state: AppState,
  pub order_id: String,
  pub next_status: TrackingStatus,
  pub order: Option<Order>,
  pub tracking: Option<OrderTracking>,
}

#[derive(Clone)]
pub struct AddCardCtxData {
  pub app_state: AppState,
  pub user: User,
  pub card: CardDetails,
  pub gateway_customer_id: Option<String>,
  pub method: Option<GatewayPaymentMethod>,
}

// --- Shared ---

#[derive(Clone)]
pub struct SendOtpEmailCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub recipient_email: String,
  pub recipient_name: String,
}
