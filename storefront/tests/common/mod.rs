// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::errors::{AppError, Result as AppResult};
use storefront::models::{CartItem, Order, Product, ShippingAddress, User, VariantInventory};
use storefront::pipelines::contexts::{
  AddCardCtxData, AddToCartCtxData, PaymentCtxData, PlaceOrderCtxData, UpdateCartItemCtxData,
};
use storefront::pipelines::require_completed;
use storefront::services::auth_service;
use storefront::services::gateway::{CardDetails, SandboxGateway};
use storefront::services::mailer::LogMailer;
use storefront::services::order_ids::{OrderIdSource, RandomOrderIds};
use storefront::state::AppState;
use storefront::store::{AccountRepository, CartRepository, CatalogRepository, MemoryStore, OrderPlacement, PlacementLine};
use storefront_flow::ContextData;
use tracing::Level;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const GOOD_CARD: &str = "4242424242424242";
pub const DECLINED_CARD: &str = "4000000000000002";
pub const ERROR_CARD: &str = "4000000000000119";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Hands out queued ids first, then random ones.
pub struct ScriptedOrderIds {
  queued: Mutex<VecDeque<String>>,
  fallback: RandomOrderIds,
}

impl ScriptedOrderIds {
  pub fn new(ids: &[&str]) -> Self {
    Self {
      queued: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
      fallback: RandomOrderIds::new(10),
    }
  }
}

impl OrderIdSource for ScriptedOrderIds {
  fn next_id(&self) -> String {
    self.queued.lock().pop_front().unwrap_or_else(|| self.fallback.next_id())
  }
}

/// A placement of `lines` of `(product, quantity)` with no variant rows.
pub fn placement(cart_id: Uuid, customer_id: Uuid, lines: &[(&Product, i32)]) -> OrderPlacement {
  OrderPlacement {
    cart_id,
    customer_id,
    placed_at: chrono::Utc::now(),
    lines: lines
      .iter()
      .map(|(product, quantity)| PlacementLine {
        product_id: product.id,
        product_title: product.title.clone(),
        quantity: *quantity,
        unit_price_cents: product.unit_price_cents,
        color: None,
        size: None,
        variant_ids: Vec::new(),
      })
      .collect(),
  }
}

/// What a successful payment run computed.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
  pub items_total_cents: i64,
  pub shipping_fee_cents: i64,
  pub amount_payable_cents: i64,
  pub intent_id: Option<String>,
}

pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<SandboxGateway>,
  pub mailer: Arc<LogMailer>,
}

pub fn test_config() -> AppConfig {
  AppConfig {
    shipping_fee_cents: 500,
    ..AppConfig::default()
  }
}

pub fn test_app() -> TestApp {
  build_app(test_config(), None)
}

pub fn test_app_with_ids(ids: &[&str]) -> TestApp {
  build_app(test_config(), Some(Arc::new(ScriptedOrderIds::new(ids))))
}

pub fn build_app(config: AppConfig, order_ids: Option<Arc<dyn OrderIdSource>>) -> TestApp {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(SandboxGateway::new());
  let mailer = Arc::new(LogMailer::new(config.email_sender.clone()));
  let state = AppState::build(config, store.clone(), gateway.clone(), mailer.clone(), order_ids);
  TestApp {
    state,
    store,
    gateway,
    mailer,
  }
}

impl TestApp {
  pub async fn user(&self, email: &str, staff: bool) -> User {
    let hash = auth_service::hash_password(TEST_PASSWORD).unwrap();
    let mut user = User::new(email, "Test Customer", hash);
    user.is_verified = true;
    user.is_staff = staff;
    self.store.insert_user(&user).await.unwrap();
    user
  }

  pub async fn product(&self, title: &str, unit_price_cents: i64, inventory: i32) -> Product {
    let product = Product::new(title, unit_price_cents, inventory);
    self.store.insert_product(&product).await.unwrap();
    product
  }

  pub async fn variant(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>, quantity: i32, surcharge: Option<i64>) -> VariantInventory {
    let variant = VariantInventory::new(product_id, color, size, quantity, surcharge);
    self.store.insert_variant(&variant).await.unwrap();
    variant
  }

  pub async fn product_inventory(&self, product_id: Uuid) -> i32 {
    self.store.get_product(product_id).await.unwrap().unwrap().inventory
  }

  pub async fn variant_quantity(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> i32 {
    self
      .store
      .get_variant_inventory(product_id, color, size)
      .await
      .unwrap()
      .unwrap()
      .quantity
  }

  /// Runs the add-to-cart pipeline.
  pub async fn add_to_cart(&self, cart_id: Uuid, product_id: Uuid, quantity: i32, color: Option<&str>, size: Option<&str>) -> AppResult<()> {
    let ctx = ContextData::new(AddToCartCtxData {
      app_state: self.state.clone(),
      cart_id,
      product_id,
      quantity,
      color: color.map(str::to_string),
      size: size.map(str::to_string),
      product: None,
      cart: None,
      cart_item: None,
    });
    require_completed(self.state.flows.run(ctx).await?)
  }

  /// Runs the update-cart-item pipeline and returns the saved line.
  pub async fn update_cart_item(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> AppResult<CartItem> {
    let ctx = ContextData::new(UpdateCartItemCtxData {
      app_state: self.state.clone(),
      cart_id,
      item_id,
      quantity,
      line: None,
      product: None,
      cart_item: None,
    });
    require_completed(self.state.flows.run(ctx.clone()).await?)?;
    let item = ctx.read().cart_item.clone();
    item.ok_or_else(|| AppError::Internal("no cart line".to_string()))
  }

  /// A fresh cart holding `lines` of `(product, quantity)`, written directly.
  pub async fn cart_with(&self, lines: &[(Uuid, i32)]) -> Uuid {
    let cart = self.store.create_cart().await.unwrap();
    for (product_id, quantity) in lines {
      self.store.add_cart_item(cart.id, *product_id, *quantity, None, None).await.unwrap();
    }
    cart.id
  }

  pub async fn place_order(&self, customer: &User, cart_id: Uuid) -> AppResult<Order> {
    let ctx = ContextData::new(PlaceOrderCtxData {
      app_state: self.state.clone(),
      customer_id: customer.id,
      cart_id,
      cart: None,
      lines: Vec::new(),
      order: None,
    });
    require_completed(self.state.flows.run(ctx.clone()).await?)?;
    let order = ctx.read().order.clone();
    order.ok_or_else(|| AppError::Internal("no order".to_string()))
  }

  pub async fn address(&self, customer: &User) -> ShippingAddress {
    let address = ShippingAddress::new(customer.id, "Home", "1 Main Street");
    self.store.insert_address(&address).await.unwrap();
    address
  }

  /// Saves a card through the add-card pipeline and returns its gateway id.
  pub async fn save_card(&self, customer: &User, number: &str) -> AppResult<String> {
    let ctx = ContextData::new(AddCardCtxData {
      app_state: self.state.clone(),
      user: customer.clone(),
      card: card(number),
      gateway_customer_id: None,
      method: None,
    });
    require_completed(self.state.flows.run(ctx.clone()).await?)?;
    let method_id = ctx.read().method.as_ref().map(|m| m.id.clone());
    method_id.ok_or_else(|| AppError::Internal("no method".to_string()))
  }

  pub async fn pay(&self, customer: &User, order_ids: &[&str], address_id: Uuid, card_id: &str) -> AppResult<PaymentReceipt> {
    let ctx = ContextData::new(PaymentCtxData {
      app_state: self.state.clone(),
      customer: customer.clone(),
      order_ids: order_ids.iter().map(|s| s.to_string()).collect(),
      address_id,
      card_id: card_id.to_string(),
      orders: Vec::new(),
      shipping_address: None,
      gateway_customer_id: None,
      items_total_cents: 0,
      shipping_fee_cents: 0,
      amount_payable_cents: 0,
      intent: None,
    });
    require_completed(self.state.flows.run(ctx.clone()).await?)?;
    let guard = ctx.read();
    Ok(PaymentReceipt {
      items_total_cents: guard.items_total_cents,
      shipping_fee_cents: guard.shipping_fee_cents,
      amount_payable_cents: guard.amount_payable_cents,
      intent_id: guard.intent.as_ref().map(|i| i.id.clone()),
    })
  }
}

pub fn card(number: &str) -> CardDetails {
  CardDetails {
    number: number.to_string(),
    exp_month: 12,
    exp_year: 30,
    cvc: "123".to_string(),
  }
}
