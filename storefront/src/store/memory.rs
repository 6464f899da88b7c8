// storefront/src/store/memory.rs

//! In-process store used when no `DATABASE_URL` is configured, and by tests.
//!
//! All tables sit behind one `parking_lot::RwLock`; every multi-row change
//! (order placement above all) happens under a single write guard, so other
//! readers never observe half of it.

use super::{
  add_units, cart_changed, AccountRepository, CartRepository, CatalogRepository, NotificationRepository, OrderPlacement,
  OrderRepository, ProductFilter, MAX_ORDER_ID_ATTEMPTS,
};
use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, Collection, Notification, Order, OrderItem, OrderTracking, OtpState, PaymentMethod, PaymentStatus,
  Product, Review, ShippingAddress, User, VariantInventory,
};
use crate::services::order_ids::OrderIdSource;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  collections: HashMap<Uuid, Collection>,
  products: HashMap<Uuid, Product>,
  variants: HashMap<Uuid, VariantInventory>,
  carts: HashMap<Uuid, Cart>,
  orders: HashMap<String, Order>,
  tracking: HashMap<String, OrderTracking>,
  users: HashMap<Uuid, User>,
  addresses: HashMap<Uuid, ShippingAddress>,
  payment_methods: HashMap<Uuid, PaymentMethod>,
  otp: HashMap<Uuid, OtpState>,
  notifications: Vec<Notification>,
  reviews: Vec<Review>,
  /// `(user_id, product_id)`
  likes: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn order_count(&self) -> usize {
    self.tables.read().orders.len()
  }
}

fn same_option(stored: Option<&str>, wanted: Option<&str>) -> bool {
  match (stored, wanted) {
    (None, None) => true,
    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
    _ => false,
  }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
  async fn list_collections(&self) -> Result<Vec<Collection>> {
    let mut all: Vec<Collection> = self.tables.read().collections.values().cloned().collect();
    all.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(all)
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let needle = filter.search.as_ref().map(|s| s.to_lowercase());
    let mut products: Vec<Product> = self
      .tables
      .read()
      .products
      .values()
      .filter(|p| filter.collection_id.map_or(true, |c| p.collection_id == Some(c)))
      .filter(|p| needle.as_ref().map_or(true, |n| p.title.to_lowercase().contains(n)))
      .cloned()
      .collect();
    products.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(products)
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.get(&product_id).cloned())
  }

  async fn list_variants(&self, product_id: Uuid) -> Result<Vec<VariantInventory>> {
    Ok(
      self
        .tables
        .read()
        .variants
        .values()
        .filter(|v| v.product_id == product_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_variant_inventory(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> Result<Option<VariantInventory>> {
    Ok(
      self
        .tables
        .read()
        .variants
        .values()
        .find(|v| v.product_id == product_id && same_option(v.color.as_deref(), color) && same_option(v.size.as_deref(), size))
        .cloned(),
    )
  }

  async fn insert_collection(&self, collection: &Collection) -> Result<()> {
    self.tables.write().collections.insert(collection.id, collection.clone());
    Ok(())
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    self.tables.write().products.insert(product.id, product.clone());
    Ok(())
  }

  async fn insert_variant(&self, variant: &VariantInventory) -> Result<()> {
    self.tables.write().variants.insert(variant.id, variant.clone());
    Ok(())
  }

  async fn insert_review(&self, review: &Review) -> Result<()> {
    self.tables.write().reviews.push(review.clone());
    Ok(())
  }

  async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>> {
    let tables = self.tables.read();
    Ok(tables.reviews.iter().filter(|r| r.product_id == product_id).cloned().collect())
  }

  async fn toggle_like(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.likes.remove(&(user_id, product_id)) {
      return Ok(false);
    }
    tables.likes.insert((user_id, product_id));
    Ok(true)
  }

  async fn liked_products(&self, user_id: Uuid) -> Result<Vec<Product>> {
    let tables = self.tables.read();
    let mut products: Vec<Product> = tables
      .likes
      .iter()
      .filter(|(liker, _)| *liker == user_id)
      .filter_map(|(_, product_id)| tables.products.get(product_id).cloned())
      .collect();
    products.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(products)
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn create_cart(&self) -> Result<Cart> {
    let cart = Cart::new();
    self.tables.write().carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.read().carts.get(&cart_id).cloned())
  }

  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32, color: Option<&str>, size: Option<&str>) -> Result<CartItem> {
    let mut tables = self.tables.write();
    let cart = tables
      .carts
      .get_mut(&cart_id)
      .ok_or_else(|| AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()))?;

    if let Some(existing) = cart.items.iter_mut().find(|i| i.same_selection(product_id, color, size)) {
      existing.quantity = add_units(existing.quantity, quantity)?;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      cart_id,
      product_id,
      quantity,
      color: color.map(str::to_string),
      size: size.map(str::to_string),
    };
    cart.items.push(item.clone());
    Ok(item)
  }

  async fn update_cart_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut tables = self.tables.write();
    let item = tables
      .carts
      .get_mut(&cart_id)
      .and_then(|c| c.items.iter_mut().find(|i| i.id == item_id));
    Ok(item.map(|i| {
      i.quantity = quantity;
      i.clone()
    }))
  }

  async fn remove_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let Some(cart) = tables.carts.get_mut(&cart_id) else {
      return Ok(false);
    };
    let before = cart.items.len();
    cart.items.retain(|i| i.id != item_id);
    Ok(cart.items.len() != before)
  }

  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    Ok(self.tables.write().carts.remove(&cart_id).is_some())
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn place_order(&self, placement: &OrderPlacement, ids: &dyn OrderIdSource) -> Result<Order> {
    let mut tables = self.tables.write();

    let cart = tables
      .carts
      .get(&placement.cart_id)
      .ok_or_else(|| AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()))?;
    if !placement.matches_cart(&cart.items) {
      return Err(cart_changed());
    }

    let demand = placement.stock_demand()?;
    for (product_id, d) in &demand.products {
      d.check(tables.products.get(product_id).map_or(0, |p| p.inventory))?;
    }
    for (variant_id, d) in &demand.variants {
      d.check(tables.variants.get(variant_id).map_or(0, |v| v.quantity))?;
    }

    let mut order_id = None;
    for attempt in 1..=MAX_ORDER_ID_ATTEMPTS {
      let candidate = ids.next_id();
      if tables.orders.contains_key(&candidate) {
        warn!(%candidate, attempt, "Order id collision, regenerating.");
        continue;
      }
      order_id = Some(candidate);
      break;
    }
    let order_id = order_id.ok_or_else(|| AppError::Internal("Could not generate a unique order id".to_string()))?;

    // Checks passed: apply every change under the same guard.
    let now = Utc::now();
    for (variant_id, d) in &demand.variants {
      if let Some(v) = tables.variants.get_mut(variant_id) {
        v.quantity -= d.requested;
      }
    }
    for (product_id, units) in &demand.units_per_product {
      if let Some(p) = tables.products.get_mut(product_id) {
        p.inventory = (p.inventory - units).max(0);
        p.updated_at = now;
      }
    }

    let items = placement
      .lines
      .iter()
      .map(|line| OrderItem {
        id: Uuid::new_v4(),
        order_id: order_id.clone(),
        product_id: line.product_id,
        product_title: line.product_title.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents,
        color: line.color.clone(),
        size: line.size.clone(),
      })
      .collect();
    let order = Order {
      id: order_id.clone(),
      customer_id: placement.customer_id,
      placed_at: placement.placed_at,
      payment_status: PaymentStatus::Pending,
      shipping_address: None,
      items,
    };
    tables.orders.insert(order_id.clone(), order.clone());
    tables.carts.remove(&placement.cart_id);

    info!(%order_id, lines = order.items.len(), "Order placed in memory store.");
    Ok(order)
  }

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.get(order_id).cloned())
  }

  async fn list_orders(&self, customer_id: Option<Uuid>) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .read()
      .orders
      .values()
      .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
    Ok(orders)
  }

  async fn find_customer_orders(&self, customer_id: Uuid, order_ids: &[String]) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    Ok(
      order_ids
        .iter()
        .filter_map(|id| tables.orders.get(id))
        .filter(|o| o.customer_id == customer_id)
        .cloned()
        .collect(),
    )
  }

  async fn set_shipping_address(&self, order_ids: &[String], address: &str) -> Result<()> {
    let mut tables = self.tables.write();
    for id in order_ids {
      if let Some(order) = tables.orders.get_mut(id) {
        order.shipping_address = Some(address.to_string());
      }
    }
    Ok(())
  }

  async fn claim_for_payment(&self, order_ids: &[String]) -> Result<()> {
    let mut tables = self.tables.write();
    for id in order_ids {
      match tables.orders.get(id).map(|o| o.payment_status) {
        Some(PaymentStatus::Complete) => return Err(AppError::AlreadyPaid(id.clone())),
        Some(PaymentStatus::Processing) => return Err(AppError::PaymentInProgress(id.clone())),
        Some(_) => {}
        None => return Err(AppError::OrderNotFound(id.clone())),
      }
    }
    for id in order_ids {
      if let Some(order) = tables.orders.get_mut(id) {
        order.payment_status = PaymentStatus::Processing;
      }
    }
    Ok(())
  }

  async fn set_payment_status(&self, order_ids: &[String], status: PaymentStatus) -> Result<()> {
    let mut tables = self.tables.write();
    for id in order_ids {
      if let Some(order) = tables.orders.get_mut(id) {
        order.payment_status = status;
      }
    }
    Ok(())
  }

  async fn create_tracking(&self, tracking: &OrderTracking) -> Result<()> {
    let mut tables = self.tables.write();
    if tables.tracking.contains_key(&tracking.order_id) {
      return Err(AppError::Validation(format!("Order {} is already tracked", tracking.order_id)));
    }
    tables.tracking.insert(tracking.order_id.clone(), tracking.clone());
    Ok(())
  }

  async fn get_tracking(&self, order_id: &str) -> Result<Option<OrderTracking>> {
    Ok(self.tables.read().tracking.get(order_id).cloned())
  }

  async fn save_tracking(&self, tracking: &OrderTracking) -> Result<()> {
    self.tables.write().tracking.insert(tracking.order_id.clone(), tracking.clone());
    Ok(())
  }
}

#[async_trait]
impl AccountRepository for MemoryStore {
  async fn insert_user(&self, user: &User) -> Result<()> {
    let mut tables = self.tables.write();
    if tables.users.values().any(|u| u.email == user.email) {
      return Err(AppError::Validation("An account with this email already exists.".to_string()));
    }
    tables.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.read().users.get(&user_id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.read().users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
  }

  async fn update_user(&self, user: &User) -> Result<()> {
    self.tables.write().users.insert(user.id, user.clone());
    Ok(())
  }

  async fn insert_address(&self, address: &ShippingAddress) -> Result<()> {
    self.tables.write().addresses.insert(address.id, address.clone());
    Ok(())
  }

  async fn list_addresses(&self, customer_id: Uuid) -> Result<Vec<ShippingAddress>> {
    let mut addresses: Vec<ShippingAddress> = self
      .tables
      .read()
      .addresses
      .values()
      .filter(|a| a.customer_id == customer_id)
      .cloned()
      .collect();
    addresses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(addresses)
  }

  async fn get_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<Option<ShippingAddress>> {
    Ok(
      self
        .tables
        .read()
        .addresses
        .get(&address_id)
        .filter(|a| a.customer_id == customer_id)
        .cloned(),
    )
  }

  async fn update_address(&self, address: &ShippingAddress) -> Result<bool> {
    let mut tables = self.tables.write();
    match tables.addresses.get_mut(&address.id) {
      Some(stored) if stored.customer_id == address.customer_id => {
        stored.name = address.name.clone();
        stored.address = address.address.clone();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn delete_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    if tables.addresses.get(&address_id).is_some_and(|a| a.customer_id == customer_id) {
      tables.addresses.remove(&address_id);
      return Ok(true);
    }
    Ok(false)
  }

  async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<()> {
    self.tables.write().payment_methods.insert(method.id, method.clone());
    Ok(())
  }

  async fn find_payment_method(&self, user_id: Uuid, gateway_method_id: &str) -> Result<Option<PaymentMethod>> {
    Ok(
      self
        .tables
        .read()
        .payment_methods
        .values()
        .find(|m| m.user_id == user_id && m.gateway_method_id == gateway_method_id)
        .cloned(),
    )
  }

  async fn load_otp(&self, user_id: Uuid) -> Result<Option<OtpState>> {
    Ok(self.tables.read().otp.get(&user_id).cloned())
  }

  async fn save_otp(&self, state: &OtpState) -> Result<()> {
    self.tables.write().otp.insert(state.user_id, state.clone());
    Ok(())
  }

  async fn clear_otp(&self, user_id: Uuid) -> Result<()> {
    self.tables.write().otp.remove(&user_id);
    Ok(())
  }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
  async fn insert_notification(&self, notification: &Notification) -> Result<()> {
    self.tables.write().notifications.push(notification.clone());
    Ok(())
  }

  async fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    // Newest first; insertion order breaks timestamp ties.
    Ok(
      self
        .tables
        .read()
        .notifications
        .iter()
        .rev()
        .filter(|n| n.is_visible_to(user_id))
        .cloned()
        .collect(),
    )
  }
}
