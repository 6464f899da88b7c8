// storefront/src/store/mod.rs

//! Repository interfaces. Each trait exposes only the query shapes the
//! workflows use; `Store` bundles them for `AppState`.

pub mod memory;
pub mod postgres;
pub mod seed;

use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, Collection, Notification, Order, OrderTracking, OtpState, PaymentMethod, PaymentStatus, Product,
  Review, ShippingAddress, User, VariantInventory,
};
use crate::services::order_ids::OrderIdSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Upper bound on id regenerations when placing an order.
pub const MAX_ORDER_ID_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  pub collection_id: Option<Uuid>,
  /// Case-insensitive match on the title.
  pub search: Option<String>,
}

/// Everything `place_order` needs, resolved from a cart beforehand.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
  pub cart_id: Uuid,
  pub customer_id: Uuid,
  pub placed_at: DateTime<Utc>,
  pub lines: Vec<PlacementLine>,
}

#[derive(Debug, Clone)]
pub struct PlacementLine {
  pub product_id: Uuid,
  pub product_title: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub color: Option<String>,
  pub size: Option<String>,
  /// Variant rows whose stock this line draws from, in addition to the
  /// product total. Empty when the product total is authoritative.
  pub variant_ids: Vec<Uuid>,
}

/// Units one placement takes from a single stock counter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Demand<'a> {
  pub requested: i32,
  pub product_id: Uuid,
  pub product_title: &'a str,
}

impl Demand<'_> {
  pub fn check(&self, available: i32) -> Result<()> {
    if self.requested > available {
      return Err(AppError::InsufficientInventory {
        product_id: self.product_id,
        product: self.product_title.to_string(),
        requested: self.requested,
        available,
      });
    }
    Ok(())
  }
}

/// Aggregated stock demand of a placement, keyed and ordered by row id so
/// backends lock rows in a stable order.
#[derive(Debug, Default)]
pub(crate) struct StockDemand<'a> {
  /// Product totals that are authoritative (lines without variant rows).
  pub products: BTreeMap<Uuid, Demand<'a>>,
  pub variants: BTreeMap<Uuid, Demand<'a>>,
  /// Units per product across every line; the product total always shrinks by this.
  pub units_per_product: BTreeMap<Uuid, i32>,
}

impl OrderPlacement {
  pub(crate) fn stock_demand(&self) -> Result<StockDemand<'_>> {
    let mut demand = StockDemand::default();
    for line in &self.lines {
      let fresh = Demand {
        requested: 0,
        product_id: line.product_id,
        product_title: line.product_title.as_str(),
      };
      if line.variant_ids.is_empty() {
        let d = demand.products.entry(line.product_id).or_insert(fresh);
        d.requested = add_units(d.requested, line.quantity)?;
      }
      for variant_id in &line.variant_ids {
        let d = demand.variants.entry(*variant_id).or_insert(fresh);
        d.requested = add_units(d.requested, line.quantity)?;
      }
      let units = demand.units_per_product.entry(line.product_id).or_insert(0);
      *units = add_units(*units, line.quantity)?;
    }
    Ok(demand)
  }

  /// True when `items` still holds exactly the lines this placement was
  /// resolved from, ignoring order.
  pub(crate) fn matches_cart(&self, items: &[CartItem]) -> bool {
    items.len() == self.lines.len()
      && self.lines.iter().all(|line| {
        items.iter().any(|item| {
          item.same_selection(line.product_id, line.color.as_deref(), line.size.as_deref())
            && item.quantity == line.quantity
        })
      })
  }
}

/// Error for a cart whose lines no longer match what was checked out.
pub(crate) fn cart_changed() -> AppError {
  AppError::Validation("The cart changed while the order was being placed. Review it and try again.".to_string())
}

/// Sums unit counts, rejecting totals that do not fit a quantity column.
pub fn add_units(total: i32, quantity: i32) -> Result<i32> {
  total
    .checked_add(quantity)
    .ok_or_else(|| AppError::Validation("Quantity is too large.".to_string()))
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
  async fn list_collections(&self) -> Result<Vec<Collection>>;
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>>;
  async fn list_variants(&self, product_id: Uuid) -> Result<Vec<VariantInventory>>;
  /// The row stored for exactly this `(color, size)` pair, if any.
  async fn get_variant_inventory(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> Result<Option<VariantInventory>>;
  async fn insert_collection(&self, collection: &Collection) -> Result<()>;
  async fn insert_product(&self, product: &Product) -> Result<()>;
  async fn insert_variant(&self, variant: &VariantInventory) -> Result<()>;
  async fn insert_review(&self, review: &Review) -> Result<()>;
  /// Oldest first.
  async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>>;
  /// Flips the like; returns whether the product is liked afterwards.
  async fn toggle_like(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
  async fn liked_products(&self, user_id: Uuid) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  async fn create_cart(&self) -> Result<Cart>;
  /// Cart with its items, or `None`.
  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>>;
  /// Adds `quantity` to the line with the same selection, or creates it.
  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32, color: Option<&str>, size: Option<&str>) -> Result<CartItem>;
  async fn update_cart_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  /// Returns whether a line was removed.
  async fn remove_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<bool>;
  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Atomically re-checks stock, decrements it, creates the order and its
  /// items under a collision-checked id, and deletes the cart. On any
  /// failure nothing is written.
  async fn place_order(&self, placement: &OrderPlacement, ids: &dyn OrderIdSource) -> Result<Order>;
  async fn get_order(&self, order_id: &str) -> Result<Option<Order>>;
  /// All orders, or one customer's, newest first.
  async fn list_orders(&self, customer_id: Option<Uuid>) -> Result<Vec<Order>>;
  /// The subset of `order_ids` owned by `customer_id`.
  async fn find_customer_orders(&self, customer_id: Uuid, order_ids: &[String]) -> Result<Vec<Order>>;
  async fn set_shipping_address(&self, order_ids: &[String], address: &str) -> Result<()>;
  /// Moves every listed order to `processing` in one unit, failing with
  /// `AlreadyPaid` or `PaymentInProgress` (and changing nothing) when any
  /// of them is `complete` or already claimed.
  async fn claim_for_payment(&self, order_ids: &[String]) -> Result<()>;
  /// Applies `status` to every listed order in one unit.
  async fn set_payment_status(&self, order_ids: &[String], status: PaymentStatus) -> Result<()>;
  async fn create_tracking(&self, tracking: &OrderTracking) -> Result<()>;
  async fn get_tracking(&self, order_id: &str) -> Result<Option<OrderTracking>>;
  async fn save_tracking(&self, tracking: &OrderTracking) -> Result<()>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
  async fn insert_user(&self, user: &User) -> Result<()>;
  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn update_user(&self, user: &User) -> Result<()>;
  async fn insert_address(&self, address: &ShippingAddress) -> Result<()>;
  async fn list_addresses(&self, customer_id: Uuid) -> Result<Vec<ShippingAddress>>;
  async fn get_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<Option<ShippingAddress>>;
  /// Saves name and address text of an existing row owned by `address.customer_id`.
  async fn update_address(&self, address: &ShippingAddress) -> Result<bool>;
  async fn delete_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<bool>;
  async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<()>;
  async fn find_payment_method(&self, user_id: Uuid, gateway_method_id: &str) -> Result<Option<PaymentMethod>>;
  async fn load_otp(&self, user_id: Uuid) -> Result<Option<OtpState>>;
  async fn save_otp(&self, state: &OtpState) -> Result<()>;
  async fn clear_otp(&self, user_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
  async fn insert_notification(&self, notification: &Notification) -> Result<()>;
  /// Notifications addressed to `user_id` plus general ones, newest first.
  async fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>>;
}

/// The full persistence surface used by `AppState`.
pub trait Store: CatalogRepository + CartRepository + OrderRepository + AccountRepository + NotificationRepository {}

impl<T> Store for T where T: CatalogRepository + CartRepository + OrderRepository + AccountRepository + NotificationRepository {}
