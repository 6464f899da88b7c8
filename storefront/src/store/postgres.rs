// storefront/src/store/postgres.rs

//! PostgreSQL-backed store. Order placement runs in one transaction that
//! row-locks every stock counter it touches before checking it.

use super::{
  cart_changed, AccountRepository, CartRepository, CatalogRepository, NotificationRepository, OrderPlacement,
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
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
  "id, collection_id, title, description, unit_price_cents, is_digital, inventory, created_at, updated_at";
const VARIANT_COLUMNS: &str = "id, product_id, color, size, quantity, surcharge_cents";
const ORDER_COLUMNS: &str = "id, customer_id, placed_at, payment_status, shipping_address";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, product_title, quantity, unit_price_cents, color, size";
const USER_COLUMNS: &str = "id, email, full_name, password_hash, is_active, is_verified, is_staff, gateway_customer_id, \
   phone, date_of_birth, gender, created_at";
const REVIEW_COLUMNS: &str = "id, product_id, author_id, rating, description, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::connect", skip_all, err(Display))]
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Internal(format!("Database migration failed: {}", e)))
  }

  async fn attach_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
    if orders.is_empty() {
      return Ok(orders);
    }
    let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY product_title",
      ORDER_ITEM_COLUMNS
    ))
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for item in items {
      by_order.entry(item.order_id.clone()).or_default().push(item);
    }
    for order in &mut orders {
      order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
  }
}

/// Maps Postgres `numeric_value_out_of_range` (an `integer` sum overflowing).
fn out_of_range_as_validation(err: sqlx::Error) -> AppError {
  match &err {
    sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("22003") => {
      AppError::Validation("Quantity is too large.".to_string())
    }
    _ => AppError::Sqlx(err),
  }
}

fn unique_violation_as(err: sqlx::Error, message: &str) -> AppError {
  match &err {
    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Validation(message.to_string()),
    _ => AppError::Sqlx(err),
  }
}

#[async_trait]
impl CatalogRepository for PgStore {
  async fn list_collections(&self) -> Result<Vec<Collection>> {
    Ok(
      sqlx::query_as("SELECT id, title, featured_product_id FROM collections ORDER BY title")
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let pattern = filter.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));
    Ok(
      sqlx::query_as(&format!(
        "SELECT {} FROM products \
         WHERE ($1::uuid IS NULL OR collection_id = $1) AND ($2::text IS NULL OR lower(title) LIKE $2) \
         ORDER BY title",
        PRODUCT_COLUMNS
      ))
      .bind(filter.collection_id)
      .bind(pattern)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_variants(&self, product_id: Uuid) -> Result<Vec<VariantInventory>> {
    Ok(
      sqlx::query_as(&format!(
        "SELECT {} FROM variant_inventory WHERE product_id = $1 ORDER BY color NULLS FIRST, size NULLS FIRST",
        VARIANT_COLUMNS
      ))
      .bind(product_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn get_variant_inventory(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> Result<Option<VariantInventory>> {
    Ok(
      sqlx::query_as(&format!(
        "SELECT {} FROM variant_inventory WHERE product_id = $1 \
         AND (($2::text IS NULL AND color IS NULL) OR lower(color) = lower($2)) \
         AND (($3::text IS NULL AND size IS NULL) OR lower(size) = lower($3)) \
         LIMIT 1",
        VARIANT_COLUMNS
      ))
      .bind(product_id)
      .bind(color)
      .bind(size)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn insert_collection(&self, collection: &Collection) -> Result<()> {
    sqlx::query("INSERT INTO collections (id, title, featured_product_id) VALUES ($1, $2, $3)")
      .bind(collection.id)
      .bind(&collection.title)
      .bind(collection.featured_product_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    sqlx::query(&format!(
      "INSERT INTO products ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      PRODUCT_COLUMNS
    ))
    .bind(product.id)
    .bind(product.collection_id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.unit_price_cents)
    .bind(product.is_digital)
    .bind(product.inventory)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn insert_variant(&self, variant: &VariantInventory) -> Result<()> {
    sqlx::query(&format!("INSERT INTO variant_inventory ({}) VALUES ($1, $2, $3, $4, $5, $6)", VARIANT_COLUMNS))
      .bind(variant.id)
      .bind(variant.product_id)
      .bind(&variant.color)
      .bind(&variant.size)
      .bind(variant.quantity)
      .bind(variant.surcharge_cents)
      .execute(&self.pool)
      .await
      .map_err(|e| unique_violation_as(e, "This product already has stock for that variant."))?;
    Ok(())
  }

  async fn insert_review(&self, review: &Review) -> Result<()> {
    sqlx::query(&format!("INSERT INTO reviews ({}) VALUES ($1, $2, $3, $4, $5, $6)", REVIEW_COLUMNS))
      .bind(review.id)
      .bind(review.product_id)
      .bind(review.author_id)
      .bind(review.rating)
      .bind(&review.description)
      .bind(review.created_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>> {
    Ok(
      sqlx::query_as(&format!(
        "SELECT {} FROM reviews WHERE product_id = $1 ORDER BY created_at",
        REVIEW_COLUMNS
      ))
      .bind(product_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn toggle_like(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let removed = sqlx::query("DELETE FROM product_likes WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    if removed.rows_affected() > 0 {
      return Ok(false);
    }
    sqlx::query("INSERT INTO product_likes (user_id, product_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(true)
  }

  async fn liked_products(&self, user_id: Uuid) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as(&format!(
        "SELECT {} FROM products p WHERE p.id IN (SELECT product_id FROM product_likes WHERE user_id = $1) \
         ORDER BY p.title",
        PRODUCT_COLUMNS
      ))
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn create_cart(&self) -> Result<Cart> {
    let cart = Cart::new();
    sqlx::query("INSERT INTO carts (id, created_at) VALUES ($1, $2)")
      .bind(cart.id)
      .bind(cart.created_at)
      .execute(&self.pool)
      .await?;
    Ok(cart)
  }

  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    let cart: Option<Cart> = sqlx::query_as("SELECT id, created_at FROM carts WHERE id = $1")
      .bind(cart_id)
      .fetch_optional(&self.pool)
      .await?;
    let Some(mut cart) = cart else { return Ok(None) };
    cart.items = sqlx::query_as("SELECT id, cart_id, product_id, quantity, color, size FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(Some(cart))
  }

  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32, color: Option<&str>, size: Option<&str>) -> Result<CartItem> {
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE id = $1")
      .bind(cart_id)
      .fetch_optional(&self.pool)
      .await?;
    if exists.is_none() {
      return Err(AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()));
    }

    Ok(
      sqlx::query_as(
        "INSERT INTO cart_items (id, cart_id, product_id, quantity, color, size) VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (cart_id, product_id, (coalesce(color, '')), (coalesce(size, ''))) \
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
         RETURNING id, cart_id, product_id, quantity, color, size",
      )
      .bind(Uuid::new_v4())
      .bind(cart_id)
      .bind(product_id)
      .bind(quantity)
      .bind(color)
      .bind(size)
      .fetch_one(&self.pool)
      .await
      .map_err(out_of_range_as_validation)?,
    )
  }

  async fn update_cart_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    Ok(
      sqlx::query_as(
        "UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND id = $2 \
         RETURNING id, cart_id, product_id, quantity, color, size",
      )
      .bind(cart_id)
      .bind(item_id)
      .bind(quantity)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn remove_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
      .bind(cart_id)
      .bind(item_id)
      .execute(&self.pool)
      .await?;
    Ok(res.rows_affected() > 0)
  }

  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart_id).execute(&self.pool).await?;
    Ok(res.rows_affected() > 0)
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "PgStore::place_order", skip_all, fields(cart_id = %placement.cart_id), err(Display))]
  async fn place_order(&self, placement: &OrderPlacement, ids: &dyn OrderIdSource) -> Result<Order> {
    // Dropping `tx` on any early return rolls everything back.
    let mut tx = self.pool.begin().await?;

    let cart: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
      .bind(placement.cart_id)
      .fetch_optional(&mut *tx)
      .await?;
    if cart.is_none() {
      return Err(AppError::EmptyOrMissingCart("No cart with the given ID was found.".to_string()));
    }
    let current: Vec<CartItem> = sqlx::query_as(
      "SELECT id, cart_id, product_id, quantity, color, size FROM cart_items WHERE cart_id = $1 FOR UPDATE",
    )
    .bind(placement.cart_id)
    .fetch_all(&mut *tx)
    .await?;
    if !placement.matches_cart(&current) {
      return Err(cart_changed());
    }

    let demand = placement.stock_demand()?;

    // Lock product rows first, then variant rows, each in id order.
    let mut product_stock: HashMap<Uuid, i32> = HashMap::new();
    for product_id in demand.units_per_product.keys() {
      let inventory: Option<i32> = sqlx::query_scalar("SELECT inventory FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
      product_stock.insert(*product_id, inventory.unwrap_or(0));
    }
    for (product_id, d) in &demand.products {
      d.check(product_stock.get(product_id).copied().unwrap_or(0))?;
    }
    for (variant_id, d) in &demand.variants {
      let quantity: Option<i32> = sqlx::query_scalar("SELECT quantity FROM variant_inventory WHERE id = $1 FOR UPDATE")
        .bind(variant_id)
        .fetch_optional(&mut *tx)
        .await?;
      d.check(quantity.unwrap_or(0))?;
    }

    let mut order_id = None;
    for attempt in 1..=MAX_ORDER_ID_ATTEMPTS {
      let candidate = ids.next_id();
      let inserted = sqlx::query(
        "INSERT INTO orders (id, customer_id, placed_at, payment_status) VALUES ($1, $2, $3, 'pending') \
         ON CONFLICT (id) DO NOTHING",
      )
      .bind(&candidate)
      .bind(placement.customer_id)
      .bind(placement.placed_at)
      .execute(&mut *tx)
      .await?;
      if inserted.rows_affected() == 1 {
        order_id = Some(candidate);
        break;
      }
      warn!(%candidate, attempt, "Order id collision, regenerating.");
    }
    let order_id = order_id.ok_or_else(|| AppError::Internal("Could not generate a unique order id".to_string()))?;

    let now = Utc::now();
    for (variant_id, d) in &demand.variants {
      sqlx::query("UPDATE variant_inventory SET quantity = quantity - $1 WHERE id = $2")
        .bind(d.requested)
        .bind(variant_id)
        .execute(&mut *tx)
        .await?;
    }
    for (product_id, units) in &demand.units_per_product {
      sqlx::query("UPDATE products SET inventory = GREATEST(inventory - $1, 0), updated_at = $3 WHERE id = $2")
        .bind(units)
        .bind(product_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    let mut items = Vec::with_capacity(placement.lines.len());
    for line in &placement.lines {
      let item = OrderItem {
        id: Uuid::new_v4(),
        order_id: order_id.clone(),
        product_id: line.product_id,
        product_title: line.product_title.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents,
        color: line.color.clone(),
        size: line.size.clone(),
      };
      sqlx::query(&format!(
        "INSERT INTO order_items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        ORDER_ITEM_COLUMNS
      ))
      .bind(item.id)
      .bind(&item.order_id)
      .bind(item.product_id)
      .bind(&item.product_title)
      .bind(item.quantity)
      .bind(item.unit_price_cents)
      .bind(&item.color)
      .bind(&item.size)
      .execute(&mut *tx)
      .await?;
      items.push(item);
    }

    sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(placement.cart_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    info!(%order_id, lines = items.len(), "Order placed.");

    Ok(Order {
      id: order_id,
      customer_id: placement.customer_id,
      placed_at: placement.placed_at,
      payment_status: PaymentStatus::Pending,
      shipping_address: None,
      items,
    })
  }

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
    let order: Option<Order> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    match order {
      Some(order) => Ok(self.attach_items(vec![order]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn list_orders(&self, customer_id: Option<Uuid>) -> Result<Vec<Order>> {
    let orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY placed_at DESC",
      ORDER_COLUMNS
    ))
    .bind(customer_id)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(orders).await
  }

  async fn find_customer_orders(&self, customer_id: Uuid, order_ids: &[String]) -> Result<Vec<Order>> {
    let orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE customer_id = $1 AND id = ANY($2)",
      ORDER_COLUMNS
    ))
    .bind(customer_id)
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(orders).await
  }

  async fn set_shipping_address(&self, order_ids: &[String], address: &str) -> Result<()> {
    sqlx::query("UPDATE orders SET shipping_address = $1 WHERE id = ANY($2)")
      .bind(address)
      .bind(order_ids)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  #[instrument(name = "PgStore::claim_for_payment", skip(self), err(Display))]
  async fn claim_for_payment(&self, order_ids: &[String]) -> Result<()> {
    let mut tx = self.pool.begin().await?;
    let rows: Vec<(String, PaymentStatus)> =
      sqlx::query_as("SELECT id, payment_status FROM orders WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(order_ids)
        .fetch_all(&mut *tx)
        .await?;
    for id in order_ids {
      match rows.iter().find(|(row_id, _)| row_id == id).map(|(_, status)| *status) {
        Some(PaymentStatus::Complete) => return Err(AppError::AlreadyPaid(id.clone())),
        Some(PaymentStatus::Processing) => return Err(AppError::PaymentInProgress(id.clone())),
        Some(_) => {}
        None => return Err(AppError::OrderNotFound(id.clone())),
      }
    }
    sqlx::query("UPDATE orders SET payment_status = 'processing' WHERE id = ANY($1)")
      .bind(order_ids)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(())
  }

  async fn set_payment_status(&self, order_ids: &[String], status: PaymentStatus) -> Result<()> {
    sqlx::query("UPDATE orders SET payment_status = $1 WHERE id = ANY($2)")
      .bind(status)
      .bind(order_ids)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn create_tracking(&self, tracking: &OrderTracking) -> Result<()> {
    sqlx::query(
      "INSERT INTO order_tracking (order_id, status, checking_date, in_transit_date, date_delivered) \
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&tracking.order_id)
    .bind(tracking.status)
    .bind(tracking.checking_date)
    .bind(tracking.in_transit_date)
    .bind(tracking.date_delivered)
    .execute(&self.pool)
    .await
    .map_err(|e| unique_violation_as(e, "Order is already tracked"))?;
    Ok(())
  }

  async fn get_tracking(&self, order_id: &str) -> Result<Option<OrderTracking>> {
    Ok(
      sqlx::query_as(
        "SELECT order_id, status, checking_date, in_transit_date, date_delivered FROM order_tracking WHERE order_id = $1",
      )
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn save_tracking(&self, tracking: &OrderTracking) -> Result<()> {
    sqlx::query(
      "UPDATE order_tracking SET status = $2, in_transit_date = $3, date_delivered = $4 WHERE order_id = $1",
    )
    .bind(&tracking.order_id)
    .bind(tracking.status)
    .bind(tracking.in_transit_date)
    .bind(tracking.date_delivered)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}

#[async_trait]
impl AccountRepository for PgStore {
  async fn insert_user(&self, user: &User) -> Result<()> {
    sqlx::query(&format!(
      "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
      USER_COLUMNS
    ))
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_verified)
    .bind(user.is_staff)
    .bind(&user.gateway_customer_id)
    .bind(&user.phone)
    .bind(user.date_of_birth)
    .bind(user.gender)
    .bind(user.created_at)
    .execute(&self.pool)
    .await
    .map_err(|e| unique_violation_as(e, "An account with this email already exists."))?;
    Ok(())
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    Ok(
      sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as(&format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn update_user(&self, user: &User) -> Result<()> {
    sqlx::query(
      "UPDATE users SET full_name = $2, password_hash = $3, is_active = $4, is_verified = $5, is_staff = $6, \
       gateway_customer_id = $7, phone = $8, date_of_birth = $9, gender = $10 WHERE id = $1",
    )
    .bind(user.id)
    .bind(&user.full_name)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_verified)
    .bind(user.is_staff)
    .bind(&user.gateway_customer_id)
    .bind(&user.phone)
    .bind(user.date_of_birth)
    .bind(user.gender)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn insert_address(&self, address: &ShippingAddress) -> Result<()> {
    sqlx::query("INSERT INTO shipping_addresses (id, customer_id, name, address, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(address.id)
      .bind(address.customer_id)
      .bind(&address.name)
      .bind(&address.address)
      .bind(address.created_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn list_addresses(&self, customer_id: Uuid) -> Result<Vec<ShippingAddress>> {
    Ok(
      sqlx::query_as(
        "SELECT id, customer_id, name, address, created_at FROM shipping_addresses WHERE customer_id = $1 ORDER BY created_at",
      )
      .bind(customer_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn get_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<Option<ShippingAddress>> {
    Ok(
      sqlx::query_as(
        "SELECT id, customer_id, name, address, created_at FROM shipping_addresses WHERE id = $1 AND customer_id = $2",
      )
      .bind(address_id)
      .bind(customer_id)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn update_address(&self, address: &ShippingAddress) -> Result<bool> {
    let updated = sqlx::query("UPDATE shipping_addresses SET name = $3, address = $4 WHERE id = $1 AND customer_id = $2")
      .bind(address.id)
      .bind(address.customer_id)
      .bind(&address.name)
      .bind(&address.address)
      .execute(&self.pool)
      .await?;
    Ok(updated.rows_affected() == 1)
  }

  async fn delete_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM shipping_addresses WHERE id = $1 AND customer_id = $2")
      .bind(address_id)
      .bind(customer_id)
      .execute(&self.pool)
      .await?;
    Ok(deleted.rows_affected() == 1)
  }

  async fn insert_payment_method(&self, method: &PaymentMethod) -> Result<()> {
    sqlx::query("INSERT INTO payment_methods (id, user_id, gateway_method_id, created_at) VALUES ($1, $2, $3, $4)")
      .bind(method.id)
      .bind(method.user_id)
      .bind(&method.gateway_method_id)
      .bind(method.created_at)
      .execute(&self.pool)
      .await
      .map_err(|e| unique_violation_as(e, "A payment method with the same card details already exists"))?;
    Ok(())
  }

  async fn find_payment_method(&self, user_id: Uuid, gateway_method_id: &str) -> Result<Option<PaymentMethod>> {
    Ok(
      sqlx::query_as(
        "SELECT id, user_id, gateway_method_id, created_at FROM payment_methods WHERE user_id = $1 AND gateway_method_id = $2",
      )
      .bind(user_id)
      .bind(gateway_method_id)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn load_otp(&self, user_id: Uuid) -> Result<Option<OtpState>> {
    Ok(
      sqlx::query_as("SELECT user_id, counter, issued_at, failed_attempts FROM otp_states WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn save_otp(&self, state: &OtpState) -> Result<()> {
    sqlx::query(
      "INSERT INTO otp_states (user_id, counter, issued_at, failed_attempts) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (user_id) DO UPDATE SET counter = EXCLUDED.counter, issued_at = EXCLUDED.issued_at, \
       failed_attempts = EXCLUDED.failed_attempts",
    )
    .bind(state.user_id)
    .bind(state.counter)
    .bind(state.issued_at)
    .bind(state.failed_attempts)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn clear_otp(&self, user_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM otp_states WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}

#[async_trait]
impl NotificationRepository for PgStore {
  async fn insert_notification(&self, notification: &Notification) -> Result<()> {
    let mut tx = self.pool.begin().await?;
    sqlx::query("INSERT INTO notifications (id, kind, title, \"desc\", general, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
      .bind(notification.id)
      .bind(notification.kind)
      .bind(&notification.title)
      .bind(&notification.desc)
      .bind(notification.general)
      .bind(notification.created_at)
      .execute(&mut *tx)
      .await?;
    if !notification.recipients.is_empty() {
      sqlx::query("INSERT INTO notification_recipients (notification_id, user_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(notification.id)
        .bind(&notification.recipients)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
  }

  async fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    Ok(
      sqlx::query_as(
        "SELECT n.id, n.kind, n.title, n.\"desc\", n.general, n.created_at FROM notifications n \
         WHERE n.general OR EXISTS ( \
           SELECT 1 FROM notification_recipients r WHERE r.notification_id = n.id AND r.user_id = $1) \
         ORDER BY n.created_at DESC",
      )
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}
