// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  /// Claimed by a payment run whose charge has not settled yet.
  Processing,
  Complete,
  Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
  /// Short random uppercase alphanumeric id.
  pub id: String,
  pub customer_id: Uuid,
  pub placed_at: DateTime<Utc>,
  pub payment_status: PaymentStatus,
  pub shipping_address: Option<String>,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
}

impl Order {
  pub fn items_total_cents(&self) -> i64 {
    self.items.iter().map(OrderItem::line_total_cents).sum()
  }

  pub fn is_paid(&self) -> bool {
    self.payment_status == PaymentStatus::Complete
  }
}

/// Price and title snapshot taken at checkout; later catalog edits do not touch it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: String,
  pub product_id: Uuid,
  pub product_title: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub color: Option<String>,
  pub size: Option<String>,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}
