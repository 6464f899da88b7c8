// storefront/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Anonymous pre-checkout basket, addressed only by its id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  #[sqlx(skip)]
  pub items: Vec<CartItem>,
}

impl Cart {
  pub fn new() -> Self {
    Self {
      id: Uuid::new_v4(),
      created_at: Utc::now(),
      items: Vec::new(),
    }
  }
}

impl Default for Cart {
  fn default() -> Self {
    Self::new()
  }
}

/// One line of a cart. `(cart_id, product_id, color, size)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub color: Option<String>,
  pub size: Option<String>,
}

impl CartItem {
  /// True when `other` names the same product and variant selection.
  pub fn same_selection(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> bool {
    self.product_id == product_id && self.color.as_deref() == color && self.size.as_deref() == size
  }
}
