// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
  pub id: Uuid,
  pub title: String,
  pub featured_product_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub collection_id: Option<Uuid>,
  pub title: String,
  pub description: Option<String>,
  pub unit_price_cents: i64,
  pub is_digital: bool,
  /// Total stock across all variants. Never negative.
  pub inventory: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn new(title: &str, unit_price_cents: i64, inventory: i32) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      collection_id: None,
      title: title.to_string(),
      description: None,
      unit_price_cents,
      is_digital: false,
      inventory,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Stock and optional surcharge for one colour, one size, or one colour+size
/// combination of a product.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VariantInventory {
  pub id: Uuid,
  pub product_id: Uuid,
  pub color: Option<String>,
  pub size: Option<String>,
  pub quantity: i32,
  pub surcharge_cents: Option<i64>,
}

impl VariantInventory {
  pub fn new(product_id: Uuid, color: Option<&str>, size: Option<&str>, quantity: i32, surcharge_cents: Option<i64>) -> Self {
    Self {
      id: Uuid::new_v4(),
      product_id,
      color: color.map(str::to_string),
      size: size.map(str::to_string),
      quantity,
      surcharge_cents,
    }
  }
}
