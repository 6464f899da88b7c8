// storefront/src/models/address.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShippingAddress {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub name: String,
  pub address: String,
  pub created_at: DateTime<Utc>,
}

impl ShippingAddress {
  pub fn new(customer_id: Uuid, name: &str, address: &str) -> Self {
    Self {
      id: Uuid::new_v4(),
      customer_id,
      name: name.to_string(),
      address: address.to_string(),
      created_at: Utc::now(),
    }
  }

  /// Text copied onto orders when this address is chosen at payment.
  pub fn snapshot(&self) -> String {
    format!("{}, {}", self.name, self.address)
  }
}
