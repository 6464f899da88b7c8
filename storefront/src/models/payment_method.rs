// storefront/src/models/payment_method.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Local reference to a card stored at the payment gateway. Card details
/// themselves live only at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
  pub id: Uuid,
  pub user_id: Uuid,
  pub gateway_method_id: String,
  pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
  pub fn new(user_id: Uuid, gateway_method_id: &str) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      gateway_method_id: gateway_method_id.to_string(),
      created_at: Utc::now(),
    }
  }
}
