// storefront/src/models/user.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  #[default]
  Unspecified,
  Male,
  Female,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub full_name: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_active: bool,
  /// Set once the signup OTP has been confirmed; signin requires it.
  pub is_verified: bool,
  pub is_staff: bool,
  /// Customer record at the payment gateway, created with the first saved card.
  #[serde(skip_serializing)]
  pub gateway_customer_id: Option<String>,
  pub phone: Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub gender: Gender,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn new(email: &str, full_name: &str, password_hash: String) -> Self {
    Self {
      id: Uuid::new_v4(),
      email: email.to_lowercase(),
      full_name: full_name.to_string(),
      password_hash,
      is_active: true,
      is_verified: false,
      is_staff: false,
      gateway_customer_id: None,
      phone: None,
      date_of_birth: None,
      gender: Gender::Unspecified,
      created_at: Utc::now(),
    }
  }
}

/// Accepts an optional leading `+` followed by 7 to 13 digits.
pub fn is_valid_phone(phone: &str) -> bool {
  let digits = phone.strip_prefix('+').unwrap_or(phone);
  (7..=13).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}
