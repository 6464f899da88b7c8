// storefront/src/models/otp.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user one-time-code state. The code itself is derived from `counter`
/// and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OtpState {
  pub user_id: Uuid,
  pub counter: i64,
  /// When the current code was issued; `None` once it has been consumed.
  pub issued_at: Option<DateTime<Utc>>,
  pub failed_attempts: i32,
}

impl OtpState {
  pub fn new(user_id: Uuid) -> Self {
    Self {
      user_id,
      counter: 0,
      issued_at: None,
      failed_attempts: 0,
    }
  }
}
