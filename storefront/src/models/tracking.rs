// storefront/src/models/tracking.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "tracking_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TrackingStatus {
  Checking,
  #[serde(alias = "in transit", alias = "in_transit")]
  InTransit,
  Delivered,
}

impl TrackingStatus {
  fn rank(self) -> u8 {
    match self {
      TrackingStatus::Checking => 0,
      TrackingStatus::InTransit => 1,
      TrackingStatus::Delivered => 2,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      TrackingStatus::Checking => "checking",
      TrackingStatus::InTransit => "in-transit",
      TrackingStatus::Delivered => "delivered",
    }
  }
}

impl std::fmt::Display for TrackingStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Shipment state of one order. Created in `checking` when the order is placed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderTracking {
  pub order_id: String,
  pub status: TrackingStatus,
  pub checking_date: DateTime<Utc>,
  pub in_transit_date: Option<DateTime<Utc>>,
  pub date_delivered: Option<DateTime<Utc>>,
}

impl OrderTracking {
  pub fn new(order_id: &str, placed_at: DateTime<Utc>) -> Self {
    Self {
      order_id: order_id.to_string(),
      status: TrackingStatus::Checking,
      checking_date: placed_at,
      in_transit_date: None,
      date_delivered: None,
    }
  }

  /// Moves the shipment strictly forward and stamps the target state's date.
  ///
  /// Forward skips (checking -> delivered) are allowed and leave the skipped
  /// state's date empty. Repeating the current state or going back fails.
  pub fn advance(&mut self, next: TrackingStatus, at: DateTime<Utc>) -> Result<()> {
    if next.rank() <= self.status.rank() {
      return Err(AppError::InvalidTrackingTransition {
        from: self.status,
        to: next,
      });
    }
    match next {
      TrackingStatus::InTransit => self.in_transit_date = Some(at),
      TrackingStatus::Delivered => self.date_delivered = Some(at),
      // rank() rules out moving to the initial state
      TrackingStatus::Checking => {}
    }
    self.status = next;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn forward_transitions_stamp_once() {
    let placed = Utc::now();
    let mut t = OrderTracking::new("ABC1234567", placed);
    let shipped = placed + chrono::Duration::hours(1);
    t.advance(TrackingStatus::InTransit, shipped).unwrap();
    assert_eq!(t.in_transit_date, Some(shipped));

    assert!(t.advance(TrackingStatus::InTransit, Utc::now()).is_err());
    assert_eq!(t.in_transit_date, Some(shipped));

    t.advance(TrackingStatus::Delivered, shipped + chrono::Duration::hours(2)).unwrap();
    assert!(t.advance(TrackingStatus::Checking, Utc::now()).is_err());
    assert_eq!(t.status, TrackingStatus::Delivered);
  }

  #[test]
  fn skipping_to_delivered_leaves_transit_date_empty() {
    let mut t = OrderTracking::new("ABC1234567", Utc::now());
    t.advance(TrackingStatus::Delivered, Utc::now()).unwrap();
    assert!(t.in_transit_date.is_none());
    assert!(t.date_delivered.is_some());
  }

  #[test]
  fn status_accepts_spaced_spelling() {
    let s: TrackingStatus = serde_json::from_str("\"in transit\"").unwrap();
    assert_eq!(s, TrackingStatus::InTransit);
    assert_eq!(serde_json::to_string(&s).unwrap(), "\"in-transit\"");
  }
}
