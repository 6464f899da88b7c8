// storefront/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "notification_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
  Offer,
  Feed,
  Activity,
}

/// Append-only message. `general` ones are visible to every user; the rest
/// only to `recipients`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
  pub id: Uuid,
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub title: String,
  pub desc: String,
  pub general: bool,
  #[sqlx(skip)]
  #[serde(skip_serializing)]
  pub recipients: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
}

impl Notification {
  pub fn new(kind: NotificationKind, title: &str, desc: &str, general: bool, recipients: Vec<Uuid>) -> Self {
    Self {
      id: Uuid::new_v4(),
      kind,
      title: title.to_string(),
      desc: desc.to_string(),
      general,
      recipients,
      created_at: Utc::now(),
    }
  }

  pub fn is_visible_to(&self, user_id: Uuid) -> bool {
    self.general || self.recipients.contains(&user_id)
  }
}
