// storefront/src/services/notifier.rs

use crate::errors::Result as AppResult;
use crate::models::{Notification, NotificationKind};
use crate::store::Store;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Records notifications. Callers treat a failure here as non-fatal.
#[derive(Clone)]
pub struct Notifier {
  repo: Arc<dyn Store>,
}

impl Notifier {
  pub fn new(repo: Arc<dyn Store>) -> Self {
    Self { repo }
  }

  #[instrument(name = "Notifier::emit", skip(self, desc), fields(recipients = recipients.len()), err(Display))]
  pub async fn emit(&self, kind: NotificationKind, title: &str, desc: &str, recipients: Vec<Uuid>) -> AppResult<Notification> {
    let notification = Notification::new(kind, title, desc, false, recipients);
    self.repo.insert_notification(&notification).await?;
    info!(notification_id = %notification.id, "Notification recorded.");
    Ok(notification)
  }

  /// A notification every user sees.
  #[instrument(name = "Notifier::broadcast", skip(self, desc), err(Display))]
  pub async fn broadcast(&self, kind: NotificationKind, title: &str, desc: &str) -> AppResult<Notification> {
    let notification = Notification::new(kind, title, desc, true, Vec::new());
    self.repo.insert_notification(&notification).await?;
    Ok(notification)
  }

  pub async fn list_for(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
    self.repo.notifications_for(user_id).await
  }
}
