// storefront/src/events.rs

//! Domain events and the subscribers that react to them.

use crate::errors::AppError;
use crate::models::{NotificationKind, OrderTracking};
use crate::services::notifier::Notifier;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_flow::EventBus;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum DomainEvent {
  UserRegistered {
    user_id: Uuid,
    email: String,
    full_name: String,
  },
  OrderCreated {
    order_id: String,
    customer_id: Uuid,
    placed_at: DateTime<Utc>,
  },
  PaymentCompleted {
    customer_id: Uuid,
    order_ids: Vec<String>,
    product_titles: Vec<String>,
    amount_cents: i64,
  },
  OrderDelivered {
    order_id: String,
    customer_id: Uuid,
  },
}

pub type DomainEventBus = EventBus<DomainEvent, AppError>;

/// Notification failures are logged and dropped; the event that caused
/// them has already committed.
async fn record(notifier: &Notifier, kind: NotificationKind, title: &str, desc: &str, user_id: Uuid) {
  if let Err(e) = notifier.emit(kind, title, desc, vec![user_id]).await {
    warn!(error = %e, %title, %user_id, "Failed to record notification.");
  }
}

/// Wires every subscriber. Tracking comes first so a failure there is
/// reported before any notification is written.
pub fn register_subscribers(events: &DomainEventBus, app_state: &AppState) {
  let store = app_state.store.clone();
  events.subscribe("start_order_tracking", move |evt: Arc<DomainEvent>| {
    let store = store.clone();
    async move {
      if let DomainEvent::OrderCreated { order_id, placed_at, .. } = evt.as_ref() {
        store.create_tracking(&OrderTracking::new(order_id, *placed_at)).await?;
        info!(%order_id, "Tracking started in 'checking'.");
      }
      Ok::<_, AppError>(())
    }
  });

  let notifier = app_state.notifier.clone();
  events.subscribe("notify_registration", move |evt: Arc<DomainEvent>| {
    let notifier = notifier.clone();
    async move {
      if let DomainEvent::UserRegistered { user_id, full_name, .. } = evt.as_ref() {
        let desc = format!("Welcome {}, verify your email to start shopping", full_name);
        record(&notifier, NotificationKind::Activity, "Welcome", &desc, *user_id).await;
      }
      Ok::<_, AppError>(())
    }
  });

  let notifier = app_state.notifier.clone();
  events.subscribe("notify_payment", move |evt: Arc<DomainEvent>| {
    let notifier = notifier.clone();
    async move {
      if let DomainEvent::PaymentCompleted { customer_id, product_titles, .. } = evt.as_ref() {
        let desc = format!("You have successfully paid for {}", product_titles.join(", "));
        record(&notifier, NotificationKind::Activity, "Payment Successful", &desc, *customer_id).await;
      }
      Ok::<_, AppError>(())
    }
  });

  let notifier = app_state.notifier.clone();
  events.subscribe("notify_delivery", move |evt: Arc<DomainEvent>| {
    let notifier = notifier.clone();
    async move {
      if let DomainEvent::OrderDelivered { customer_id, .. } = evt.as_ref() {
        record(&notifier, NotificationKind::Activity, "Order Delivery", "Your order has been delivered", *customer_id).await;
      }
      Ok::<_, AppError>(())
    }
  });

  info!(subscribers = ?events.subscriber_names(), "Domain event subscribers registered.");
}
