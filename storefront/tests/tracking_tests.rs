// tests/tracking_tests.rs

mod common;

use common::{test_app, TestApp};
use serial_test::serial;
use storefront::errors::{AppError, Result as AppResult};
use storefront::models::{OrderTracking, TrackingStatus, User};
use storefront::pipelines::contexts::TrackingUpdateCtxData;
use storefront::pipelines::require_completed;
use storefront::store::{NotificationRepository, OrderRepository};
use storefront_flow::ContextData;

async fn placed_order(app: &TestApp, customer: &User) -> String {
  let product = app.product("Tent", 12_000, 3).await;
  let cart_id = app.cart_with(&[(product.id, 1)]).await;
  app.place_order(customer, cart_id).await.unwrap().id
}

async fn advance(app: &TestApp, order_id: &str, next_status: TrackingStatus) -> AppResult<OrderTracking> {
  let ctx = ContextData::new(TrackingUpdateCtxData {
    app_state: app.state.clone(),
    order_id: order_id.to_string(),
    next_status,
    order: None,
    tracking: None,
  });
  require_completed(app.state.flows.run(ctx.clone()).await?)?;
  let tracking = ctx.read().tracking.clone();
  tracking.ok_or_else(|| AppError::Internal("no tracking".to_string()))
}

#[tokio::test]
#[serial]
async fn shipment_moves_forward_and_stamps_each_step_once() {
  let app = test_app();
  let customer = app.user("camper@example.com", false).await;
  let order_id = placed_order(&app, &customer).await;

  let shipped = advance(&app, &order_id, TrackingStatus::InTransit).await.unwrap();
  assert_eq!(shipped.status, TrackingStatus::InTransit);
  let in_transit_at = shipped.in_transit_date.expect("transit stamped");
  assert!(shipped.date_delivered.is_none());

  let delivered = advance(&app, &order_id, TrackingStatus::Delivered).await.unwrap();
  assert_eq!(delivered.status, TrackingStatus::Delivered);
  assert_eq!(delivered.in_transit_date, Some(in_transit_at));
  assert!(delivered.date_delivered.is_some());

  let stored = app.store.get_tracking(&order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, TrackingStatus::Delivered);
  assert_eq!(stored.date_delivered, delivered.date_delivered);
}

#[tokio::test]
#[serial]
async fn repeating_or_reversing_a_status_is_rejected() {
  let app = test_app();
  let customer = app.user("camper@example.com", false).await;
  let order_id = placed_order(&app, &customer).await;

  let err = advance(&app, &order_id, TrackingStatus::Checking).await.unwrap_err();
  assert!(matches!(
    err,
    AppError::InvalidTrackingTransition {
      from: TrackingStatus::Checking,
      to: TrackingStatus::Checking
    }
  ));

  advance(&app, &order_id, TrackingStatus::InTransit).await.unwrap();
  let first_stamp = app.store.get_tracking(&order_id).await.unwrap().unwrap().in_transit_date;

  let err = advance(&app, &order_id, TrackingStatus::InTransit).await.unwrap_err();
  assert!(matches!(err, AppError::InvalidTrackingTransition { .. }));
  let err = advance(&app, &order_id, TrackingStatus::Checking).await.unwrap_err();
  assert_eq!(err.to_string(), "Order cannot move from 'in-transit' to 'checking'");

  let stored = app.store.get_tracking(&order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, TrackingStatus::InTransit);
  assert_eq!(stored.in_transit_date, first_stamp);
}

#[tokio::test]
#[serial]
async fn delivery_can_skip_transit_and_notifies_the_customer() {
  let app = test_app();
  let customer = app.user("camper@example.com", false).await;
  let order_id = placed_order(&app, &customer).await;

  let delivered = advance(&app, &order_id, TrackingStatus::Delivered).await.unwrap();
  assert!(delivered.in_transit_date.is_none());
  assert!(delivered.date_delivered.is_some());

  let notes = app.store.notifications_for(customer.id).await.unwrap();
  let delivery = notes.iter().find(|n| n.title == "Order Delivery").expect("delivery notification");
  assert_eq!(delivery.desc, "Your order has been delivered");
  assert!(!delivery.general);
}

#[tokio::test]
#[serial]
async fn moving_to_transit_sends_no_delivery_notice() {
  let app = test_app();
  let customer = app.user("camper@example.com", false).await;
  let order_id = placed_order(&app, &customer).await;

  advance(&app, &order_id, TrackingStatus::InTransit).await.unwrap();
  let notes = app.store.notifications_for(customer.id).await.unwrap();
  assert!(notes.iter().all(|n| n.title != "Order Delivery"));
}

#[tokio::test]
#[serial]
async fn unknown_orders_cannot_be_tracked() {
  let app = test_app();
  let err = advance(&app, "NOSUCHORDR", TrackingStatus::InTransit).await.unwrap_err();
  assert!(matches!(err, AppError::OrderNotFound(ref id) if id == "NOSUCHORDR"));
}
