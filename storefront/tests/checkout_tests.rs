// tests/checkout_tests.rs

mod common;

use common::{placement, test_app};
use serial_test::serial;
use storefront::errors::AppError;
use storefront::models::{PaymentStatus, TrackingStatus};
use storefront::services::order_ids::RandomOrderIds;
use storefront::store::{CartRepository, OrderRepository};

#[tokio::test]
#[serial]
async fn placing_an_order_reserves_stock_and_consumes_the_cart() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let product = app.product("Lamp", 4_000, 5).await;
  let cart_id = app.cart_with(&[(product.id, 2)]).await;

  let order = app.place_order(&customer, cart_id).await.expect("order should be placed");

  assert_eq!(order.id.len(), 10);
  assert!(order.id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
  assert_eq!(order.payment_status, PaymentStatus::Pending);
  assert_eq!(order.items.len(), 1);
  assert_eq!(order.items[0].quantity, 2);
  assert_eq!(order.items[0].unit_price_cents, 4_000);
  assert_eq!(order.items_total_cents(), 8_000);

  assert_eq!(app.product_inventory(product.id).await, 3);
  assert!(app.store.get_cart(cart_id).await.unwrap().is_none());

  let tracking = app.store.get_tracking(&order.id).await.unwrap().expect("tracking starts with the order");
  assert_eq!(tracking.status, TrackingStatus::Checking);
  assert_eq!(tracking.checking_date, order.placed_at);
  assert!(tracking.in_transit_date.is_none());
}

#[tokio::test]
#[serial]
async fn shortfall_writes_nothing() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let product = app.product("Lamp", 4_000, 5).await;
  let cart_id = app.cart_with(&[(product.id, 10)]).await;

  match app.place_order(&customer, cart_id).await {
    Err(AppError::InsufficientInventory {
      product_id,
      requested,
      available,
      ..
    }) => {
      assert_eq!(product_id, product.id);
      assert_eq!(requested, 10);
      assert_eq!(available, 5);
    }
    other => panic!("expected insufficient inventory, got {:?}", other.map(|o| o.id)),
  }

  assert_eq!(app.product_inventory(product.id).await, 5);
  assert_eq!(app.store.order_count(), 0);
  assert!(app.store.get_cart(cart_id).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn one_short_line_rejects_the_whole_cart() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let plenty = app.product("Pen", 150, 100).await;
  let scarce = app.product("Notebook", 900, 1).await;
  let cart_id = app.cart_with(&[(plenty.id, 3), (scarce.id, 2)]).await;

  assert!(matches!(
    app.place_order(&customer, cart_id).await,
    Err(AppError::InsufficientInventory { .. })
  ));
  assert_eq!(app.product_inventory(plenty.id).await, 100);
  assert_eq!(app.product_inventory(scarce.id).await, 1);
}

#[tokio::test]
#[serial]
async fn empty_or_missing_cart_is_rejected() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;

  let empty = app.cart_with(&[]).await;
  let err = app.place_order(&customer, empty).await.unwrap_err();
  assert!(matches!(err, AppError::EmptyOrMissingCart(_)));
  assert_eq!(err.to_string(), "The cart is empty.");

  let err = app.place_order(&customer, uuid::Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.to_string(), "No cart with the given ID was found.");
}

#[tokio::test]
#[serial]
async fn colliding_order_ids_are_regenerated() {
  let app = common::test_app_with_ids(&["AAAAAAAAAA", "AAAAAAAAAA", "BBBBBBBBBB"]);
  let customer = app.user("buyer@example.com", false).await;
  let product = app.product("Lamp", 4_000, 5).await;

  let first = app.place_order(&customer, app.cart_with(&[(product.id, 1)]).await).await.unwrap();
  let second = app.place_order(&customer, app.cart_with(&[(product.id, 1)]).await).await.unwrap();

  assert_eq!(first.id, "AAAAAAAAAA");
  assert_eq!(second.id, "BBBBBBBBBB");
  assert_eq!(app.store.order_count(), 2);
}

#[tokio::test]
#[serial]
async fn variant_rows_set_price_and_availability() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let shirt = app.product("Shirt", 2_000, 20).await;
  app.variant(shirt.id, Some("red"), None, 4, Some(150)).await;

  let cart_id = app.store.create_cart().await.unwrap().id;
  app.add_to_cart(cart_id, shirt.id, 3, Some("Red"), None).await.unwrap();
  let order = app.place_order(&customer, cart_id).await.unwrap();

  assert_eq!(order.items[0].unit_price_cents, 2_150);
  assert_eq!(order.items[0].color.as_deref(), Some("Red"));
  assert_eq!(app.variant_quantity(shirt.id, Some("red"), None).await, 1);
  assert_eq!(app.product_inventory(shirt.id).await, 17);

  // Only one red left, even though the product total says 17.
  let cart_id = app.store.create_cart().await.unwrap().id;
  app.store.add_cart_item(cart_id, shirt.id, 2, Some("red"), None).await.unwrap();
  assert!(matches!(
    app.place_order(&customer, cart_id).await,
    Err(AppError::InsufficientInventory { available: 1, .. })
  ));
}

#[tokio::test]
#[serial]
async fn cart_edited_after_resolution_is_not_silently_dropped() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let lamp = app.product("Lamp", 4_000, 5).await;
  let mug = app.product("Mug", 1_250, 5).await;
  let cart_id = app.cart_with(&[(lamp.id, 1)]).await;

  // Resolved from the cart as it was, then the cart grows.
  let resolved = placement(cart_id, customer.id, &[(&lamp, 1)]);
  app.store.add_cart_item(cart_id, mug.id, 2, None, None).await.unwrap();

  let ids = RandomOrderIds::new(10);
  let err = app.store.place_order(&resolved, &ids).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(app.store.order_count(), 0);
  assert_eq!(app.product_inventory(lamp.id).await, 5);
  assert_eq!(app.store.get_cart(cart_id).await.unwrap().unwrap().items.len(), 2);

  // A fresh run picks up both lines.
  let order = app.place_order(&customer, cart_id).await.unwrap();
  assert_eq!(order.items.len(), 2);
  assert_eq!(app.product_inventory(mug.id).await, 3);
}

#[tokio::test]
#[serial]
async fn oversized_placement_totals_are_rejected() {
  let app = test_app();
  let customer = app.user("buyer@example.com", false).await;
  let tee = app.product("Tee", 1_999, 10).await;
  let cart = app.store.create_cart().await.unwrap();
  app.store.add_cart_item(cart.id, tee.id, i32::MAX, Some("black"), None).await.unwrap();
  app.store.add_cart_item(cart.id, tee.id, 1, Some("white"), None).await.unwrap();

  let err = app.place_order(&customer, cart.id).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_) | AppError::InsufficientInventory { .. }));
  assert_eq!(app.product_inventory(tee.id).await, 10);
  assert_eq!(app.store.order_count(), 0);
}
