// tests/cart_tests.rs

mod common;

use common::test_app;
use serial_test::serial;
use storefront::errors::AppError;
use storefront::store::CartRepository;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn same_selection_merges_into_one_line() {
  let app = test_app();
  let tee = app.product("Tee", 1_999, 10).await;
  app.variant(tee.id, Some("black"), None, 6, None).await;
  let cart = app.store.create_cart().await.unwrap();

  app.add_to_cart(cart.id, tee.id, 2, Some("black"), None).await.unwrap();
  app.add_to_cart(cart.id, tee.id, 1, Some("black"), None).await.unwrap();
  app.add_to_cart(cart.id, tee.id, 1, None, None).await.unwrap();

  let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
  assert_eq!(cart.items.len(), 2);
  let black = cart.items.iter().find(|i| i.color.as_deref() == Some("black")).unwrap();
  assert_eq!(black.quantity, 3);
}

#[tokio::test]
#[serial]
async fn stock_check_counts_what_is_already_in_the_cart() {
  let app = test_app();
  let mug = app.product("Mug", 1_250, 3).await;
  let cart = app.store.create_cart().await.unwrap();

  app.add_to_cart(cart.id, mug.id, 2, None, None).await.unwrap();
  let err = app.add_to_cart(cart.id, mug.id, 2, None, None).await.unwrap_err();
  match err {
    AppError::InsufficientInventory { requested, available, .. } => {
      assert_eq!(requested, 4);
      assert_eq!(available, 3);
    }
    other => panic!("expected InsufficientInventory, got {other:?}"),
  }

  // Adding to the cart reserves nothing.
  assert_eq!(app.product_inventory(mug.id).await, 3);
  let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
  assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
#[serial]
async fn selections_outside_the_variant_rows_are_rejected() {
  let app = test_app();
  let tee = app.product("Tee", 1_999, 10).await;
  app.variant(tee.id, None, Some("M"), 5, None).await;
  let cart = app.store.create_cart().await.unwrap();

  let err = app.add_to_cart(cart.id, tee.id, 1, None, Some("XXL")).await.unwrap_err();
  assert_eq!(err.to_string(), "We don't have that size for this specific product!");

  let err = app.add_to_cart(cart.id, tee.id, 1, Some("green"), None).await.unwrap_err();
  assert_eq!(err.to_string(), "We don't have that color for this specific product!");

  // Blank selections are treated as none.
  app.add_to_cart(cart.id, tee.id, 1, Some(" "), Some("m")).await.unwrap();
  let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
  assert_eq!(cart.items[0].color, None);
}

#[tokio::test]
#[serial]
async fn bad_quantities_and_unknown_ids_are_rejected() {
  let app = test_app();
  let mug = app.product("Mug", 1_250, 3).await;
  let cart = app.store.create_cart().await.unwrap();

  let err = app.add_to_cart(cart.id, mug.id, 0, None, None).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));

  let err = app.add_to_cart(cart.id, Uuid::new_v4(), 1, None, None).await.unwrap_err();
  assert_eq!(err.to_string(), "No product with the given ID was found.");

  let err = app.add_to_cart(Uuid::new_v4(), mug.id, 1, None, None).await.unwrap_err();
  assert!(matches!(err, AppError::EmptyOrMissingCart(_)));
}

#[tokio::test]
#[serial]
async fn setting_a_line_quantity_checks_stock() {
  let app = test_app();
  let tee = app.product("Tee", 1_999, 10).await;
  app.variant(tee.id, Some("black"), None, 4, None).await;
  let cart = app.store.create_cart().await.unwrap();
  app.add_to_cart(cart.id, tee.id, 1, Some("black"), None).await.unwrap();
  let line_id = app.store.get_cart(cart.id).await.unwrap().unwrap().items[0].id;

  let line = app.update_cart_item(cart.id, line_id, 4).await.unwrap();
  assert_eq!(line.quantity, 4);

  match app.update_cart_item(cart.id, line_id, 5).await.unwrap_err() {
    AppError::InsufficientInventory { requested, available, .. } => {
      assert_eq!(requested, 5);
      assert_eq!(available, 4);
    }
    other => panic!("expected InsufficientInventory, got {other:?}"),
  }
  let err = app.update_cart_item(cart.id, line_id, 0).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let err = app.update_cart_item(cart.id, Uuid::new_v4(), 1).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));

  let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
  assert_eq!(cart.items[0].quantity, 4);
}

#[tokio::test]
#[serial]
async fn huge_quantities_are_rejected_without_overflowing() {
  let app = test_app();
  let mug = app.product("Mug", 1_250, 3).await;
  let cart = app.store.create_cart().await.unwrap();
  let line = app.store.add_cart_item(cart.id, mug.id, i32::MAX, None, None).await.unwrap();

  let err = app.add_to_cart(cart.id, mug.id, 1, None, None).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(err.to_string(), "Quantity is too large.");

  let err = app.store.add_cart_item(cart.id, mug.id, 1, None, None).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));

  let err = app.update_cart_item(cart.id, line.id, i32::MAX).await.unwrap_err();
  assert!(matches!(err, AppError::InsufficientInventory { .. }));

  let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
  assert_eq!(cart.items[0].quantity, i32::MAX);
}
