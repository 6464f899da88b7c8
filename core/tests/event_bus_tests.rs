// tests/event_bus_tests.rs
mod common;

use common::*;
use parking_lot::Mutex;
use std::sync::Arc;
use storefront_flow::EventBus;

#[derive(Debug, Clone, PartialEq)]
enum ShopEvent {
  Placed(u32),
  Shipped(u32),
}

#[tokio::test]
async fn test_publish_reaches_subscribers_in_order() {
  setup_tracing();
  let bus = EventBus::<ShopEvent, TestError>::new();
  let log = Arc::new(Mutex::new(Vec::<String>::new()));

  let first_log = log.clone();
  bus.subscribe("first", move |evt: Arc<ShopEvent>| {
    let log = first_log.clone();
    async move {
      log.lock().push(format!("first:{:?}", evt));
      Ok::<_, TestError>(())
    }
  });
  let second_log = log.clone();
  bus.subscribe("placed_only", move |evt: Arc<ShopEvent>| {
    let log = second_log.clone();
    async move {
      if let ShopEvent::Placed(id) = *evt {
        log.lock().push(format!("placed:{}", id));
      }
      Ok::<_, TestError>(())
    }
  });

  assert_eq!(bus.subscriber_names(), vec!["first", "placed_only"]);
  assert_eq!(bus.publish(ShopEvent::Placed(7)).await, Ok(2));
  assert_eq!(bus.publish(ShopEvent::Shipped(7)).await, Ok(2));

  assert_eq!(
    *log.lock(),
    vec!["first:Placed(7)".to_string(), "placed:7".to_string(), "first:Shipped(7)".to_string()]
  );
}

#[tokio::test]
async fn test_failing_subscriber_aborts_delivery() {
  setup_tracing();
  let bus = EventBus::<ShopEvent, TestError>::new();
  let reached = Arc::new(Mutex::new(false));

  bus.subscribe("broken", |_evt: Arc<ShopEvent>| async move { Err::<(), _>(TestError::Handler("down".to_string())) });
  let reached_flag = reached.clone();
  bus.subscribe("after_broken", move |_evt: Arc<ShopEvent>| {
    let reached = reached_flag.clone();
    async move {
      *reached.lock() = true;
      Ok::<_, TestError>(())
    }
  });

  assert_eq!(bus.publish(ShopEvent::Placed(1)).await, Err(TestError::Handler("down".to_string())));
  assert!(!*reached.lock());
}

#[tokio::test]
async fn test_publish_without_subscribers() {
  setup_tracing();
  let bus = EventBus::<ShopEvent, TestError>::default();
  assert_eq!(bus.publish(ShopEvent::Shipped(3)).await, Ok(0));
}
