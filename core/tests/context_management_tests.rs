// tests/context_management_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storefront_flow::{ContextData, Pipeline, PipelineControl};

#[tokio::test]
#[serial]
async fn test_context_data_is_shared_across_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("write", false, None), ("read", false, None)]);
  pipeline.on_root("write", |ctx: ContextData<TestContext>| async move {
    ctx.write().message = "written by first step".to_string();
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on_root("read", |ctx: ContextData<TestContext>| async move {
    let seen = { ctx.read().message.clone() };
    ctx.write().steps_executed.push(seen);
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().steps_executed, vec!["written by first step"]);
}

#[tokio::test]
#[serial]
async fn test_context_data_clone_shares_data() {
  setup_tracing();
  let original = ContextData::new(TestContext::default());
  let handle = original.clone();
  assert!(handle.same_as(&original));

  handle.write().counter = 10;
  assert_eq!(original.read().counter, 10);

  let unrelated = ContextData::new(TestContext::default());
  assert!(!unrelated.same_as(&original));
}

#[tokio::test]
#[serial]
async fn test_context_data_mapped_guards() {
  setup_tracing();
  let ctx = ContextData::new(TestContext::default());
  {
    let mut message = ctx.map_write(|c| &mut c.message);
    message.push_str("mapped");
  }
  assert_eq!(&*ctx.map_read(|c| c.message.as_str()), "mapped");

  let write_guard = ctx.write();
  assert!(ctx.try_read().is_none());
  drop(write_guard);
  assert!(ctx.try_write().is_some());
}

#[tokio::test]
#[serial]
async fn test_context_data_locks_released_before_await() {
  setup_tracing();
  let ctx = ContextData::new(TestContext::default());

  let initial_count = { ctx.read().counter };
  tokio::time::sleep(std::time::Duration::from_millis(1)).await;
  {
    ctx.write().counter = initial_count + 1;
  }

  assert_eq!(ctx.read().counter, 1);
}
