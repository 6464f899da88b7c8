use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use storefront_flow::{ContextData, EventBus, FlowError, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

#[derive(Debug)]
struct BenchEvent(u64);

fn step_names(num_steps: usize) -> Vec<&'static str> {
  (0..num_steps)
    .map(|i| Box::leak(format!("step_{}", i).into_boxed_str()) as &'static str)
    .collect()
}

fn build_pipeline(num_steps: usize, delay_micros: u64) -> Pipeline<BenchContext, FlowError> {
  let names = step_names(num_steps);
  let defs: Vec<(&str, bool, Option<SkipCondition<BenchContext>>)> = names.iter().map(|n| (*n, false, None)).collect();
  let mut pipeline = Pipeline::<BenchContext, FlowError>::new(&defs);
  for name in names {
    pipeline.on_root(name, move |ctx: ContextData<BenchContext>| async move {
      if delay_micros > 0 {
        tokio::time::sleep(std::time::Duration::from_micros(delay_micros)).await;
      }
      ctx.write().counter += 1;
      Ok::<_, FlowError>(PipelineControl::Continue)
    });
  }
  pipeline
}

fn bench_pipeline_steps(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineSteps");
  let rt = Runtime::new().unwrap();

  for num_steps in [1usize, 5, 10] {
    for delay_us in [0u64, 10] {
      let pipeline = Arc::new(build_pipeline(num_steps, delay_us));
      group.throughput(Throughput::Elements(num_steps as u64));
      group.bench_with_input(
        BenchmarkId::new(format!("{}steps", num_steps), delay_us),
        &delay_us,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || ContextData::new(BenchContext::default()),
            |ctx| {
              let p = pipeline.clone();
              async move { p.run(ctx).await.unwrap() }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let registry = Arc::new(FlowRegistry::<FlowError>::new());
  registry.register_pipeline(build_pipeline(1, 0));

  c.bench_function("RegistryDispatch/one_step", |b| {
    b.to_async(&rt).iter_batched(
      || ContextData::new(BenchContext::default()),
      |ctx| {
        let r = registry.clone();
        async move { r.run(ctx).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
}

fn bench_event_publish(c: &mut Criterion) {
  let mut group = c.benchmark_group("EventPublish");
  let rt = Runtime::new().unwrap();

  for num_subscribers in [1usize, 4, 16] {
    let bus = Arc::new(EventBus::<BenchEvent, FlowError>::new());
    for i in 0..num_subscribers {
      bus.subscribe(&format!("sub_{}", i), |evt: Arc<BenchEvent>| async move {
        criterion::black_box(evt.0);
        Ok::<_, FlowError>(())
      });
    }
    group.bench_with_input(BenchmarkId::from_parameter(num_subscribers), &num_subscribers, |b, _| {
      b.to_async(&rt).iter(|| {
        let bus = bus.clone();
        async move { bus.publish(BenchEvent(42)).await.unwrap() }
      });
    });
  }
  group.finish();
}

criterion_group!(benches, bench_pipeline_steps, bench_registry_dispatch, bench_event_publish);
criterion_main!(benches);
