// storefront-flow/src/events.rs

//! A small typed event bus.
//!
//! Producers publish a domain event after their own work has committed;
//! subscribers are registered by name at startup and receive every event in
//! subscription order. Each subscriber decides which variants it cares about.

use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Boxed subscriber signature. The event is shared, so a handler can move it
/// into its future without cloning the payload.
pub type EventHandler<E, Err> =
  Arc<dyn Fn(Arc<E>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;

struct Subscriber<E, Err> {
  name: String,
  handler: EventHandler<E, Err>,
}

impl<E, Err> Clone for Subscriber<E, Err> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      handler: Arc::clone(&self.handler),
    }
  }
}

pub struct EventBus<E, Err>
where
  E: std::fmt::Debug + Send + Sync + 'static,
  Err: std::error::Error + Send + Sync + 'static,
{
  subscribers: RwLock<Vec<Subscriber<E, Err>>>,
}

impl<E, Err> Default for EventBus<E, Err>
where
  E: std::fmt::Debug + Send + Sync + 'static,
  Err: std::error::Error + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<E, Err> EventBus<E, Err>
where
  E: std::fmt::Debug + Send + Sync + 'static,
  Err: std::error::Error + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      subscribers: RwLock::new(Vec::new()),
    }
  }

  /// Adds a subscriber. Names are for logs and introspection; they need not be unique.
  pub fn subscribe<F, UserErr>(&self, name: &str, handler_fn: impl Fn(Arc<E>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    let handler: EventHandler<E, Err> = Arc::new(move |evt| {
      let fut = handler_fn(evt);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.subscribers.write().push(Subscriber {
      name: name.to_string(),
      handler,
    });
    event!(Level::DEBUG, subscriber = %name, "Event subscriber registered.");
  }

  pub fn subscriber_names(&self) -> Vec<String> {
    self.subscribers.read().iter().map(|s| s.name.clone()).collect()
  }

  /// Delivers `evt` to every subscriber, one after another.
  ///
  /// Returns how many subscribers ran. The first failing subscriber aborts
  /// delivery to the rest and its error is returned.
  #[instrument(name = "EventBus::publish", skip_all, fields(event = ?evt), err(Display))]
  pub async fn publish(&self, evt: E) -> Result<usize, Err> {
    // Snapshot so the lock is not held while subscribers await.
    let subscribers: Vec<Subscriber<E, Err>> = self.subscribers.read().clone();
    let evt = Arc::new(evt);

    for (delivered, sub) in subscribers.iter().enumerate() {
      if let Err(e) = (sub.handler)(Arc::clone(&evt)).await {
        event!(Level::WARN, subscriber = %sub.name, delivered, error = %e, "Event subscriber failed.");
        return Err(e);
      }
    }
    Ok(subscribers.len())
  }
}
