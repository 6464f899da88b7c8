// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::{self, DomainEventBus};
use crate::pipelines;
use crate::services::gateway::PaymentGateway;
use crate::services::mailer::Mailer;
use crate::services::notifier::Notifier;
use crate::services::order_ids::{OrderIdSource, RandomOrderIds};
use crate::store::Store;
use std::sync::Arc;
use storefront_flow::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub mailer: Arc<dyn Mailer>,
  pub notifier: Notifier,
  pub order_ids: Arc<dyn OrderIdSource>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub events: Arc<DomainEventBus>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state and registers every pipeline and event subscriber.
  pub fn build(
    config: AppConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    order_ids: Option<Arc<dyn OrderIdSource>>,
  ) -> Self {
    let order_ids = order_ids.unwrap_or_else(|| Arc::new(RandomOrderIds::new(config.order_id_length)));
    let state = AppState {
      notifier: Notifier::new(store.clone()),
      store,
      gateway,
      mailer,
      order_ids,
      flows: Arc::new(FlowRegistry::new()),
      events: Arc::new(DomainEventBus::new()),
      config: Arc::new(config),
    };

    pipelines::register_all_pipelines(&state.flows, &state);
    events::register_subscribers(&state.events, &state);
    state
  }
}
