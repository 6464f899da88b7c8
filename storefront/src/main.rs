// storefront/src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use storefront::config::AppConfig;
use storefront::services::gateway::SandboxGateway;
use storefront::services::mailer::LogMailer;
use storefront::state::AppState;
use storefront::store::{seed, MemoryStore, PgStore, Store};
use storefront::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      std::process::exit(1);
    }
  };
  storefront::telemetry::init_tracing(app_config.log_json);
  tracing::info!("Starting storefront server...");

  let store: Arc<dyn Store> = match app_config.database_url.as_deref() {
    Some(url) => {
      let pg = PgStore::connect(url).await.map_err(std::io::Error::other)?;
      pg.migrate().await.map_err(std::io::Error::other)?;
      Arc::new(pg)
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory store.");
      Arc::new(MemoryStore::new())
    }
  };

  if app_config.seed_db {
    if let Err(e) = seed::seed_demo_catalog(store.as_ref()).await {
      tracing::error!(error = %e, "Failed to seed database.");
    }
  }

  let mailer = Arc::new(LogMailer::new(app_config.email_sender.clone()));
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::build(app_config, store, Arc::new(SandboxGateway::new()), mailer, None);

  tracing::info!("Attempting to bind server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
