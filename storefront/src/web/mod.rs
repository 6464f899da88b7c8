// storefront/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AuthenticatedUser;
pub use routes::configure_app_routes;

use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope shared by every endpoint.
pub fn envelope<T: Serialize>(message: &str, data: T) -> Value {
  json!({ "message": message, "status": true, "data": data })
}
