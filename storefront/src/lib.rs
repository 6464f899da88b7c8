// storefront/src/lib.rs

//! Storefront backend: catalog, carts, orders, payment and shipment
//! tracking over HTTP, with each multi-step workflow expressed as a
//! `storefront_flow` pipeline.

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
