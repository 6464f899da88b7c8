// storefront/src/services/mod.rs

pub mod auth_service;
pub mod gateway;
pub mod inventory;
pub mod mailer;
pub mod notifier;
pub mod order_ids;
pub mod otp;
