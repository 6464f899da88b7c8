// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Process configuration, loaded once at startup and handed to every
/// component through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Postgres when set; the in-memory store otherwise.
  pub database_url: Option<String>,

  /// Flat fee added once per payment, whatever the number of orders paid.
  pub shipping_fee_cents: i64,
  pub currency: String,

  pub jwt_secret: String,
  pub jwt_ttl_secs: i64,
  /// Lifetime of the refresh token handed out at signin.
  pub jwt_refresh_ttl_secs: i64,

  pub otp_secret: String,
  pub otp_ttl_secs: i64,
  pub otp_max_attempts: i32,

  pub order_id_length: usize,
  pub email_sender: String,

  pub seed_db: bool,
  pub log_json: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      shipping_fee_cents: 0,
      currency: "usd".to_string(),
      jwt_secret: "dev-only-jwt-secret".to_string(),
      jwt_ttl_secs: 86_400,
      jwt_refresh_ttl_secs: 604_800,
      otp_secret: "dev-only-otp-secret".to_string(),
      otp_ttl_secs: 300,
      otp_max_attempts: 5,
      order_id_length: 10,
      email_sender: "noreply@example.com".to_string(),
      seed_db: false,
      log_json: false,
    }
  }
}

fn parse_var<T>(name: &str, raw: String) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = AppConfig::default();
    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    // Secrets may only fall back to the dev defaults in debug builds.
    let secret = |var_name: &str, fallback: &str| -> Result<String> {
      match get_env(var_name) {
        Some(v) => Ok(v),
        None if cfg!(debug_assertions) => {
          tracing::warn!("{} not set, using development default.", var_name);
          Ok(fallback.to_string())
        }
        None => Err(AppError::Config(format!("Missing environment variable '{}'", var_name))),
      }
    };

    let config = Self {
      server_host: get_env("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: get_env("SERVER_PORT").map(|v| parse_var("SERVER_PORT", v)).transpose()?.unwrap_or(defaults.server_port),
      database_url: get_env("DATABASE_URL"),
      shipping_fee_cents: get_env("SHIPPING_FEE_CENTS")
        .map(|v| parse_var("SHIPPING_FEE_CENTS", v))
        .transpose()?
        .unwrap_or(defaults.shipping_fee_cents),
      currency: get_env("CURRENCY").map(|c| c.to_lowercase()).unwrap_or(defaults.currency),
      jwt_secret: secret("JWT_SECRET", &defaults.jwt_secret)?,
      jwt_ttl_secs: get_env("JWT_TTL_SECS").map(|v| parse_var("JWT_TTL_SECS", v)).transpose()?.unwrap_or(defaults.jwt_ttl_secs),
      jwt_refresh_ttl_secs: get_env("JWT_REFRESH_TTL_SECS")
        .map(|v| parse_var("JWT_REFRESH_TTL_SECS", v))
        .transpose()?
        .unwrap_or(defaults.jwt_refresh_ttl_secs),
      otp_secret: secret("OTP_SECRET", &defaults.otp_secret)?,
      otp_ttl_secs: get_env("OTP_TTL_SECS").map(|v| parse_var("OTP_TTL_SECS", v)).transpose()?.unwrap_or(defaults.otp_ttl_secs),
      otp_max_attempts: get_env("OTP_MAX_ATTEMPTS")
        .map(|v| parse_var("OTP_MAX_ATTEMPTS", v))
        .transpose()?
        .unwrap_or(defaults.otp_max_attempts),
      order_id_length: get_env("ORDER_ID_LENGTH")
        .map(|v| parse_var("ORDER_ID_LENGTH", v))
        .transpose()?
        .unwrap_or(defaults.order_id_length),
      email_sender: get_env("EMAIL_SENDER").unwrap_or(defaults.email_sender),
      seed_db: get_env("SEED_DB").map(|v| parse_var("SEED_DB", v)).transpose()?.unwrap_or(defaults.seed_db),
      log_json: get_env("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(defaults.log_json),
    };

    if config.shipping_fee_cents < 0 {
      return Err(AppError::Config("SHIPPING_FEE_CENTS cannot be negative".to_string()));
    }
    if !(6..=32).contains(&config.order_id_length) {
      return Err(AppError::Config("ORDER_ID_LENGTH must be between 6 and 32".to_string()));
    }

    tracing::info!(
      store = if config.database_url.is_some() { "postgres" } else { "memory" },
      shipping_fee_cents = config.shipping_fee_cents,
      "Application configuration loaded successfully."
    );
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_var_reports_variable_name() {
    let err = parse_var::<u16>("SERVER_PORT", "eighty".to_string()).unwrap_err();
    assert!(err.to_string().contains("SERVER_PORT"));
    assert_eq!(parse_var::<i64>("SHIPPING_FEE_CENTS", " 500 ".to_string()).unwrap(), 500);
  }

  #[test]
  fn defaults_match_documented_values() {
    let cfg = AppConfig::default();
    assert_eq!(cfg.order_id_length, 10);
    assert_eq!(cfg.currency, "usd");
    assert_eq!(cfg.otp_max_attempts, 5);
  }
}
