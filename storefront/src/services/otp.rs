// storefront/src/services/otp.rs

//! Counter-based one-time codes (HOTP over HMAC-SHA256).
//!
//! Only the counter is stored. Issuing a code advances it and restarts the
//! attempt budget; a successful verification consumes the code.

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use crate::models::OtpState;
use crate::store::AccountRepository;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, instrument, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const OTP_DIGITS: u32 = 6;

/// RFC 4226 dynamic truncation, keyed per user.
pub fn code_for(secret: &str, user_id: Uuid, counter: i64) -> AppResult<String> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("Invalid OTP secret: {}", e)))?;
  mac.update(user_id.as_bytes());
  mac.update(&counter.to_be_bytes());
  let digest = mac.finalize().into_bytes();

  let offset = (digest[digest.len() - 1] & 0x0f) as usize;
  let binary = u32::from_be_bytes([digest[offset] & 0x7f, digest[offset + 1], digest[offset + 2], digest[offset + 3]]);
  let code = binary % 10u32.pow(OTP_DIGITS);
  Ok(format!("{:0width$}", code, width = OTP_DIGITS as usize))
}

/// Issues a fresh code for `user_id` and returns it for delivery.
#[instrument(name = "otp::issue", skip(accounts, config), err(Display))]
pub async fn issue<A: AccountRepository + ?Sized>(accounts: &A, config: &AppConfig, user_id: Uuid, now: DateTime<Utc>) -> AppResult<String> {
  let mut state = accounts.load_otp(user_id).await?.unwrap_or_else(|| OtpState::new(user_id));
  state.counter += 1;
  state.issued_at = Some(now);
  state.failed_attempts = 0;
  accounts.save_otp(&state).await?;

  info!(counter = state.counter, "OTP issued.");
  code_for(&config.otp_secret, user_id, state.counter)
}

/// Checks `code` against the outstanding one. Wrong codes count against
/// the attempt budget; once it is spent only a new code helps.
#[instrument(name = "otp::verify", skip(accounts, config, code), err(Display))]
pub async fn verify<A: AccountRepository + ?Sized>(accounts: &A, config: &AppConfig, user_id: Uuid, code: &str, now: DateTime<Utc>) -> AppResult<()> {
  let mut state = accounts
    .load_otp(user_id)
    .await?
    .ok_or_else(|| AppError::Otp("Invalid otp".to_string()))?;
  let issued_at = state.issued_at.ok_or_else(|| AppError::Otp("Invalid otp".to_string()))?;

  if state.failed_attempts >= config.otp_max_attempts {
    warn!("OTP locked after too many attempts.");
    return Err(AppError::Otp("Too many invalid attempts. Request a new otp".to_string()));
  }
  if now - issued_at > Duration::seconds(config.otp_ttl_secs) {
    return Err(AppError::Otp("The otp has expired. Request a new one".to_string()));
  }

  let expected = code_for(&config.otp_secret, user_id, state.counter)?;
  if expected != code.trim() {
    state.failed_attempts += 1;
    accounts.save_otp(&state).await?;
    warn!(failed_attempts = state.failed_attempts, "OTP mismatch.");
    return Err(AppError::Otp("Invalid otp".to_string()));
  }

  state.issued_at = None;
  state.failed_attempts = 0;
  accounts.save_otp(&state).await?;
  info!("OTP verified.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  #[test]
  fn codes_are_six_digits_and_counter_dependent() {
    let user = Uuid::new_v4();
    let a = code_for("secret", user, 1).unwrap();
    let b = code_for("secret", user, 2).unwrap();
    assert_eq!(a.len(), 6);
    assert!(a.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(a, code_for("secret", user, 1).unwrap());
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn verified_code_is_consumed() {
    let store = MemoryStore::new();
    let config = AppConfig::default();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let code = issue(&store, &config, user, now).await.unwrap();
    verify(&store, &config, user, &code, now).await.unwrap();
    assert!(matches!(verify(&store, &config, user, &code, now).await, Err(AppError::Otp(_))));
  }

  #[tokio::test]
  async fn expired_and_exhausted_codes_are_rejected() {
    let store = MemoryStore::new();
    let config = AppConfig::default();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let code = issue(&store, &config, user, now).await.unwrap();
    let later = now + Duration::seconds(config.otp_ttl_secs + 1);
    assert!(verify(&store, &config, user, &code, later).await.is_err());

    let code = issue(&store, &config, user, now).await.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    for _ in 0..config.otp_max_attempts {
      assert!(verify(&store, &config, user, wrong, now).await.is_err());
    }
    // Budget spent: even the right code is refused.
    assert!(verify(&store, &config, user, &code, now).await.is_err());
  }
}
