// storefront/src/services/auth_service.rs

//! Password hashing (Argon2) and bearer tokens (HS256 JWT). Signin hands out
//! a short-lived access token and a longer refresh token; each is only
//! accepted where its kind is expected.

use crate::config::AppConfig;
use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String, // user id
  pub email: String,
  pub jti: String,
  pub typ: TokenKind,
  pub iat: i64,
  pub exp: i64,
}

/// Hashes a plain-text password using Argon2 with a random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Returns `Ok(false)` on a mismatch; errors only for unusable input or a
/// corrupt stored hash.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Err(AppError::Auth("Invalid email or password".to_string()));
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other) => Err(AppError::Internal(format!("Password verification process failed: {}", other))),
  }
}

fn encode_token(config: &AppConfig, user_id: Uuid, email: &str, typ: TokenKind, ttl_secs: i64) -> Result<String, AppError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user_id.to_string(),
    email: email.to_string(),
    jti: Uuid::new_v4().to_string(),
    typ,
    iat: now.timestamp(),
    exp: (now + Duration::seconds(ttl_secs)).timestamp(),
  };

  encode(
    &Header::new(Algorithm::HS256),
    &claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )
  .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))
}

/// Access token for the `Authorization: Bearer` header.
#[instrument(name = "auth_service::issue_token", skip(config, email), err(Display))]
pub fn issue_token(config: &AppConfig, user_id: Uuid, email: &str) -> Result<String, AppError> {
  encode_token(config, user_id, email, TokenKind::Access, config.jwt_ttl_secs)
}

#[instrument(name = "auth_service::issue_refresh_token", skip(config, email), err(Display))]
pub fn issue_refresh_token(config: &AppConfig, user_id: Uuid, email: &str) -> Result<String, AppError> {
  encode_token(config, user_id, email, TokenKind::Refresh, config.jwt_refresh_ttl_secs)
}

/// Validates an access token's signature and expiry and returns the user id
/// it names.
pub fn validate_token(config: &AppConfig, token: &str) -> Result<Uuid, AppError> {
  validate_kind(config, token, TokenKind::Access)
}

pub fn validate_refresh_token(config: &AppConfig, token: &str) -> Result<Uuid, AppError> {
  validate_kind(config, token, TokenKind::Refresh)
}

fn validate_kind(config: &AppConfig, token: &str, expected: TokenKind) -> Result<Uuid, AppError> {
  let claims = decode::<Claims>(
    token,
    &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map_err(|e| match e.kind() {
    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Auth("Token has expired".to_string()),
    _ => {
      warn!(error = %e, "Rejected bearer token.");
      AppError::Auth("Invalid token".to_string())
    }
  })?
  .claims;

  if claims.typ != expected {
    warn!(presented = ?claims.typ, ?expected, "Token of the wrong kind.");
    return Err(AppError::Auth("Invalid token".to_string()));
  }
  Uuid::parse_str(&claims.sub).map_err(|_| AppError::Auth("Invalid token".to_string()))
}
