// storefront/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::models::User;
use crate::services::auth_service;
use crate::state::AppState;

/// The caller named by a `Bearer` JWT. The account must still exist and be
/// active.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
  pub fn id(&self) -> uuid::Uuid {
    self.0.id
  }

  pub fn is_staff(&self) -> bool {
    self.0.is_staff
  }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
  Some(token.trim().to_string())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let app_state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req);

    Box::pin(async move {
      let app_state = app_state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth("Authentication credentials were not provided.".to_string()))?;

      let user_id = auth_service::validate_token(&app_state.config, &token)?;
      let user = app_state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".to_string()))?;
      if !user.is_active {
        warn!(%user_id, "Token presented for an inactive account.");
        return Err(AppError::Auth("User is inactive".to_string()));
      }
      Ok(AuthenticatedUser(user))
    })
  }
}
