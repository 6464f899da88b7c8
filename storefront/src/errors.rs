// storefront/src/errors.rs

use crate::models::TrackingStatus;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront_flow::FlowError;
use thiserror::Error;
use uuid::Uuid;

/// Every failure a request can end in. The `Display` text is what the
/// client sees in the `message` field of the error envelope.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  /// Checkout against a cart that does not exist or holds nothing.
  #[error("{0}")]
  EmptyOrMissingCart(String),

  #[error("There is not enough product to complete the order")]
  InsufficientInventory {
    product_id: Uuid,
    product: String,
    requested: i32,
    available: i32,
  },

  #[error("You don't have any order with that ID")]
  OrderNotFound(String),

  #[error("Payment made already!")]
  AlreadyPaid(String),

  #[error("A payment for this order is already in progress")]
  PaymentInProgress(String),

  #[error("You don't have any shipping address with that ID!")]
  AddressNotFound(Uuid),

  #[error("You don't have a payment method with that ID!")]
  PaymentMethodNotFound(String),

  #[error("No tracking record exists for order {0}")]
  TrackingNotFound(String),

  #[error("Order cannot move from '{from}' to '{to}'")]
  InvalidTrackingTransition { from: TrackingStatus, to: TrackingStatus },

  #[error("{0}")]
  PaymentDeclined(String),

  /// Raised by the payment gateway; the message is passed through untouched.
  #[error("{0}")]
  Gateway(String),

  #[error("{0}")]
  Otp(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A pipeline stopped before producing what the handler needs.
  #[error("Request was halted before completion.")]
  PipelineHaltedByHandler,
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    // Keep the original variant when an AppError travelled through anyhow.
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl AppError {
  /// Extra structured context for the error envelope, when there is any.
  fn detail(&self) -> Option<serde_json::Value> {
    match self {
      AppError::InsufficientInventory {
        product_id,
        product,
        requested,
        available,
      } => Some(json!({
        "id": product_id,
        "product": product,
        "requested": requested,
        "available": available,
      })),
      AppError::OrderNotFound(order_id) | AppError::AlreadyPaid(order_id) | AppError::PaymentInProgress(order_id) => Some(json!({ "order_id": order_id })),
      AppError::InvalidTrackingTransition { from, to } => Some(json!({ "from": from, "to": to })),
      _ => None,
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_)
      | AppError::EmptyOrMissingCart(_)
      | AppError::InsufficientInventory { .. }
      | AppError::AddressNotFound(_)
      | AppError::PaymentMethodNotFound(_)
      | AppError::PaymentDeclined(_)
      | AppError::Gateway(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) | AppError::Otp(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) | AppError::OrderNotFound(_) | AppError::TrackingNotFound(_) => StatusCode::NOT_FOUND,
      AppError::AlreadyPaid(_)
      | AppError::PaymentInProgress(_)
      | AppError::InvalidTrackingTransition { .. }
      | AppError::PipelineHaltedByHandler => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Flow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Internal details stay in the logs.
    let message = if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
      "An internal error occurred".to_string()
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
      self.to_string()
    };

    let mut body = json!({ "message": message, "status": false });
    if let Some(detail) = self.detail() {
      body["detail"] = detail;
    }
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
