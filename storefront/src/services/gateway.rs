// storefront/src/services/gateway.rs

//! Payment gateway seam. `SandboxGateway` is an in-process stand-in that
//! behaves like a card processor with a few magic card numbers.

use crate::errors::{AppError, Result as AppResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
  pub number: String,
  pub exp_month: u32,
  /// Two-digit year as entered on the card.
  pub exp_year: u32,
  pub cvc: String,
}

impl CardDetails {
  pub fn validate(&self) -> AppResult<()> {
    if self.number.len() != 16 || !self.number.chars().all(|c| c.is_ascii_digit()) {
      return Err(AppError::Validation("Card number must be 16 digits".to_string()));
    }
    if !(1..=12).contains(&self.exp_month) {
      return Err(AppError::Validation("Expiry month must be between 1 and 12".to_string()));
    }
    if self.exp_year > 99 {
      return Err(AppError::Validation("Expiry year must be 2 digits".to_string()));
    }
    if self.cvc.len() != 3 || !self.cvc.chars().all(|c| c.is_ascii_digit()) {
      return Err(AppError::Validation("CVC must be 3 digits".to_string()));
    }
    Ok(())
  }

  pub fn last4(&self) -> &str {
    &self.number[self.number.len().saturating_sub(4)..]
  }
}

/// The card summary a gateway exposes; never the full number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayPaymentMethod {
  pub id: String,
  pub brand: String,
  pub last4: String,
  pub exp_month: u32,
  pub exp_year: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
  Succeeded,
  Declined,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
  pub id: String,
  pub amount_cents: i64,
  pub currency: String,
  pub status: IntentStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Returns the gateway's customer id.
  async fn create_customer(&self, email: &str) -> AppResult<String>;
  async fn create_payment_method(&self, card: &CardDetails) -> AppResult<GatewayPaymentMethod>;
  async fn attach_payment_method(&self, method_id: &str, customer_id: &str) -> AppResult<()>;
  async fn list_payment_methods(&self, customer_id: &str) -> AppResult<Vec<GatewayPaymentMethod>>;
  /// Creates and confirms a charge in one call. A decline is a normal
  /// outcome; errors are reserved for processing failures.
  async fn create_payment_intent(&self, amount_cents: i64, currency: &str, customer_id: &str, method_id: &str) -> AppResult<PaymentIntent>;
}

#[derive(Debug, Clone)]
pub struct RecordedCharge {
  pub amount_cents: i64,
  pub currency: String,
  pub customer_id: String,
  pub method_id: String,
  pub status: IntentStatus,
}

#[derive(Default)]
struct SandboxState {
  customers: HashMap<String, String>,
  methods: HashMap<String, (GatewayPaymentMethod, String)>,
  attachments: HashMap<String, Vec<String>>,
  charges: Vec<RecordedCharge>,
}

/// Cards ending in `0002` are declined and cards ending in `0119` fail with a
/// processing error.
#[derive(Default)]
pub struct SandboxGateway {
  state: Mutex<SandboxState>,
  fail_listing: AtomicBool,
}

const DECLINED_SUFFIX: &str = "0002";
const PROCESSING_ERROR_SUFFIX: &str = "0119";

impl SandboxGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes `list_payment_methods` fail, as an unreachable gateway would.
  pub fn set_fail_listing(&self, fail: bool) {
    self.fail_listing.store(fail, Ordering::SeqCst);
  }

  pub fn charges(&self) -> Vec<RecordedCharge> {
    self.state.lock().charges.clone()
  }
}

fn brand_for(number: &str) -> &'static str {
  match number.chars().next() {
    Some('4') => "visa",
    Some('5') => "mastercard",
    Some('3') => "amex",
    _ => "unknown",
  }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
  #[instrument(name = "SandboxGateway::create_customer", skip(self))]
  async fn create_customer(&self, email: &str) -> AppResult<String> {
    let id = format!("cus_{}", Uuid::new_v4().simple());
    self.state.lock().customers.insert(id.clone(), email.to_string());
    info!(customer_id = %id, "Sandbox customer created.");
    Ok(id)
  }

  #[instrument(name = "SandboxGateway::create_payment_method", skip_all, fields(last4 = %card.last4()))]
  async fn create_payment_method(&self, card: &CardDetails) -> AppResult<GatewayPaymentMethod> {
    card.validate()?;
    let method = GatewayPaymentMethod {
      id: format!("pm_{}", Uuid::new_v4().simple()),
      brand: brand_for(&card.number).to_string(),
      last4: card.last4().to_string(),
      exp_month: card.exp_month,
      exp_year: card.exp_year,
    };
    self.state.lock().methods.insert(method.id.clone(), (method.clone(), card.number.clone()));
    Ok(method)
  }

  async fn attach_payment_method(&self, method_id: &str, customer_id: &str) -> AppResult<()> {
    let mut state = self.state.lock();
    if !state.customers.contains_key(customer_id) {
      return Err(AppError::Gateway(format!("No such customer: '{}'", customer_id)));
    }
    if !state.methods.contains_key(method_id) {
      return Err(AppError::Gateway(format!("No such PaymentMethod: '{}'", method_id)));
    }
    state.attachments.entry(customer_id.to_string()).or_default().push(method_id.to_string());
    Ok(())
  }

  async fn list_payment_methods(&self, customer_id: &str) -> AppResult<Vec<GatewayPaymentMethod>> {
    if self.fail_listing.load(Ordering::SeqCst) {
      warn!("Sandbox gateway listing is switched off.");
      return Err(AppError::Gateway("Network error!".to_string()));
    }
    let state = self.state.lock();
    Ok(
      state
        .attachments
        .get(customer_id)
        .map(|ids| ids.iter().filter_map(|id| state.methods.get(id).map(|(m, _)| m.clone())).collect())
        .unwrap_or_default(),
    )
  }

  #[instrument(name = "SandboxGateway::create_payment_intent", skip(self), err(Display))]
  async fn create_payment_intent(&self, amount_cents: i64, currency: &str, customer_id: &str, method_id: &str) -> AppResult<PaymentIntent> {
    if amount_cents <= 0 {
      return Err(AppError::Gateway("Amount must be greater than zero".to_string()));
    }
    let mut state = self.state.lock();
    let number = match state.methods.get(method_id) {
      Some((_, number)) => number.clone(),
      None => return Err(AppError::Gateway(format!("No such PaymentMethod: '{}'", method_id))),
    };
    if number.ends_with(PROCESSING_ERROR_SUFFIX) {
      warn!("Sandbox processing error.");
      return Err(AppError::Gateway("An error occurred while processing your card. Try again in a little bit.".to_string()));
    }

    let status = if number.ends_with(DECLINED_SUFFIX) {
      IntentStatus::Declined
    } else {
      IntentStatus::Succeeded
    };
    state.charges.push(RecordedCharge {
      amount_cents,
      currency: currency.to_string(),
      customer_id: customer_id.to_string(),
      method_id: method_id.to_string(),
      status,
    });
    info!(?status, "Sandbox charge recorded.");

    Ok(PaymentIntent {
      id: format!("pi_{}", Uuid::new_v4().simple()),
      amount_cents,
      currency: currency.to_string(),
      status,
    })
  }
}
