// storefront/src/services/mailer.rs

use crate::errors::Result as AppResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentEmail {
  pub message_id: String,
  pub from: String,
  pub to: Vec<String>,
  pub subject: String,
  pub template: String,
  pub context: Value,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  /// Sends `template` rendered with `context`; returns the message id.
  async fn send(&self, subject: &str, template: &str, context: Value, recipients: &[String]) -> AppResult<String>;
}

/// Logs every message and keeps it in an outbox instead of delivering it.
pub struct LogMailer {
  sender: String,
  outbox: Mutex<Vec<SentEmail>>,
}

impl LogMailer {
  pub fn new(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      outbox: Mutex::new(Vec::new()),
    }
  }

  pub fn outbox(&self) -> Vec<SentEmail> {
    self.outbox.lock().clone()
  }
}

#[async_trait]
impl Mailer for LogMailer {
  #[instrument(name = "LogMailer::send", skip(self, context), fields(recipients = recipients.len()))]
  async fn send(&self, subject: &str, template: &str, context: Value, recipients: &[String]) -> AppResult<String> {
    let message_id = format!("msg_{}", Uuid::new_v4().simple());
    info!(%message_id, from = %self.sender, to = ?recipients, %template, "Email queued.");
    self.outbox.lock().push(SentEmail {
      message_id: message_id.clone(),
      from: self.sender.clone(),
      to: recipients.to_vec(),
      subject: subject.to_string(),
      template: template.to_string(),
      context,
    });
    Ok(message_id)
  }
}
