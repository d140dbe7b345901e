//! Delivery backends.

use crate::Message;
use mailrelay_core::DeliveryError;
use std::fmt;
use std::sync::Arc;

/// Acknowledgement returned by a backend that accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Name of the backend that accepted the message.
    pub backend: String,
    /// Backend-provided detail, such as a provider message id.
    pub detail: String,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// A transport able to deliver a [`Message`].
///
/// Implementations hold no per-message state; the same backend is reused
/// for every message sent through its pipeline.
pub trait Backend: Send + Sync {
    /// Stable name, used in logs and errors.
    fn name(&self) -> &str;

    /// Delivers one message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Backend`] when the message was not accepted.
    fn deliver(&self, message: &Message) -> Result<Receipt, DeliveryError>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn deliver(&self, message: &Message) -> Result<Receipt, DeliveryError> {
        (**self).deliver(message)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn deliver(&self, message: &Message) -> Result<Receipt, DeliveryError> {
        (**self).deliver(message)
    }
}

/// Accepts every message without sending anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoopBackend {
    name: String,
}

impl NoopBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Backend for NoopBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, message: &Message) -> Result<Receipt, DeliveryError> {
        tracing::debug!(backend = %self.name, subject = %message.subject(), "sending email");
        Ok(Receipt {
            backend: self.name.clone(),
            detail: format!("Email sent from {}", self.name),
        })
    }
}
