//! Backends and messages shared by the integration tests.

#![allow(dead_code)]

use mailrelay::{Backend, DeliveryError, Message, Receipt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A backend that fails a scripted number of times before succeeding.
#[derive(Debug)]
pub struct FlakyBackend {
    name: String,
    fail_first: usize,
    calls: AtomicUsize,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl FlakyBackend {
    /// Fails the first `n` calls, then succeeds.
    pub fn failing_first(name: &str, n: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail_first: n,
            calls: AtomicUsize::new(0),
            journal: None,
        })
    }

    pub fn healthy(name: &str) -> Arc<Self> {
        Self::failing_first(name, 0)
    }

    pub fn broken(name: &str) -> Arc<Self> {
        Self::failing_first(name, usize::MAX)
    }

    /// Like [`failing_first`](Self::failing_first), also appending its name
    /// to `journal` on every call.
    pub fn journaled(name: &str, n: usize, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail_first: n,
            calls: AtomicUsize::new(0),
            journal: Some(Arc::clone(journal)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Backend for FlakyBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, _message: &Message) -> Result<Receipt, DeliveryError> {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(self.name.clone());
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            Err(DeliveryError::backend(&self.name, "service unavailable"))
        } else {
            Ok(Receipt {
                backend: self.name.clone(),
                detail: format!("accepted #{n}"),
            })
        }
    }
}

pub fn message(i: usize) -> Message {
    Message::new(
        format!("Test Email {i}"),
        format!("This is a test email {i}"),
        ["email@example.com"],
        "from@example.com",
    )
}
