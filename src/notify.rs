/// Activation notification contract
///
/// The core only produces activation tokens. Delivering them out of band is
/// the notifier's job; `Outbox` records messages instead of sending them.

use std::sync::Mutex;

use crate::auth::PlainToken;
use crate::error::NotifyError;

pub trait ActivationNotifier {
    fn deliver(&self, email: &str, token: &PlainToken) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationMessage {
    pub email: String,
    pub token: PlainToken,
    pub link: String,
}

/// Build the link an activation message points at
pub fn activation_link(base_url: &str, token: &PlainToken, email: &str) -> String {
    format!(
        "{}/account_activations/{}/edit?email={}",
        base_url.trim_end_matches('/'),
        token.expose(),
        urlencoding::encode(email)
    )
}

/// Notifier that keeps every message in memory
pub struct Outbox {
    base_url: String,
    messages: Mutex<Vec<ActivationMessage>>,
}

impl Outbox {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Remove and return all recorded messages
    pub fn drain(&self) -> Vec<ActivationMessage> {
        match self.messages.lock() {
            Ok(mut messages) => std::mem::take(&mut *messages),
            Err(_) => Vec::new(),
        }
    }
}

impl ActivationNotifier for Outbox {
    fn deliver(&self, email: &str, token: &PlainToken) -> Result<(), NotifyError> {
        if email.is_empty() {
            return Err(NotifyError::InvalidRecipient("email is empty".to_string()));
        }

        let message = ActivationMessage {
            email: email.to_string(),
            token: token.clone(),
            link: activation_link(&self.base_url, token, email),
        };

        self.messages
            .lock()
            .map_err(|_| NotifyError::DeliveryFailed("outbox lock poisoned".to_string()))?
            .push(message);

        tracing::info!(recipient = %email, "Activation message queued");
        Ok(())
    }
}
