//! Mock mail transport for testing

use super::{MailTransport, SendResult};
use crate::models::MessageEnvelope;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock transport that captures sent messages.
///
/// Failures and panics can be scripted per recipient address, which is how
/// tests exercise failure isolation in delivery tasks.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<MessageEnvelope>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    fail_for: HashSet<String>,
    panic_for: HashSet<String>,
    fail_all: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport that always fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_all: Some(message.into()),
            ..Self::default()
        }
    }

    /// Fail every message addressed to `recipient`
    pub fn fail_for(mut self, recipient: impl Into<String>) -> Self {
        self.fail_for.insert(recipient.into());
        self
    }

    /// Panic on every message addressed to `recipient`
    pub fn panic_for(mut self, recipient: impl Into<String>) -> Self {
        self.panic_for.insert(recipient.into());
        self
    }

    /// Get all successfully sent messages
    pub async fn sent_messages(&self) -> Vec<MessageEnvelope> {
        self.sent.lock().await.clone()
    }

    /// Get the count of successfully sent messages
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Subjects of every message handed to `send`, in order, failures included
    pub async fn attempts(&self) -> Vec<String> {
        self.attempts.lock().await.clone()
    }

    /// Clear all recorded messages
    pub async fn clear(&self) {
        self.sent.lock().await.clear();
        self.attempts.lock().await.clear();
    }

    /// Check if a message was sent to a specific address
    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent
            .lock()
            .await
            .iter()
            .any(|m| m.recipients().iter().any(|r| r == address))
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, message: &MessageEnvelope) -> Result<SendResult> {
        self.attempts.lock().await.push(message.subject.clone());

        if let Some(reason) = &self.fail_all {
            return Err(eyre::eyre!(reason.clone()));
        }

        for recipient in message.recipients() {
            if self.panic_for.contains(recipient) {
                panic!("mock transport panicked for {}", recipient);
            }
            if self.fail_for.contains(recipient) {
                return Err(eyre::eyre!("Mock failure for {}", recipient));
            }
        }

        for attachment in &message.attachments {
            attachment
                .source
                .load()
                .await
                .wrap_err_with(|| format!("Failed to read attachment '{}'", attachment.filename))?;
        }

        self.sent.lock().await.push(message.clone());

        Ok(SendResult {
            message_id: format!("mock-{}", message.id),
        })
    }

    async fn health_check(&self) -> Result<()> {
        if self.fail_all.is_some() {
            return Err(eyre::eyre!("Mock health check failed"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> MessageEnvelope {
        MessageEnvelope::new(&[to], "Test Subject", "<p>Body</p>").unwrap()
    }

    #[tokio::test]
    async fn test_mock_transport_sends_message() {
        let transport = MockTransport::new();

        let result = transport.send(&message("test@example.com")).await;
        assert!(result.is_ok());

        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients(), ["test@example.com"]);
        assert!(transport.was_sent_to("test@example.com").await);
        assert!(!transport.was_sent_to("other@example.com").await);
    }

    #[tokio::test]
    async fn test_mock_transport_fails() {
        let transport = MockTransport::failing("Simulated failure");

        let result = transport.send(&message("test@example.com")).await;
        assert!(result.unwrap_err().to_string().contains("Simulated failure"));
        assert_eq!(transport.sent_count().await, 0);
        assert_eq!(transport.attempts().await.len(), 1);
        assert!(transport.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_transport_fails_per_recipient() {
        let transport = MockTransport::new().fail_for("bad@example.com");

        assert!(transport.send(&message("bad@example.com")).await.is_err());
        assert!(transport.send(&message("good@example.com")).await.is_ok());
        assert_eq!(transport.sent_count().await, 1);
    }
}
