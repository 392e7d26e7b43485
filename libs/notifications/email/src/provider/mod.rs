//! Mail transport implementations

pub mod mock;
pub mod smtp;

pub use mock::MockTransport;
pub use smtp::SmtpTransport;

use crate::models::MessageEnvelope;
use async_trait::async_trait;
use eyre::Result;

/// Result of sending a message
#[derive(Debug)]
pub struct SendResult {
    /// Transport-specific message ID
    pub message_id: String,
}

/// Trait for mail transports
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send one message, attachments included
    async fn send(&self, message: &MessageEnvelope) -> Result<SendResult>;

    /// Check if the transport is reachable
    async fn health_check(&self) -> Result<()>;

    /// Get transport name
    fn name(&self) -> &'static str;
}
