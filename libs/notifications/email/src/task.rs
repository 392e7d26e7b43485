//! Delivery task: the unit of mail work executed on the dispatch pool

use crate::error::MailResult;
use crate::models::MessageEnvelope;
use crate::provider::MailTransport;
use crate::redact::mask_recipients;
use async_trait::async_trait;
use dispatch_pool::{DeliveryFault, PoolTask, TaskContext, TaskOutcome};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

type Builder = Box<dyn FnOnce() -> MailResult<MessageEnvelope> + Send>;

/// A message waiting to be sent.
pub enum PendingMessage {
    /// Already built
    Prepared(MessageEnvelope),
    /// Built on the worker, right before sending
    Deferred(Builder),
}

impl PendingMessage {
    pub fn deferred<F>(build: F) -> Self
    where
        F: FnOnce() -> MailResult<MessageEnvelope> + Send + 'static,
    {
        Self::Deferred(Box::new(build))
    }
}

impl From<MessageEnvelope> for PendingMessage {
    fn from(envelope: MessageEnvelope) -> Self {
        Self::Prepared(envelope)
    }
}

impl fmt::Debug for PendingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepared(envelope) => f.debug_tuple("Prepared").field(&envelope.id).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Ordered messages plus the transport that sends them.
///
/// Consumed by exactly one worker. Each message is sent once; a failure is
/// reported to the pool's failure sink and the next message is still sent.
pub struct DeliveryTask {
    id: Uuid,
    messages: Vec<PendingMessage>,
    transport: Arc<dyn MailTransport>,
}

impl DeliveryTask {
    pub fn new(messages: Vec<PendingMessage>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages,
            transport,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[async_trait]
impl PoolTask for DeliveryTask {
    fn task_id(&self) -> Uuid {
        self.id
    }

    async fn execute(self: Box<Self>, ctx: &TaskContext) -> TaskOutcome {
        let DeliveryTask {
            id,
            messages,
            transport,
        } = *self;
        let mut outcome = TaskOutcome::default();

        for pending in messages {
            outcome.attempted += 1;

            let envelope = match pending {
                PendingMessage::Prepared(envelope) => envelope,
                PendingMessage::Deferred(build) => match build() {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        outcome.failed += 1;
                        ctx.report(DeliveryFault::Isolated {
                            item: "<deferred message>".to_string(),
                            detail: String::new(),
                            cause: e.to_string(),
                        });
                        continue;
                    }
                },
            };

            let recipients = mask_recipients(envelope.recipients());
            match transport.send(&envelope).await {
                Ok(result) => {
                    debug!(
                        task_id = %id,
                        message_id = %envelope.id,
                        transport_id = %result.message_id,
                        to = %recipients,
                        subject = %envelope.subject,
                        "Sent e-mail"
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        task_id = %id,
                        message_id = %envelope.id,
                        to = %recipients,
                        subject = %envelope.subject,
                        "Error sending e-mail"
                    );
                    ctx.report(DeliveryFault::Isolated {
                        item: envelope.subject.clone(),
                        detail: recipients,
                        cause: format!("{:#}", e),
                    });
                }
            }
        }

        outcome
    }
}
