//! Mail service: the send surface used by the rest of the application.
//!
//! `send` renders the body, tags the subject, validates attachments and hands
//! a `DeliveryTask` to the dispatch pool. It returns as soon as the task is
//! queued; delivery failures only reach the pool's failure sink.

use crate::attachment::{self, AttachmentMap};
use crate::error::{MailError, MailResult};
use crate::models::{MessageEnvelope, Sender};
use crate::provider::MailTransport;
use crate::redact::mask_recipients;
use crate::task::{DeliveryTask, PendingMessage};
use core_config::{ActiveProfiles, MailSettings};
use dispatch_pool::{DispatchPool, TaskTicket};
use std::sync::Arc;
use templating::{tag_subject, RenderContext, Renderer, TemplateRef};
use tracing::{debug, info};

/// Namespace of mail templates under the template base path.
pub const MAIL_NAMESPACE: &str = "emails";

/// Service for sending templated e-mail through the dispatch pool.
#[derive(Clone)]
pub struct MailService {
    renderer: Renderer,
    transport: Arc<dyn MailTransport>,
    pool: Arc<DispatchPool>,
    settings: MailSettings,
    profiles: ActiveProfiles,
}

impl MailService {
    /// Create a new mail service.
    pub fn new(
        renderer: Renderer,
        transport: Arc<dyn MailTransport>,
        pool: Arc<DispatchPool>,
        settings: MailSettings,
        profiles: ActiveProfiles,
    ) -> Self {
        Self {
            renderer,
            transport,
            pool,
            settings,
            profiles,
        }
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Render `template` and queue it for delivery.
    ///
    /// Returns `None` when mail is disabled: the message is rendered and
    /// logged, never sent.
    pub async fn send<S: AsRef<str>>(
        &self,
        template: &TemplateRef,
        subject: &str,
        recipients: &[S],
        context: &RenderContext,
        attachments: Option<AttachmentMap>,
    ) -> MailResult<Option<TaskTicket>> {
        if recipients.iter().all(|r| r.as_ref().trim().is_empty()) {
            return Err(MailError::EmptyRecipients);
        }

        let body = self
            .renderer
            .render(&template.scoped(MAIL_NAMESPACE), context)?;
        let attachments = match attachments {
            Some(map) => attachment::resolve(map)?,
            None => Vec::new(),
        };

        if !self.settings.enabled {
            info!(
                template = %template.path(),
                subject = %subject,
                to = %mask_recipients(recipients),
                attachments = %attachments.len(),
                "Mail disabled, not sending e-mail"
            );
            return Ok(None);
        }

        let envelope = MessageEnvelope::new(
            recipients,
            tag_subject(subject, &self.profiles),
            body,
        )?
        .with_bcc(self.settings.bcc_all.as_slice())
        .with_sender(self.default_sender())
        .with_attachments(attachments)?;

        debug!(
            message_id = %envelope.id,
            template = %template.path(),
            subject = %envelope.subject,
            to = %mask_recipients(envelope.recipients()),
            "Queueing e-mail"
        );

        self.dispatch(vec![envelope.into()]).await.map(Some)
    }

    /// Queue already built envelopes as one task, sent in order.
    pub async fn send_prepared(
        &self,
        envelopes: Vec<MessageEnvelope>,
    ) -> MailResult<Option<TaskTicket>> {
        if envelopes.is_empty() {
            return Ok(None);
        }

        if !self.settings.enabled {
            for envelope in &envelopes {
                info!(
                    subject = %envelope.subject,
                    to = %mask_recipients(envelope.recipients()),
                    "Mail disabled, not sending e-mail"
                );
            }
            return Ok(None);
        }

        let messages = envelopes.into_iter().map(PendingMessage::from).collect();
        self.dispatch(messages).await.map(Some)
    }

    /// Queue message builders evaluated on the worker, right before sending.
    ///
    /// A builder that fails counts as a failed message of the task.
    pub async fn send_deferred<I, F>(&self, builders: I) -> MailResult<Option<TaskTicket>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> MailResult<MessageEnvelope> + Send + 'static,
    {
        let messages: Vec<PendingMessage> =
            builders.into_iter().map(PendingMessage::deferred).collect();
        if messages.is_empty() {
            return Ok(None);
        }

        if !self.settings.enabled {
            info!(
                count = %messages.len(),
                "Mail disabled, not building deferred e-mails"
            );
            return Ok(None);
        }

        self.dispatch(messages).await.map(Some)
    }

    fn default_sender(&self) -> Sender {
        Sender::new(self.settings.sender_name(), self.settings.sender_address())
    }

    async fn dispatch(&self, messages: Vec<PendingMessage>) -> MailResult<TaskTicket> {
        let task = DeliveryTask::new(messages, Arc::clone(&self.transport));
        let count = task.len();
        let ticket = self.pool.submit(task).await?;

        debug!(task_id = %ticket.id(), messages = %count, "Delivery task queued");
        Ok(ticket)
    }
}
