//! SMTP mail transport using lettre

use super::{MailTransport, SendResult};
use crate::models::{MessageEnvelope, Sender};
use crate::redact::mask_recipients;
use async_trait::async_trait;
use core_config::MailSettings;
use eyre::{eyre, Result, WrapErr};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP transport
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    default_sender: Sender,
}

impl SmtpTransport {
    /// Create a transport from mail settings.
    ///
    /// STARTTLS relay when `starttls` is set, plain connection otherwise;
    /// credentials only when `smtp_auth` is set.
    pub fn new(settings: &MailSettings) -> Result<Self> {
        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .wrap_err("Failed to create SMTP relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let builder = builder.port(settings.port);
        let builder = if settings.smtp_auth {
            builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
        } else {
            builder
        };

        Ok(Self {
            transport: builder.build(),
            default_sender: Sender::new(settings.sender_name(), settings.sender_address()),
        })
    }

    async fn build_message(&self, envelope: &MessageEnvelope) -> Result<Message> {
        let sender = envelope.sender.as_ref().unwrap_or(&self.default_sender);
        let from = Mailbox::new(
            Some(sender.name.clone()),
            sender
                .address
                .parse()
                .wrap_err_with(|| format!("Invalid sender address '{}'", sender.address))?,
        );

        let mut builder = Message::builder()
            .from(from.clone())
            .reply_to(from)
            .subject(&envelope.subject);

        for to in envelope.recipients() {
            let mailbox: Mailbox = to.parse().wrap_err("Invalid recipient address")?;
            builder = builder.to(mailbox);
        }

        for bcc in &envelope.bcc {
            let mailbox: Mailbox = bcc.parse().wrap_err("Invalid BCC address")?;
            builder = builder.bcc(mailbox);
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(envelope.body.clone()));

        for attachment in &envelope.attachments {
            let content = attachment
                .source
                .load()
                .await
                .wrap_err_with(|| format!("Failed to read attachment '{}'", attachment.filename))?;
            let content_type = ContentType::parse(&attachment.content_type())
                .map_err(|e| eyre!("Invalid content type for '{}': {}", attachment.filename, e))?;

            body = body.singlepart(
                Attachment::new(attachment.filename.clone()).body(content, content_type),
            );
        }

        builder
            .multipart(body)
            .wrap_err("Failed to build multipart message")
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<SendResult> {
        let message = self.build_message(envelope).await?;

        let response = self
            .transport
            .send(message)
            .await
            .wrap_err("Failed to send email via SMTP")?;

        let message_id = response
            .message()
            .next()
            .map(|s| s.to_string())
            .unwrap_or_else(|| envelope.id.to_string());

        tracing::debug!(
            message_id = %envelope.id,
            to = %mask_recipients(envelope.recipients()),
            "SMTP server accepted message"
        );

        Ok(SendResult { message_id })
    }

    async fn health_check(&self) -> Result<()> {
        self.transport
            .test_connection()
            .await
            .wrap_err("SMTP health check failed")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{AttachmentSource, ResolvedAttachment, StreamSource};

    fn plain_settings() -> MailSettings {
        let mut settings = MailSettings::new("noreply@example.com", "localhost");
        settings.port = 1025;
        settings.smtp_auth = false;
        settings.starttls = false;
        settings
    }

    #[tokio::test]
    async fn test_build_message_with_attachment() {
        let transport = SmtpTransport::new(&plain_settings()).unwrap();
        let envelope = MessageEnvelope::new(&["user@example.com"], "Invoice", "<p>Hi</p>")
            .unwrap()
            .with_bcc(&["audit@example.com"])
            .with_attachments(vec![ResolvedAttachment::new(
                "invoice.txt",
                AttachmentSource::Stream(StreamSource::from_bytes("total: 42")),
            )])
            .unwrap();

        let message = transport.build_message(&envelope).await.unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Invoice"));
        assert!(raw.contains("To: user@example.com"));
        assert!(raw.contains("<noreply@example.com>"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("invoice.txt"));
    }

    #[tokio::test]
    async fn test_build_message_uses_envelope_sender() {
        let transport = SmtpTransport::new(&plain_settings()).unwrap();
        let envelope = MessageEnvelope::new(&["user@example.com"], "Hello", "<p>Hi</p>")
            .unwrap()
            .with_sender(Sender::new("Billing", "billing@example.com"));

        let message = transport.build_message(&envelope).await.unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: Billing <billing@example.com>"));
        assert!(raw.contains("Reply-To: Billing <billing@example.com>"));
        assert!(!raw.contains("noreply@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_build() {
        let transport = SmtpTransport::new(&plain_settings()).unwrap();
        let envelope = MessageEnvelope::new(&["not an address"], "Hello", "<p>Hi</p>").unwrap();

        assert!(transport.build_message(&envelope).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_attachment_fails_build() {
        let transport = SmtpTransport::new(&plain_settings()).unwrap();
        let envelope = MessageEnvelope::new(&["user@example.com"], "Hello", "<p>Hi</p>")
            .unwrap()
            .with_attachments(vec![ResolvedAttachment::new(
                "missing.pdf",
                AttachmentSource::File("/definitely/not/here.pdf".into()),
            )])
            .unwrap();

        let err = transport.build_message(&envelope).await.unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
    }
}
