use crate::attachment::ResolvedAttachment;
use crate::error::{MailError, MailResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Display name + address used as `From` and `Reply-To`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl Sender {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// A fully rendered message, ready for a transport.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    /// Unique identifier for the message
    pub id: Uuid,
    recipients: Vec<String>,
    pub subject: String,
    /// Rendered HTML body
    pub body: String,
    pub bcc: Vec<String>,
    /// Falls back to the transport's account when unset
    pub sender: Option<Sender>,
    pub attachments: Vec<ResolvedAttachment>,
    pub created_at: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Create an envelope; fails unless at least one recipient is non-blank.
    ///
    /// Blank entries are dropped and the rest are trimmed.
    pub fn new<S: AsRef<str>>(
        recipients: &[S],
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> MailResult<Self> {
        let recipients = clean_addresses(recipients);
        if recipients.is_empty() {
            return Err(MailError::EmptyRecipients);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            recipients,
            subject: subject.into(),
            body: body.into(),
            bcc: Vec::new(),
            sender: None,
            attachments: Vec::new(),
            created_at: Utc::now(),
        })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Set BCC recipients (blank entries are dropped)
    pub fn with_bcc<S: AsRef<str>>(mut self, bcc: &[S]) -> Self {
        self.bcc = clean_addresses(bcc);
        self
    }

    /// Set the sender
    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set attachments; filenames must be unique
    pub fn with_attachments(mut self, attachments: Vec<ResolvedAttachment>) -> MailResult<Self> {
        let mut seen = HashSet::new();
        for attachment in &attachments {
            if !seen.insert(attachment.filename.as_str()) {
                return Err(MailError::DuplicateAttachment(attachment.filename.clone()));
            }
        }

        self.attachments = attachments;
        Ok(self)
    }
}

fn clean_addresses<S: AsRef<str>>(addresses: &[S]) -> Vec<String> {
    addresses
        .iter()
        .map(|a| a.as_ref().trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
