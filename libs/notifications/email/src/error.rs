//! Error types for the mail service.
//!
//! Everything here is raised synchronously, before a message is queued.
//! Delivery failures happen later on a pool worker and only reach the pool's
//! failure sink.

use dispatch_pool::DispatchError;
use templating::RenderError;
use thiserror::Error;

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

/// Errors that can occur while preparing a message.
#[derive(Error, Debug)]
pub enum MailError {
    /// No recipient, or only blank addresses
    #[error("A message needs at least one recipient")]
    EmptyRecipients,

    /// An attachment value is neither a file path nor a stream source
    #[error("Attachment '{name}' has unsupported type {found}; expected a file path or a stream source")]
    UnsupportedAttachmentType { name: String, found: &'static str },

    /// Two attachments share a filename
    #[error("Duplicate attachment filename '{0}'")]
    DuplicateAttachment(String),

    /// The body could not be rendered
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The pool refused the delivery task
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
