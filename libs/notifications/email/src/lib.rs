//! Templated e-mail delivered asynchronously through a dispatch pool
//!
//! ## Components
//!
//! - **Service**: `MailService` renders, tags, validates and queues mail
//! - **Models**: `MessageEnvelope`, `Sender`
//! - **Attachments**: `AttachmentMap` at the boundary, resolved into
//!   file- or stream-backed `ResolvedAttachment`s
//! - **Delivery**: `DeliveryTask`, run by `dispatch_pool::DispatchPool`
//! - **Transports**: SMTP (lettre) and Mock
//!
//! ## Usage
//!
//! ```ignore
//! use email::{MailService, SmtpTransport};
//! use templating::{RenderContext, Renderer, TemplateRef};
//!
//! let transport = Arc::new(SmtpTransport::new(&settings)?);
//! let service = MailService::new(renderer, transport, pool, settings, profiles);
//!
//! let template = TemplateRef::new("welcome", "default")?;
//! let context = RenderContext::new().with("name", "Ada");
//! service.send(&template, "Welcome", &["ada@example.com"], &context, None).await?;
//! ```

pub mod attachment;
pub mod error;
pub mod models;
pub mod provider;
pub mod redact;
pub mod service;
pub mod task;

// Re-export main types
pub use attachment::{AttachmentMap, AttachmentSource, ResolvedAttachment, StreamSource};
pub use error::{MailError, MailResult};
pub use models::{MessageEnvelope, Sender};
pub use provider::{MailTransport, MockTransport, SendResult, SmtpTransport};
pub use service::MailService;
pub use task::{DeliveryTask, PendingMessage};
