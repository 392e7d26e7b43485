//! PDF reports rendered from Handlebars templates
//!
//! A report template renders to XHTML through the shared `templating`
//! renderer (namespace `pdf`). The XHTML is reduced to headings, paragraphs,
//! list items and table rows, then laid out on pages with the standard
//! Helvetica fonts via `lopdf`.
//!
//! ```ignore
//! let reports = PdfRenderer::new(renderer, settings, profiles);
//! let template = TemplateRef::new("summary", "report")?;
//! let mut file = File::create("summary.pdf")?;
//! reports.render(&template, "Monthly summary", &mut file, &context)?;
//! ```

pub mod convert;
pub mod document;
pub mod error;
pub mod layout;
pub mod renderer;

pub use convert::{Block, BlockKind, xhtml_to_blocks};
pub use document::{DocumentInfo, DocumentSession};
pub use error::{ConversionError, PdfError, PdfResult};
pub use layout::{Margins, PageLayout, PageSize};
pub use renderer::{PDF_NAMESPACE, PdfRenderer};
