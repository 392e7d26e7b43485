//! Template rendering shared by mail bodies and PDF reports
//!
//! A [`TemplateRef`] names a body template and the layout that wraps it. The
//! [`Renderer`] loads both from a base directory, includes the body into the
//! layout through the `{{> body}}` partial and evaluates them against a
//! [`RenderContext`] with Handlebars.
//!
//! ```text
//! <base>/layouts/<layout>.hbs      {{> body}} goes here
//! <base>/<template>.hbs            the body itself
//! ```
//!
//! [`tag_subject`] prefixes subjects and titles with the active deployment
//! profiles outside production.

pub mod context;
pub mod error;
pub mod renderer;
pub mod tagger;

pub use context::RenderContext;
pub use error::{RenderError, RenderResult};
pub use renderer::{Renderer, TemplateRef};
pub use tagger::tag_subject;
