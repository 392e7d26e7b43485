//! Rendering errors

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while resolving or evaluating a template.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The template reference itself is unusable (caller error)
    #[error("Invalid template reference: {0} cannot be empty")]
    InvalidReference(&'static str),

    /// The layout or body template could not be located
    #[error("Template not found: {path}")]
    TemplateResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template failed to compile or to evaluate against the context
    #[error("Failed to evaluate template \"{template}\"")]
    TemplateEvaluation {
        template: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RenderError {
    pub(crate) fn evaluation(
        template: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::TemplateEvaluation {
            template: template.into(),
            source: Box::new(source),
        }
    }
}
