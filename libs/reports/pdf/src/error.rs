use std::error::Error;
use std::io;
use templating::RenderError;
use thiserror::Error;

pub type PdfResult<T> = Result<T, PdfError>;

/// Failures turning rendered XHTML into page content.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Malformed XHTML at byte {position}: {source}")]
    Markup {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Element <{0}> is never closed")]
    UnclosedElement(String),

    #[error("Invalid UTF-8 in character data: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Failed to encode page content: {0}")]
    Content(#[from] lopdf::Error),
}

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Unable to bind the PDF document to the output sink: {0}")]
    DocumentWriteInit(#[source] io::Error),

    #[error("Unable to convert rendered XHTML to PDF content: {0}")]
    ContentConversion(#[source] ConversionError),

    #[error("Unable to write the PDF document: {0}")]
    Write(#[source] Box<dyn Error + Send + Sync>),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PdfError {
    pub(crate) fn write(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Write(source.into())
    }
}

impl From<ConversionError> for PdfError {
    fn from(e: ConversionError) -> Self {
        Self::ContentConversion(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_keeps_cause() {
        let err = PdfError::from(ConversionError::UnclosedElement("p".to_string()));

        assert!(matches!(err, PdfError::ContentConversion(_)));
        let cause = err.source().map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("Element <p> is never closed"));
    }

    #[test]
    fn test_write_error_from_io() {
        let err = PdfError::write(io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
