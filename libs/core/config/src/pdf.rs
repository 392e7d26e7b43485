use crate::{env_flag, env_or_default, ConfigError, FromEnv};

/// PDF report settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfSettings {
    /// When false, reports are rendered and logged but no document is written
    pub enabled: bool,
    /// Author written into the document metadata
    pub author: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            author: "Reports".to_string(),
        }
    }
}

impl FromEnv for PdfSettings {
    /// - PDF_ENABLE: defaults to true
    /// - PDF_AUTHOR: defaults to "Reports"
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_flag("PDF_ENABLE", true)?,
            author: env_or_default("PDF_AUTHOR", "Reports"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_settings_defaults() {
        temp_env::with_vars_unset(["PDF_ENABLE", "PDF_AUTHOR"], || {
            assert_eq!(PdfSettings::from_env().unwrap(), PdfSettings::default());
        });
    }

    #[test]
    fn test_pdf_settings_disabled() {
        temp_env::with_vars(
            [("PDF_ENABLE", Some("no")), ("PDF_AUTHOR", Some("Billing"))],
            || {
                let settings = PdfSettings::from_env().unwrap();
                assert!(!settings.enabled);
                assert_eq!(settings.author, "Billing");
            },
        );
    }
}
