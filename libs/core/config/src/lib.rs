pub mod mail;
pub mod pdf;
pub mod templates;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

pub use mail::MailSettings;
pub use pdf::PdfSettings;
pub use templates::TemplateSettings;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Profile name that marks a production deployment.
pub const PRODUCTION_PROFILE: &str = "prod";

/// Profiles that read templates from the on-disk source tree.
pub const SOURCE_TREE_PROFILES: [&str; 2] = ["dev", "sandbox"];

/// Active deployment profiles, in the order they were declared.
///
/// Read from `APP_PROFILES` (comma-separated), falling back to `APP_ENV`
/// and finally to `dev`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveProfiles(Vec<String>);

impl ActiveProfiles {
    pub fn new<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            profiles
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    pub fn from_env() -> Self {
        let raw = env::var("APP_PROFILES")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "dev".to_string());

        Self::new(raw.split(','))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.0.iter().any(|p| p == profile)
    }

    pub fn is_production(&self) -> bool {
        self.contains(PRODUCTION_PROFILE)
    }

    // Whether templates should be read from the source tree (hot reload)
    pub fn reads_source_tree(&self) -> bool {
        SOURCE_TREE_PROFILES.iter().any(|p| self.contains(p))
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable into `T`, using `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Boolean flag accepting `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a boolean", other),
        }),
    }
}

/// Comma-separated list, blank entries dropped.
pub fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Helper for optional, non-blank values
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_default_to_dev() {
        temp_env::with_vars_unset(["APP_PROFILES", "APP_ENV"], || {
            let profiles = ActiveProfiles::from_env();
            assert_eq!(profiles.names(), ["dev"]);
            assert!(!profiles.is_production());
            assert!(profiles.reads_source_tree());
        });
    }

    #[test]
    fn test_profiles_from_comma_list() {
        temp_env::with_var("APP_PROFILES", Some("staging, QA ,"), || {
            let profiles = ActiveProfiles::from_env();
            assert_eq!(profiles.names(), ["staging", "qa"]);
            assert!(!profiles.reads_source_tree());
        });
    }

    #[test]
    fn test_profiles_fall_back_to_app_env() {
        temp_env::with_vars([("APP_PROFILES", None), ("APP_ENV", Some("prod"))], || {
            let profiles = ActiveProfiles::from_env();
            assert!(profiles.is_production());
        });
    }

    #[test]
    fn test_sandbox_reads_source_tree() {
        let profiles = ActiveProfiles::new(["sandbox"]);
        assert!(profiles.reads_source_tree());
    }

    #[test]
    fn test_env_or_default_with_value() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            let result = env_or_default("TEST_VAR", "default");
            assert_eq!(result, "test_value");
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR", || {
            let result = env_or_default("MISSING_VAR", "default_value");
            assert_eq!(result, "default_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse_invalid() {
        temp_env::with_var("PARSE_ME", Some("abc"), || {
            let err = env_parse::<u16>("PARSE_ME", 1).unwrap_err();
            assert!(err.to_string().contains("PARSE_ME"));
        });
    }

    #[test]
    fn test_env_flag_variants() {
        temp_env::with_var("FLAG", Some("Off"), || {
            assert!(!env_flag("FLAG", true).unwrap());
        });
        temp_env::with_var("FLAG", Some("1"), || {
            assert!(env_flag("FLAG", false).unwrap());
        });
        temp_env::with_var("FLAG", Some("maybe"), || {
            assert!(env_flag("FLAG", false).is_err());
        });
    }

    #[test]
    fn test_env_list_drops_blanks() {
        temp_env::with_var("LIST", Some("a@x.io, ,b@x.io"), || {
            assert_eq!(env_list("LIST"), vec!["a@x.io", "b@x.io"]);
        });
    }
}
