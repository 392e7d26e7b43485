use crate::{env_or_default, ActiveProfiles, ConfigError, FromEnv};
use std::path::PathBuf;

/// Where templates are loaded from.
///
/// Development-like profiles (`dev`, `sandbox`) read straight from the source
/// tree so edits show up without a restart; every other profile reads the
/// packaged, read-only copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSettings {
    pub packaged_dir: PathBuf,
    pub source_dir: PathBuf,
}

impl TemplateSettings {
    pub fn new(packaged_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            packaged_dir: packaged_dir.into(),
            source_dir: source_dir.into(),
        }
    }

    pub fn resolve_base_path(&self, profiles: &ActiveProfiles) -> PathBuf {
        if profiles.reads_source_tree() {
            self.source_dir.clone()
        } else {
            self.packaged_dir.clone()
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self::new("templates", "resources/templates")
    }
}

impl FromEnv for TemplateSettings {
    /// - TEMPLATES_DIR: defaults to "templates"
    /// - TEMPLATES_SOURCE_DIR: defaults to "resources/templates"
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            env_or_default("TEMPLATES_DIR", "templates"),
            env_or_default("TEMPLATES_SOURCE_DIR", "resources/templates"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_profile_uses_source_tree() {
        let settings = TemplateSettings::default();
        let base = settings.resolve_base_path(&ActiveProfiles::new(["dev"]));
        assert_eq!(base, PathBuf::from("resources/templates"));
    }

    #[test]
    fn test_other_profiles_use_packaged_dir() {
        let settings = TemplateSettings::default();
        let base = settings.resolve_base_path(&ActiveProfiles::new(["staging"]));
        assert_eq!(base, PathBuf::from("templates"));
    }

    #[test]
    fn test_template_settings_from_env() {
        temp_env::with_vars(
            [
                ("TEMPLATES_DIR", Some("/opt/app/templates")),
                ("TEMPLATES_SOURCE_DIR", Some("./tpl")),
            ],
            || {
                let settings = TemplateSettings::from_env().unwrap();
                assert_eq!(settings.packaged_dir, PathBuf::from("/opt/app/templates"));
                assert_eq!(settings.source_dir, PathBuf::from("./tpl"));
            },
        );
    }
}
