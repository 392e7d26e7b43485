//! Handlebars renderer: body template + layout + context → text

use crate::context::RenderContext;
use crate::error::{RenderError, RenderResult};
use core_config::{ActiveProfiles, TemplateSettings};
use handlebars::Handlebars;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

const EXTENSION: &str = "hbs";
const LAYOUTS_DIR: &str = "layouts";
const LAYOUT_TEMPLATE: &str = "layout";
const BODY_PARTIAL: &str = "body";

/// Identifies a body template and the layout that wraps it.
///
/// Both names are relative to the renderer's base path and carry no extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    path: String,
    layout: String,
}

impl TemplateRef {
    pub fn new(path: impl Into<String>, layout: impl Into<String>) -> RenderResult<Self> {
        let path = path.into();
        let layout = layout.into();

        if path.trim().is_empty() {
            return Err(RenderError::InvalidReference("templatePath"));
        }
        if layout.trim().is_empty() {
            return Err(RenderError::InvalidReference("layout"));
        }

        Ok(Self { path, layout })
    }

    /// Move both names under a namespace, e.g. `emails` or `pdf`.
    ///
    /// `welcome` + `default` scoped to `emails` resolves to
    /// `emails/welcome.hbs` wrapped in `layouts/emails/default.hbs`.
    pub fn scoped(&self, namespace: &str) -> Self {
        Self {
            path: format!("{}/{}", namespace, self.path),
            layout: format!("{}/{}", namespace, self.layout),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }
}

/// Renders templates from a base directory.
///
/// No compiled-template cache: every call reads and compiles both files, so
/// edits on disk are picked up immediately.
#[derive(Debug, Clone)]
pub struct Renderer {
    base_path: PathBuf,
    strict_mode: bool,
}

impl Renderer {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            strict_mode: false,
        }
    }

    /// Create a renderer rooted where the active profiles expect templates.
    pub fn from_settings(settings: &TemplateSettings, profiles: &ActiveProfiles) -> Self {
        Self::new(settings.resolve_base_path(profiles))
    }

    /// Fail on variables missing from the context instead of rendering them empty.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Render `template` inside its layout.
    pub fn render(&self, template: &TemplateRef, context: &RenderContext) -> RenderResult<String> {
        debug!(
            template = %template.path(),
            layout = %template.layout(),
            "Rendering template"
        );

        match self.render_inner(template, context) {
            Ok(text) => {
                debug!(template = %template.path(), output = %text, "Rendering template done");
                Ok(text)
            }
            Err(e) => {
                error!(template = %template.path(), error = %e, "Error rendering template");
                Err(e)
            }
        }
    }

    fn render_inner(&self, template: &TemplateRef, context: &RenderContext) -> RenderResult<String> {
        let layout_path = self
            .base_path
            .join(LAYOUTS_DIR)
            .join(format!("{}.{}", template.layout(), EXTENSION));
        let body_path = self
            .base_path
            .join(format!("{}.{}", template.path(), EXTENSION));

        let layout_source = read_template(&layout_path)?;
        let body_source = read_template(&body_path)?;

        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(self.strict_mode);

        handlebars
            .register_partial(BODY_PARTIAL, body_source)
            .map_err(|e| RenderError::evaluation(template.path(), e))?;
        handlebars
            .register_template_string(LAYOUT_TEMPLATE, layout_source)
            .map_err(|e| RenderError::evaluation(template.layout(), e))?;

        handlebars
            .render(LAYOUT_TEMPLATE, context)
            .map_err(|e| RenderError::evaluation(template.path(), e))
    }
}

fn read_template(path: &Path) -> RenderResult<String> {
    std::fs::read_to_string(path).map_err(|source| RenderError::TemplateResolution {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_ref_rejects_empty_names() {
        assert!(matches!(
            TemplateRef::new("", "default"),
            Err(RenderError::InvalidReference("templatePath"))
        ));
        assert!(matches!(
            TemplateRef::new("welcome", "  "),
            Err(RenderError::InvalidReference("layout"))
        ));
    }

    #[test]
    fn test_scoped_prefixes_both_names() {
        let template = TemplateRef::new("welcome", "default").unwrap();
        let scoped = template.scoped("emails");

        assert_eq!(scoped.path(), "emails/welcome");
        assert_eq!(scoped.layout(), "emails/default");
    }

    #[test]
    fn test_from_settings_follows_profiles() {
        let settings = TemplateSettings::new("/srv/templates", "src/templates");

        let dev = Renderer::from_settings(&settings, &ActiveProfiles::new(["dev"]));
        let prod = Renderer::from_settings(&settings, &ActiveProfiles::new(["prod"]));

        assert_eq!(dev.base_path(), Path::new("src/templates"));
        assert_eq!(prod.base_path(), Path::new("/srv/templates"));
    }
}
