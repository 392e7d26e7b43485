use crate::convert::xhtml_to_blocks;
use crate::document::{DocumentInfo, DocumentSession};
use crate::error::{PdfError, PdfResult};
use crate::layout::PageLayout;
use core_config::{ActiveProfiles, PdfSettings};
use std::io::Write;
use templating::{RenderContext, Renderer, TemplateRef, tag_subject};
use tracing::{debug, error, info, warn};

/// Namespace of report templates under the template base path.
pub const PDF_NAMESPACE: &str = "pdf";

/// Renders report templates into PDF documents.
///
/// The page layout is the only mutable state; changing it takes `&mut self`,
/// while every render opens its own document session from a copy.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    renderer: Renderer,
    settings: PdfSettings,
    profiles: ActiveProfiles,
    layout: PageLayout,
}

impl PdfRenderer {
    pub fn new(renderer: Renderer, settings: PdfSettings, profiles: ActiveProfiles) -> Self {
        Self {
            renderer,
            settings,
            profiles,
            layout: PageLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
    }

    pub fn settings(&self) -> &PdfSettings {
        &self.settings
    }

    /// Render `template` and write it as a PDF document to `sink`.
    ///
    /// The title is tagged with the active non-production profiles. The sink
    /// stays owned by the caller; the document is closed before returning,
    /// whether conversion succeeded or not.
    pub fn render<W: Write>(
        &self,
        template: &TemplateRef,
        title: &str,
        sink: &mut W,
        context: &RenderContext,
    ) -> PdfResult<()> {
        let html = self
            .renderer
            .render(&template.scoped(PDF_NAMESPACE), context)?;
        let title = tag_subject(title, &self.profiles);

        if !self.settings.enabled {
            info!(
                template = %template.path(),
                layout = %template.layout(),
                title = %title,
                "PDF generation disabled, not writing document"
            );
            return Ok(());
        }

        let mut session = DocumentSession::open(sink, self.layout)?;
        session.set_info(&DocumentInfo::new(title.as_str(), self.settings.author.as_str()));

        let written = xhtml_to_blocks(&html)
            .and_then(|blocks| session.write_blocks(&blocks))
            .map_err(PdfError::from);

        match written {
            Ok(()) => {
                session.close()?;
                debug!(template = %template.path(), title = %title, "PDF document written");
                Ok(())
            }
            Err(e) => {
                if let Err(close_error) = session.close() {
                    warn!(error = %close_error, "Failed to close PDF document after conversion error");
                }
                error!(template = %template.path(), title = %title, error = %e, "PDF generation failed");
                Err(e)
            }
        }
    }
}
