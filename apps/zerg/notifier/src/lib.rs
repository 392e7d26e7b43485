//! Notifier
//!
//! Command-line front end for the rendering pipeline:
//!
//! ```text
//! notifier mail                     notifier pdf
//!   ↓ Renderer (emails/)              ↓ Renderer (pdf/)
//!   ↓ subject tagging                 ↓ title tagging
//!   ↓ attachment resolution           ↓ XHTML → pages
//! DispatchPool → SMTP               PDF file
//! ```
//!
//! All configuration is read from the environment. The mail command waits for
//! its delivery task and drains the pool before exiting.

pub mod cli;

use cli::{Cli, Commands};
use core_config::tracing::init_tracing;
use core_config::{ActiveProfiles, FromEnv, MailSettings, PdfSettings, TemplateSettings};
use dispatch_pool::{DispatchPool, PoolConfig, TaskState};
use email::{AttachmentMap, MailService, SmtpTransport};
use eyre::{Result, WrapErr, bail};
use reports::PdfRenderer;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use templating::{RenderContext, Renderer, TemplateRef};
use tracing::{info, warn};

/// Run one CLI command.
pub async fn run(cli: Cli) -> Result<()> {
    let profiles = ActiveProfiles::from_env();
    init_tracing(&profiles);
    info!(profiles = ?profiles.names(), "Starting notifier");

    let templates = TemplateSettings::from_env().wrap_err("Failed to load template settings")?;
    let renderer = Renderer::from_settings(&templates, &profiles);

    match cli.command {
        Commands::Mail {
            template,
            layout,
            subject,
            to,
            vars,
            attach,
        } => {
            let template = TemplateRef::new(template, layout)?;
            send_mail(
                renderer,
                profiles,
                &template,
                &subject,
                &to,
                &context(vars),
                &attach,
            )
            .await
        }
        Commands::Pdf {
            template,
            layout,
            title,
            output,
            vars,
        } => {
            let template = TemplateRef::new(template, layout)?;
            write_pdf(renderer, profiles, &template, &title, &output, &context(vars))
        }
    }
}

fn context(vars: Vec<(String, Value)>) -> RenderContext {
    vars.into_iter()
        .fold(RenderContext::new(), |ctx, (key, value)| ctx.with(key, value))
}

fn attachments(paths: &[PathBuf]) -> Result<Option<AttachmentMap>> {
    if paths.is_empty() {
        return Ok(None);
    }

    let mut map = AttachmentMap::new();
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| eyre::eyre!("Attachment path has no file name: {}", path.display()))?;
        map.insert(name, path.clone());
    }
    Ok(Some(map))
}

async fn send_mail(
    renderer: Renderer,
    profiles: ActiveProfiles,
    template: &TemplateRef,
    subject: &str,
    to: &[String],
    context: &RenderContext,
    attach: &[PathBuf],
) -> Result<()> {
    let settings = MailSettings::from_env().wrap_err("Failed to load mail settings")?;
    let pool_config = PoolConfig::from_env().wrap_err("Failed to load dispatch pool settings")?;
    let transport = Arc::new(SmtpTransport::new(&settings)?);
    let pool = Arc::new(DispatchPool::new(pool_config));
    let service = MailService::new(renderer, transport, Arc::clone(&pool), settings, profiles);

    let ticket = service
        .send(template, subject, to, context, attachments(attach)?)
        .await
        .wrap_err("Failed to queue e-mail")?;

    let state = match ticket {
        Some(mut ticket) => Some(ticket.finished().await),
        None => None,
    };

    let report = pool.shutdown().await;
    if !report.drained {
        warn!(abandoned = %report.abandoned.len(), "Dispatch pool did not drain in time");
    }

    match state {
        Some(TaskState::Completed) => info!("E-mail delivered"),
        Some(other) => bail!("E-mail delivery ended in state {:?}", other),
        None => info!("Mail disabled, nothing sent"),
    }
    Ok(())
}

fn write_pdf(
    renderer: Renderer,
    profiles: ActiveProfiles,
    template: &TemplateRef,
    title: &str,
    output: &Path,
    context: &RenderContext,
) -> Result<()> {
    let settings = PdfSettings::from_env().wrap_err("Failed to load PDF settings")?;
    let reports = PdfRenderer::new(renderer, settings, profiles);

    let file = File::create(output)
        .wrap_err_with(|| format!("Failed to create {}", output.display()))?;
    let mut sink = BufWriter::new(file);
    reports.render(template, title, &mut sink, context)?;
    sink.flush()
        .wrap_err_with(|| format!("Failed to write {}", output.display()))?;

    info!(output = %output.display(), "PDF report written");
    Ok(())
}
