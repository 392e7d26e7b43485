//! Renderer tests against templates written to a temporary directory

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use templating::{RenderContext, RenderError, Renderer, TemplateRef};

fn write(base: &Path, relative: &str, content: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "layouts/emails/default.hbs",
        "<html><body>{{> body}}<footer>{{company}}</footer></body></html>",
    );
    write(dir.path(), "emails/welcome.hbs", "<p>Hello {{name}}</p>");
    write(
        dir.path(),
        "emails/order.hbs",
        "<ul>{{#each lines}}<li>{{item}} x{{qty}}</li>{{/each}}</ul>",
    );
    write(dir.path(), "emails/broken.hbs", "<p>{{nohelper name}}</p>");
    dir
}

fn welcome() -> TemplateRef {
    TemplateRef::new("welcome", "default").unwrap().scoped("emails")
}

#[test]
fn test_render_body_inside_layout() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let context = RenderContext::new()
        .with("name", "Ada")
        .with("company", "Acme");

    let html = renderer.render(&welcome(), &context).unwrap();

    assert_eq!(
        html,
        "<html><body><p>Hello Ada</p><footer>Acme</footer></body></html>"
    );
}

#[test]
fn test_render_is_deterministic() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let context = RenderContext::new()
        .with("name", "Ada")
        .with("company", "Acme");

    let first = renderer.render(&welcome(), &context).unwrap();
    let second = renderer.render(&welcome(), &context).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_render_structured_values() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let mut context = RenderContext::new();
    context
        .insert("company", "Acme")
        .insert(
            "lines",
            serde_json::json!([{"item": "bolt", "qty": 3}, {"item": "nut", "qty": 5}]),
        );

    let template = TemplateRef::new("order", "default").unwrap().scoped("emails");
    let html = renderer.render(&template, &context).unwrap();

    assert!(html.contains("<li>bolt x3</li><li>nut x5</li>"));
}

#[test]
fn test_missing_layout_is_resolution_error() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let template = TemplateRef::new("welcome", "missing").unwrap().scoped("emails");

    let err = renderer.render(&template, &RenderContext::new()).unwrap_err();

    match err {
        RenderError::TemplateResolution { path, .. } => {
            assert!(path.ends_with("layouts/emails/missing.hbs"));
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
}

#[test]
fn test_missing_body_is_resolution_error() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let template = TemplateRef::new("nope", "default").unwrap().scoped("emails");

    let err = renderer.render(&template, &RenderContext::new()).unwrap_err();

    assert!(matches!(err, RenderError::TemplateResolution { .. }));
}

#[test]
fn test_unknown_helper_is_evaluation_error() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let template = TemplateRef::new("broken", "default").unwrap().scoped("emails");
    let context = RenderContext::new().with("name", "Ada");

    let err = renderer.render(&template, &context).unwrap_err();

    assert!(matches!(err, RenderError::TemplateEvaluation { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unclosed_block_is_evaluation_error() {
    let dir = fixture();
    write(dir.path(), "emails/unclosed.hbs", "{{#if name}}<p>open");
    let renderer = Renderer::new(dir.path());
    let template = TemplateRef::new("unclosed", "default").unwrap().scoped("emails");

    let err = renderer.render(&template, &RenderContext::new()).unwrap_err();

    assert!(matches!(err, RenderError::TemplateEvaluation { .. }));
}

#[test]
fn test_strict_mode_rejects_missing_variables() {
    let dir = fixture();
    let lenient = Renderer::new(dir.path());
    let strict = Renderer::new(dir.path()).with_strict_mode(true);
    let context = RenderContext::new().with("company", "Acme");

    assert!(lenient.render(&welcome(), &context).is_ok());
    assert!(matches!(
        strict.render(&welcome(), &context),
        Err(RenderError::TemplateEvaluation { .. })
    ));
}

#[test]
fn test_edits_on_disk_are_picked_up() {
    let dir = fixture();
    let renderer = Renderer::new(dir.path());
    let context = RenderContext::new()
        .with("name", "Ada")
        .with("company", "Acme");

    let before = renderer.render(&welcome(), &context).unwrap();
    write(dir.path(), "emails/welcome.hbs", "<p>Welcome back {{name}}</p>");
    let after = renderer.render(&welcome(), &context).unwrap();

    assert_ne!(before, after);
    assert!(after.contains("Welcome back Ada"));
}
