//! Embedded boot-script templates.
//!
//! At compile time, `include_dir!` embeds everything under `cli/templates/`.
//! Placeholders use the `{{ NAME }}` form; rendering fails if any is left.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use include_dir::{Dir, include_dir};
use regex::{Captures, Regex};

use crate::application::ports::TemplateRenderer;
use crate::domain::launch::{BootPayload, BootTemplate};

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z][A-Z0-9_]*)\s*\}\}").ok());

/// Renders the templates compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

/// Substitute `vars` into `source`.
///
/// # Errors
///
/// Returns an error naming the first placeholder without a value.
pub fn substitute(source: &str, vars: &[(&str, &str)]) -> Result<String> {
    let re = PLACEHOLDER
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("invalid placeholder pattern"))?;

    let mut missing: Option<String> = None;
    let rendered = re.replace_all(source, |caps: &Captures<'_>| {
        let key = &caps[1];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => (*value).to_string(),
            None => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });

    if let Some(key) = missing {
        anyhow::bail!("template variable {key} has no value");
    }
    Ok(rendered.into_owned())
}

impl TemplateRenderer for EmbeddedTemplates {
    fn render(&self, template: BootTemplate, vars: &[(&str, &str)]) -> Result<BootPayload> {
        let name = template.name();
        let source = TEMPLATES
            .get_file(name)
            .and_then(|f| f.contents_utf8())
            .ok_or_else(|| anyhow::anyhow!("embedded template not found: {name}"))?;
        let script = substitute(source, vars).with_context(|| format!("rendering {name}"))?;
        Ok(BootPayload::from_encoded(&STANDARD.encode(script)))
    }
}
