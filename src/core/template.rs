//! Placeholder substitution for the LaTeX invoice template.
//!
//! A placeholder is a macro definition of the form
//!
//! ```text
//! \newcommand{\NAME}{DEFAULT}
//! ```
//!
//! where `NAME` is ASCII letters and `DEFAULT` is a single line without a closing brace. Rendering replaces
//! `DEFAULT` for every `NAME` that is a [`FieldKey`]; anything else passes through untouched.
//! The item table is inserted where the template contains [`ITEM_ROWS_SENTINEL`].

use crate::domain::model::{FieldKey, InvoiceFields, LineItem};
use crate::utils::error::{Result, ToolkitError};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

pub const ITEM_ROWS_SENTINEL: &str = "%%ITEM_ROWS%%";
pub const EMPTY_ITEMS_ROW: &str = "{No items added}&{}&{}&{}&{}&{}\\\\";
const FALLBACK_INVOICE_ID: &str = "0000";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\\newcommand\{\\([A-Za-z]+)\}\{([^}\n]*)\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    source: String,
}

impl TemplateEngine {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Reads the template, failing before any substitution if it is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ToolkitError::TemplateMissing {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded template {} ({} bytes)", path.display(), source.len());
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, fields: &InvoiceFields, items: &[LineItem], currency: &str) -> String {
        // Split on the marker first so neither field values nor item rows are scanned again.
        let segments: Vec<&str> = self.source.split(ITEM_ROWS_SENTINEL).collect();
        let mut replaced = 0usize;
        let substituted: Vec<String> = segments
            .iter()
            .map(|segment| {
                placeholder_pattern()
                    .replace_all(segment, |caps: &Captures| match FieldKey::from_macro_name(&caps[1]) {
                        Some(key) => {
                            replaced += 1;
                            format!("\\newcommand{{\\{}}}{{{}}}", &caps[1], fields.get(key))
                        }
                        None => caps[0].to_string(),
                    })
                    .into_owned()
            })
            .collect();
        tracing::debug!("Substituted {} placeholders", replaced);

        if substituted.len() == 1 {
            tracing::warn!("Template has no {} marker, item table skipped", ITEM_ROWS_SENTINEL);
        }
        let rows = item_rows(items, currency).join("\n");
        substituted.join(&rows)
    }
}

/// One table row per item, or a single "no items" row.
pub fn item_rows(items: &[LineItem], currency: &str) -> Vec<String> {
    if items.is_empty() {
        return vec![EMPTY_ITEMS_ROW.to_string()];
    }

    items
        .iter()
        .map(|item| {
            format!(
                "{{{}}}&{{{}}}&{{{}}}&{{{}{}}}&{{{}\\%}}&{{{}{}}}\\\\",
                item.name,
                item.description,
                item.quantity,
                currency,
                item.price,
                item.tax,
                currency,
                item.amount
            )
        })
        .collect()
}

/// File-name-safe invoice id: separators become `-`, empty becomes `0000`.
pub fn sanitize_invoice_number(raw: &str) -> String {
    let cleaned = raw.trim().replace(['/', '\\'], "-");
    if cleaned.is_empty() {
        FALLBACK_INVOICE_ID.to_string()
    } else {
        cleaned
    }
}
