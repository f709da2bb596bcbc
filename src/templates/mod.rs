//! Prompt templates with `{{ name }}` placeholders.
//!
//! A [`TemplateProvider`] hands out template text by id and renders it
//! against task parameters. String values are inserted verbatim; any other
//! JSON value is inserted in its compact JSON form.
//!
//! ```rust
//! use agentreg::registry::Parameters;
//! use agentreg::templates::{InMemoryTemplates, TemplateProvider};
//! use serde_json::json;
//!
//! let templates = InMemoryTemplates::new()
//!     .with_template("review", "Review {{ file }} for {{focus}}.");
//!
//! let mut vars = Parameters::new();
//! vars.insert("file".into(), json!("lib.rs"));
//!
//! assert_eq!(
//!     templates.render("review", &vars).unwrap(),
//!     "Review lib.rs for {{focus}}."
//! );
//! assert!(templates.render_strict("review", &vars).is_err());
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;
use thiserror::Error;

use crate::registry::Parameters;

/// Errors raised by template providers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No template with this id.
    #[error("template '{0}' not found")]
    NotFound(String),

    /// Strict rendering found placeholders without a value.
    #[error("template '{id}' is missing values for: {}", missing.join(", "))]
    MissingVariables {
        /// Template id.
        id: String,
        /// Placeholder names without a value, in order of appearance.
        missing: Vec<String>,
    },
}

/// Result type for template operations.
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap_or_else(|e| {
            unreachable!("placeholder pattern is a valid regex: {e}")
        })
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Placeholder names in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitute known placeholders, leaving unknown ones untouched.
///
/// Returns the rendered text and the names that had no value.
pub fn render_text(text: &str, vars: &Parameters) -> (String, Vec<String>) {
    let mut missing: Vec<String> = Vec::new();
    let rendered = placeholder_regex().replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        match vars.get(name) {
            Some(value) => value_text(value),
            None => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                caps[0].to_string()
            }
        }
    });
    (rendered.into_owned(), missing)
}

/// Source of templates.
pub trait TemplateProvider: Send + Sync {
    /// Template text by id.
    fn get_template(&self, id: &str) -> TemplateResult<String>;

    /// Render a template, leaving placeholders without a value untouched.
    fn render(&self, id: &str, vars: &Parameters) -> TemplateResult<String> {
        let template = self.get_template(id)?;
        Ok(render_text(&template, vars).0)
    }

    /// Render a template, failing if any placeholder has no value.
    fn render_strict(&self, id: &str, vars: &Parameters) -> TemplateResult<String> {
        let template = self.get_template(id)?;
        let (rendered, missing) = render_text(&template, vars);
        if missing.is_empty() {
            Ok(rendered)
        } else {
            Err(TemplateError::MissingVariables {
                id: id.to_string(),
                missing,
            })
        }
    }
}

/// Templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplates {
    templates: HashMap<String, String>,
}

impl InMemoryTemplates {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, builder style.
    pub fn with_template(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    /// Add or replace a template. Returns the previous text.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) -> Option<String> {
        self.templates.insert(id.into(), text.into())
    }

    /// Template ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl TemplateProvider for InMemoryTemplates {
    fn get_template(&self, id: &str) -> TemplateResult<String> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }
}
