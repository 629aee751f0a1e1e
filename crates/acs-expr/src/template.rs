//! `{{ expression }}` placeholder templates for action payloads.
//!
//! Templates are compiled once when a rule set loads and resolved on every
//! dispatch. Compilation never fails: a placeholder whose expression does not
//! compile is kept as literal text (with a warning), and a placeholder whose
//! expression fails at resolve time also falls back to its literal text. Bad
//! payload text must never stop an action from dispatching.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::ast::Expr;
use crate::eval::{evaluate, stringify, Scope};

/// One piece of a parsed template string.
#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    /// A compiled placeholder plus its raw `{{ ... }}` source, kept for the
    /// literal fallback.
    Placeholder { expr: Expr, raw: String },
}

/// A template string with its placeholders pre-compiled.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template. Infallible: anything that is not a well-formed,
    /// compilable `{{ ... }}` placeholder stays literal text.
    pub fn parse(source: &str) -> Template {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            match rest[start + 2..].find("}}") {
                Some(end) => {
                    if start > 0 {
                        segments.push(Segment::Text(rest[..start].to_string()));
                    }
                    let raw = &rest[start..start + 2 + end + 2];
                    let inner = &rest[start + 2..start + 2 + end];
                    match crate::compile(inner) {
                        Ok(expr) => segments.push(Segment::Placeholder {
                            expr,
                            raw: raw.to_string(),
                        }),
                        Err(err) => {
                            warn!(placeholder = raw, %err, "placeholder does not compile, keeping literal text");
                            segments.push(Segment::Text(raw.to_string()));
                        }
                    }
                    rest = &rest[start + 2 + end + 2..];
                }
                // Unterminated opener: the remainder is literal.
                None => break,
            }
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Template { segments }
    }

    /// True when the template contains at least one compiled placeholder.
    pub fn is_dynamic(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder { .. }))
    }

    /// Resolve against a scope. Placeholders whose expressions fail keep
    /// their raw `{{ ... }}` text.
    pub fn resolve(&self, scope: &dyn Scope) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder { expr, raw } => match evaluate(expr, scope) {
                    Ok(value) => out.push_str(&stringify(&value)),
                    Err(err) => {
                        debug!(placeholder = raw.as_str(), %err, "placeholder failed to resolve, keeping literal text");
                        out.push_str(raw);
                    }
                },
            }
        }
        out
    }
}

/// A JSON payload with every string pre-parsed as a [`Template`].
///
/// Non-string leaves pass through untouched; only strings are scanned for
/// placeholders.
#[derive(Debug, Clone)]
pub enum TemplateValue {
    Scalar(Value),
    Text(Template),
    List(Vec<TemplateValue>),
    Map(Vec<(String, TemplateValue)>),
}

impl TemplateValue {
    /// Compile a payload value, parsing templates in every string leaf.
    pub fn compile(value: &Value) -> TemplateValue {
        match value {
            Value::String(s) => TemplateValue::Text(Template::parse(s)),
            Value::Array(items) => {
                TemplateValue::List(items.iter().map(TemplateValue::compile).collect())
            }
            Value::Object(map) => TemplateValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), TemplateValue::compile(v)))
                    .collect(),
            ),
            other => TemplateValue::Scalar(other.clone()),
        }
    }

    /// Resolve every template against the scope, rebuilding the payload.
    pub fn resolve(&self, scope: &dyn Scope) -> Value {
        match self {
            TemplateValue::Scalar(value) => value.clone(),
            TemplateValue::Text(template) => Value::String(template.resolve(scope)),
            TemplateValue::List(items) => {
                Value::Array(items.iter().map(|item| item.resolve(scope)).collect())
            }
            TemplateValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.resolve(scope));
                }
                Value::Object(map)
            }
        }
    }
}
