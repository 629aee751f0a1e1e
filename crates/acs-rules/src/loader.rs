//! TOML rule-set loading and compilation.
//!
//! Loading algorithm:
//!
//! 1. Parse the TOML into a [`RuleSetDoc`].
//! 2. Reject the whole set if it is smaller than the expected minimum or
//!    contains duplicate rule ids.
//! 3. Compile every condition and every action directive. The first failure
//!    aborts the load with an error naming the offending rule id. A rule
//!    set with any uncompilable rule never activates, not even partially.
//! 4. Sort by priority descending. The sort is stable, so equal priorities
//!    keep their document order.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use acs_contracts::{AcsError, AcsResult};
use acs_expr::TemplateValue;

use crate::rule::{ActionDirective, Rule, RuleDoc, RuleSetDoc};

/// Knobs for rule-set loading.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Hard lower bound on the number of rules. Loading fewer is a
    /// configuration error: a near-empty shield is worse than a loud
    /// failure, because it silently stops protecting.
    pub min_rules: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { min_rules: 1 }
    }
}

/// Parses and compiles rule-set documents.
///
/// Stateless apart from its options; the compiled output is handed to a
/// [`RuleStore`](crate::RuleStore) for atomic activation.
#[derive(Debug, Default)]
pub struct RuleLoader {
    options: LoadOptions,
}

impl RuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        RuleLoader { options }
    }

    /// Parse `source` as a TOML rule-set and compile it.
    ///
    /// Returns the rules sorted by priority descending, ties in document
    /// order. Any compilation failure rejects the entire set.
    pub fn load_str(&self, source: &str) -> AcsResult<Vec<Rule>> {
        let doc: RuleSetDoc = toml::from_str(source).map_err(|e| AcsError::Config {
            reason: format!("failed to parse rule-set TOML: {}", e),
        })?;

        if doc.rules.len() < self.options.min_rules {
            return Err(AcsError::RuleSetRejected {
                reason: format!(
                    "rule-set has {} rule(s), expected at least {}",
                    doc.rules.len(),
                    self.options.min_rules
                ),
            });
        }

        let mut seen = HashSet::new();
        for rule in &doc.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(AcsError::RuleSetRejected {
                    reason: format!("duplicate rule id '{}'", rule.id),
                });
            }
        }

        let mut rules = doc
            .rules
            .into_iter()
            .map(compile_rule)
            .collect::<AcsResult<Vec<_>>>()?;

        rules.sort_by_key(|rule| Reverse(rule.priority));

        info!(
            count = rules.len(),
            name = doc.name.as_deref().unwrap_or("unnamed"),
            "rule-set loaded"
        );
        Ok(rules)
    }

    /// Read the file at `path` and load it as a rule-set.
    pub fn load_file(&self, path: &Path) -> AcsResult<Vec<Rule>> {
        let source = std::fs::read_to_string(path).map_err(|e| AcsError::Config {
            reason: format!("failed to read rule-set file '{}': {}", path.display(), e),
        })?;
        self.load_str(&source)
    }
}

/// Compile one rule document: condition text to AST, payload strings to
/// templates.
fn compile_rule(doc: RuleDoc) -> AcsResult<Rule> {
    let compiled_condition =
        acs_expr::compile(&doc.condition).map_err(|e| AcsError::RuleCompilation {
            rule_id: doc.id.clone(),
            reason: e.to_string(),
        })?;

    let mut actions = Vec::with_capacity(doc.action.len());
    for (index, table) in doc.action.iter().enumerate() {
        let mut entries = table.iter();
        let (name, payload) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(AcsError::RuleCompilation {
                    rule_id: doc.id.clone(),
                    reason: format!(
                        "action directive {} must have exactly one key (the action name)",
                        index + 1
                    ),
                })
            }
        };
        let payload = toml_to_json(payload.clone());
        actions.push(ActionDirective {
            name: name.clone(),
            payload: Arc::new(TemplateValue::compile(&payload)),
        });
    }

    debug!(
        rule_id = %doc.id,
        priority = doc.priority,
        actions = actions.len(),
        "rule compiled"
    );

    Ok(Rule {
        id: doc.id,
        description: doc.description,
        priority: doc.priority,
        severity: doc.severity,
        condition: doc.condition,
        compiled_condition: Arc::new(compiled_condition),
        actions,
        audit_required: doc.audit,
    })
}

/// Convert a TOML value into the JSON value domain the expression engine and
/// action handlers work in. Datetimes become their string form; TOML cannot
/// produce non-finite floats in practice, but if one appears it maps to null.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

// ── Rule disablement ─────────────────────────────────────────────────────────

/// Outcome of removing one rule block from a rule-set source.
#[derive(Debug)]
pub struct RemovedRule {
    /// The rule-set source rewritten without the removed rule.
    pub remaining: String,

    /// The removed rule as a standalone `[[rules]]` block. Appending these
    /// blocks to an archive file keeps the archive valid TOML.
    pub archived: String,

    /// The removed rule document, for audit metadata.
    pub doc: RuleDoc,
}

/// Remove the rule with `rule_id` from a rule-set source.
///
/// Pure string-to-string: callers decide where the rewritten source and the
/// archived block go. Comments in the original file do not survive the
/// rewrite; the rule content does.
pub fn remove_rule(source: &str, rule_id: &str) -> AcsResult<RemovedRule> {
    let mut doc: RuleSetDoc = toml::from_str(source).map_err(|e| AcsError::Config {
        reason: format!("failed to parse rule-set TOML: {}", e),
    })?;

    let position = doc
        .rules
        .iter()
        .position(|rule| rule.id == rule_id)
        .ok_or_else(|| AcsError::RuleNotFound {
            rule_id: rule_id.to_string(),
        })?;
    let removed = doc.rules.remove(position);

    #[derive(Serialize)]
    struct ArchivedRules {
        rules: Vec<RuleDoc>,
    }

    let remaining = toml::to_string_pretty(&doc).map_err(|e| AcsError::Config {
        reason: format!("failed to serialize rewritten rule-set: {}", e),
    })?;
    let archived = toml::to_string_pretty(&ArchivedRules {
        rules: vec![removed.clone()],
    })
    .map_err(|e| AcsError::Config {
        reason: format!("failed to serialize archived rule: {}", e),
    })?;

    info!(rule_id = %rule_id, "rule removed from rule-set source");

    Ok(RemovedRule {
        remaining,
        archived,
        doc: removed,
    })
}
