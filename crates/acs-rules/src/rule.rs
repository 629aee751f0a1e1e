//! Rule types: the TOML document schema and the compiled, evaluable form.
//!
//! A `RuleSetDoc` is what serde sees in a rule-set file; it round-trips, so
//! the disable operation can rewrite a file minus one rule. A `Rule` is the
//! loader's output: condition compiled to an AST, payload strings compiled to
//! templates, ready for the evaluator. Rules are immutable once built.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use acs_contracts::Severity;
use acs_expr::{Expr, TemplateValue};

/// A single rule as written in TOML.
///
/// Only `id` is required. Everything else defaults: `priority` 100,
/// `severity` medium, `condition` `"false"` (an omitted condition never
/// matches), `audit` false, `action` empty.
///
/// ```toml
/// [[rules]]
/// id = "gps-impossible-jump"
/// priority = 900
/// severity = "critical"
/// description = "Vehicle teleported"
/// condition = "event.gps.deltaDistanceKm > 200"
/// audit = true
///
/// [[rules.action]]
/// freeze-entity = { entityType = "shipment", entityId = "{{event.shipment.id}}" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDoc {
    /// Stable identifier, unique within the rule-set. Used in audit entries
    /// and error messages.
    pub id: String,

    /// Human-readable explanation of what this rule catches.
    #[serde(default)]
    pub description: String,

    /// Higher priorities evaluate (and audit) first. Ties keep document order.
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// Informational severity label, copied into audit metadata and blocks.
    #[serde(default)]
    pub severity: Severity,

    /// Condition source text in the expression language. Defaults to
    /// `"false"` so a rule without a condition can never fire.
    #[serde(default = "default_condition")]
    pub condition: String,

    /// When true, every match of this rule writes one audit entry.
    #[serde(default)]
    pub audit: bool,

    /// Ordered action directives. Each table must hold exactly one key, the
    /// action name, whose value is the payload template.
    ///
    /// Declared last: TOML serializes plain values before array-of-table
    /// fields, and this field becomes `[[rules.action]]` tables.
    #[serde(default)]
    pub action: Vec<toml::Table>,
}

fn default_priority() -> i64 {
    100
}

fn default_condition() -> String {
    "false".to_string()
}

/// The top-level structure of a rule-set file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetDoc {
    /// Format version of the rule-set file, for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: i64,

    /// Optional display name for the rule-set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The rules, in document order. The loader re-sorts by priority.
    #[serde(default)]
    pub rules: Vec<RuleDoc>,
}

fn default_schema_version() -> i64 {
    1
}

/// One named side effect with its pre-compiled payload template.
#[derive(Debug, Clone)]
pub struct ActionDirective {
    /// Action name as written in the rule file, e.g. `freeze-entity`.
    pub name: String,

    /// Payload with every string leaf parsed for `{{ ... }}` placeholders.
    pub payload: Arc<TemplateValue>,
}

/// A compiled rule, ready for the evaluator.
///
/// Compiled parts sit behind `Arc` so cloning a rule into a match record is
/// cheap.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub priority: i64,
    pub severity: Severity,

    /// Original condition text, kept for display and audit metadata.
    pub condition: String,

    /// The condition compiled at load time. Never re-parsed per event.
    pub compiled_condition: Arc<Expr>,

    /// Actions to dispatch, in document order, when the condition is truthy.
    pub actions: Vec<ActionDirective>,

    /// Whether a match of this rule must produce an audit entry.
    pub audit_required: bool,
}
