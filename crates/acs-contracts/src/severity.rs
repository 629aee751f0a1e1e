//! Rule severity labels.

use serde::{Deserialize, Serialize};

/// Informational severity attached to a rule.
///
/// Severity never changes control flow on its own: a `low` rule evaluates
/// exactly like a `critical` one. It travels into block records, audit
/// metadata, and operator-facing output, where humans triage on it.
///
/// Ordering follows escalation: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// The lowercase wire label, matching the rule-set file format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `pad` keeps width/alignment flags working in tabular output.
        f.pad(self.as_str())
    }
}
