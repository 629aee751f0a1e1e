//! Entity block and freeze records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::severity::Severity;

/// How an entity was taken out of circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// Entity is held in place mid-flight (e.g. a shipment pending review).
    Freeze,
    /// Entity is barred from further operations until manually cleared.
    Block,
}

/// A row the `freeze-entity` / `block-entity` handlers write through the
/// persistence adapter. One record per action dispatch; clearing a block is
/// an operator workflow outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Unique identifier, `blk-` prefixed.
    pub id: String,
    pub kind: BlockKind,
    pub entity_type: String,
    pub entity_id: String,
    pub severity: Severity,
    pub reason: String,
    /// Rule that triggered the block, when rule-driven.
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BlockRecord {
    pub fn new(
        kind: BlockKind,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        BlockRecord {
            id: format!("blk-{}", Uuid::new_v4()),
            kind,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            severity: Severity::default(),
            reason: String::new(),
            rule_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}
