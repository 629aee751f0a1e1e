//! Tamper-evident audit records.
//!
//! `AuditDraft` is what a caller hands to the audit writer; `AuditEntry` is
//! the sealed record that comes back, with its `audit_hash` computed over a
//! canonical serialization of the draft fields. Drafts are cheap to build
//! anywhere; entries are immutable once hashed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unsealed fields of an audit record, before id/timestamp/hash stamping.
///
/// Exactly the fields that participate in the hash. Anything a consumer may
/// mutate after the fact (there is nothing legitimate in that category) will
/// be caught by `verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDraft {
    /// Kind of the subject (`"shipment"`, `"user"`, `"rule"`, …).
    pub entity_type: String,
    /// Identifier of the subject within its kind.
    pub entity_id: String,
    /// The verb performed (`"rule-matched"`, `"rule-disabled"`, …).
    pub action: String,
    /// Actor the action is attributed to, when one is known.
    pub performed_by: Option<String>,
    /// Originating rule, when the action was rule-driven.
    pub rule_id: Option<String>,
    /// Arbitrary structured context for the decision.
    pub metadata: Value,
}

impl AuditDraft {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        AuditDraft {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            performed_by: None,
            rule_id: None,
            metadata: Value::Null,
        }
    }

    pub fn performed_by(mut self, actor: impl Into<String>) -> Self {
        self.performed_by = Some(actor.into());
        self
    }

    pub fn rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An immutable, hash-sealed audit record.
///
/// `audit_hash` is a hex SHA-256 digest over the canonical serialization of
/// every field except `id`, `timestamp`, and `audit_hash` itself. Recomputing
/// that digest at any later time and comparing is the tamper-detection
/// contract. Entries are append-only: this component never mutates or deletes
/// one after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique, time-sortable identifier (UUIDv7 text).
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub performed_by: Option<String>,
    pub rule_id: Option<String>,
    pub metadata: Value,
    /// Hex SHA-256 over the canonicalized draft fields.
    pub audit_hash: String,
    /// Wall-clock creation time (UTC). Not part of the hash.
    pub timestamp: DateTime<Utc>,
}
