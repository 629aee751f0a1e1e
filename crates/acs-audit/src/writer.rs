//! The hashing audit writer.
//!
//! `AuditWriter` seals drafts into entries (canonicalize → hash → stamp) and
//! persists them through the `PersistenceAdapter` boundary. Persistence is
//! best-effort by contract: a failed write is logged and swallowed, because
//! an audit outage must never fail the business operation that triggered it.
//! The sealed entry, hash intact, is returned to the caller either way.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use acs_contracts::{AcsError, AcsResult, AuditDraft, AuditEntry};
use acs_core::traits::{AuditSink, PersistenceAdapter};

use crate::canonical::compute_hash;

/// Builds tamper-evident audit entries.
///
/// Stateless; construct once and share. Implements
/// [`AuditSink`] so the evaluator can record rule matches through it.
#[derive(Debug, Default)]
pub struct AuditWriter;

impl AuditWriter {
    pub fn new() -> Self {
        AuditWriter
    }

    /// Seal a draft into an immutable entry.
    ///
    /// Stamps a UUIDv7 id (time-sortable, so entries list in creation order)
    /// and the creation timestamp, and computes the audit hash over the
    /// draft's canonical serialization.
    pub fn create(&self, draft: AuditDraft) -> AuditEntry {
        let audit_hash = compute_hash(&draft);
        let entry = AuditEntry {
            id: Uuid::now_v7().to_string(),
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            action: draft.action,
            performed_by: draft.performed_by,
            rule_id: draft.rule_id,
            metadata: draft.metadata,
            audit_hash,
            timestamp: Utc::now(),
        };
        debug!(
            audit_id = %entry.id,
            entity_type = %entry.entity_type,
            action = %entry.action,
            "audit entry sealed"
        );
        entry
    }

    /// Persist an entry through the adapter.
    ///
    /// With no adapter this is a no-op success: the caller keeps the sealed
    /// in-memory entry. An adapter failure surfaces as
    /// [`AcsError::AuditWrite`]; callers on the evaluation path log it and
    /// carry on rather than propagating.
    pub fn write(&self, entry: &AuditEntry, adapter: Option<&dyn PersistenceAdapter>) -> AcsResult<()> {
        let adapter = match adapter {
            Some(adapter) => adapter,
            None => {
                debug!(audit_id = %entry.id, "no persistence adapter, audit entry not persisted");
                return Ok(());
            }
        };
        adapter
            .insert_audit_log(entry)
            .map_err(|e| AcsError::AuditWrite {
                reason: format!("failed to persist audit entry '{}': {}", entry.id, e),
            })
    }
}

impl AuditSink for AuditWriter {
    /// Seal and best-effort persist in one step.
    ///
    /// The entry comes back with a valid hash even when persistence failed;
    /// the failure is logged at `warn!` and swallowed here so no caller up
    /// the evaluation path has to handle it.
    fn record(&self, draft: AuditDraft, adapter: Option<&dyn PersistenceAdapter>) -> AuditEntry {
        let entry = self.create(draft);
        if let Err(e) = self.write(&entry, adapter) {
            warn!(audit_id = %entry.id, error = %e, "audit persistence failed, continuing");
        }
        entry
    }
}
