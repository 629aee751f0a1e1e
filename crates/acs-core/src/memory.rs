//! In-memory implementation of `PersistenceAdapter`.
//!
//! `MemoryAdapter` is the reference implementation for tests, local
//! development, and the CLI harness. State lives behind `Arc<Mutex<_>>`, so
//! clones of the adapter share one store: hand a clone to the evaluator and
//! keep one for inspecting what got recorded.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use acs_contracts::{AcsError, AcsResult, AuditEntry, BlockRecord};

use crate::traits::PersistenceAdapter;

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    audit_logs: Vec<AuditEntry>,
    blocks: Vec<BlockRecord>,
    known_hashes: HashSet<String>,
}

// ── Public adapter ────────────────────────────────────────────────────────────

/// An in-memory, append-only persistence adapter.
///
/// # Thread safety
///
/// All methods acquire a `Mutex` internally; clones share the same state and
/// may be used from multiple threads without extra synchronization.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a content hash as already seen, so `check_hash_exists` (and the
    /// `exists_hash` condition builtin) reports it as a duplicate.
    pub fn seed_hash(&self, hash: impl Into<String>) {
        let mut state = self.state.lock().expect("memory adapter lock poisoned");
        state.known_hashes.insert(hash.into());
    }

    /// Snapshot of every audit entry recorded so far, in insertion order.
    pub fn audit_logs(&self) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("memory adapter lock poisoned");
        state.audit_logs.clone()
    }

    /// Snapshot of every block row recorded so far, in insertion order.
    pub fn blocks(&self) -> Vec<BlockRecord> {
        let state = self.state.lock().expect("memory adapter lock poisoned");
        state.blocks.clone()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn insert_audit_log(&self, entry: &AuditEntry) -> AcsResult<()> {
        let mut state = self.state.lock().map_err(|e| AcsError::Persistence {
            reason: format!("memory adapter lock poisoned: {}", e),
        })?;
        state.audit_logs.push(entry.clone());
        debug!(audit_id = %entry.id, total = state.audit_logs.len(), "audit entry stored");
        Ok(())
    }

    fn insert_block(&self, block: &BlockRecord) -> AcsResult<()> {
        let mut state = self.state.lock().map_err(|e| AcsError::Persistence {
            reason: format!("memory adapter lock poisoned: {}", e),
        })?;
        state.blocks.push(block.clone());
        debug!(block_id = %block.id, total = state.blocks.len(), "block stored");
        Ok(())
    }

    fn check_hash_exists(&self, hash: &str) -> AcsResult<bool> {
        let state = self.state.lock().map_err(|e| AcsError::Persistence {
            reason: format!("memory adapter lock poisoned: {}", e),
        })?;
        Ok(state.known_hashes.contains(hash))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use acs_contracts::{AuditEntry, BlockKind, BlockRecord, Severity};

    use crate::traits::PersistenceAdapter;

    use super::MemoryAdapter;

    fn entry(id: &str) -> AuditEntry {
        AuditEntry {
            id: id.to_string(),
            entity_type: "shipment".to_string(),
            entity_id: "SHP-1".to_string(),
            action: "frozen".to_string(),
            performed_by: None,
            rule_id: None,
            metadata: json!({}),
            audit_hash: "00".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_inserts_are_observable_through_clones() {
        let adapter = MemoryAdapter::new();
        let handle = adapter.clone();

        adapter.insert_audit_log(&entry("aud-1")).unwrap();
        adapter
            .insert_block(&BlockRecord::new(BlockKind::Freeze, "shipment", "SHP-1")
                .severity(Severity::Critical))
            .unwrap();

        assert_eq!(handle.audit_logs().len(), 1);
        assert_eq!(handle.audit_logs()[0].id, "aud-1");
        assert_eq!(handle.blocks().len(), 1);
        assert_eq!(handle.blocks()[0].entity_id, "SHP-1");
    }

    #[test]
    fn test_hash_lookup_and_seeding() {
        let adapter = MemoryAdapter::new();
        assert!(!adapter.check_hash_exists("abc").unwrap());

        adapter.seed_hash("abc");
        assert!(adapter.check_hash_exists("abc").unwrap());
        assert!(!adapter.check_hash_exists("def").unwrap());
    }
}
