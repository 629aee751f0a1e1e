//! # acs-audit
//!
//! Tamper-evident audit entries for the ACS engine.
//!
//! ## Overview
//!
//! Every entry carries a SHA-256 hash over a canonical serialization of its
//! content fields. Canonicalization sorts object keys at every nesting
//! level, so two logically identical entries hash identically no matter how
//! their fields were assembled. Tampering with any hashed field, even a
//! single byte, is detected by [`verify`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use acs_audit::{verify, AuditWriter};
//! use acs_contracts::AuditDraft;
//!
//! let writer = AuditWriter::new();
//! let draft = AuditDraft::new("shipment", "SHP-1", "frozen")
//!     .performed_by("usr-42")
//!     .metadata(serde_json::json!({ "reason": "GPS jump" }));
//! let entry = writer.record(draft, Some(&adapter));
//!
//! assert!(verify(&entry));
//! ```

pub mod canonical;
pub mod writer;

pub use canonical::{canonical_bytes, compute_hash, verify};
pub use writer::AuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use acs_contracts::{AcsError, AcsResult, AuditDraft, AuditEntry, BlockRecord};
    use acs_core::traits::{AuditSink, PersistenceAdapter};
    use acs_core::MemoryAdapter;

    use super::{compute_hash, verify, AuditWriter};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_draft() -> AuditDraft {
        AuditDraft::new("shipment", "SHP-1", "frozen")
            .performed_by("usr-42")
            .rule_id("gps-impossible-jump")
            .metadata(json!({ "reason": "GPS jump", "deltaKm": 250 }))
    }

    /// An adapter whose audit inserts always fail.
    struct BrokenAdapter;

    impl PersistenceAdapter for BrokenAdapter {
        fn insert_audit_log(&self, _entry: &AuditEntry) -> AcsResult<()> {
            Err(AcsError::Persistence {
                reason: "simulated outage".to_string(),
            })
        }

        fn insert_block(&self, _block: &BlockRecord) -> AcsResult<()> {
            Ok(())
        }

        fn check_hash_exists(&self, _hash: &str) -> AcsResult<bool> {
            Ok(false)
        }
    }

    // ── 1. hash determinism ───────────────────────────────────────────────────

    /// `verify(create(...))` holds for every draft shape, sparse or full.
    #[test]
    fn test_verify_accepts_freshly_created_entries() {
        let writer = AuditWriter::new();

        let full = writer.create(make_draft());
        assert!(verify(&full));
        assert_eq!(full.audit_hash.len(), 64, "lowercase hex SHA-256");

        let sparse = writer.create(AuditDraft::new("user", "usr-9", "kyc-submitted"));
        assert!(verify(&sparse));
    }

    /// Metadata maps assembled in different key orders canonicalize to the
    /// same bytes and therefore the same hash.
    #[test]
    fn test_hash_ignores_field_insertion_order() {
        let mut forward = Map::new();
        forward.insert("alpha".to_string(), json!(1));
        forward.insert("beta".to_string(), json!({"y": 2, "x": 1}));

        let mut backward = Map::new();
        backward.insert("beta".to_string(), json!({"x": 1, "y": 2}));
        backward.insert("alpha".to_string(), json!(1));

        let a = AuditDraft::new("shipment", "SHP-1", "frozen").metadata(Value::Object(forward));
        let b = AuditDraft::new("shipment", "SHP-1", "frozen").metadata(Value::Object(backward));

        assert_eq!(compute_hash(&a), compute_hash(&b));
    }

    /// Different content must hash differently.
    #[test]
    fn test_hash_reflects_content() {
        let base = compute_hash(&make_draft());
        let changed = compute_hash(&make_draft().metadata(json!({ "deltaKm": 251 })));
        assert_ne!(base, changed);
    }

    // ── 2. tamper detection ───────────────────────────────────────────────────

    /// Mutating any hashed field after creation breaks verification;
    /// mutating the unhashed `id`/`timestamp` does not.
    #[test]
    fn test_tamper_detection() {
        let writer = AuditWriter::new();

        let mut entry = writer.create(make_draft());
        entry.action = "unfrozen".to_string();
        assert!(!verify(&entry), "mutated action must be detected");

        let mut entry = writer.create(make_draft());
        entry.metadata["deltaKm"] = json!(5);
        assert!(!verify(&entry), "mutated metadata must be detected");

        let mut entry = writer.create(make_draft());
        entry.performed_by = None;
        assert!(!verify(&entry), "dropped attribution must be detected");

        let mut entry = writer.create(make_draft());
        entry.id = "aud-rewritten".to_string();
        entry.timestamp = chrono::Utc::now();
        assert!(verify(&entry), "id and timestamp are outside the hash");
    }

    // ── 3. identifiers ────────────────────────────────────────────────────────

    /// Entry ids are time-sortable: later entries sort after earlier ones.
    #[test]
    fn test_ids_are_time_sortable() {
        let writer = AuditWriter::new();
        let first = writer.create(make_draft());
        // UUIDv7 leads with a millisecond timestamp; step past it.
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = writer.create(make_draft());

        assert_ne!(first.id, second.id);
        assert!(
            first.id < second.id,
            "v7 ids must sort by creation time: {} vs {}",
            first.id,
            second.id
        );
    }

    // ── 4. persistence behavior ───────────────────────────────────────────────

    /// `record` persists through the adapter; the stored entry verifies.
    #[test]
    fn test_record_persists_through_adapter() {
        let adapter = MemoryAdapter::new();
        let writer = AuditWriter::new();

        let entry = writer.record(make_draft(), Some(&adapter));

        let stored = adapter.audit_logs();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, entry.id);
        assert!(verify(&stored[0]));
    }

    /// A persistence outage is swallowed by `record`: the sealed entry still
    /// comes back with a valid hash. The lower-level `write` reports it.
    #[test]
    fn test_write_failure_is_swallowed_by_record() {
        let writer = AuditWriter::new();

        let entry = writer.record(make_draft(), Some(&BrokenAdapter));
        assert!(verify(&entry), "entry must be sealed even when unpersisted");

        match writer.write(&entry, Some(&BrokenAdapter)) {
            Err(AcsError::AuditWrite { reason }) => {
                assert!(reason.contains("simulated outage"), "unexpected reason: {reason}");
            }
            other => panic!("expected AuditWrite, got {:?}", other),
        }
    }

    /// With no adapter attached, `write` is a no-op success.
    #[test]
    fn test_write_without_adapter_is_ok() {
        let writer = AuditWriter::new();
        let entry = writer.create(make_draft());
        assert!(writer.write(&entry, None).is_ok());
    }
}
