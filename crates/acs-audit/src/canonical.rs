//! Canonicalization and hashing primitives for audit entries.
//!
//! The audit hash commits to the draft fields and nothing else. Every field
//! that contributes is listed explicitly so nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. The draft rendered as a JSON object with keys `action`, `entity_id`,
//!      `entity_type`, `metadata`, `performed_by`, `rule_id`
//!   2. Serialized compactly, keys lexicographically sorted at every nesting
//!      level (serde_json's map is ordered by key), no whitespace
//!   3. Fed to SHA-256; the digest is emitted as lowercase hex
//!
//! `id`, `timestamp`, and `audit_hash` itself never participate, so the hash
//! can be recomputed from a stored entry at any later time. Two logically
//! identical drafts built with fields in different order canonicalize to the
//! same bytes.

use serde_json::Value;
use sha2::{Digest, Sha256};

use acs_contracts::{AuditDraft, AuditEntry};

/// The canonical JSON bytes of a draft.
///
/// # Panics
///
/// Panics if the draft cannot be serialized to JSON, which cannot happen
/// for the well-formed `AuditDraft` type.
pub fn canonical_bytes(draft: &AuditDraft) -> Vec<u8> {
    let value: Value =
        serde_json::to_value(draft).expect("AuditDraft must always be serializable to JSON");
    serde_json::to_vec(&value).expect("JSON value must always serialize")
}

/// Compute the audit hash for a draft.
///
/// Returns a lowercase 64-character hex string.
pub fn compute_hash(draft: &AuditDraft) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(draft));
    hex::encode(hasher.finalize())
}

/// Verify a sealed entry against its own hash.
///
/// Rebuilds the draft from the entry's hashed fields, recomputes, and
/// compares. Any post-creation mutation of a hashed field makes this return
/// `false`; mutating `id` or `timestamp` does not, since they are outside
/// the hash.
pub fn verify(entry: &AuditEntry) -> bool {
    let draft = AuditDraft {
        entity_type: entry.entity_type.clone(),
        entity_id: entry.entity_id.clone(),
        action: entry.action.clone(),
        performed_by: entry.performed_by.clone(),
        rule_id: entry.rule_id.clone(),
        metadata: entry.metadata.clone(),
    };
    compute_hash(&draft) == entry.audit_hash
}
