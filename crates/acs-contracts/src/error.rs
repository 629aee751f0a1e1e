//! Error types for the ACS engine.
//!
//! All fallible operations across the ACS crates return `AcsResult<T>`.
//! Variants carry enough context to log a useful line at the boundary where
//! the error is caught; most of them never reach the caller of `evaluate`,
//! which degrades per rule/action/audit attempt instead of failing whole.

use thiserror::Error;

/// The unified error type for the ACS engine.
#[derive(Debug, Error)]
pub enum AcsError {
    /// A rule's condition (or a payload template) could not be compiled.
    ///
    /// Fatal for the whole rule-set: no partial set is ever activated.
    #[error("rule `{rule_id}` failed to compile: {reason}")]
    RuleCompilation { rule_id: String, reason: String },

    /// The rule-set document was structurally unacceptable (too few rules,
    /// duplicate ids, malformed action directive).
    #[error("rule-set rejected: {reason}")]
    RuleSetRejected { reason: String },

    /// A rule id was referenced (e.g. by a disable operation) but is not
    /// present in the set.
    #[error("rule `{rule_id}` not found in the active rule-set")]
    RuleNotFound { rule_id: String },

    /// A configuration source could not be read or parsed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The persistence adapter reported a storage failure.
    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    /// An audit entry could not be durably written.
    ///
    /// Audit writing is best-effort: callers log this variant and carry on
    /// with the in-memory entry. It must never fail the triggering operation.
    #[error("audit write failed: {reason}")]
    AuditWrite { reason: String },

    /// Key generation or encryption failed inside the local KMS.
    #[error("crypto failure: {reason}")]
    Crypto { reason: String },

    /// Decryption failed because the authentication tag did not verify.
    ///
    /// Security-relevant integrity failure: propagates hard, never swallowed.
    #[error("decryption failed for key `{key_id}`: authentication tag rejected")]
    DecryptFailed { key_id: String },
}

/// Convenience alias used throughout the ACS crates.
pub type AcsResult<T> = Result<T, AcsError>;
