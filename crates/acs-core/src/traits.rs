//! Trait seams for the ACS evaluation pipeline.
//!
//! Three boundaries keep the engine pluggable:
//!
//! - `PersistenceAdapter`: the storage the engine depends on but does not
//!   implement (audit rows, block rows, hash lookups)
//! - `ActionDispatcher`: turns a matched rule's directives into side
//!   effects and structured results
//! - `AuditSink`: builds and best-effort-persists tamper-evident audit
//!   entries
//!
//! The evaluator wires them together; every one of them can be swapped for a
//! mock in tests or a production implementation in deployment.

use serde_json::Value;

use acs_contracts::{AcsResult, ActionResult, AuditDraft, AuditEntry, BlockRecord};

/// The storage boundary.
///
/// Implementations are expected to be cheap to call from the evaluation hot
/// path: `check_hash_exists` backs the `exists_hash` condition builtin and
/// runs once per rule that uses it.
pub trait PersistenceAdapter: Send + Sync {
    /// Append one audit entry. Append-only: entries are never updated or
    /// deleted through this boundary.
    fn insert_audit_log(&self, entry: &AuditEntry) -> AcsResult<()>;

    /// Record a freeze/block row for an entity.
    fn insert_block(&self, block: &BlockRecord) -> AcsResult<()>;

    /// Point lookup: has this content hash been seen before?
    fn check_hash_exists(&self, hash: &str) -> AcsResult<bool>;
}

/// Everything an action handler may consult besides its resolved payload.
pub struct DispatchContext<'a> {
    /// The triggering event document.
    pub event: &'a Value,

    /// The actor/request context (`ctx` in rule conditions).
    pub actor: &'a Value,

    /// Slow-changing configuration and read-only indices.
    pub system: &'a Value,

    /// Id of the rule whose directive is being dispatched.
    pub rule_id: &'a str,

    /// Storage handle for handlers with durable side effects.
    pub persistence: Option<&'a dyn PersistenceAdapter>,
}

/// Dispatches one action directive.
///
/// Implementations must never let a handler failure escape: a failed handler
/// is reported as an [`ActionResult`] with `ok = false` and an `error`
/// message, so sibling actions and remaining rules always proceed. Unknown
/// action names degrade to a logged stub result rather than an error.
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, name: &str, payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult;
}

/// Builds and persists tamper-evident audit entries.
///
/// Recording is best-effort by contract: implementations hash and return the
/// entry even when persistence fails, logging the failure instead of
/// propagating it. Audit writing must never fail the operation that
/// triggered it.
pub trait AuditSink: Send + Sync {
    fn record(&self, draft: AuditDraft, adapter: Option<&dyn PersistenceAdapter>) -> AuditEntry;
}
