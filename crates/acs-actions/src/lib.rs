//! # acs-actions
//!
//! The side-effect vocabulary of the shield: a closed set of action
//! handlers dispatched by name from matched rules.
//!
//! ## Contract
//!
//! Dispatch never throws. Every directive produces exactly one
//! `ActionResult`: handler failures come back as `ok: false` with `error`,
//! a rejection comes back as `ok: false` with `rejected: true` and no
//! `error`, and unknown action names are logged and stub-executed. Durable
//! side effects (freeze/block rows) go through the `PersistenceAdapter`.

pub mod kind;
pub mod registry;

pub use kind::ActionKind;
pub use registry::ActionRegistry;

// ── Tests ─────────────────────────────────────────────────────────────────────
