//! # acs-contracts
//!
//! Shared types and the error taxonomy for the ACS (Anti-Corruption Shield)
//! rule engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod action;
pub mod audit;
pub mod block;
pub mod error;
pub mod severity;

pub use action::ActionResult;
pub use audit::{AuditDraft, AuditEntry};
pub use block::{BlockKind, BlockRecord};
pub use error::{AcsError, AcsResult};
pub use severity::Severity;
