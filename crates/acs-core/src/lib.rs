//! # acs-core
//!
//! The evaluation runtime of the Anti-Corruption Shield.
//!
//! This crate provides:
//! - The three trait seams (`PersistenceAdapter`, `ActionDispatcher`,
//!   `AuditSink`)
//! - The per-event `EvaluationContext` that conditions read through
//! - The `Evaluator` that runs the full-pass rule pipeline
//! - `MemoryAdapter`, the in-memory reference persistence implementation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use acs_core::{Evaluator, MemoryAdapter};
//! use acs_rules::RuleStore;
//!
//! let store = Arc::new(RuleStore::new());
//! store.load_file(Path::new("rulesets/logistics.toml"))?;
//! let evaluator = Evaluator::new(store)
//!     .with_persistence(Box::new(MemoryAdapter::new()));
//! let matches = evaluator.evaluate(&event, &actor, &system_config);
//! ```

pub mod context;
pub mod evaluator;
pub mod memory;
pub mod traits;

pub use context::EvaluationContext;
pub use evaluator::{first_rejection, Evaluator, RuleMatch};
pub use memory::MemoryAdapter;
pub use traits::{ActionDispatcher, AuditSink, DispatchContext, PersistenceAdapter};
