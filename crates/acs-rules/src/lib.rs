//! # acs-rules
//!
//! Rule definitions for the shield: the TOML document schema, the loader
//! that compiles documents into evaluable [`Rule`]s, and the [`RuleStore`]
//! holding the process-wide active set.
//!
//! ## Loading
//!
//! ```rust,ignore
//! use acs_rules::{RuleLoader, RuleStore};
//!
//! let store = RuleStore::new();
//! store.load_file(Path::new("rulesets/logistics.toml"))?;
//! for rule in store.active().iter() {
//!     println!("{} (priority {})", rule.id, rule.priority);
//! }
//! ```
//!
//! Loading is all-or-nothing: one uncompilable condition, one malformed
//! action directive, a duplicate id, or an undersized set rejects the whole
//! document and leaves the previously active rules in place. Compiled sets
//! are sorted by priority descending (stable, so equal priorities keep
//! document order) and swapped in as a single reference replacement.

pub mod loader;
pub mod rule;
pub mod store;

pub use loader::{remove_rule, LoadOptions, RemovedRule, RuleLoader};
pub use rule::{ActionDirective, Rule, RuleDoc, RuleSetDoc};
pub use store::RuleStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
