//! The process-wide active rule list.
//!
//! `RuleStore` owns the list the evaluator iterates. Replacement is a single
//! `Arc` swap behind a reader-writer lock: an in-flight evaluation holds its
//! own `Arc` clone and sees either the old or the new complete set, never a
//! partially-updated one. A failed reload leaves the previous set active.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use acs_contracts::{AcsError, AcsResult};

use crate::loader::{LoadOptions, RuleLoader};
use crate::rule::Rule;

pub struct RuleStore {
    loader: RuleLoader,
    // The guard only ever holds complete lists: writers assign a freshly
    // built Arc, never mutate in place.
    active: RwLock<Arc<Vec<Rule>>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    /// An empty store with default load options.
    pub fn new() -> Self {
        Self::with_options(LoadOptions::default())
    }

    pub fn with_options(options: LoadOptions) -> Self {
        RuleStore {
            loader: RuleLoader::with_options(options),
            active: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Compile `source` and activate it. On error the active set is
    /// untouched. Returns the number of active rules.
    pub fn load_str(&self, source: &str) -> AcsResult<usize> {
        let rules = self.loader.load_str(source)?;
        Ok(self.swap(rules))
    }

    /// Compile the file at `path` and activate it. On error the active set
    /// is untouched.
    pub fn load_file(&self, path: &Path) -> AcsResult<usize> {
        let rules = self.loader.load_file(path)?;
        Ok(self.swap(rules))
    }

    /// Replace the active set wholesale. Returns the new rule count.
    pub fn swap(&self, rules: Vec<Rule>) -> usize {
        let count = rules.len();
        let mut guard = self.active.write().expect("rule store lock poisoned");
        *guard = Arc::new(rules);
        info!(count, "active rule-set swapped");
        count
    }

    /// The current active set, sorted by priority descending. The returned
    /// `Arc` stays valid across concurrent reloads.
    pub fn active(&self) -> Arc<Vec<Rule>> {
        let guard = self.active.read().expect("rule store lock poisoned");
        Arc::clone(&guard)
    }

    /// Remove one rule from the active set by id, returning the removed rule
    /// so the caller can record the disablement.
    ///
    /// Only touches the in-memory set; rewriting the rule-set source is
    /// [`remove_rule`](crate::loader::remove_rule)'s job.
    pub fn disable(&self, rule_id: &str) -> AcsResult<Rule> {
        let mut guard = self.active.write().expect("rule store lock poisoned");
        let position = guard
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or_else(|| AcsError::RuleNotFound {
                rule_id: rule_id.to_string(),
            })?;

        let mut rules: Vec<Rule> = guard.as_ref().clone();
        let removed = rules.remove(position);
        *guard = Arc::new(rules);

        info!(
            rule_id = %removed.id,
            remaining = guard.len(),
            "rule disabled in active set"
        );
        Ok(removed)
    }
}
