//! The per-event evaluation context.

use serde_json::Value;

use acs_expr::{EvalError, Scope};

use crate::traits::PersistenceAdapter;

/// Everything one evaluation call can see.
///
/// Built per incoming event, borrowed for the duration of the call,
/// discarded afterwards. Condition expressions read it through the
/// [`Scope`] impl: `event` and `system` map to their documents, `ctx` maps
/// to the actor document, and `exists_hash` reaches the persistence adapter
/// when one is attached.
pub struct EvaluationContext<'a> {
    pub event: &'a Value,
    pub actor: &'a Value,
    pub system: &'a Value,
    pub persistence: Option<&'a dyn PersistenceAdapter>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        event: &'a Value,
        actor: &'a Value,
        system: &'a Value,
        persistence: Option<&'a dyn PersistenceAdapter>,
    ) -> Self {
        EvaluationContext {
            event,
            actor,
            system,
            persistence,
        }
    }

    /// The actor's user id, when the context carries one. Audit entries for
    /// rule matches are attributed to this.
    pub fn performed_by(&self) -> Option<&str> {
        self.actor.get("userId").and_then(Value::as_str)
    }

    /// The event's `type` field, when present. Used in audit metadata.
    pub fn event_type(&self) -> Option<&str> {
        self.event.get("type").and_then(Value::as_str)
    }
}

impl Scope for EvaluationContext<'_> {
    fn root(&self, name: &str) -> Option<&Value> {
        match name {
            "event" => Some(self.event),
            "ctx" => Some(self.actor),
            "system" => Some(self.system),
            _ => None,
        }
    }

    fn hash_exists(&self, hash: &str) -> Result<bool, EvalError> {
        let adapter = self.persistence.ok_or(EvalError::AdapterUnavailable)?;
        adapter.check_hash_exists(hash).map_err(|e| EvalError::Lookup {
            detail: e.to_string(),
        })
    }
}
