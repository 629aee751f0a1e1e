//! Action dispatch results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The outcome of dispatching one action directive.
///
/// Every dispatch produces exactly one `ActionResult`, success or not: a
/// handler failure is reported inside the result (`ok: false` plus `error`),
/// never raised past the dispatch boundary. Handlers attach their identifying
/// output (`blockId`, `ticketRef`, …) as extra `fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// The action name as written in the rule's directive.
    pub action: String,
    /// Whether the handler considers the action to have succeeded.
    ///
    /// `reject-request` sets this to `false` with no `error`: a rejection is
    /// the handler working as intended, not a handler failure.
    pub ok: bool,
    /// Action-specific output fields, flattened alongside `action`/`ok`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Present only when the handler itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// A successful result with no extra fields yet.
    pub fn success(action: impl Into<String>) -> Self {
        ActionResult {
            action: action.into(),
            ok: true,
            fields: Map::new(),
            error: None,
        }
    }

    /// A handler-failure result carrying the error text.
    pub fn failure(action: impl Into<String>, error: impl Into<String>) -> Self {
        ActionResult {
            action: action.into(),
            ok: false,
            fields: Map::new(),
            error: Some(error.into()),
        }
    }

    /// Attach an output field, consuming and returning the result.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Mark the result as unsuccessful without recording a handler error.
    pub fn denied(mut self) -> Self {
        self.ok = false;
        self
    }

    /// Look up an output field by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
