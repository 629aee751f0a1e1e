//! The closed action vocabulary.
//!
//! Rule files name actions by kebab-case strings; dispatch happens over this
//! enum so the compiler checks every handler exists. Names outside the
//! vocabulary parse to [`ActionKind::Unknown`], which carries stub-executed
//! semantics instead of failing: rule-set authors can ship directives for
//! handlers that roll out later.

/// Every action a rule directive may name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Hold an entity in place pending review.
    FreezeEntity,
    /// Bar an entity from further operations.
    BlockEntity,
    /// Open a work item for a human queue.
    CreateTicket,
    /// Fire-and-forget a named domain event.
    EmitEvent,
    /// Deny the triggering request. The only action the embedding pipeline
    /// treats as a hard failure.
    RejectRequest,
    /// Put an entity on a watchlist.
    FlagWatchlist,
    /// Route the triggering operation to a manual review queue.
    RequireManualReview,
    /// Mask one field of the triggering payload downstream.
    RedactField,
    /// Rate-limit a key (user, device, lane) for a window.
    Throttle,
    /// Notify an operational role.
    NotifyRole,
    /// Anything else: logged and stub-executed, never an error.
    Unknown(String),
}

impl ActionKind {
    /// Map a directive name to its kind. Never fails.
    pub fn parse(name: &str) -> ActionKind {
        match name {
            "freeze-entity" => ActionKind::FreezeEntity,
            "block-entity" => ActionKind::BlockEntity,
            "create-ticket" => ActionKind::CreateTicket,
            "emit-event" => ActionKind::EmitEvent,
            "reject-request" => ActionKind::RejectRequest,
            "flag-watchlist" => ActionKind::FlagWatchlist,
            "require-manual-review" => ActionKind::RequireManualReview,
            "redact-field" => ActionKind::RedactField,
            "throttle" => ActionKind::Throttle,
            "notify-role" => ActionKind::NotifyRole,
            other => ActionKind::Unknown(other.to_string()),
        }
    }

    /// The kebab-case name as written in rule files.
    pub fn name(&self) -> &str {
        match self {
            ActionKind::FreezeEntity => "freeze-entity",
            ActionKind::BlockEntity => "block-entity",
            ActionKind::CreateTicket => "create-ticket",
            ActionKind::EmitEvent => "emit-event",
            ActionKind::RejectRequest => "reject-request",
            ActionKind::FlagWatchlist => "flag-watchlist",
            ActionKind::RequireManualReview => "require-manual-review",
            ActionKind::RedactField => "redact-field",
            ActionKind::Throttle => "throttle",
            ActionKind::NotifyRole => "notify-role",
            ActionKind::Unknown(name) => name,
        }
    }
}
