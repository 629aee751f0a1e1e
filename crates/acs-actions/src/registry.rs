//! Action handlers and the dispatching registry.
//!
//! One handler per [`ActionKind`], each with the same contract:
//!
//! - consume the resolved payload and the dispatch context
//! - perform the named side effect (durable ones go through the
//!   persistence adapter)
//! - return exactly one `ActionResult`, success or not
//!
//! A handler's own failure (missing payload field, persistence error) is
//! reported inside the result (`ok: false` plus `error`) and never escapes
//! the dispatch boundary. `reject-request` is the one deliberate
//! `ok: false` without `error`: rejection is the handler succeeding.

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use acs_contracts::{ActionResult, BlockKind, BlockRecord, Severity};
use acs_core::traits::{ActionDispatcher, DispatchContext};

use crate::kind::ActionKind;

/// The fixed table mapping action names to handlers.
///
/// Stateless; construct once and hand to the evaluator:
///
/// ```rust,ignore
/// let evaluator = Evaluator::new(store)
///     .with_dispatcher(Box::new(ActionRegistry::new()));
/// ```
#[derive(Debug, Default)]
pub struct ActionRegistry;

impl ActionRegistry {
    pub fn new() -> Self {
        ActionRegistry
    }
}

impl ActionDispatcher for ActionRegistry {
    fn dispatch(&self, name: &str, payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
        debug!(action = name, rule_id = ctx.rule_id, "dispatching action");
        match ActionKind::parse(name) {
            ActionKind::FreezeEntity => freeze_entity(payload, ctx),
            ActionKind::BlockEntity => block_entity(payload, ctx),
            ActionKind::CreateTicket => create_ticket(payload, ctx),
            ActionKind::EmitEvent => emit_event(payload, ctx),
            ActionKind::RejectRequest => reject_request(payload, ctx),
            ActionKind::FlagWatchlist => flag_watchlist(payload, ctx),
            ActionKind::RequireManualReview => require_manual_review(payload, ctx),
            ActionKind::RedactField => redact_field(payload, ctx),
            ActionKind::Throttle => throttle(payload, ctx),
            ActionKind::NotifyRole => notify_role(payload, ctx),
            ActionKind::Unknown(other) => stub_execute(&other, payload),
        }
    }
}

// ── Payload helpers ──────────────────────────────────────────────────────────

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn required<'a>(action: &str, payload: &'a Value, key: &str) -> Result<&'a str, ActionResult> {
    str_field(payload, key).ok_or_else(|| {
        ActionResult::failure(action, format!("payload missing required field '{}'", key))
    })
}

fn severity_field(payload: &Value) -> Severity {
    payload
        .get("severity")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Shared body of `freeze-entity` and `block-entity`: build the block row,
/// write it through the adapter when one is attached.
fn write_block(
    kind: BlockKind,
    action: &str,
    payload: &Value,
    ctx: &DispatchContext<'_>,
) -> Result<BlockRecord, ActionResult> {
    let entity_type = str_field(payload, "entityType").unwrap_or("entity");
    let entity_id = required(action, payload, "entityId")?;

    let block = BlockRecord::new(kind, entity_type, entity_id)
        .severity(severity_field(payload))
        .reason(str_field(payload, "reason").unwrap_or(""))
        .rule_id(ctx.rule_id);

    match ctx.persistence {
        Some(adapter) => {
            if let Err(e) = adapter.insert_block(&block) {
                return Err(ActionResult::failure(action, e.to_string()));
            }
        }
        None => {
            debug!(block_id = %block.id, "no persistence adapter, block not recorded");
        }
    }

    info!(
        block_id = %block.id,
        entity_type = %block.entity_type,
        entity_id = %block.entity_id,
        rule_id = ctx.rule_id,
        "entity taken out of circulation"
    );
    Ok(block)
}

fn freeze_entity(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    match write_block(BlockKind::Freeze, "freeze-entity", payload, ctx) {
        Ok(block) => ActionResult::success("freeze-entity").with_field("blockId", block.id.into()),
        Err(failure) => failure,
    }
}

fn block_entity(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    match write_block(BlockKind::Block, "block-entity", payload, ctx) {
        Ok(block) => ActionResult::success("block-entity")
            .with_field("blockId", block.id.into())
            .with_field("entityType", block.entity_type.into()),
        Err(failure) => failure,
    }
}

fn create_ticket(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let ticket_ref = format!("TCK-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let queue = str_field(payload, "queue").unwrap_or("default");
    info!(
        ticket_ref = %ticket_ref,
        queue,
        summary = str_field(payload, "summary").unwrap_or(""),
        rule_id = ctx.rule_id,
        "ticket opened"
    );
    ActionResult::success("create-ticket")
        .with_field("ticketRef", ticket_ref.into())
        .with_field("queue", queue.into())
}

fn emit_event(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let event_name = match required("emit-event", payload, "eventName") {
        Ok(name) => name,
        Err(failure) => return failure,
    };
    info!(event_name, rule_id = ctx.rule_id, "domain event emitted");
    ActionResult::success("emit-event").with_field("eventName", event_name.into())
}

fn reject_request(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let code = str_field(payload, "code").unwrap_or("REQUEST_REJECTED");
    let message = str_field(payload, "message").unwrap_or("request rejected by policy");
    info!(code, rule_id = ctx.rule_id, "request rejected");
    ActionResult::success("reject-request")
        .denied()
        .with_field("rejected", true.into())
        .with_field("code", code.into())
        .with_field("message", message.into())
}

fn flag_watchlist(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let entity_type = str_field(payload, "entityType").unwrap_or("entity");
    let entity_id = match required("flag-watchlist", payload, "entityId") {
        Ok(id) => id,
        Err(failure) => return failure,
    };
    info!(
        entity_type,
        entity_id,
        reason = str_field(payload, "reason").unwrap_or(""),
        rule_id = ctx.rule_id,
        "entity flagged to watchlist"
    );
    ActionResult::success("flag-watchlist")
        .with_field("entityType", entity_type.into())
        .with_field("entityId", entity_id.into())
}

fn require_manual_review(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let entity_id = match required("require-manual-review", payload, "entityId") {
        Ok(id) => id,
        Err(failure) => return failure,
    };
    let queue = str_field(payload, "queue").unwrap_or("manual-review");
    info!(entity_id, queue, rule_id = ctx.rule_id, "routed to manual review");
    ActionResult::success("require-manual-review")
        .with_field("entityId", entity_id.into())
        .with_field("queue", queue.into())
}

fn redact_field(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let field = match required("redact-field", payload, "field") {
        Ok(field) => field,
        Err(failure) => return failure,
    };
    info!(field, rule_id = ctx.rule_id, "field marked for redaction");
    ActionResult::success("redact-field").with_field("field", field.into())
}

fn throttle(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let key = match required("throttle", payload, "key") {
        Ok(key) => key,
        Err(failure) => return failure,
    };
    let window_sec = payload.get("windowSec").and_then(Value::as_i64).unwrap_or(60);
    info!(key, window_sec, rule_id = ctx.rule_id, "throttle applied");
    ActionResult::success("throttle")
        .with_field("key", key.into())
        .with_field("windowSec", window_sec.into())
}

fn notify_role(payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
    let role = match required("notify-role", payload, "role") {
        Ok(role) => role,
        Err(failure) => return failure,
    };
    let channel = str_field(payload, "channel").unwrap_or("ops");
    info!(role, channel, rule_id = ctx.rule_id, "role notified");
    ActionResult::success("notify-role")
        .with_field("role", role.into())
        .with_field("channel", channel.into())
}

/// Unknown action names degrade gracefully: log, echo the payload, report
/// stub execution. Never an error, so rule-sets can name handlers that roll
/// out after the rules do.
fn stub_execute(name: &str, payload: &Value) -> ActionResult {
    warn!(action = name, "unknown action name, stub-executed");
    ActionResult::success(name)
        .with_field("status", "stub-executed".into())
        .with_field("payload", payload.clone())
}
