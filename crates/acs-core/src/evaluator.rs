//! The ACS evaluator: the full-pass rule-matching pipeline.
//!
//! For every incoming event the evaluator runs the complete active rule list:
//!
//!   Context → per rule: Condition → Actions → Audit → RuleMatch
//!
//! Full-pass is deliberate. Priority controls the order rules evaluate (and
//! therefore the order actions and audit entries happen), never whether a
//! rule fires: independent concerns like "freeze the shipment" and "notify
//! fraud ops" compose without knowing about each other. Every per-rule
//! failure mode is contained at its own boundary: a condition error means
//! "no match", a handler error becomes a failed `ActionResult`, a lost audit
//! write is logged and swallowed. One bad rule never takes down the pass.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use acs_contracts::{ActionResult, AuditDraft};
use acs_rules::{Rule, RuleStore};

use crate::context::EvaluationContext;
use crate::traits::{ActionDispatcher, AuditSink, DispatchContext, PersistenceAdapter};

/// One matched rule with everything its match produced.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub rule_id: String,

    /// The rule as it was at match time. Cheap to clone: compiled parts are
    /// shared.
    pub rule: Rule,

    /// The raw truthy value the condition evaluated to.
    pub evaluation: Value,

    /// One result per dispatched action directive, in directive order.
    pub action_results: Vec<ActionResult>,

    /// Id of the audit entry written for this match, when the rule requires
    /// auditing and a sink is attached.
    pub audit_entry_id: Option<String>,
}

/// The central evaluator.
///
/// Owns the pluggable components and the handle to the active rule list.
/// Construct with [`Evaluator::new`] and attach components as the deployment
/// provides them. A bare evaluator still matches rules, it just cannot
/// dispatch actions, write audit entries, or answer `exists_hash`.
pub struct Evaluator {
    store: Arc<RuleStore>,
    dispatcher: Option<Box<dyn ActionDispatcher>>,
    audit: Option<Box<dyn AuditSink>>,
    persistence: Option<Box<dyn PersistenceAdapter>>,
}

impl Evaluator {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Evaluator {
            store,
            dispatcher: None,
            audit: None,
            persistence: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Box<dyn ActionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_audit_sink(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_persistence(mut self, persistence: Box<dyn PersistenceAdapter>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Evaluate one event against the active rule list.
    ///
    /// # Pipeline
    ///
    /// 1. Build an [`EvaluationContext`] borrowing `event`, `actor` (the
    ///    `ctx` root in conditions), `system`, and the persistence adapter.
    /// 2. Take the active rule list: one `Arc` clone, already sorted by
    ///    priority descending; a concurrent reload cannot change it mid-pass.
    /// 3. Per rule, evaluate the compiled condition. An evaluation error is
    ///    logged with the rule id and treated as "no match"; remaining rules
    ///    always run.
    /// 4. On a truthy result, resolve each directive's payload template and
    ///    dispatch it in directive order, collecting one `ActionResult` each.
    ///    A placeholder that fails to resolve stays literal; a handler
    ///    failure comes back as a failed result, never a panic or early exit.
    /// 5. If the rule requires auditing, record one audit entry (best-effort)
    ///    attributed to the actor's `userId`.
    /// 6. Append a [`RuleMatch`] and continue: full pass, no
    ///    stop-on-first-match.
    ///
    /// Never returns an error: every failure mode is contained per rule, per
    /// action, or per audit write.
    pub fn evaluate(&self, event: &Value, actor: &Value, system: &Value) -> Vec<RuleMatch> {
        let scope = EvaluationContext::new(event, actor, system, self.persistence.as_deref());
        let rules = self.store.active();

        debug!(
            rules = rules.len(),
            event_type = scope.event_type().unwrap_or("unknown"),
            "evaluation pass starting"
        );

        let mut matches = Vec::new();
        for rule in rules.iter() {
            // ── Condition ────────────────────────────────────────────────────
            let evaluation = match acs_expr::evaluate(&rule.compiled_condition, &scope) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        rule_id = %rule.id,
                        error = %e,
                        "condition evaluation failed, treating as no match"
                    );
                    continue;
                }
            };
            if !acs_expr::truthy(&evaluation) {
                continue;
            }

            debug!(rule_id = %rule.id, priority = rule.priority, "rule matched");

            // ── Actions ──────────────────────────────────────────────────────
            let action_results = self.dispatch_actions(rule, event, actor, system, &scope);

            // ── Audit ────────────────────────────────────────────────────────
            let audit_entry_id = if rule.audit_required {
                self.record_match(rule, &scope, &evaluation)
            } else {
                None
            };

            matches.push(RuleMatch {
                rule_id: rule.id.clone(),
                rule: rule.clone(),
                evaluation,
                action_results,
                audit_entry_id,
            });
        }

        debug!(matched = matches.len(), "evaluation pass complete");
        matches
    }

    fn dispatch_actions(
        &self,
        rule: &Rule,
        event: &Value,
        actor: &Value,
        system: &Value,
        scope: &EvaluationContext<'_>,
    ) -> Vec<ActionResult> {
        let dispatcher = match self.dispatcher.as_deref() {
            Some(dispatcher) => dispatcher,
            None => {
                if !rule.actions.is_empty() {
                    debug!(
                        rule_id = %rule.id,
                        skipped = rule.actions.len(),
                        "no dispatcher attached, actions skipped"
                    );
                }
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(rule.actions.len());
        for directive in &rule.actions {
            let payload = directive.payload.resolve(scope);
            let ctx = DispatchContext {
                event,
                actor,
                system,
                rule_id: &rule.id,
                persistence: self.persistence.as_deref(),
            };
            let result = dispatcher.dispatch(&directive.name, &payload, &ctx);
            if !result.ok && result.error.is_some() {
                warn!(
                    rule_id = %rule.id,
                    action = %result.action,
                    error = result.error.as_deref().unwrap_or(""),
                    "action handler reported failure"
                );
            }
            results.push(result);
        }
        results
    }

    /// Record the audit entry for one matched rule. Returns the entry id, or
    /// `None` when no sink is attached.
    fn record_match(
        &self,
        rule: &Rule,
        scope: &EvaluationContext<'_>,
        evaluation: &Value,
    ) -> Option<String> {
        let sink = match self.audit.as_deref() {
            Some(sink) => sink,
            None => {
                debug!(rule_id = %rule.id, "rule requires audit but no sink attached");
                return None;
            }
        };

        let mut draft = AuditDraft::new("rule", &rule.id, "rule-matched")
            .rule_id(&rule.id)
            .metadata(json!({
                "severity": rule.severity,
                "description": rule.description,
                "eventType": scope.event_type(),
                "evaluation": evaluation,
            }));
        if let Some(user) = scope.performed_by() {
            draft = draft.performed_by(user);
        }

        let entry = sink.record(draft, self.persistence.as_deref());
        debug!(rule_id = %rule.id, audit_id = %entry.id, "rule match audited");
        Some(entry.id)
    }
}

/// The first `reject-request` outcome across all matches, if any fired.
///
/// The embedding pipeline denies the triggering operation when this returns
/// `Some`, propagating the result's `code` and `message` fields. Results
/// with `error` set are handler failures, not rejections, and do not count.
pub fn first_rejection(matches: &[RuleMatch]) -> Option<&ActionResult> {
    matches
        .iter()
        .flat_map(|m| m.action_results.iter())
        .find(|r| r.action == "reject-request" && !r.ok && r.error.is_none())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use serde_json::{json, Value};

    use acs_contracts::{AcsResult, ActionResult, AuditDraft, AuditEntry, BlockRecord};
    use acs_rules::RuleStore;

    use crate::traits::{ActionDispatcher, AuditSink, DispatchContext, PersistenceAdapter};

    use super::{first_rejection, Evaluator};

    // ── Fixtures ─────────────────────────────────────────────────────────────

    const RULESET: &str = r#"
        [[rules]]
        id = "gps-impossible-jump"
        priority = 900
        severity = "critical"
        description = "Vehicle teleported: distance/time ratio physically impossible"
        condition = """
        event.type == 'gps.ping'
          && event.gps.deltaDistanceKm > 200
          && event.gps.deltaTimeSec < 600
        """
        audit = true

        [[rules.action]]
        freeze-entity = { entityType = "shipment", entityId = "{{event.shipmentId}}", reason = "GPS jump of {{event.gps.deltaDistanceKm}}km" }

        [[rules.action]]
        notify-role = { role = "ops-fraud" }

        [[rules]]
        id = "gps-any-ping"
        priority = 100
        condition = "event.type == 'gps.ping'"
    "#;

    fn store_with(ruleset: &str) -> Arc<RuleStore> {
        let store = RuleStore::new();
        store.load_str(ruleset).unwrap();
        Arc::new(store)
    }

    fn gps_event(delta_km: i64, delta_sec: i64) -> Value {
        json!({
            "type": "gps.ping",
            "shipmentId": "SHP-1",
            "gps": { "deltaDistanceKm": delta_km, "deltaTimeSec": delta_sec }
        })
    }

    // ── Mocks ────────────────────────────────────────────────────────────────

    /// Records every dispatch; fails actions whose name matches `fail`.
    struct MockDispatcher {
        calls: Arc<Mutex<Vec<(String, Value, String)>>>,
        fail: Option<String>,
    }

    impl MockDispatcher {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(vec![])),
                fail: None,
            }
        }

        fn failing(action: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(vec![])),
                fail: Some(action.to_string()),
            }
        }
    }

    impl ActionDispatcher for MockDispatcher {
        fn dispatch(&self, name: &str, payload: &Value, ctx: &DispatchContext<'_>) -> ActionResult {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), payload.clone(), ctx.rule_id.to_string()));

            if self.fail.as_deref() == Some(name) {
                return ActionResult::failure(name, "simulated handler failure");
            }
            if name == "reject-request" {
                return ActionResult::success(name)
                    .denied()
                    .with_field("rejected", json!(true))
                    .with_field("code", json!("KYC_REQUIRED"))
                    .with_field("message", json!("KYC verification required"));
            }
            ActionResult::success(name)
        }
    }

    /// Captures drafts and returns fabricated sealed entries.
    struct MockSink {
        drafts: Arc<Mutex<Vec<AuditDraft>>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                drafts: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl AuditSink for MockSink {
        fn record(&self, draft: AuditDraft, _adapter: Option<&dyn PersistenceAdapter>) -> AuditEntry {
            let mut drafts = self.drafts.lock().unwrap();
            drafts.push(draft.clone());
            AuditEntry {
                id: format!("aud-{:03}", drafts.len()),
                entity_type: draft.entity_type,
                entity_id: draft.entity_id,
                action: draft.action,
                performed_by: draft.performed_by,
                rule_id: draft.rule_id,
                metadata: draft.metadata,
                audit_hash: "feedface".to_string(),
                timestamp: Utc::now(),
            }
        }
    }

    /// Adapter that knows a fixed set of hashes and records nothing.
    struct FixedHashes(Vec<String>);

    impl PersistenceAdapter for FixedHashes {
        fn insert_audit_log(&self, _entry: &AuditEntry) -> AcsResult<()> {
            Ok(())
        }

        fn insert_block(&self, _block: &BlockRecord) -> AcsResult<()> {
            Ok(())
        }

        fn check_hash_exists(&self, hash: &str) -> AcsResult<bool> {
            Ok(self.0.iter().any(|h| h == hash))
        }
    }

    // ── Matching and dispatch ────────────────────────────────────────────────

    /// A 250km/200s jump matches; payload templates resolve against the
    /// event; both directives dispatch in document order.
    #[test]
    fn test_matching_rule_dispatches_actions_in_order() {
        let dispatcher = MockDispatcher::new();
        let calls = dispatcher.calls.clone();

        let evaluator =
            Evaluator::new(store_with(RULESET)).with_dispatcher(Box::new(dispatcher));
        let matches = evaluator.evaluate(&gps_event(250, 200), &json!({}), &json!({}));

        assert_eq!(matches.len(), 2, "jump rule and catch-all should both match");
        assert_eq!(matches[0].rule_id, "gps-impossible-jump");
        assert_eq!(matches[0].action_results.len(), 2);
        assert!(matches[0].action_results.iter().all(|r| r.ok));

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "freeze-entity");
        assert_eq!(calls[0].1["entityId"], json!("SHP-1"));
        assert_eq!(calls[0].1["reason"], json!("GPS jump of 250km"));
        assert_eq!(calls[0].2, "gps-impossible-jump");
        assert_eq!(calls[1].0, "notify-role");
    }

    /// A 50km jump stays below the threshold: the jump rule must not match.
    #[test]
    fn test_below_threshold_event_does_not_match() {
        let evaluator = Evaluator::new(store_with(RULESET));
        let matches = evaluator.evaluate(&gps_event(50, 200), &json!({}), &json!({}));

        assert!(matches.iter().all(|m| m.rule_id != "gps-impossible-jump"));
        assert_eq!(matches.len(), 1, "only the catch-all should match");
    }

    /// A condition that errors at runtime is "no match" for that one rule;
    /// every other rule still runs.
    #[test]
    fn test_condition_error_is_no_match_and_evaluation_continues() {
        let ruleset = r#"
            [[rules]]
            id = "orders-a-string"
            priority = 500
            condition = "event.note > 10"

            [[rules]]
            id = "always-on"
            condition = "true"
        "#;

        let evaluator = Evaluator::new(store_with(ruleset));
        let matches = evaluator.evaluate(&json!({"note": "text"}), &json!({}), &json!({}));

        let ids: Vec<&str> = matches.iter().map(|m| m.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["always-on"]);
    }

    /// Matches come back in priority order because the active list is
    /// pre-sorted; no re-sort happens per call.
    #[test]
    fn test_matches_follow_priority_order() {
        let ruleset = r#"
            [[rules]]
            id = "low"
            priority = 10
            condition = "true"

            [[rules]]
            id = "high"
            priority = 1000
            condition = "true"

            [[rules]]
            id = "mid"
            priority = 500
            condition = "true"
        "#;

        let evaluator = Evaluator::new(store_with(ruleset));
        let matches = evaluator.evaluate(&json!({}), &json!({}), &json!({}));
        let ids: Vec<&str> = matches.iter().map(|m| m.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    /// Without a dispatcher the match is still reported, with no results.
    #[test]
    fn test_no_dispatcher_still_reports_match() {
        let evaluator = Evaluator::new(store_with(RULESET));
        let matches = evaluator.evaluate(&gps_event(250, 200), &json!({}), &json!({}));

        assert_eq!(matches[0].rule_id, "gps-impossible-jump");
        assert!(matches[0].action_results.is_empty());
    }

    // ── Audit behavior ───────────────────────────────────────────────────────

    /// Only audit-required rules write entries; the entry is attributed to
    /// the actor's userId and carries the rule id.
    #[test]
    fn test_audit_written_only_for_audit_required_rules() {
        let sink = MockSink::new();
        let drafts = sink.drafts.clone();

        let evaluator = Evaluator::new(store_with(RULESET)).with_audit_sink(Box::new(sink));
        let matches = evaluator.evaluate(
            &gps_event(250, 200),
            &json!({"userId": "usr-77", "role": "driver"}),
            &json!({}),
        );

        // Both rules matched, but only the jump rule has audit = true.
        let drafts = drafts.lock().unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].entity_id, "gps-impossible-jump");
        assert_eq!(drafts[0].action, "rule-matched");
        assert_eq!(drafts[0].performed_by.as_deref(), Some("usr-77"));
        assert_eq!(drafts[0].rule_id.as_deref(), Some("gps-impossible-jump"));
        assert_eq!(drafts[0].metadata["severity"], json!("critical"));
        assert_eq!(drafts[0].metadata["eventType"], json!("gps.ping"));

        assert_eq!(matches[0].audit_entry_id.as_deref(), Some("aud-001"));
        assert_eq!(matches[1].audit_entry_id, None);
    }

    // ── Persistence-backed conditions ────────────────────────────────────────

    /// `exists_hash` consults the attached adapter; without one the
    /// condition errors out into "no match".
    #[test]
    fn test_exists_hash_uses_persistence_adapter() {
        let ruleset = r#"
            [[rules]]
            id = "duplicate-pod"
            condition = "exists_hash(event.pod.fileHash)"
        "#;
        let event = json!({"pod": {"fileHash": "abc123"}});

        let seen = Evaluator::new(store_with(ruleset))
            .with_persistence(Box::new(FixedHashes(vec!["abc123".to_string()])));
        assert_eq!(seen.evaluate(&event, &json!({}), &json!({})).len(), 1);

        let unseen = Evaluator::new(store_with(ruleset))
            .with_persistence(Box::new(FixedHashes(vec![])));
        assert!(unseen.evaluate(&event, &json!({}), &json!({})).is_empty());

        // No adapter attached: AdapterUnavailable is caught as no-match.
        let bare = Evaluator::new(store_with(ruleset));
        assert!(bare.evaluate(&event, &json!({}), &json!({})).is_empty());
    }

    // ── Failure containment ──────────────────────────────────────────────────

    /// A failing handler yields a failed result; the sibling action still
    /// dispatches and the pass completes.
    #[test]
    fn test_handler_failure_is_contained() {
        let dispatcher = MockDispatcher::failing("freeze-entity");
        let calls = dispatcher.calls.clone();

        let evaluator =
            Evaluator::new(store_with(RULESET)).with_dispatcher(Box::new(dispatcher));
        let matches = evaluator.evaluate(&gps_event(250, 200), &json!({}), &json!({}));

        let results = &matches[0].action_results;
        assert_eq!(results.len(), 2);
        assert!(!results[0].ok);
        assert!(results[0].error.as_deref().unwrap().contains("simulated"));
        assert!(results[1].ok, "sibling action must still run");

        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    /// `first_rejection` finds a reject-request result and ignores handler
    /// failures.
    #[test]
    fn test_first_rejection_finds_reject_request() {
        let ruleset = r#"
            [[rules]]
            id = "kyc-gate"
            condition = "ctx.userKycStatus != 'VERIFIED'"

            [[rules.action]]
            reject-request = { code = "KYC_REQUIRED", message = "KYC verification required" }
        "#;

        let evaluator =
            Evaluator::new(store_with(ruleset)).with_dispatcher(Box::new(MockDispatcher::new()));
        let matches = evaluator.evaluate(
            &json!({"type": "booking.create"}),
            &json!({"userId": "usr-9", "userKycStatus": "PENDING"}),
            &json!({}),
        );

        let rejection = first_rejection(&matches).expect("rejection should be found");
        assert_eq!(rejection.field("code"), Some(&json!("KYC_REQUIRED")));

        // A verified actor sails through.
        let matches = evaluator.evaluate(
            &json!({"type": "booking.create"}),
            &json!({"userId": "usr-9", "userKycStatus": "VERIFIED"}),
            &json!({}),
        );
        assert!(first_rejection(&matches).is_none());
    }
}
