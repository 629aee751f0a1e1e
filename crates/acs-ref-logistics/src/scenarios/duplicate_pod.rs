//! Scenario 3: Duplicate Proof-of-Delivery
//!
//! A driver submits the same proof-of-delivery document twice. The first
//! upload passes and the platform records its file hash; the replay is
//! rejected, a fraud ticket is opened, and the match is audited.
//!
//! Pipeline walk-through for the demo run:
//!   1. Load the embedded logistics rule-set into a `RuleStore`
//!   2. Evaluate the first `pod.upload`; the hash is unknown, nothing fires
//!   3. The platform accepts the upload and seeds its hash into persistence
//!   4. Evaluate the identical upload again; `exists_hash` now reports true
//!   5. `pod-duplicate-hash` rejects the request and opens a fraud ticket
//!   6. The audited match lands in the adapter with a verifiable hash

use std::sync::Arc;

use acs_actions::ActionRegistry;
use acs_audit::AuditWriter;
use acs_contracts::error::AcsResult;
use acs_core::{
    evaluator::{first_rejection, Evaluator},
    memory::MemoryAdapter,
};
use acs_rules::store::RuleStore;

use crate::{mock_data, REFERENCE_RULESET};

/// Run Scenario 3: Duplicate Proof-of-Delivery.
///
/// Same event evaluated twice around a persistence write, showing how
/// `exists_hash` turns the adapter's memory into a replay detector.
pub fn run_scenario() -> AcsResult<()> {
    println!("=== Scenario 3: Duplicate Proof-of-Delivery ===");
    println!();

    // ── Wire up the shield ────────────────────────────────────────────────────

    let store = Arc::new(RuleStore::new());
    store.load_str(REFERENCE_RULESET)?;

    let adapter = MemoryAdapter::new();

    let evaluator = Evaluator::new(Arc::clone(&store))
        .with_dispatcher(Box::new(ActionRegistry::new()))
        .with_audit_sink(Box::new(AuditWriter::new()))
        .with_persistence(Box::new(adapter.clone()));

    let system = mock_data::system_config();

    // ── First upload: hash unseen ─────────────────────────────────────────────

    let (event, actor) = mock_data::pod_duplicate();

    println!("  Event: pod.upload for SHP-8873");
    println!("  Hash:  {}...", &mock_data::DUPLICATE_POD_HASH[..16]);
    println!();

    let matches = evaluator.evaluate(&event, &actor, &system);
    match first_rejection(&matches) {
        Some(_) => println!("  First upload REJECTED (unexpected)"),
        None => println!("  First upload accepted; recording file hash"),
    }

    // The platform persists the accepted document's hash. Replays of the
    // same bytes are now detectable.
    adapter.seed_hash(mock_data::DUPLICATE_POD_HASH);
    println!();

    // ── Second upload: same bytes, same hash ──────────────────────────────────

    let (event, actor) = mock_data::pod_duplicate();
    let matches = evaluator.evaluate(&event, &actor, &system);

    println!("  Same document submitted again");
    println!("  Matched {} rule(s):", matches.len());
    for m in &matches {
        println!(
            "    [{}] {} (priority {})",
            m.rule.severity, m.rule_id, m.rule.priority
        );
        for result in &m.action_results {
            let status = if result.ok { "ok" } else { "failed" };
            println!("      action {:<22} {}", result.action, status);
        }
    }
    println!();

    match first_rejection(&matches) {
        Some(rejection) => {
            println!("  Second upload REJECTED");
            println!(
                "    code: {}",
                rejection.field("code").and_then(|v| v.as_str()).unwrap_or("?")
            );
        }
        None => println!("  Second upload accepted (unexpected)"),
    }
    println!();

    // ── Ticket and audit trail ────────────────────────────────────────────────

    for m in &matches {
        for result in &m.action_results {
            if result.action == "create-ticket" {
                println!(
                    "  Fraud ticket {} opened in queue '{}'",
                    result.field("ticketRef").and_then(|v| v.as_str()).unwrap_or("?"),
                    result.field("queue").and_then(|v| v.as_str()).unwrap_or("?"),
                );
            }
        }
    }

    let entries = adapter.audit_logs();
    println!("  Audit entries written: {}", entries.len());
    for entry in &entries {
        let verified = acs_audit::verify(entry);
        println!(
            "    {} by rule {} [{}]",
            entry.action,
            entry.rule_id.as_deref().unwrap_or("-"),
            if verified { "hash VERIFIED" } else { "hash MISMATCH" }
        );
    }
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
