//! Scenario 1: Impossible GPS Jump
//!
//! A shipment's tracker reports a 250km position change in 200 seconds, a
//! physical impossibility for road freight. The shield freezes the shipment,
//! pages the fraud desk, and writes a tamper-evident audit entry.
//!
//! Pipeline walk-through for the demo run:
//!   1. Load the embedded logistics rule-set into a `RuleStore`
//!   2. Evaluate the `gps.jump` canned event against all active rules
//!   3. `gps-impossible-jump` (critical) and `gps-speed-limit` (high) match
//!   4. The freeze action writes a `BlockRecord` through the memory adapter
//!   5. The audit sink records the critical match; its hash is verified
//!   6. A normal ping is evaluated to show the quiet path

use std::sync::Arc;

use acs_actions::ActionRegistry;
use acs_audit::AuditWriter;
use acs_contracts::error::AcsResult;
use acs_core::{evaluator::Evaluator, memory::MemoryAdapter};
use acs_rules::store::RuleStore;

use crate::{mock_data, REFERENCE_RULESET};

/// Run Scenario 1: Impossible GPS Jump.
///
/// Evaluates the canned 250km/200s ping (4500km/h) and prints every match,
/// block, and audit entry the shield produces, then the clean ping to show
/// that ordinary traffic passes untouched.
pub fn run_scenario() -> AcsResult<()> {
    println!("=== Scenario 1: Impossible GPS Jump ===");
    println!();

    // ── Wire up the shield ────────────────────────────────────────────────────

    let store = Arc::new(RuleStore::new());
    let count = store.load_str(REFERENCE_RULESET)?;

    // Keep a handle on the adapter so we can inspect blocks and audit entries
    // after the evaluator takes its boxed clone.
    let adapter = MemoryAdapter::new();

    let evaluator = Evaluator::new(Arc::clone(&store))
        .with_dispatcher(Box::new(ActionRegistry::new()))
        .with_audit_sink(Box::new(AuditWriter::new()))
        .with_persistence(Box::new(adapter.clone()));

    let system = mock_data::system_config();

    println!("  Loaded {} rules from the logistics rule-set", count);
    println!();

    // ── Evaluate the impossible jump ──────────────────────────────────────────

    let (event, actor) = mock_data::gps_jump();

    println!("  Event: gps.ping for SHP-3412");
    println!("  Delta: 250km in 200s (4500km/h)");
    println!();

    let matches = evaluator.evaluate(&event, &actor, &system);

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

    // ── Inspect the block the freeze action wrote ─────────────────────────────

    for block in adapter.blocks() {
        println!(
            "  Block {} [{:?}] on {} {}",
            block.id, block.kind, block.entity_type, block.entity_id
        );
        println!("    reason: {}", block.reason);
    }
    println!();

    // ── Verify the audit trail ────────────────────────────────────────────────

    let entries = adapter.audit_logs();
    println!("  Audit entries written: {}", entries.len());
    for entry in &entries {
        let verified = acs_audit::verify(entry);
        println!(
            "    {} {} on {} {} [{}]",
            entry.id,
            entry.action,
            entry.entity_type,
            entry.entity_id,
            if verified { "hash VERIFIED" } else { "hash MISMATCH" }
        );
    }
    println!();

    // ── The quiet path ────────────────────────────────────────────────────────

    let (event, actor) = mock_data::gps_normal();
    let matches = evaluator.evaluate(&event, &actor, &system);

    println!("  Event: gps.ping for SHP-3412 (50km in 1h)");
    println!("  Matched {} rule(s); ordinary traffic passes untouched", matches.len());
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
