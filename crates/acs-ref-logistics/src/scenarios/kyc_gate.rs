//! Scenario 2: Mandatory KYC Gate
//!
//! A shipper whose KYC verification is still pending tries to create a
//! booking. The shield rejects the request synchronously with a stable code
//! the calling service can surface to the user, and a verified shipper then
//! books the same load to show the gate only stops the unverified.
//!
//! Pipeline walk-through for the demo run:
//!   1. Load the embedded logistics rule-set into a `RuleStore`
//!   2. Evaluate `booking.create` with actor KYC status `PENDING`
//!   3. `kyc-mandatory-booking` (critical) matches and emits a rejection
//!   4. `first_rejection` surfaces the code the caller should return
//!   5. The audited match lands in the adapter with a verifiable hash
//!   6. The same booking from a `VERIFIED` actor sails through

use std::sync::Arc;

use serde_json::json;

use acs_actions::ActionRegistry;
use acs_audit::AuditWriter;
use acs_contracts::error::AcsResult;
use acs_core::{
    evaluator::{first_rejection, Evaluator},
    memory::MemoryAdapter,
};
use acs_rules::store::RuleStore;

use crate::{mock_data, REFERENCE_RULESET};

/// Run Scenario 2: Mandatory KYC Gate.
///
/// Shows the synchronous rejection path: the caller evaluates before
/// committing the booking and refuses the request when a rejection comes
/// back.
pub fn run_scenario() -> AcsResult<()> {
    println!("=== Scenario 2: Mandatory KYC Gate ===");
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

    // ── A pending-KYC shipper tries to book ───────────────────────────────────

    let (event, actor) = mock_data::booking_kyc_pending();

    println!("  Event: booking.create for BK-2091 (BOM-DEL, 450000 INR)");
    println!("  Actor: usr-1402, KYC status PENDING");
    println!();

    let matches = evaluator.evaluate(&event, &actor, &system);

    println!("  Matched {} rule(s):", matches.len());
    for m in &matches {
        println!(
            "    [{}] {} (priority {})",
            m.rule.severity, m.rule_id, m.rule.priority
        );
    }
    println!();

    match first_rejection(&matches) {
        Some(rejection) => {
            let code = rejection
                .field("code")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            let message = rejection
                .field("message")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            println!("  Request REJECTED");
            println!("    code:    {}", code);
            println!("    message: {}", message);
        }
        None => println!("  Request allowed"),
    }
    println!();

    // ── Audit trail for the gate ──────────────────────────────────────────────

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

    // ── The same booking from a verified account ──────────────────────────────

    let (event, _) = mock_data::booking_kyc_pending();
    let actor = json!({
        "userId": "usr-8807",
        "role": "shipper",
        "userKycStatus": "VERIFIED"
    });

    let matches = evaluator.evaluate(&event, &actor, &system);

    println!("  Actor: usr-8807, KYC status VERIFIED");
    match first_rejection(&matches) {
        Some(_) => println!("  Request REJECTED"),
        None => println!("  Request allowed; booking proceeds"),
    }
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
