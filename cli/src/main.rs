//! ACS operational harness.
//!
//! Evaluates canned events against a rule-set, lists and disables rules,
//! and runs the logistics reference scenarios. Persistence is the in-memory
//! adapter: the harness demonstrates engine behavior, it is not wired to a
//! production store.
//!
//! Usage:
//!   cargo run -p cli -- evaluate --event gps.jump
//!   cargo run -p cli -- list-rules
//!   cargo run -p cli -- disable-rule --rules rules.toml --id bid-velocity --by ops-admin
//!   cargo run -p cli -- scenario all

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use acs_actions::ActionRegistry;
use acs_audit::AuditWriter;
use acs_contracts::{AcsError, AcsResult, AuditDraft};
use acs_core::{
    evaluator::{first_rejection, Evaluator},
    memory::MemoryAdapter,
    traits::AuditSink,
};
use acs_ref_logistics::{mock_data, scenarios, REFERENCE_RULESET};
use acs_rules::{remove_rule, RuleStore};

// ── CLI definition ────────────────────────────────────────────────────────────

/// ACS anti-corruption shield harness.
///
/// Each subcommand exercises the engine the way an embedding service would:
/// load a rule-set, feed it events, act on the matches.
#[derive(Parser)]
#[command(
    name = "acs",
    about = "ACS rule engine operational harness",
    long_about = "Evaluates events against a TOML rule-set, lists and disables rules,\n\
                  and runs the logistics reference scenarios end to end."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a canned event and print every match, action, and audit id.
    Evaluate {
        /// Rule-set TOML file; defaults to the embedded logistics set.
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Canned event name: gps.jump, gps.normal, booking.kyc-pending,
        /// pod.duplicate.
        #[arg(long)]
        event: String,
    },
    /// Print the active rule-set in priority order.
    ListRules {
        /// Rule-set TOML file; defaults to the embedded logistics set.
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Take one rule out of service: archive it, rewrite the file, audit it.
    DisableRule {
        /// Rule-set TOML file to rewrite.
        #[arg(long)]
        rules: PathBuf,
        /// Id of the rule to disable.
        #[arg(long)]
        id: String,
        /// Operator recorded in the audit entry.
        #[arg(long, default_value = "operator")]
        by: String,
    },
    /// Run a reference scenario: gps-jump, kyc-gate, duplicate-pod, or all.
    Scenario { name: String },
}

/// What a subcommand run means for the process exit code.
enum Outcome {
    Clean,
    /// A `reject-request` action fired: the evaluated operation was denied.
    Rejected,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging to stderr. Set RUST_LOG=debug for the full trace.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Evaluate { rules, event } => cmd_evaluate(rules.as_deref(), &event),
        Command::ListRules { rules } => cmd_list_rules(rules.as_deref()),
        Command::DisableRule { rules, id, by } => cmd_disable_rule(&rules, &id, &by),
        Command::Scenario { name } => cmd_scenario(&name),
    };

    match outcome {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Rejected) => std::process::exit(2),
        Err(e) => {
            eprintln!("acs: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

fn cmd_evaluate(rules: Option<&Path>, event_name: &str) -> AcsResult<Outcome> {
    let store = load_store(rules)?;

    let (event, actor) = mock_data::canned_event(event_name).ok_or_else(|| AcsError::Config {
        reason: format!(
            "unknown event '{}'; expected one of: {}",
            event_name,
            mock_data::EVENT_NAMES.join(", ")
        ),
    })?;

    let adapter = MemoryAdapter::new();
    let evaluator = Evaluator::new(Arc::clone(&store))
        .with_dispatcher(Box::new(ActionRegistry::new()))
        .with_audit_sink(Box::new(AuditWriter::new()))
        .with_persistence(Box::new(adapter.clone()));

    let matches = evaluator.evaluate(&event, &actor, &mock_data::system_config());

    println!("{} rule(s) matched '{}'", matches.len(), event_name);
    for m in &matches {
        println!();
        println!(
            "[{}] {} (priority {})",
            m.rule.severity, m.rule_id, m.rule.priority
        );
        if !m.rule.description.is_empty() {
            println!("    {}", m.rule.description);
        }
        for result in &m.action_results {
            let status = match (result.ok, &result.error) {
                (true, _) => "ok".to_string(),
                (false, None) => "denied".to_string(),
                (false, Some(e)) => format!("failed: {}", e),
            };
            println!("    action {:<22} {}", result.action, status);
            for (key, value) in &result.fields {
                println!("      {} = {}", key, value);
            }
        }
        if let Some(audit_id) = &m.audit_entry_id {
            println!("    audit {}", audit_id);
        }
    }

    if let Some(rejection) = first_rejection(&matches) {
        println!();
        println!(
            "REJECTED [{}]: {}",
            rejection
                .field("code")
                .and_then(|v| v.as_str())
                .unwrap_or("REQUEST_REJECTED"),
            rejection
                .field("message")
                .and_then(|v| v.as_str())
                .unwrap_or("request rejected by policy"),
        );
        return Ok(Outcome::Rejected);
    }
    Ok(Outcome::Clean)
}

fn cmd_list_rules(rules: Option<&Path>) -> AcsResult<Outcome> {
    let store = load_store(rules)?;
    let active = store.active();

    println!("{} active rule(s), priority descending", active.len());
    println!();
    for rule in active.iter() {
        println!(
            "{:>4}  {:<9} {:<6} {:<28} {}",
            rule.priority,
            rule.severity,
            if rule.audit_required { "audit" } else { "" },
            rule.id,
            rule.description
        );
    }
    Ok(Outcome::Clean)
}

/// Disable one rule: archive its block, rewrite the source file, swap the
/// in-process set, and record exactly one audit entry for the change.
fn cmd_disable_rule(path: &Path, rule_id: &str, by: &str) -> AcsResult<Outcome> {
    let source = std::fs::read_to_string(path).map_err(|e| AcsError::Config {
        reason: format!("failed to read rule-set file '{}': {}", path.display(), e),
    })?;

    // Compile the full set up front: a file that no longer loads should
    // fail here, not after it has been rewritten.
    let store = RuleStore::new();
    store.load_str(&source)?;

    let removed = remove_rule(&source, rule_id)?;

    let archive = archive_path(path);
    append_block(&archive, &removed.archived)?;

    std::fs::write(path, &removed.remaining).map_err(|e| AcsError::Config {
        reason: format!("failed to rewrite rule-set file '{}': {}", path.display(), e),
    })?;

    store.disable(rule_id)?;
    let remaining = store.active().len();

    let adapter = MemoryAdapter::new();
    let entry = AuditWriter::new().record(
        AuditDraft::new("rule", rule_id, "rule-disabled")
            .performed_by(by)
            .rule_id(rule_id)
            .metadata(json!({
                "priority": removed.doc.priority,
                "severity": removed.doc.severity,
                "archive": archive.display().to_string(),
            })),
        Some(&adapter),
    );

    println!("rule '{}' disabled by {}", rule_id, by);
    println!("  archived to {}", archive.display());
    println!("  {} rule(s) remain active", remaining);
    println!(
        "  audit {} [{}]",
        entry.id,
        if acs_audit::verify(&entry) {
            "hash VERIFIED"
        } else {
            "hash MISMATCH"
        }
    );
    Ok(Outcome::Clean)
}

fn cmd_scenario(name: &str) -> AcsResult<Outcome> {
    print_banner();
    match name {
        "gps-jump" => scenarios::gps_jump::run_scenario()?,
        "kyc-gate" => scenarios::kyc_gate::run_scenario()?,
        "duplicate-pod" => scenarios::duplicate_pod::run_scenario()?,
        "all" => {
            scenarios::gps_jump::run_scenario()?;
            scenarios::kyc_gate::run_scenario()?;
            scenarios::duplicate_pod::run_scenario()?;
        }
        other => {
            return Err(AcsError::Config {
                reason: format!(
                    "unknown scenario '{}'; expected gps-jump, kyc-gate, duplicate-pod, or all",
                    other
                ),
            })
        }
    }
    println!("All selected scenarios completed successfully.");
    Ok(Outcome::Clean)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_store(rules: Option<&Path>) -> AcsResult<Arc<RuleStore>> {
    let store = RuleStore::new();
    let count = match rules {
        Some(path) => store.load_file(path)?,
        None => store.load_str(REFERENCE_RULESET)?,
    };
    info!(count, "rule-set active");
    Ok(Arc::new(store))
}

/// Archive file next to the rule-set: `rules.toml` gets
/// `rules.toml.archive.toml`. Appended blocks keep the archive valid TOML.
fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".archive.toml");
    PathBuf::from(name)
}

fn append_block(path: &Path, block: &str) -> AcsResult<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AcsError::Config {
            reason: format!("failed to open archive '{}': {}", path.display(), e),
        })?;
    writeln!(file, "{}", block).map_err(|e| AcsError::Config {
        reason: format!("failed to append to archive '{}': {}", path.display(), e),
    })
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("ACS Logistics Reference Runtime");
    println!("===============================");
    println!();
    println!("Evaluation pipeline per event:");
    println!("  [1] Every active rule's condition runs against event/ctx/system");
    println!("  [2] Matching rules dispatch their actions in priority order");
    println!("  [3] Audited matches are sealed into tamper-evident entries");
    println!("  [4] reject-request outcomes deny the triggering operation");
    println!();
}
