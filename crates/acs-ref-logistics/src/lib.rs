//! # acs-ref-logistics
//!
//! Logistics reference runtime for the ACS anti-corruption shield.
//!
//! Demonstrates three fraud-control scenarios using mock data:
//!
//! 1. **Impossible GPS Jump**: spoofed telemetry freezes the shipment and
//!    pages the fraud desk.
//! 2. **Mandatory KYC Gate**: a booking from an unverified account is
//!    rejected synchronously with a stable error code.
//! 3. **Duplicate Proof-of-Delivery**: a replayed document is caught by its
//!    content hash and routed to the fraud queue.
//!
//! The embedded [`REFERENCE_RULESET`] is a full logistics rule pack: GPS
//! integrity, KYC and identity gates, proof-of-delivery checks, bidding
//! anomalies, payment and pricing controls, velocity ceilings, personal
//! data handling, and watchlists.
//!
//! All data is hardcoded and fictional. Nothing talks to a real platform.

pub mod mock_data;
pub mod scenarios;

/// The embedded logistics rule-set the scenarios and the CLI default to.
pub const REFERENCE_RULESET: &str = include_str!("../rulesets/logistics.toml");

// ── Tests ─────────────────────────────────────────────────────────────────────
