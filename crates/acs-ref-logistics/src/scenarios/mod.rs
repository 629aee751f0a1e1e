//! Logistics reference demo scenarios.
//!
//! Each scenario is a self-contained module that wires real ACS components
//! (rule store, action registry, audit writer, in-memory persistence) around
//! one canned event and walks through the decision the shield takes.

pub mod duplicate_pod;
pub mod gps_jump;
pub mod kyc_gate;
