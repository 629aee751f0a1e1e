//! Canned logistics traffic for the ACS reference runtime.
//!
//! Everything in this module is hardcoded and fictional. The events mirror
//! the payloads the owning platform feeds the shield in production; the
//! system config carries the thresholds and watchlists the reference
//! rule-set reads under the `system` root.

use serde_json::{json, Value};

/// File hash used by the duplicate proof-of-delivery scenario.
pub const DUPLICATE_POD_HASH: &str =
    "9f2c4e71d0ab9e6c10e5b3a75b1ce9f4a9f6d2c801b34b7e2f8d5a6c3e1b0f42";

/// Names accepted by [`canned_event`], in the order the CLI lists them.
pub const EVENT_NAMES: [&str; 4] = [
    "gps.jump",
    "gps.normal",
    "booking.kyc-pending",
    "pod.duplicate",
];

/// Look up a canned `(event, actor)` pair by CLI name.
pub fn canned_event(name: &str) -> Option<(Value, Value)> {
    match name {
        "gps.jump" => Some(gps_jump()),
        "gps.normal" => Some(gps_normal()),
        "booking.kyc-pending" => Some(booking_kyc_pending()),
        "pod.duplicate" => Some(pod_duplicate()),
        _ => None,
    }
}

// ── Canned events ─────────────────────────────────────────────────────────────

/// A 250km position change in 200 seconds. Trips the impossible-jump and
/// speed-limit rules.
pub fn gps_jump() -> (Value, Value) {
    (
        json!({
            "type": "gps.ping",
            "shipment": { "id": "SHP-3412" },
            "deviceId": "dev-9981",
            "gps": {
                "lat": 19.0760,
                "lon": 72.8777,
                "deltaDistanceKm": 250,
                "deltaTimeSec": 200
            }
        }),
        driver_actor(),
    )
}

/// 50km in an hour. Trips nothing.
pub fn gps_normal() -> (Value, Value) {
    (
        json!({
            "type": "gps.ping",
            "shipment": { "id": "SHP-3412" },
            "deviceId": "dev-9981",
            "gps": {
                "lat": 18.5204,
                "lon": 73.8567,
                "deltaDistanceKm": 50,
                "deltaTimeSec": 3600
            }
        }),
        driver_actor(),
    )
}

/// A booking from an account still pending KYC. Trips the mandatory-KYC
/// gate.
pub fn booking_kyc_pending() -> (Value, Value) {
    (
        json!({
            "type": "booking.create",
            "booking": {
                "id": "BK-2091",
                "route": "BOM-DEL",
                "valueInr": 450000,
                "destinationCountry": "IN"
            }
        }),
        json!({
            "userId": "usr-1402",
            "role": "shipper",
            "userKycStatus": "PENDING"
        }),
    )
}

/// A proof-of-delivery upload whose file hash is [`DUPLICATE_POD_HASH`].
/// Trips the duplicate rule once that hash is known to persistence.
pub fn pod_duplicate() -> (Value, Value) {
    (
        json!({
            "type": "pod.upload",
            "pod": {
                "shipmentId": "SHP-8873",
                "fileHash": DUPLICATE_POD_HASH,
                "fileSizeBytes": 482133,
                "hoursSinceDelivery": 6
            }
        }),
        json!({
            "userId": "usr-3306",
            "role": "driver"
        }),
    )
}

fn driver_actor() -> Value {
    json!({
        "userId": "usr-2214",
        "role": "driver"
    })
}

// ── System configuration ──────────────────────────────────────────────────────

/// Thresholds and watchlists the reference rule-set reads as `system.*`.
pub fn system_config() -> Value {
    json!({
        "thresholds": {
            "maxSpeedKmh": 120,
            "maxGpsAgeSec": 900,
            "maxSignalGapSec": 1800,
            "maxBidsPerHour": 20,
            "maxFailedLogins": 5,
            "maxBookingsPerDay": 15,
            "highValueBookingInr": 1000000,
            "maxQuoteDeviation": 0.35
        },
        "watchlists": {
            "users": ["usr-6619", "usr-7013"],
            "devices": ["dev-4417", "dev-5521"],
            "routes": ["DEL-SXR", "IXJ-SXR"],
            "sanctionedCountries": ["KP", "IR", "SY"]
        }
    })
}
