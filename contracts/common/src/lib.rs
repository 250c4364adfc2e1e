//! Shared utilities and error types for the diversity aggregator contracts.
//!
//! This crate provides:
//! - [`CommonError`]: standardised error codes for all contracts.
//! - [`pausable`]: the process-wide pause switch.
//! - [`rate_limit`]: per-address, per-action cooldown enforcement.
//!
//! Contract-specific errors can extend the range starting at code **100** and
//! above, ensuring no collisions with the common set.

#![no_std]
#![allow(clippy::arithmetic_side_effects)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use soroban_sdk::contracterror;

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod pausable;
pub mod rate_limit;

pub use pausable::*;
pub use rate_limit::*;

// ── Storage TTL policy ───────────────────────────────────────────────────────

/// Remaining-ledger threshold below which an entry's TTL is bumped.
pub const TTL_THRESHOLD: u32 = 518_400; // ~30 days (@ ~5s/ledger)
/// Ledger count an entry is extended to once it drops below the threshold.
pub const TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days (@ ~5s/ledger)

/// Extends the TTL of the calling contract's instance storage.
pub fn extend_instance_ttl(env: &soroban_sdk::Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

// ── Shared error enum ────────────────────────────────────────────────────────

/// Standardised error codes shared by every contract in the workspace.
///
/// # Code ranges
/// | Range   | Purpose                       |
/// |---------|-------------------------------|
/// | 1 – 9   | Lifecycle / initialisation    |
/// | 10 – 19 | Authentication & authorisation|
/// | 40 – 49 | Contract state                |
/// | 100+    | Reserved for contract-specific |
#[contracterror]
#[derive(Clone, Debug, Eq, PartialEq, Copy)]
#[repr(u32)]
pub enum CommonError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    AccessDenied = 10,
    // ── Contract state (40–49) ───────────────────────────────
    /// The contract is currently paused and cannot process requests.
    Paused = 40,
    /// The caller acted again before its cooldown window elapsed.
    CooldownActive = 41,
}
