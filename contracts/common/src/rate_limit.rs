//! Per-address, per-action cooldown table.
//!
//! A single global cooldown duration (instance storage) applies to every
//! [`ActionKind`]. The last accepted timestamp is kept per `(address, kind)`
//! in persistent storage. An address with no recorded action is never
//! throttled.

#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::{CommonError, TTL_EXTEND_TO, TTL_THRESHOLD};

const COOLDOWN: Symbol = symbol_short!("CD_SECS");
const LAST_ACT: Symbol = symbol_short!("LAST_ACT");

/// Kinds of throttled actions. Each kind keeps its own last-action record.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Submit,
    DecryptionRequest,
}

fn last_action_key(address: &Address, kind: ActionKind) -> (Symbol, Address, ActionKind) {
    (LAST_ACT, address.clone(), kind)
}

/// Sets the global cooldown duration. Takes effect for every later check.
pub fn set_cooldown_seconds(env: &Env, seconds: u64) {
    env.storage().instance().set(&COOLDOWN, &seconds);
}

/// As [`set_cooldown_seconds`], emitting `("COOLDOWN", caller)` with the new value.
pub fn set_cooldown_seconds_by(env: &Env, caller: &Address, seconds: u64) {
    set_cooldown_seconds(env, seconds);
    env.events()
        .publish((symbol_short!("COOLDOWN"), caller.clone()), seconds);
}

pub fn cooldown_seconds(env: &Env) -> u64 {
    env.storage().instance().get(&COOLDOWN).unwrap_or(0)
}

/// Timestamp of the last accepted `kind` action from `address`, if any.
pub fn last_action(env: &Env, address: &Address, kind: ActionKind) -> Option<u64> {
    let key = last_action_key(address, kind);
    let last: Option<u64> = env.storage().persistent().get(&key);
    if last.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    last
}

/// Read-only check: fails with `CooldownActive` when `now < last + cooldown`.
pub fn check(env: &Env, address: &Address, kind: ActionKind, now: u64) -> Result<(), CommonError> {
    if let Some(last) = last_action(env, address, kind) {
        if now < last.saturating_add(cooldown_seconds(env)) {
            return Err(CommonError::CooldownActive);
        }
    }
    Ok(())
}

/// Records `now` as the last accepted `kind` action from `address`.
pub fn record(env: &Env, address: &Address, kind: ActionKind, now: u64) {
    let key = last_action_key(address, kind);
    env.storage().persistent().set(&key, &now);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// [`check`] followed by [`record`] when the check passes.
pub fn check_and_record(
    env: &Env,
    address: &Address,
    kind: ActionKind,
    now: u64,
) -> Result<(), CommonError> {
    check(env, address, kind, now)?;
    record(env, address, kind, now);
    Ok(())
}
