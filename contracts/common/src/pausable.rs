#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::CommonError;

const PAUSED: Symbol = symbol_short!("PAUSED");

/// Sets the contract pause state without emitting anything.
///
/// Performs no auth checks; callers enforce owner authorization first.
pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&PAUSED, &paused);
}

/// Returns `true` when the contract is paused.
pub fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&PAUSED).unwrap_or(false)
}

/// Returns `CommonError::Paused` when the contract is paused.
pub fn require_not_paused(env: &Env) -> Result<(), CommonError> {
    if is_paused(env) {
        return Err(CommonError::Paused);
    }
    Ok(())
}

/// Stores `paused` and emits a `("PAUSED", caller)` event carrying the new
/// value. The event fires even when the flag did not change.
pub fn set_paused_by(env: &Env, caller: &Address, paused: bool) {
    set_paused(env, paused);
    env.events()
        .publish((PAUSED, caller.clone()), paused);
}
