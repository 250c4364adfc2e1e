//! Owner and provider-set management.
//!
//! Exactly one owner exists at a time and the owner is always a provider.
//! The provider set is only mutated by the owner, and the owner can never be
//! removed from it directly.

use soroban_sdk::{symbol_short, Address, Env, Symbol};

use common::{TTL_EXTEND_TO, TTL_THRESHOLD};

use crate::{events, ContractError};

const OWNER: Symbol = symbol_short!("OWNER");
const PROVIDER: Symbol = symbol_short!("PROVIDER");

fn provider_key(address: &Address) -> (Symbol, Address) {
    (PROVIDER, address.clone())
}

fn insert_provider(env: &Env, address: &Address) {
    let key = provider_key(address);
    env.storage().persistent().set(&key, &true);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn init(env: &Env, owner: &Address) {
    env.storage().instance().set(&OWNER, owner);
    insert_provider(env, owner);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&OWNER)
}

pub fn owner(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&OWNER)
        .ok_or(ContractError::NotInitialized)
}

pub fn is_provider(env: &Env, address: &Address) -> bool {
    let key = provider_key(address);
    let member = env.storage().persistent().get(&key).unwrap_or(false);
    if member {
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    member
}

/// Authenticates `caller` and checks it is the current owner.
pub fn require_owner(env: &Env, caller: &Address) -> Result<(), ContractError> {
    let owner = owner(env)?;
    caller.require_auth();
    if *caller != owner {
        return Err(ContractError::NotOwner);
    }
    Ok(())
}

/// Authenticates `caller` and checks it is in the provider set.
pub fn require_provider(env: &Env, caller: &Address) -> Result<(), ContractError> {
    owner(env)?;
    caller.require_auth();
    if !is_provider(env, caller) {
        return Err(ContractError::NotProvider);
    }
    Ok(())
}

/// Reassigns ownership. The new owner joins the provider set; the previous
/// owner keeps its provider membership until explicitly removed.
pub fn transfer_ownership(
    env: &Env,
    caller: &Address,
    new_owner: &Address,
) -> Result<(), ContractError> {
    require_owner(env, caller)?;
    env.storage().instance().set(&OWNER, new_owner);
    insert_provider(env, new_owner);
    events::publish_ownership_transferred(env, caller, new_owner);
    Ok(())
}

/// Returns `false` (and emits nothing) when `address` already is a provider.
pub fn add_provider(env: &Env, caller: &Address, address: &Address) -> Result<bool, ContractError> {
    require_owner(env, caller)?;
    if is_provider(env, address) {
        return Ok(false);
    }
    insert_provider(env, address);
    events::publish_provider_added(env, address);
    Ok(true)
}

/// Returns `false` (and emits nothing) when `address` is the owner or not a
/// provider.
pub fn remove_provider(
    env: &Env,
    caller: &Address,
    address: &Address,
) -> Result<bool, ContractError> {
    require_owner(env, caller)?;
    if *address == owner(env)? || !is_provider(env, address) {
        return Ok(false);
    }
    env.storage().persistent().remove(&provider_key(address));
    events::publish_provider_removed(env, address);
    Ok(true)
}
