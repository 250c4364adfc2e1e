#![allow(deprecated)] // events().publish migration tracked separately

//! Structured event publishing for the diversity aggregator.
//!
//! Every successful state transition emits exactly one event; together with
//! direct state reads they form the contract's audit trail.

use soroban_sdk::{symbol_short, Address, BytesN, Env};

pub fn publish_initialized(env: &Env, owner: &Address, engine: &Address, cooldown_seconds: u64) {
    env.events().publish(
        (symbol_short!("INIT"),),
        (owner.clone(), engine.clone(), cooldown_seconds),
    );
}

pub fn publish_ownership_transferred(env: &Env, previous: &Address, new_owner: &Address) {
    env.events().publish(
        (symbol_short!("OWN_XFER"), previous.clone()),
        new_owner.clone(),
    );
}

pub fn publish_provider_added(env: &Env, provider: &Address) {
    env.events()
        .publish((symbol_short!("PROV_ADD"), provider.clone()), ());
}

pub fn publish_provider_removed(env: &Env, provider: &Address) {
    env.events()
        .publish((symbol_short!("PROV_REM"), provider.clone()), ());
}

pub fn publish_batch_opened(env: &Env, batch_id: u64) {
    env.events()
        .publish((symbol_short!("BATCH_OPN"), batch_id), ());
}

pub fn publish_batch_closed(env: &Env, batch_id: u64) {
    env.events()
        .publish((symbol_short!("BATCH_CLS"), batch_id), ());
}

pub fn publish_data_submitted(env: &Env, provider: &Address, batch_id: u64) {
    env.events().publish(
        (symbol_short!("DATA_SUB"), provider.clone(), batch_id),
        (),
    );
}

pub fn publish_decryption_requested(
    env: &Env,
    request_id: u64,
    batch_id: u64,
    state_hash: &BytesN<32>,
) {
    env.events().publish(
        (symbol_short!("DEC_REQ"), request_id, batch_id),
        state_hash.clone(),
    );
}

pub fn publish_decryption_completed(env: &Env, request_id: u64, batch_id: u64, value: u32) {
    env.events().publish(
        (symbol_short!("DEC_DONE"), request_id, batch_id),
        value,
    );
}
