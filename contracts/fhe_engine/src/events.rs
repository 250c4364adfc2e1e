#![allow(deprecated)] // events().publish migration tracked separately

//! Structured event publishing for the FHE engine contract.

use soroban_sdk::{symbol_short, Address, Bytes, BytesN, Env};

pub fn publish_initialized(env: &Env, admin: &Address, oracle: &Address, n: i128) {
    env.events()
        .publish((symbol_short!("INIT"),), (admin.clone(), oracle.clone(), n));
}

pub fn publish_oracle_changed(env: &Env, admin: &Address, oracle: &Address) {
    env.events()
        .publish((symbol_short!("ORACLE"), admin.clone()), oracle.clone());
}

pub fn publish_ciphertext_created(env: &Env, handle: &BytesN<32>, bits: u32) {
    env.events()
        .publish((symbol_short!("CT_NEW"), handle.clone()), bits);
}

pub fn publish_decryption_requested(env: &Env, request_id: u64, requester: &Address) {
    env.events().publish(
        (symbol_short!("DEC_OPEN"), request_id),
        requester.clone(),
    );
}

/// Relayers pick the cleartext and proof up from this event and deliver them
/// to the requester's callback.
pub fn publish_fulfilled(env: &Env, request_id: u64, cleartext: &Bytes, proof: &BytesN<32>) {
    env.events().publish(
        (symbol_short!("DEC_FUL"), request_id),
        (cleartext.clone(), proof.clone()),
    );
}
