//! Decryption request / callback coordination.
//!
//! A request binds itself to the accumulator state it was issued against via
//! `state_hash = SHA-256(handle_0 || .. || handle_k || contract_address_xdr)`.
//! The callback re-derives the hash from the *current* accumulator and refuses
//! to finalize when the two differ, so a result computed over a stale
//! ciphertext is never attached to newer state.
//!
//! Per request the lifecycle is `Requested → Completed`. A request that is
//! never answered stays `Requested` indefinitely.

use soroban_sdk::{
    contracttype, symbol_short, xdr::ToXdr, Address, Bytes, BytesN, Env, Symbol, Vec,
};

use common::{rate_limit, ActionKind, TTL_EXTEND_TO, TTL_THRESHOLD};

use crate::engine::FheEngineClient;
use crate::{access, aggregator, batch, engine_address, events, ContractError};

const CONTEXT: Symbol = symbol_short!("DEC_CTX");
const RESULT: Symbol = symbol_short!("DEC_RES");

/// Binding record of one decryption request. Never deleted; `processed`
/// flips from `false` to `true` exactly once.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionContext {
    pub batch_id: u64,
    pub state_hash: BytesN<32>,
    pub processed: bool,
}

fn persist<V>(env: &Env, key: &(Symbol, u64), value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn context(env: &Env, request_id: u64) -> Option<DecryptionContext> {
    env.storage().persistent().get(&(CONTEXT, request_id))
}

pub fn result(env: &Env, request_id: u64) -> Option<u32> {
    env.storage().persistent().get(&(RESULT, request_id))
}

/// Ordered ciphertext handles that make up the decryptable state.
pub fn state_handles(env: &Env) -> Option<Vec<BytesN<32>>> {
    aggregator::accumulator(env).map(|acc| {
        let mut handles = Vec::new(env);
        handles.push_back(acc);
        handles
    })
}

pub fn state_hash(env: &Env, handles: &Vec<BytesN<32>>) -> BytesN<32> {
    let mut data = Bytes::new(env);
    for handle in handles.iter() {
        data.extend_from_array(&handle.to_array());
    }
    data.append(&env.current_contract_address().to_xdr(env));
    env.crypto().sha256(&data).into()
}

/// Opens a decryption job over the live accumulator.
pub fn request(env: &Env, caller: &Address) -> Result<u64, ContractError> {
    access::require_owner(env, caller)?;
    common::require_not_paused(env)?;

    let now = env.ledger().timestamp();
    rate_limit::check(env, caller, ActionKind::DecryptionRequest, now)?;
    let batch = batch::require_open(env)?;
    let handles = state_handles(env).ok_or(ContractError::AccumulatorEmpty)?;

    rate_limit::record(env, caller, ActionKind::DecryptionRequest, now);

    let state_hash = state_hash(env, &handles);
    let engine = FheEngineClient::new(env, &engine_address(env)?);
    let request_id = engine.request_decryption(&env.current_contract_address(), &handles);
    if context(env, request_id).is_some() {
        return Err(ContractError::DuplicateRequestId);
    }

    let ctx = DecryptionContext {
        batch_id: batch.id,
        state_hash: state_hash.clone(),
        processed: false,
    };
    persist(env, &(CONTEXT, request_id), &ctx);

    events::publish_decryption_requested(env, request_id, batch.id, &state_hash);
    Ok(request_id)
}

/// Validates and finalizes an engine callback.
///
/// Order matters: the replay guard runs first so repeated delivery is inert,
/// the state binding is checked before the proof, and `processed` is set
/// only after the proof verified and the cleartext decoded.
pub fn on_callback(
    env: &Env,
    request_id: u64,
    cleartext: &Bytes,
    proof: &BytesN<32>,
) -> Result<u32, ContractError> {
    let mut ctx = context(env, request_id).ok_or(ContractError::RequestNotFound)?;
    if ctx.processed {
        return Err(ContractError::ReplayAttempt);
    }

    let current = state_handles(env).ok_or(ContractError::StateMismatch)?;
    if state_hash(env, &current) != ctx.state_hash {
        return Err(ContractError::StateMismatch);
    }

    let engine = FheEngineClient::new(env, &engine_address(env)?);
    if !engine.verify(&request_id, cleartext, proof) {
        return Err(ContractError::InvalidProof);
    }

    let value = decode_u32(cleartext)?;

    ctx.processed = true;
    persist(env, &(CONTEXT, request_id), &ctx);
    persist(env, &(RESULT, request_id), &value);

    events::publish_decryption_completed(env, request_id, ctx.batch_id, value);
    Ok(value)
}

/// Exactly four big-endian bytes.
fn decode_u32(cleartext: &Bytes) -> Result<u32, ContractError> {
    if cleartext.len() != 4 {
        return Err(ContractError::MalformedCleartext);
    }
    let mut buf = [0u8; 4];
    cleartext.copy_into_slice(&mut buf);
    Ok(u32::from_be_bytes(buf))
}
