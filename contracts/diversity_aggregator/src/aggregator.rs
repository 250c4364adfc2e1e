//! The running encrypted accumulator.
//!
//! The accumulator is only ever mutated by homomorphic addition through the
//! engine; it is never decrypted in place.

use soroban_sdk::{symbol_short, Address, BytesN, Env, Symbol};

use common::{rate_limit, ActionKind, TTL_EXTEND_TO, TTL_THRESHOLD};

use crate::engine::FheEngineClient;
use crate::{access, batch, engine_address, events, ContractError};

const ACCUMULATOR: Symbol = symbol_short!("ACC");
const SUB_COUNT: Symbol = symbol_short!("SUB_CNT");

/// Current accumulator handle; `None` until the first accepted submission.
pub fn accumulator(env: &Env) -> Option<BytesN<32>> {
    env.storage().instance().get(&ACCUMULATOR)
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&ACCUMULATOR)
}

pub fn submission_count(env: &Env, batch_id: u64) -> u32 {
    env.storage()
        .persistent()
        .get(&(SUB_COUNT, batch_id))
        .unwrap_or(0)
}

/// Folds `contribution` into the accumulator and returns the batch id it
/// was counted under.
///
/// Checks run in order: provider, pause, cooldown, open batch. Nothing is
/// written until all of them pass.
pub fn submit(
    env: &Env,
    provider: &Address,
    contribution: &BytesN<32>,
) -> Result<u64, ContractError> {
    access::require_provider(env, provider)?;
    common::require_not_paused(env)?;

    let now = env.ledger().timestamp();
    rate_limit::check(env, provider, ActionKind::Submit, now)?;
    let batch = batch::require_open(env)?;

    rate_limit::record(env, provider, ActionKind::Submit, now);

    let engine = FheEngineClient::new(env, &engine_address(env)?);
    let current = match accumulator(env) {
        Some(handle) => handle,
        None => engine.zero_like(contribution),
    };
    let updated = engine.add(&current, contribution);
    env.storage().instance().set(&ACCUMULATOR, &updated);

    let count_key = (SUB_COUNT, batch.id);
    let count = submission_count(env, batch.id).saturating_add(1);
    env.storage().persistent().set(&count_key, &count);
    env.storage()
        .persistent()
        .extend_ttl(&count_key, TTL_THRESHOLD, TTL_EXTEND_TO);

    events::publish_data_submitted(env, provider, batch.id);
    Ok(batch.id)
}
