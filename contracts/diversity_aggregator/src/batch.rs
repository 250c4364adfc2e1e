use soroban_sdk::{contracttype, symbol_short, Env, Symbol};

use crate::{events, ContractError};

const BATCH: Symbol = symbol_short!("BATCH");

/// The current batch. Ids start at 1 and never decrease.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchState {
    pub id: u64,
    pub open: bool,
}

pub fn init(env: &Env) {
    store(env, &BatchState { id: 1, open: false });
}

pub fn current(env: &Env) -> BatchState {
    env.storage()
        .instance()
        .get(&BATCH)
        .unwrap_or(BatchState { id: 1, open: false })
}

fn store(env: &Env, batch: &BatchState) {
    env.storage().instance().set(&BATCH, batch);
}

pub fn require_open(env: &Env) -> Result<BatchState, ContractError> {
    let batch = current(env);
    if !batch.open {
        return Err(ContractError::BatchClosedOrNonExistent);
    }
    Ok(batch)
}

/// `Open` → new id, still `Open`. `Closed` → `Open` under the same id.
///
/// A close/open cycle therefore resumes the previous id, so submissions on
/// either side of it share one batch id.
pub fn open(env: &Env) -> u64 {
    let mut batch = current(env);
    if batch.open {
        batch.id = batch.id.saturating_add(1);
    } else {
        batch.open = true;
    }
    store(env, &batch);
    events::publish_batch_opened(env, batch.id);
    batch.id
}

/// Returns `None` when the batch was already closed.
pub fn close(env: &Env) -> Option<u64> {
    let mut batch = current(env);
    if !batch.open {
        return None;
    }
    batch.open = false;
    store(env, &batch);
    events::publish_batch_closed(env, batch.id);
    Some(batch.id)
}
