#![no_std]

//! # Diversity Aggregator
//!
//! Accumulates homomorphically-encrypted contributions from authorised
//! providers into a single encrypted aggregate, and coordinates the
//! asynchronous, oracle-mediated decryption of that aggregate:
//!
//! - **Access control**: one owner (always also a provider), an owner-managed
//!   provider set, and a process-wide pause switch.
//! - **Rate limiting**: one global cooldown applied per address and per
//!   action kind (`Submit`, `DecryptionRequest`).
//! - **Batch lifecycle**: `Closed ⇄ Open`, with re-opening an open batch
//!   advancing the batch id.
//! - **Encrypted aggregation**: contributions are folded into the accumulator
//!   with the engine's homomorphic add; plaintext is never seen on-chain.
//! - **Decryption coordination**: a request records a state hash over the
//!   accumulator handles; the callback must match that hash, carry a valid
//!   engine proof, and can succeed at most once per request.

pub mod access;
pub mod aggregator;
pub mod batch;
pub mod decryption;
pub mod engine;
pub mod events;


use soroban_sdk::{
    contract, contracterror, contractimpl, symbol_short, Address, Bytes, BytesN, Env, Symbol,
};

use common::{rate_limit, CommonError};

pub use batch::BatchState;
pub use common::ActionKind;
pub use decryption::DecryptionContext;

// ── Storage keys ──────────────────────────────────────────────────────────────

const ENGINE: Symbol = symbol_short!("ENGINE");

// ── Error codes ───────────────────────────────────────────────────────────────

/// Contract error codes. Codes below 100 mirror [`CommonError`].
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotOwner = 10,
    NotProvider = 11,
    Paused = 40,
    CooldownActive = 41,
    /// The operation needs an open batch.
    BatchClosedOrNonExistent = 100,
    /// Callback for a request that already completed.
    ReplayAttempt = 101,
    /// The accumulator changed between request and callback.
    StateMismatch = 102,
    InvalidProof = 103,
    RequestNotFound = 104,
    /// Decryption requested before any contribution was accepted.
    AccumulatorEmpty = 105,
    /// Verified cleartext is not a 4-byte big-endian `u32`.
    MalformedCleartext = 106,
    /// The engine issued a request id that already has a context.
    DuplicateRequestId = 107,
}

impl From<CommonError> for ContractError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::NotInitialized => ContractError::NotInitialized,
            CommonError::AlreadyInitialized => ContractError::AlreadyInitialized,
            CommonError::AccessDenied => ContractError::NotOwner,
            CommonError::Paused => ContractError::Paused,
            CommonError::CooldownActive => ContractError::CooldownActive,
        }
    }
}

pub(crate) fn engine_address(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&ENGINE)
        .ok_or(ContractError::NotInitialized)
}

// ── Contract ──────────────────────────────────────────────────────────────────

#[contract]
pub struct DiversityAggregatorContract;

#[contractimpl]
impl DiversityAggregatorContract {
    // ── Initialisation ────────────────────────────────────────────────────────

    /// Bootstrap the aggregator.
    ///
    /// * `owner`: becomes the owner and the first provider.
    /// * `engine`: FHE engine contract used for homomorphic adds,
    ///   decryption jobs, and proof verification.
    /// * `cooldown_seconds`: initial global cooldown between two actions of
    ///   the same kind from the same address.
    pub fn initialize(
        env: Env,
        owner: Address,
        engine: Address,
        cooldown_seconds: u64,
    ) -> Result<(), ContractError> {
        if access::is_initialized(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        owner.require_auth();

        access::init(&env, &owner);
        env.storage().instance().set(&ENGINE, &engine);
        rate_limit::set_cooldown_seconds(&env, cooldown_seconds);
        batch::init(&env);
        common::extend_instance_ttl(&env);

        events::publish_initialized(&env, &owner, &engine, cooldown_seconds);
        Ok(())
    }

    // ── Access control ────────────────────────────────────────────────────────

    pub fn transfer_ownership(
        env: Env,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), ContractError> {
        access::transfer_ownership(&env, &caller, &new_owner)?;
        common::extend_instance_ttl(&env);
        Ok(())
    }

    /// Idempotent. Returns `true` only when `provider` was newly added.
    pub fn add_provider(env: Env, caller: Address, provider: Address) -> Result<bool, ContractError> {
        access::add_provider(&env, &caller, &provider)
    }

    /// No-op for the owner or a non-member. Returns `true` only on removal.
    pub fn remove_provider(
        env: Env,
        caller: Address,
        provider: Address,
    ) -> Result<bool, ContractError> {
        access::remove_provider(&env, &caller, &provider)
    }

    /// Unconditional set; emits even when the flag is unchanged.
    pub fn set_paused(env: Env, caller: Address, paused: bool) -> Result<(), ContractError> {
        access::require_owner(&env, &caller)?;
        common::set_paused_by(&env, &caller, paused);
        Ok(())
    }

    pub fn set_cooldown_seconds(env: Env, caller: Address, seconds: u64) -> Result<(), ContractError> {
        access::require_owner(&env, &caller)?;
        rate_limit::set_cooldown_seconds_by(&env, &caller, seconds);
        Ok(())
    }

    // ── Batch lifecycle ───────────────────────────────────────────────────────

    /// Open a batch, or start a new batch id if one is already open.
    pub fn open_batch(env: Env, caller: Address) -> Result<u64, ContractError> {
        access::require_owner(&env, &caller)?;
        common::require_not_paused(&env)?;
        let id = batch::open(&env);
        common::extend_instance_ttl(&env);
        Ok(id)
    }

    /// Close the current batch. No-op when already closed.
    pub fn close_batch(env: Env, caller: Address) -> Result<(), ContractError> {
        access::require_owner(&env, &caller)?;
        common::require_not_paused(&env)?;
        batch::close(&env);
        Ok(())
    }

    // ── Aggregation ───────────────────────────────────────────────────────────

    /// Fold an encrypted contribution into the accumulator. Returns the batch
    /// id it was counted under.
    ///
    /// A handle the engine does not know aborts inside the engine call, so it
    /// surfaces as the engine's error rather than a [`ContractError`].
    pub fn submit_encrypted_data(
        env: Env,
        provider: Address,
        contribution: BytesN<32>,
    ) -> Result<u64, ContractError> {
        let batch_id = aggregator::submit(&env, &provider, &contribution)?;
        common::extend_instance_ttl(&env);
        Ok(batch_id)
    }

    // ── Decryption ────────────────────────────────────────────────────────────

    /// Request decryption of the current diversity score (the accumulator).
    /// Returns the engine-issued request id.
    pub fn request_score_decryption(env: Env, caller: Address) -> Result<u64, ContractError> {
        let request_id = decryption::request(&env, &caller)?;
        common::extend_instance_ttl(&env);
        Ok(request_id)
    }

    /// Entry point for the engine's relayer. Untrusted input: see
    /// [`decryption::on_callback`] for the validation order.
    pub fn on_decryption_callback(
        env: Env,
        request_id: u64,
        cleartext: Bytes,
        proof: BytesN<32>,
    ) -> Result<u32, ContractError> {
        decryption::on_callback(&env, request_id, &cleartext, &proof)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_owner(env: Env) -> Result<Address, ContractError> {
        access::owner(&env)
    }

    pub fn is_provider(env: Env, address: Address) -> bool {
        access::is_provider(&env, &address)
    }

    pub fn is_paused(env: Env) -> bool {
        common::is_paused(&env)
    }

    pub fn get_cooldown_seconds(env: Env) -> u64 {
        rate_limit::cooldown_seconds(&env)
    }

    pub fn get_last_action(env: Env, address: Address, kind: ActionKind) -> Option<u64> {
        rate_limit::last_action(&env, &address, kind)
    }

    pub fn get_engine(env: Env) -> Result<Address, ContractError> {
        engine_address(&env)
    }

    pub fn get_batch(env: Env) -> BatchState {
        batch::current(&env)
    }

    pub fn get_submission_count(env: Env, batch_id: u64) -> u32 {
        aggregator::submission_count(&env, batch_id)
    }

    pub fn is_accumulator_initialized(env: Env) -> bool {
        aggregator::is_initialized(&env)
    }

    pub fn get_accumulator(env: Env) -> Option<BytesN<32>> {
        aggregator::accumulator(&env)
    }

    pub fn get_decryption_context(env: Env, request_id: u64) -> Option<DecryptionContext> {
        decryption::context(&env, request_id)
    }

    pub fn get_decryption_result(env: Env, request_id: u64) -> Option<u32> {
        decryption::result(&env, request_id)
    }
}
