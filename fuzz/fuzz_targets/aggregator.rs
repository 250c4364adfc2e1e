#![no_main]

use arbitrary::Arbitrary;
use diversity_aggregator::{DiversityAggregatorContract, DiversityAggregatorContractClient};
use fhe_engine::{FheEngineContract, FheEngineContractClient};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    Address, BytesN, Env,
};

/// Every state-changing aggregator entry point plus relayer delivery.
///
/// Contribution values are `u8` so the plaintext sum of any input stays far
/// below the engine modulus and decrypted results can be checked exactly.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Submit { user: u8, value: u8 },
    Request,
    Deliver { request: u8 },
    DeliverForged { request: u8, flip: u8 },
    OpenBatch,
    CloseBatch,
    AddProvider { user: u8 },
    RemoveProvider { user: u8 },
    SetPaused { paused: bool },
    SetCooldown { seconds: u8 },
    AdvanceTime { delta: u16 },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();

    let engine_id = env.register(FheEngineContract, ());
    let engine = FheEngineContractClient::new(&env, &engine_id);
    let oracle = Address::generate(&env);
    engine.initialize(
        &Address::generate(&env),
        &oracle,
        &1009i128,
        &1013i128,
        &BytesN::from_array(&env, &[42u8; 32]),
    );

    let agg_id = env.register(DiversityAggregatorContract, ());
    let agg = DiversityAggregatorContractClient::new(&env, &agg_id);
    let owner = Address::generate(&env);
    if agg.try_initialize(&owner, &engine_id, &30u64).is_err() {
        return;
    }

    let mut users = vec![owner.clone()];
    for _ in 0..4 {
        users.push(Address::generate(&env));
    }

    let mut accepted_sum: u64 = 0;
    // (request_id, accepted_sum at request time)
    let mut requests: Vec<(u64, u64)> = Vec::new();
    let mut finalized: Vec<(u64, u32)> = Vec::new();
    let mut last_batch = agg.get_batch();

    for action in actions.into_iter().take(64) {
        match action {
            FuzzAction::Submit { user, value } => {
                let provider = &users[user as usize % users.len()];
                let handle = engine.encrypt(&(value as u32), &32u32);
                if let Ok(Ok(_)) = agg.try_submit_encrypted_data(provider, &handle) {
                    accepted_sum += value as u64;
                }
            }
            FuzzAction::Request => {
                if let Ok(Ok(id)) = agg.try_request_score_decryption(&owner) {
                    requests.push((id, accepted_sum));
                }
            }
            FuzzAction::Deliver { request } => {
                if requests.is_empty() {
                    continue;
                }
                let (id, expected) = requests[request as usize % requests.len()];
                let f = engine.fulfillment(&oracle, &id);
                if let Ok(Ok(value)) = agg.try_on_decryption_callback(&id, &f.cleartext, &f.proof) {
                    assert_eq!(
                        value as u64, expected,
                        "INVARIANT VIOLATION: request {} decrypted to {}",
                        id, value
                    );
                    assert!(
                        finalized.iter().all(|(done, _)| *done != id),
                        "INVARIANT VIOLATION: request {} finalized twice",
                        id
                    );
                    finalized.push((id, value));
                }
            }
            FuzzAction::DeliverForged { request, flip } => {
                if requests.is_empty() {
                    continue;
                }
                let (id, _) = requests[request as usize % requests.len()];
                let f = engine.fulfillment(&oracle, &id);
                let mut proof = f.proof.to_array();
                proof[flip as usize % 32] ^= 0x01;
                let forged = BytesN::from_array(&env, &proof);
                let before = agg.get_decryption_context(&id);
                let result = agg.try_on_decryption_callback(&id, &f.cleartext, &forged);
                assert!(result.is_err(), "INVARIANT VIOLATION: forged proof accepted");
                assert_eq!(agg.get_decryption_context(&id), before);
            }
            FuzzAction::OpenBatch => {
                let _ = agg.try_open_batch(&owner);
            }
            FuzzAction::CloseBatch => {
                let _ = agg.try_close_batch(&owner);
            }
            FuzzAction::AddProvider { user } => {
                let _ = agg.try_add_provider(&owner, &users[user as usize % users.len()]);
            }
            FuzzAction::RemoveProvider { user } => {
                let _ = agg.try_remove_provider(&owner, &users[user as usize % users.len()]);
            }
            FuzzAction::SetPaused { paused } => {
                let _ = agg.try_set_paused(&owner, &paused);
            }
            FuzzAction::SetCooldown { seconds } => {
                let _ = agg.try_set_cooldown_seconds(&owner, &(seconds as u64));
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        assert!(
            agg.is_provider(&owner),
            "INVARIANT VIOLATION: owner left the provider set"
        );

        let batch = agg.get_batch();
        assert!(
            batch.id >= last_batch.id,
            "INVARIANT VIOLATION: batch id went backwards"
        );
        last_batch = batch;

        for (id, value) in &finalized {
            let ctx = agg.get_decryption_context(id);
            assert!(
                ctx.map(|c| c.processed).unwrap_or(false),
                "INVARIANT VIOLATION: processed flag reverted"
            );
            assert_eq!(agg.get_decryption_result(id), Some(*value));
        }
    }
});
