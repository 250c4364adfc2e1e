//! Capability interface of the external FHE engine.
//!
//! The aggregator only ever sees opaque handles. The engine guarantees that
//! `add` is deterministic and that `verify` accepts nothing but a proof its
//! oracle produced for exactly `(request_id, cleartext)`.

use soroban_sdk::{Address, Bytes, BytesN, Env, Vec};

#[soroban_sdk::contractclient(name = "FheEngineClient")]
#[allow(dead_code)]
pub trait FheEngineInterface {
    /// Encrypted zero of the same ciphertext type as `handle`.
    fn zero_like(env: Env, handle: BytesN<32>) -> BytesN<32>;

    fn add(env: Env, lhs: BytesN<32>, rhs: BytesN<32>) -> BytesN<32>;

    /// Opens an asynchronous decrypt-and-prove job over `handles`, in order.
    fn request_decryption(env: Env, requester: Address, handles: Vec<BytesN<32>>) -> u64;

    fn verify(env: Env, request_id: u64, cleartext: Bytes, proof: BytesN<32>) -> bool;
}
