#![no_std]

//! # Reference FHE engine
//!
//! Development implementation of the external engine the diversity
//! aggregator talks to. Ciphertexts never leave the contract: callers hold
//! opaque 32-byte handles, combine them homomorphically with [`add`], and get
//! plaintext back only through an oracle-fulfilled decryption request whose
//! result carries a proof that [`verify`] can check.
//!
//! The arithmetic is additive Paillier over `i128`, so moduli are small and
//! the scheme offers no real security. Plaintext sums wrap modulo `n` and are
//! reduced to the handle's bit width on decryption.
//!
//! [`add`]: FheEngineContract::add
//! [`verify`]: FheEngineContract::verify

pub mod events;
pub mod paillier;
pub mod proof;


use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Bytes, BytesN,
    Env, Symbol, Vec,
};

use crate::paillier::{Paillier, PaillierPrivateKey, PaillierPublicKey};

pub use crate::proof::{encode_cleartext, sign_cleartext};

// ── Storage keys ────────────────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const ORACLE: Symbol = symbol_short!("ORACLE");
const PUB_KEY: Symbol = symbol_short!("PUB_KEY");
const PRIV_KEY: Symbol = symbol_short!("PRIV_KEY");
const SIGN_KEY: Symbol = symbol_short!("SIGN_KEY");
const HANDLE_CTR: Symbol = symbol_short!("HDL_CTR");
const REQ_CTR: Symbol = symbol_short!("REQ_CTR");
const CIPHERTEXT: Symbol = symbol_short!("CT");
const JOB: Symbol = symbol_short!("JOB");

const TTL_THRESHOLD: u32 = 518_400;
const TTL_EXTEND_TO: u32 = 3_110_400;

/// Attempts at drawing an encryption nonce coprime to `n`.
const NONCE_ATTEMPTS: u32 = 16;

// ── Types ──────────────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ciphertext {
    pub value: i128,
    /// Plaintext bit width (8, 16 or 32).
    pub bits: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionJob {
    pub requester: Address,
    pub handles: Vec<BytesN<32>>,
    pub requested_at: u64,
    pub fulfilled: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fulfillment {
    pub request_id: u64,
    pub cleartext: Bytes,
    pub proof: BytesN<32>,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum EngineError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidKey = 4,
    InvalidInput = 5,
    UnknownHandle = 6,
    RequestNotFound = 7,
}

// ── Contract ───────────────────────────────────────────────────────────────────

#[contract]
pub struct FheEngineContract;

#[contractimpl]
impl FheEngineContract {
    /// Derive the Paillier key from `p` and `q` and register the oracle that
    /// fulfils decryption requests. `signing_key` is the oracle secret behind
    /// every proof.
    pub fn initialize(
        env: Env,
        admin: Address,
        oracle: Address,
        p: i128,
        q: i128,
        signing_key: BytesN<32>,
    ) -> Result<(), EngineError> {
        if env.storage().instance().has(&ADMIN) {
            return Err(EngineError::AlreadyInitialized);
        }
        admin.require_auth();

        let (pub_key, priv_key) = Paillier::keygen(p, q).ok_or(EngineError::InvalidKey)?;

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&ORACLE, &oracle);
        env.storage().instance().set(&PUB_KEY, &pub_key);
        env.storage().instance().set(&PRIV_KEY, &priv_key);
        env.storage().instance().set(&SIGN_KEY, &signing_key);
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

        events::publish_initialized(&env, &admin, &oracle, pub_key.n);
        Ok(())
    }

    pub fn get_admin(env: Env) -> Result<Address, EngineError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(EngineError::NotInitialized)
    }

    pub fn get_oracle(env: Env) -> Result<Address, EngineError> {
        env.storage()
            .instance()
            .get(&ORACLE)
            .ok_or(EngineError::NotInitialized)
    }

    pub fn get_public_key(env: Env) -> Result<PaillierPublicKey, EngineError> {
        Self::load_pub_key(&env)
    }

    /// Rotate the relayer allowed to fulfil requests.
    pub fn set_oracle(env: Env, caller: Address, oracle: Address) -> Result<(), EngineError> {
        caller.require_auth();
        if caller != Self::get_admin(env.clone())? {
            return Err(EngineError::Unauthorized);
        }
        env.storage().instance().set(&ORACLE, &oracle);
        events::publish_oracle_changed(&env, &caller, &oracle);
        Ok(())
    }

    // ── Ciphertext operations ─────────────────────────────────────────────────

    /// Encrypt `value` as a `bits`-wide ciphertext and return its handle.
    pub fn encrypt(env: Env, value: u32, bits: u32) -> Result<BytesN<32>, EngineError> {
        let pub_key = Self::load_pub_key(&env)?;
        if !matches!(bits, 8 | 16 | 32) {
            return Err(EngineError::InvalidInput);
        }
        if bits < 32 && value >= (1u32 << bits) {
            return Err(EngineError::InvalidInput);
        }
        if (value as i128) >= pub_key.n {
            return Err(EngineError::InvalidInput);
        }

        let r = Self::draw_nonce(&env, &pub_key)?;
        let value = Paillier::encrypt(&pub_key, value as i128, r);
        Ok(Self::store_ciphertext(&env, Ciphertext { value, bits }))
    }

    /// Trivial encryption of zero with the same ciphertext type as `handle`.
    pub fn zero_like(env: Env, handle: BytesN<32>) -> Result<BytesN<32>, EngineError> {
        Self::load_pub_key(&env)?;
        let template = Self::load_ciphertext(&env, &handle)?;
        Ok(Self::store_ciphertext(
            &env,
            Ciphertext {
                value: Paillier::trivial_zero(),
                bits: template.bits,
            },
        ))
    }

    /// Homomorphic addition. The result takes the wider of the two types.
    pub fn add(env: Env, lhs: BytesN<32>, rhs: BytesN<32>) -> Result<BytesN<32>, EngineError> {
        let pub_key = Self::load_pub_key(&env)?;
        let a = Self::load_ciphertext(&env, &lhs)?;
        let b = Self::load_ciphertext(&env, &rhs)?;
        Ok(Self::store_ciphertext(
            &env,
            Ciphertext {
                value: Paillier::add(&pub_key, a.value, b.value),
                bits: a.bits.max(b.bits),
            },
        ))
    }

    /// Plaintext bit width of `handle`, if it exists.
    pub fn get_ciphertext_bits(env: Env, handle: BytesN<32>) -> Option<u32> {
        env.storage()
            .persistent()
            .get::<_, Ciphertext>(&(CIPHERTEXT, handle))
            .map(|ct| ct.bits)
    }

    // ── Asynchronous decryption ───────────────────────────────────────────────

    /// Open a decryption job over `handles`. Returns the request id the
    /// oracle later fulfils; ids start at 1 and never repeat.
    pub fn request_decryption(
        env: Env,
        requester: Address,
        handles: Vec<BytesN<32>>,
    ) -> Result<u64, EngineError> {
        Self::load_pub_key(&env)?;
        requester.require_auth();

        if handles.is_empty() {
            return Err(EngineError::InvalidInput);
        }
        for handle in handles.iter() {
            Self::load_ciphertext(&env, &handle)?;
        }

        let request_id: u64 = env
            .storage()
            .instance()
            .get(&REQ_CTR)
            .unwrap_or(0u64)
            .saturating_add(1);
        env.storage().instance().set(&REQ_CTR, &request_id);

        let job = DecryptionJob {
            requester: requester.clone(),
            handles,
            requested_at: env.ledger().timestamp(),
            fulfilled: false,
        };
        Self::store_job(&env, request_id, &job);

        events::publish_decryption_requested(&env, request_id, &requester);
        Ok(request_id)
    }

    pub fn get_request(env: Env, request_id: u64) -> Option<DecryptionJob> {
        env.storage().persistent().get(&(JOB, request_id))
    }

    /// Oracle-only: decrypt the job's handles and sign the result.
    ///
    /// The relayer forwards the returned cleartext and proof to the
    /// requester's callback. Deterministic for a given request, so repeated
    /// calls return the same fulfillment.
    pub fn fulfillment(
        env: Env,
        oracle: Address,
        request_id: u64,
    ) -> Result<Fulfillment, EngineError> {
        oracle.require_auth();
        if oracle != Self::get_oracle(env.clone())? {
            return Err(EngineError::Unauthorized);
        }

        let mut job: DecryptionJob = env
            .storage()
            .persistent()
            .get(&(JOB, request_id))
            .ok_or(EngineError::RequestNotFound)?;

        let pub_key = Self::load_pub_key(&env)?;
        let priv_key: PaillierPrivateKey = env
            .storage()
            .instance()
            .get(&PRIV_KEY)
            .ok_or(EngineError::NotInitialized)?;

        let mut cleartext = Bytes::new(&env);
        for handle in job.handles.iter() {
            let ct = Self::load_ciphertext(&env, &handle)?;
            let m = Paillier::decrypt(&pub_key, &priv_key, ct.value);
            let word = (m as u64 % (1u64 << ct.bits)) as u32;
            cleartext.append(&encode_cleartext(&env, &[word]));
        }
        let proof = sign_cleartext(&env, &Self::load_signing_key(&env)?, request_id, &cleartext);

        if !job.fulfilled {
            job.fulfilled = true;
            Self::store_job(&env, request_id, &job);
            events::publish_fulfilled(&env, request_id, &cleartext, &proof);
        }

        Ok(Fulfillment {
            request_id,
            cleartext,
            proof,
        })
    }

    /// Check that `proof` is the oracle's attestation of `cleartext` for
    /// `request_id`. Unknown requests never verify.
    pub fn verify(env: Env, request_id: u64, cleartext: Bytes, proof: BytesN<32>) -> bool {
        if !env.storage().persistent().has(&(JOB, request_id)) {
            return false;
        }
        match Self::load_signing_key(&env) {
            Ok(key) => sign_cleartext(&env, &key, request_id, &cleartext) == proof,
            Err(_) => false,
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn load_pub_key(env: &Env) -> Result<PaillierPublicKey, EngineError> {
        env.storage()
            .instance()
            .get(&PUB_KEY)
            .ok_or(EngineError::NotInitialized)
    }

    fn load_signing_key(env: &Env) -> Result<BytesN<32>, EngineError> {
        env.storage()
            .instance()
            .get(&SIGN_KEY)
            .ok_or(EngineError::NotInitialized)
    }

    fn load_ciphertext(env: &Env, handle: &BytesN<32>) -> Result<Ciphertext, EngineError> {
        env.storage()
            .persistent()
            .get(&(CIPHERTEXT, handle.clone()))
            .ok_or(EngineError::UnknownHandle)
    }

    fn store_ciphertext(env: &Env, ct: Ciphertext) -> BytesN<32> {
        let counter: u64 = env
            .storage()
            .instance()
            .get(&HANDLE_CTR)
            .unwrap_or(0u64)
            .saturating_add(1);
        env.storage().instance().set(&HANDLE_CTR, &counter);

        let mut seed = Bytes::from_array(env, &counter.to_be_bytes());
        seed.extend_from_array(&ct.bits.to_be_bytes());
        let handle: BytesN<32> = env.crypto().sha256(&seed).into();

        let key = (CIPHERTEXT, handle.clone());
        env.storage().persistent().set(&key, &ct);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);

        events::publish_ciphertext_created(env, &handle, ct.bits);
        handle
    }

    fn store_job(env: &Env, request_id: u64, job: &DecryptionJob) {
        let key = (JOB, request_id);
        env.storage().persistent().set(&key, job);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }

    fn draw_nonce(env: &Env, pub_key: &PaillierPublicKey) -> Result<i128, EngineError> {
        for _ in 0..NONCE_ATTEMPTS {
            let r: u64 = env.prng().gen_range(1..pub_key.n as u64);
            if Paillier::is_valid_nonce(pub_key, r as i128) {
                return Ok(r as i128);
            }
        }
        Err(EngineError::InvalidKey)
    }
}
