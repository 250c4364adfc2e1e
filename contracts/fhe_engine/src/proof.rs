use soroban_sdk::{Bytes, BytesN, Env};

/// Oracle attestation over a decryption result.
///
/// `proof = SHA-256(signing_key || request_id_be || cleartext)`
pub fn sign_cleartext(
    env: &Env,
    signing_key: &BytesN<32>,
    request_id: u64,
    cleartext: &Bytes,
) -> BytesN<32> {
    let mut data = Bytes::from_array(env, &signing_key.to_array());
    data.extend_from_array(&request_id.to_be_bytes());
    data.append(cleartext);
    env.crypto().sha256(&data).into()
}

/// Big-endian `u32` words, one per decrypted handle.
pub fn encode_cleartext(env: &Env, values: &[u32]) -> Bytes {
    let mut out = Bytes::new(env);
    for v in values {
        out.extend_from_array(&v.to_be_bytes());
    }
    out
}
