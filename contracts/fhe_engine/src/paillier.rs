use soroban_sdk::contracttype;

/// Upper bound (exclusive) on `n`. Keeps every `x · y mod n²` product
/// inside `i128`.
pub const MAX_MODULUS: i128 = 1 << 31;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaillierPublicKey {
    pub n: i128,  // n = p * q
    pub nn: i128, // n^2
    pub g: i128,  // g = n + 1
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaillierPrivateKey {
    pub lambda: i128, // phi(n) = (p-1)(q-1)
    pub mu: i128,     // lambda^-1 mod n
}

pub struct Paillier;

impl Paillier {
    /// Derives a key pair from two distinct primes.
    ///
    /// Returns `None` when either input is not prime, the primes coincide,
    /// or `p · q` reaches [`MAX_MODULUS`].
    pub fn keygen(p: i128, q: i128) -> Option<(PaillierPublicKey, PaillierPrivateKey)> {
        if p == q || !is_prime(p) || !is_prime(q) {
            return None;
        }
        let n = p.checked_mul(q)?;
        if n >= MAX_MODULUS {
            return None;
        }
        let lambda = (p - 1) * (q - 1);
        let mu = mod_inverse(lambda % n, n)?;

        Some((
            PaillierPublicKey {
                n,
                nn: n * n,
                g: n + 1,
            },
            PaillierPrivateKey { lambda, mu },
        ))
    }

    /// c = (g^m * r^n) mod n^2
    ///
    /// `r` must be in `[1, n)` and coprime to `n`; see [`Paillier::is_valid_nonce`].
    pub fn encrypt(pub_key: &PaillierPublicKey, m: i128, r: i128) -> i128 {
        let gm = pow_mod(pub_key.g, m, pub_key.nn);
        let rn = pow_mod(r, pub_key.n, pub_key.nn);
        (gm * rn) % pub_key.nn
    }

    /// m = L(c^lambda mod n^2) * mu mod n, with L(u) = (u - 1) / n
    pub fn decrypt(pub_key: &PaillierPublicKey, priv_key: &PaillierPrivateKey, c: i128) -> i128 {
        let u = pow_mod(c, priv_key.lambda, pub_key.nn);
        let l_u = (u - 1) / pub_key.n;
        (l_u * priv_key.mu) % pub_key.n
    }

    /// Additive property: E(m1 + m2) = E(m1) * E(m2) mod n^2
    pub fn add(pub_key: &PaillierPublicKey, c1: i128, c2: i128) -> i128 {
        (c1 * c2) % pub_key.nn
    }

    /// Encryption of zero with `r = 1`.
    pub fn trivial_zero() -> i128 {
        1
    }

    pub fn is_valid_nonce(pub_key: &PaillierPublicKey, r: i128) -> bool {
        r >= 1 && r < pub_key.n && gcd(r, pub_key.n) == 1
    }
}

fn pow_mod(mut base: i128, mut exp: i128, mod_val: i128) -> i128 {
    let mut res = 1;
    base %= mod_val;
    while exp > 0 {
        if exp % 2 == 1 {
            res = (res * base) % mod_val;
        }
        base = (base * base) % mod_val;
        exp /= 2;
    }
    res
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

/// Extended Euclid. `None` when `a` has no inverse modulo `m`.
fn mod_inverse(a: i128, m: i128) -> Option<i128> {
    let (mut old_r, mut r) = (a, m);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m))
}

fn is_prime(v: i128) -> bool {
    if v < 2 {
        return false;
    }
    if v % 2 == 0 {
        return v == 2;
    }
    let mut d = 3i128;
    while d * d <= v {
        if v % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
