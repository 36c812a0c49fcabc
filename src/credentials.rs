//! PIN and password hashing built around PBKDF2-HMAC-SHA512.
//!
//! Verifiers are stored as `salt_hex:hash_hex` and are never decrypted;
//! verification recomputes the hash under the stored salt. The parameters
//! below are a deliberate throughput throttle against offline brute force
//! and must match the verifiers already in storage.

use anyhow::{Result, anyhow, bail};
use getrandom::fill;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

/// PBKDF2 iteration count applied to every credential.
pub const PBKDF2_ROUNDS: u32 = 100_000;
/// Length of the per-credential salt (16 bytes).
pub const CRED_SALT_LEN: usize = 16;
/// Length of the PBKDF2 output (64 bytes).
pub const CRED_HASH_LEN: usize = 64;

/// Hashes a PIN or password into a storable verifier.
///
/// Output is non-deterministic: a fresh salt is generated on every call, so
/// two verifiers for the same PIN never match byte-for-byte.
pub fn hash_pin(pin: &str) -> Result<String> {
    if pin.is_empty() {
        bail!("pin must not be empty");
    }

    let mut salt = [0u8; CRED_SALT_LEN];
    fill(&mut salt).map_err(|_| anyhow!("OS random generator unavailable"))?;

    let mut hash = [0u8; CRED_HASH_LEN];
    pbkdf2_hmac::<Sha512>(pin.as_bytes(), &salt, PBKDF2_ROUNDS, &mut hash);

    Ok(format!("{}:{}", hex::encode(salt), hex::encode(hash)))
}

/// Checks a candidate PIN against a stored verifier.
///
/// Returns `false` for a wrong PIN and for any malformed verifier; the
/// caller cannot distinguish the two, which is intentional.
pub fn verify_pin(pin: &str, verifier: &str) -> bool {
    let Some((salt_hex, hash_hex)) = verifier.split_once(':') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };
    if salt.len() != CRED_SALT_LEN || expected.len() != CRED_HASH_LEN {
        return false;
    }

    let mut candidate = [0u8; CRED_HASH_LEN];
    pbkdf2_hmac::<Sha512>(pin.as_bytes(), &salt, PBKDF2_ROUNDS, &mut candidate);

    constant_time_eq(&candidate, &expected)
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
