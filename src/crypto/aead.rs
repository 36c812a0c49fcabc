use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use anyhow::{Result, anyhow};
use getrandom::fill;
use zeroize::Zeroizing;

use super::{IV_LEN, SALT_LEN, TAG_LEN};
use crate::error::DecryptError;

/// AES-256-GCM with the 16-byte IV the record format carries.
type FieldGcm = AesGcm<Aes256, U16>;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| anyhow!("OS random generator unavailable"))
}

/// Generate a fresh key-derivation salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate a fresh initialization vector
pub fn generate_iv() -> Result<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    secure_random(&mut iv)?;
    Ok(iv)
}

/// Encrypt plaintext, returning the ciphertext and the detached tag
pub fn seal(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = FieldGcm::new_from_slice(key).map_err(|_| anyhow!("invalid key length"))?;

    let mut ciphertext = cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| anyhow!("encryption failed"))?;

    if ciphertext.len() < TAG_LEN {
        return Err(anyhow!("ciphertext shorter than authentication tag"));
    }
    let tag_bytes = ciphertext.split_off(ciphertext.len() - TAG_LEN);
    let tag: [u8; TAG_LEN] = tag_bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("tag length mismatch"))?;

    Ok((ciphertext, tag))
}

/// Decrypt ciphertext, verifying the tag. Fails closed on any mismatch.
pub fn open(
    key: &[u8],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    let cipher = FieldGcm::new_from_slice(key)
        .map_err(|_| DecryptError::Fault("invalid key length".into()))?;

    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), combined.as_ref())
        .map_err(|_| DecryptError::Verification)?;
    Ok(Zeroizing::new(plaintext))
}
