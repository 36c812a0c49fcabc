//! Field-level authenticated encryption and credential hashing for data at
//! rest.
//!
//! Two facilities: [`FieldCipher`] seals short strings into hex records
//! (scrypt-derived key per record, AES-256-GCM), and [`hash_pin`] /
//! [`verify_pin`] turn PINs into salted PBKDF2 verifiers. Both fail closed
//! on untrusted input.
//!
//! Every encrypt, decrypt, and hash call pays a deliberately expensive key
//! derivation. Calls are synchronous and CPU-bound; on a cooperative
//! scheduler run them on a blocking worker so they don't starve concurrent
//! I/O.

mod credentials;
mod crypto;
mod error;
mod secret;

pub use crate::credentials::{CRED_HASH_LEN, CRED_SALT_LEN, PBKDF2_ROUNDS, hash_pin, verify_pin};
pub use crate::crypto::ScryptParams;
pub use crate::error::DecryptError;
pub use crate::secret::{MASTER_SECRET_LEN, MasterSecret, SecretFile};

use crate::crypto::EncryptedRecord;
use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Reversible, authenticated protection of short strings for storage in an
/// untrusted-at-rest medium.
///
/// Holds the immutable master secret and the scrypt cost parameters; every
/// call derives a one-shot key and is independent of every other call, so a
/// shared `FieldCipher` can be used from any number of threads.
pub struct FieldCipher {
    secret: MasterSecret,
    kdf: ScryptParams,
}

impl FieldCipher {
    pub fn new(secret: MasterSecret) -> Self {
        Self::with_kdf(secret, ScryptParams::default())
    }

    pub fn with_kdf(secret: MasterSecret, kdf: ScryptParams) -> Self {
        Self { secret, kdf }
    }

    /// Encrypts a plaintext string into its hex storage record.
    ///
    /// An empty plaintext yields `Ok(None)`: there is nothing to store, and
    /// that must not be confusable with a failure. Output is
    /// non-deterministic because salt and IV are fresh on every call.
    ///
    /// # Errors
    ///
    /// Only environment faults (randomness source, cipher setup) surface as
    /// errors; they must be propagated, not treated as an absent value.
    pub fn encrypt(&self, plaintext: &str) -> Result<Option<String>> {
        if plaintext.is_empty() {
            return Ok(None);
        }

        let salt = crypto::generate_salt()?;
        let iv = crypto::generate_iv()?;
        let key = crypto::derive_key(self.secret.as_bytes(), &salt, self.kdf)
            .context("failed to derive encryption key")?;

        let (ciphertext, tag) = crypto::seal(key.as_slice(), &iv, plaintext.as_bytes())?;

        Ok(Some(EncryptedRecord::new(salt, iv, tag, ciphertext).to_hex()))
    }

    /// Decrypts a stored record back into its plaintext.
    ///
    /// The input is untrusted. Bad hex, a too-short frame, a flipped byte, a
    /// foreign master secret: all fail closed with a [`DecryptError`] that
    /// names the reason, never a panic and never partial plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, DecryptError> {
        let record = EncryptedRecord::from_hex(encoded)?;

        let key = crypto::derive_key(self.secret.as_bytes(), record.salt(), self.kdf)
            .map_err(|e| DecryptError::Fault(e.to_string()))?;

        let plaintext = crypto::open(key.as_slice(), record.iv(), record.tag(), record.ciphertext())?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| DecryptError::Malformed("plaintext is not valid utf-8".into()))
    }
}

/// Platform-default location of the master secret file.
pub fn default_secret_file() -> Result<SecretFile> {
    let project_dirs = ProjectDirs::from("", "", "fieldseal")
        .context("could not determine platform directories")?;

    let path = project_dirs.data_dir().join("master.key");

    Ok(SecretFile::new(path))
}
