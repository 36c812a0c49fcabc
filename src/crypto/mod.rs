//! Cryptographic primitives for field-level protection.
//!
//! Provides key derivation, authenticated encryption, and the packed
//! at-rest record format.

pub mod aead;
pub mod kdf;
pub mod record;

pub use aead::{generate_iv, generate_salt, open, seal};
pub use kdf::{ScryptParams, derive_key};
pub use record::EncryptedRecord;

/// Length of the per-record key-derivation salt (64 bytes).
pub const SALT_LEN: usize = 64;
/// Length of the AES-GCM initialization vector (16 bytes).
pub const IV_LEN: usize = 16;
/// Length of the GCM authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;
/// Length of the derived encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
