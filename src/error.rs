use std::fmt;

/// Why a stored record could not be decrypted.
///
/// `Malformed` and `Verification` are the recoverable outcomes: the caller
/// should treat the field as unavailable. `Fault` means the crypto layer
/// itself failed and must be propagated, not swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// Not hex, shorter than the minimum frame, or not valid UTF-8 after open.
    Malformed(String),
    /// The authentication tag rejected the record: tampering, corruption, or
    /// a different master secret.
    Verification,
    /// Key derivation or cipher setup failed. Environment fault.
    Fault(String),
}

impl DecryptError {
    /// `true` for faults that must not be treated as "field unavailable".
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecryptError::Fault(_))
    }
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptError::Malformed(why) => write!(f, "malformed record: {why}"),
            DecryptError::Verification => write!(f, "record failed authentication"),
            DecryptError::Fault(why) => write!(f, "crypto fault: {why}"),
        }
    }
}

impl std::error::Error for DecryptError {}
