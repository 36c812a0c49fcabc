//! Packed at-rest format for encrypted fields.
//!
//! Record layout (then lowercase hex encoded):
//! ```text
//! SALT (64) | IV (16) | TAG (16) | CIPHERTEXT
//! ```
//!
//! The layout is frozen: previously stored records must keep parsing at
//! exactly these offsets.

use super::{IV_LEN, SALT_LEN, TAG_LEN};
use crate::error::DecryptError;

/// A parsed encrypted record with all components.
#[derive(Debug)]
pub struct EncryptedRecord {
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedRecord {
    /// Smallest decodable record: salt + iv + tag with an empty ciphertext.
    pub const MIN_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

    pub fn new(
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        tag: [u8; TAG_LEN],
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            salt,
            iv,
            tag,
            ciphertext,
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes the record to its lowercase hex storage form.
    pub fn to_hex(&self) -> String {
        let mut buf = Vec::with_capacity(Self::MIN_LEN + self.ciphertext.len());

        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.tag);
        buf.extend_from_slice(&self.ciphertext);

        hex::encode(buf)
    }

    /// Parses a stored record. The input is untrusted: anything that is not
    /// hex or is shorter than the minimum frame is rejected as malformed.
    pub fn from_hex(encoded: &str) -> Result<Self, DecryptError> {
        let data = hex::decode(encoded)
            .map_err(|_| DecryptError::Malformed("not a hex string".into()))?;

        if data.len() < Self::MIN_LEN {
            return Err(DecryptError::Malformed(format!(
                "record too short: {} bytes, need at least {}",
                data.len(),
                Self::MIN_LEN
            )));
        }

        let mut offset = 0;

        let salt: [u8; SALT_LEN] = data[offset..offset + SALT_LEN]
            .try_into()
            .map_err(|_| DecryptError::Malformed("invalid salt length".into()))?;
        offset += SALT_LEN;

        let iv: [u8; IV_LEN] = data[offset..offset + IV_LEN]
            .try_into()
            .map_err(|_| DecryptError::Malformed("invalid iv length".into()))?;
        offset += IV_LEN;

        let tag: [u8; TAG_LEN] = data[offset..offset + TAG_LEN]
            .try_into()
            .map_err(|_| DecryptError::Malformed("invalid tag length".into()))?;
        offset += TAG_LEN;

        let ciphertext = data[offset..].to_vec();

        Ok(Self {
            salt,
            iv,
            tag,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let record = EncryptedRecord::new([1u8; 64], [2u8; 16], [3u8; 16], vec![9u8; 10]);

        let encoded = record.to_hex();
        let parsed = EncryptedRecord::from_hex(&encoded).unwrap();

        assert_eq!(parsed.salt(), record.salt());
        assert_eq!(parsed.iv(), record.iv());
        assert_eq!(parsed.tag(), record.tag());
        assert_eq!(parsed.ciphertext(), record.ciphertext());
    }

    #[test]
    fn encoding_is_lowercase_hex() {
        let record = EncryptedRecord::new([0xABu8; 64], [0xCDu8; 16], [0xEFu8; 16], vec![0xFF]);
        let encoded = record.to_hex();

        assert_eq!(encoded.len(), (EncryptedRecord::MIN_LEN + 1) * 2);
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn components_land_at_fixed_offsets() {
        let record = EncryptedRecord::new([1u8; 64], [2u8; 16], [3u8; 16], vec![4u8; 4]);
        let raw = hex::decode(record.to_hex()).unwrap();

        assert_eq!(&raw[..64], &[1u8; 64]);
        assert_eq!(&raw[64..80], &[2u8; 16]);
        assert_eq!(&raw[80..96], &[3u8; 16]);
        assert_eq!(&raw[96..], &[4u8; 4]);
    }

    #[test]
    fn minimum_length_record_parses_with_empty_ciphertext() {
        let encoded = "00".repeat(EncryptedRecord::MIN_LEN);
        let parsed = EncryptedRecord::from_hex(&encoded).unwrap();

        assert!(parsed.ciphertext().is_empty());
    }

    #[test]
    fn too_short_record_is_malformed() {
        let encoded = "00".repeat(EncryptedRecord::MIN_LEN - 1);

        match EncryptedRecord::from_hex(&encoded) {
            Err(DecryptError::Malformed(why)) => assert!(why.contains("too short")),
            other => panic!("expected Malformed, got: {other:?}"),
        }
    }

    #[test]
    fn garbage_input_is_malformed() {
        for bad in ["", "zz", "not hex at all", "abc"] {
            assert!(matches!(
                EncryptedRecord::from_hex(bad),
                Err(DecryptError::Malformed(_))
            ));
        }
    }
}
