use anyhow::{Context, Result};
use zeroize::Zeroizing;

use super::KEY_LEN;

/// Cost parameters for scrypt key derivation.
///
/// The defaults match the parameters the stored records were produced with,
/// so they must only be changed for newly provisioned deployments.
#[derive(Debug, Clone, Copy)]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            // default CPU/memory cost, N = 2^14 = 16384
            log_n: 14,
            // default block size
            r: 8,
            // default parallelism
            p: 1,
        }
    }
}

impl ScryptParams {
    pub fn new(log_n: u8, r: u32, p: u32) -> anyhow::Result<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.log_n == 0 || self.log_n >= 64 {
            anyhow::bail!("scrypt log_n must be in 1..64");
        }
        if self.r < 1 {
            anyhow::bail!("scrypt block size must be >= 1");
        }
        if self.p < 1 {
            anyhow::bail!("scrypt parallelism must be >= 1");
        }
        Ok(())
    }
}

/// Derives a 32-byte encryption key from the master secret and a salt.
///
/// Recomputed for every cipher operation; the result is wiped when dropped.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    kdf: ScryptParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    kdf.validate().context("invalid scrypt parameters")?;

    let params = scrypt::Params::new(kdf.log_n, kdf.r, kdf.p, KEY_LEN)
        .map_err(|e| anyhow::anyhow!("failed to construct scrypt params: {e}"))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(secret, salt, &params, key.as_mut())
        .map_err(|e| anyhow::anyhow!("scrypt key derivation failed: {e}"))?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // keep unit tests fast; the default cost is exercised in lib.rs
    fn cheap() -> ScryptParams {
        ScryptParams::new(10, 8, 1).unwrap()
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 64];

        let k1 = derive_key(b"master", &salt, cheap()).unwrap();
        let k2 = derive_key(b"master", &salt, cheap()).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn kdf_salt_affects_output() {
        let k1 = derive_key(b"master", &[1u8; 64], cheap()).unwrap();
        let k2 = derive_key(b"master", &[2u8; 64], cheap()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 64];

        let k1 = derive_key(b"master", &salt, ScryptParams::new(10, 8, 1).unwrap()).unwrap();
        let k2 = derive_key(b"master", &salt, ScryptParams::new(11, 8, 1).unwrap()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(ScryptParams::new(0, 8, 1).is_err());
        assert!(ScryptParams::new(64, 8, 1).is_err());
        assert!(ScryptParams::new(14, 0, 1).is_err());
        assert!(ScryptParams::new(14, 8, 0).is_err());
    }
}
