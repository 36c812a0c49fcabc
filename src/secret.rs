//! Master secret handling and its on-disk persistence.
//!
//! The master secret is created once, held immutably for the process
//! lifetime, and passed explicitly to the cipher at construction. It is
//! never logged.

use anyhow::{Context, Result, anyhow, bail};
use getrandom::fill;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use zeroize::Zeroizing;

/// Length of a generated master secret (32 bytes).
pub const MASTER_SECRET_LEN: usize = 32;

/// The process-wide encryption secret.
///
/// Externally supplied secrets may be any non-empty byte string; generated
/// ones are 32 random bytes. The bytes are wiped when dropped and `Debug`
/// never prints them.
pub struct MasterSecret(Zeroizing<Vec<u8>>);

impl MasterSecret {
    /// Wraps an externally supplied secret.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("master secret must not be empty");
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Parses the hex form used for persistence and env injection.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim()).context("master secret is not valid hex")?;
        Self::new(bytes)
    }

    /// Generates a fresh random secret.
    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new(vec![0u8; MASTER_SECRET_LEN]);
        fill(&mut bytes).map_err(|_| anyhow!("OS random generator unavailable"))?;
        Ok(Self(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&*self.0))
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterSecret(..)")
    }
}

/// File-backed persistence for the master secret.
///
/// `SecretFile` is the only resource here that needs mutual exclusion: if
/// several processes start concurrently, the exclusive-create temp file plus
/// atomic rename guarantees one coherent secret wins and no interleaved
/// write is ever observed.
#[derive(Clone)]
pub struct SecretFile {
    path: PathBuf,
}

impl SecretFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if a secret has been persisted.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the persisted secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a hex
    /// encoded secret.
    pub fn load(&self) -> Result<MasterSecret> {
        let content = Zeroizing::new(fs::read_to_string(&self.path)?);
        MasterSecret::from_hex(&content)
    }

    /// Persists the secret using an atomic write.
    ///
    /// Crash-safety protocol:
    /// 1. Write to a temporary file with a random name, created exclusively
    /// 2. Sync the temporary file to disk
    /// 3. Atomically replace the old file with the new one
    /// 4. Sync the parent directory so the rename itself is persisted
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, secret: &MasterSecret) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // exclusive create; a concurrent starter gets its own temp file
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary file")?;

        tmp_file.write_all(self.to_file_contents(secret).as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    /// Loads the secret, generating and persisting a fresh one if absent.
    ///
    /// A missing secret is an operational signal, not a fatal condition; it
    /// is logged as a warning and recovered automatically.
    pub fn load_or_generate(&self) -> Result<MasterSecret> {
        if self.exists() {
            return self.load();
        }

        warn!(path = %self.path.display(), "master secret not found, generating a new one");
        let secret = MasterSecret::generate()?;
        self.save(&secret)
            .context("failed to persist generated master secret")?;
        Ok(secret)
    }

    /// Returns the path of the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn to_file_contents(&self, secret: &MasterSecret) -> Zeroizing<String> {
        Zeroizing::new(format!("{}\n", &*secret.to_hex()))
    }

    /// Generates a unique temporary file path in the same directory.
    ///
    /// Uses cryptographically secure random bytes to avoid name collisions.
    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        fill(&mut buf).map_err(|_| anyhow!("OS random generator unavailable"))?;

        let rand_string = hex::encode(buf);

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "secret".to_string());

        let tmp_name = format!("{}.tmp.{}", file_name, rand_string);

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
    /// to ensure the operation is truly atomic and persisted to disk.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        // ReplaceFileW fails if the target does not exist yet
        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}
