//! Reviewer key persistence.
//!
//! The reviewer's X25519 private key lives in its own file: 64 hex characters
//! and an optional trailing newline. On Unix the file must be owner-only;
//! anything group or world readable is refused before the content is read.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use sealdrop_crypto::{PRIVATE_KEY_SIZE, PrivateKey, PublicKey, generate_ephemeral_key_pair};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::KeyStoreError;

/// Source of the reviewer's private key.
pub trait ReviewerKeyStore {
    /// Load the private key.
    fn load_private_key(&self) -> Result<PrivateKey, KeyStoreError>;
}

/// Key held in memory, for tests and embedding.
impl ReviewerKeyStore for PrivateKey {
    fn load_private_key(&self) -> Result<PrivateKey, KeyStoreError> {
        Ok(self.clone())
    }
}

/// Hex key file on disk.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Key store backed by `path`. Nothing is read until
    /// [`ReviewerKeyStore::load_private_key`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Key file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewerKeyStore for FileKeyStore {
    fn load_private_key(&self) -> Result<PrivateKey, KeyStoreError> {
        check_permissions(&self.path)?;

        let text = Zeroizing::new(fs::read_to_string(&self.path).map_err(|e| io_error(&self.path, &e))?);
        let bytes = Zeroizing::new(
            hex::decode(text.trim()).map_err(|_| malformed(&self.path, "not valid hex"))?,
        );

        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(malformed(&self.path, "expected 32 bytes"));
        }

        PrivateKey::from_slice(&bytes).map_err(|_| malformed(&self.path, "expected 32 bytes"))
    }
}

/// Create a new reviewer key file at `path` and return its public key.
///
/// The file is created with mode 0600 on Unix and never overwrites an
/// existing file.
///
/// # Errors
///
/// - `AlreadyExists`: something is already at `path`
/// - `Io`: the file could not be created or written
/// - `Generation`: OS randomness unavailable
pub fn generate_reviewer_key(path: &Path) -> Result<PublicKey, KeyStoreError> {
    let key_pair = generate_ephemeral_key_pair().map_err(KeyStoreError::Generation)?;
    let encoded = Zeroizing::new(hex::encode(key_pair.private_key().as_bytes()));

    write_new_file(path, |file| {
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()
    })?;

    let public_key = *key_pair.public_key();
    info!(path = %path.display(), public_key = ?public_key, "reviewer key generated");
    Ok(public_key)
}

/// Create `path` owner-only and fill it with `write`.
///
/// A failed write removes the file again, so a later attempt does not trip
/// over a truncated key.
fn write_new_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<(), KeyStoreError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            KeyStoreError::AlreadyExists { path: path.display().to_string() }
        } else {
            io_error(path, &e)
        }
    })?;

    if let Err(err) = write(&mut file) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove_err, "partial key file left behind");
        }
        return Err(io_error(path, &err));
    }

    Ok(())
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<(), KeyStoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| io_error(path, &e))?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(KeyStoreError::InsecurePermissions { path: path.display().to_string(), mode });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(path: &Path) -> Result<(), KeyStoreError> {
    fs::metadata(path).map(|_| ()).map_err(|e| io_error(path, &e))
}

fn io_error(path: &Path, err: &io::Error) -> KeyStoreError {
    KeyStoreError::Io { path: path.display().to_string(), message: err.to_string() }
}

fn malformed(path: &Path, reason: &'static str) -> KeyStoreError {
    KeyStoreError::Malformed { path: path.display().to_string(), reason }
}
