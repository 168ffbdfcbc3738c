//! Encrypted vault container
//!
//! The on-disk format is a small JSON document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "kdf_id": "pbkdf2_sha256",
//!   "iterations": 200000,
//!   "salt": "<base64, 16 bytes>",
//!   "ciphertext": "<base64, nonce || aes-256-gcm ciphertext || tag>"
//! }
//! ```
//!
//! The ciphertext wraps the JSON encoding of [`VaultPlaintext`]. Decryption
//! reads the KDF parameters from the container itself. Every failure past
//! that point is reported as [`VaultError::Auth`] without saying which step
//! failed.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::cipher;
use crate::kdf::{self, KdfId, KdfParams, SALT_LEN};

/// Container format written by this version
pub const FORMAT_VERSION: u32 = 1;

/// Default vault file name, relative to the working directory
pub const DEFAULT_VAULT_FILENAME: &str = "local_wallet";

#[derive(Error, Debug)]
pub enum VaultError {
    /// Wrong password or corrupted/tampered ciphertext
    #[error("Wrong master password or corrupted vault file")]
    Auth,
    #[error("No vault found at {0}")]
    NotFound(PathBuf),
    #[error("Corrupt vault container: {0}")]
    CorruptContainer(String),
    #[error("Unsupported vault format version {0}")]
    UnsupportedVersion(u32),
    #[error("Failed to encode vault: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One stored wallet
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletRecord {
    pub name: String,
    /// Normalised BIP-39 phrase
    pub mnemonic: String,
    /// BIP-39 passphrase, empty when none was set
    #[serde(default)]
    pub passphrase: String,
    /// Cached receive address, recomputable from mnemonic + passphrase
    #[serde(default)]
    pub address: String,
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("name", &self.name)
            .field("mnemonic", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Decrypted vault contents. Never written to disk unencrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPlaintext {
    #[serde(default)]
    pub wallets: Vec<WalletRecord>,
}

/// Serde helpers for base64 byte fields
mod base64_serde {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.trim()).map_err(serde::de::Error::custom)
    }

    pub mod salt {
        use super::*;
        use crate::kdf::SALT_LEN;

        pub fn serialize<S>(salt: &[u8; SALT_LEN], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            super::serialize(salt, serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; SALT_LEN], D::Error>
        where
            D: Deserializer<'de>,
        {
            let bytes = super::deserialize(deserializer)?;
            <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
                serde::de::Error::custom(format!(
                    "salt must be {} bytes, got {}",
                    SALT_LEN,
                    bytes.len()
                ))
            })
        }
    }
}

/// Persisted, encrypted form of the vault
///
/// Unknown fields are ignored, so newer writers can add metadata without
/// breaking this reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContainer {
    #[serde(alias = "version")]
    pub format_version: u32,
    #[serde(alias = "kdf")]
    pub kdf_id: KdfId,
    pub iterations: u32,
    /// Argon2 memory cost in KiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_kib: Option<u32>,
    /// Argon2 lanes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
    #[serde(with = "base64_serde::salt")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "base64_serde")]
    pub ciphertext: Vec<u8>,
}

impl VaultContainer {
    /// KDF parameters recorded in this container
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            kdf: self.kdf_id,
            iterations: self.iterations,
            memory_kib: self.memory_kib,
            parallelism: self.parallelism,
        }
    }

    /// Parse a container document
    pub fn from_json(json: &str) -> Result<Self, VaultError> {
        serde_json::from_str(json).map_err(|e| VaultError::CorruptContainer(e.to_string()))
    }

    /// Pretty-printed container document
    pub fn to_json(&self) -> Result<String, VaultError> {
        serde_json::to_string_pretty(self).map_err(|e| VaultError::Encode(e.to_string()))
    }
}

/// Encrypt with the default KDF parameters
pub fn encrypt_container(
    password: &str,
    plaintext: &VaultPlaintext,
) -> Result<VaultContainer, VaultError> {
    encrypt_container_with(password, plaintext, &KdfParams::default())
}

/// Encrypt with explicit KDF parameters
///
/// A new random salt is drawn on every call.
pub fn encrypt_container_with(
    password: &str,
    plaintext: &VaultPlaintext,
    params: &KdfParams,
) -> Result<VaultContainer, VaultError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key = kdf::derive_key(password, &salt, params)
        .map_err(|e| VaultError::Encode(e.to_string()))?;

    let encoded = Zeroizing::new(
        serde_json::to_vec(plaintext).map_err(|e| VaultError::Encode(e.to_string()))?,
    );
    let ciphertext =
        cipher::seal(&key, &encoded).map_err(|e| VaultError::Encode(e.to_string()))?;

    Ok(VaultContainer {
        format_version: FORMAT_VERSION,
        kdf_id: params.kdf,
        iterations: params.iterations,
        memory_kib: params.memory_kib,
        parallelism: params.parallelism,
        salt,
        ciphertext,
    })
}

/// Decrypt a container with the KDF parameters it carries
pub fn decrypt_container(
    password: &str,
    container: &VaultContainer,
) -> Result<VaultPlaintext, VaultError> {
    if container.format_version == 0 {
        return Err(VaultError::CorruptContainer("format_version 0".into()));
    }
    if container.format_version > FORMAT_VERSION {
        return Err(VaultError::UnsupportedVersion(container.format_version));
    }

    let params = container.kdf_params();
    params
        .validate()
        .map_err(|e| VaultError::CorruptContainer(e.to_string()))?;

    let key = kdf::derive_key(password, &container.salt, &params).map_err(|_| VaultError::Auth)?;
    let decoded = cipher::open(&key, &container.ciphertext).map_err(|_| VaultError::Auth)?;
    serde_json::from_slice(&decoded).map_err(|_| VaultError::Auth)
}

/// Location of the vault on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    path: PathBuf,
}

impl VaultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the container; [`VaultError::NotFound`] signals first run
    pub fn read(&self) -> Result<VaultContainer, VaultError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let container = VaultContainer::from_json(&contents)?;
        log::debug!(
            "Read vault {} (format {}, {})",
            self.path.display(),
            container.format_version,
            container.kdf_id
        );
        Ok(container)
    }

    /// Replace the vault file atomically
    ///
    /// Writes a sibling temp file, fsyncs it, then renames it over the
    /// target. A crash leaves either the old or the new vault intact.
    pub fn write(&self, container: &VaultContainer) -> Result<(), VaultError> {
        let json = container.to_json()?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let tmp_path = self.tmp_path();
        if let Err(e) = write_synced(&tmp_path, json.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path))
        {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        sync_dir(&parent);

        log::info!("Saved vault to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_VAULT_FILENAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for VaultFile {
    fn default() -> Self {
        Self::new(DEFAULT_VAULT_FILENAME)
    }
}

/// Write `bytes` to a freshly created file
///
/// A leftover file from an interrupted write is removed first, so the mode
/// below always applies.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed stale {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        log::warn!("Failed to fsync {}: {}", dir.display(), e);
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
