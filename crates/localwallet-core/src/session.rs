//! Unlocked vault session
//!
//! Holds the vault location, the master password and the decrypted store
//! together. Every mutation goes through [`Session::update`], which writes
//! the new state to disk before it becomes visible in memory.

use std::path::PathBuf;
use thiserror::Error;

use crate::kdf::KdfParams;
use crate::password::MasterPassword;
use crate::store::{StoreError, WalletStore};
use crate::vault::{
    decrypt_container, encrypt_container_with, VaultError, VaultFile, VaultPlaintext,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Vault already exists at {0}")]
    AlreadyExists(PathBuf),
}

#[derive(Debug)]
pub struct Session {
    file: VaultFile,
    password: MasterPassword,
    store: WalletStore,
    /// Parameters for every write made by this session
    kdf: KdfParams,
}

impl Session {
    /// Create an empty vault at `file`; refuses to overwrite
    pub fn create(
        file: VaultFile,
        password: MasterPassword,
        kdf: KdfParams,
    ) -> Result<Self, SessionError> {
        if file.exists() {
            return Err(SessionError::AlreadyExists(file.path().to_path_buf()));
        }
        let session = Self {
            file,
            password,
            store: WalletStore::new(),
            kdf,
        };
        session.save()?;
        log::info!("Created vault at {}", session.file.path().display());
        Ok(session)
    }

    /// Read and decrypt an existing vault
    ///
    /// Decryption uses the parameters stored in the file; `kdf` applies to
    /// later writes.
    pub fn unlock(
        file: VaultFile,
        password: MasterPassword,
        kdf: KdfParams,
    ) -> Result<Self, SessionError> {
        let container = file.read()?;
        let plaintext = decrypt_container(password.expose(), &container)?;
        log::info!("Unlocked vault with {} wallet(s)", plaintext.wallets.len());
        Ok(Self {
            file,
            password,
            store: WalletStore::from_plaintext(plaintext),
            kdf,
        })
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    pub fn file(&self) -> &VaultFile {
        &self.file
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Apply `change` and persist the result
    ///
    /// `change` runs against a copy. The copy replaces the live store only
    /// after it is on disk, so an error from either step changes nothing.
    pub fn update<T, F>(&mut self, change: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut WalletStore) -> Result<T, StoreError>,
    {
        let mut next = self.store.clone();
        let value = change(&mut next)?;
        self.persist(&self.password, next.plaintext())?;
        self.store = next;
        Ok(value)
    }

    /// Re-encrypt the current state with a fresh salt and nonce
    pub fn save(&self) -> Result<(), SessionError> {
        self.persist(&self.password, self.store.plaintext())
    }

    /// Re-encrypt under `new_password`
    ///
    /// The old password stays in effect if the write fails.
    pub fn change_password(&mut self, new_password: MasterPassword) -> Result<(), SessionError> {
        self.persist(&new_password, self.store.plaintext())?;
        self.password = new_password;
        log::info!("Master password changed");
        Ok(())
    }

    fn persist(
        &self,
        password: &MasterPassword,
        plaintext: &VaultPlaintext,
    ) -> Result<(), SessionError> {
        let container = encrypt_container_with(password.expose(), plaintext, &self.kdf)?;
        self.file.write(&container)?;
        Ok(())
    }
}
