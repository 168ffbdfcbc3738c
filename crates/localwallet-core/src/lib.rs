//! localwallet core
//!
//! Offline custody of BIP-39 mnemonics under a single master password.
//!
//! # Key Derivation
//!
//! Every wallet resolves to one native segwit receive key:
//! - Bitcoin keys via BIP-84: m/84'/0'/0'/0/0
//!
//! # Encrypted Storage
//!
//! The wallet list is encrypted at rest with PBKDF2-HMAC-SHA256 (or Argon2id)
//! + AES-256-GCM. The KDF parameters are stored next to the ciphertext.

pub mod cipher;
pub mod hardening;
pub mod hd;
pub mod kdf;
pub mod mnemonic;
pub mod password;
pub mod session;
pub mod store;
pub mod vault;

pub use hd::{derive, derive_address, derive_private_key, DerivationError, DerivationResult};
pub use kdf::{KdfId, KdfParams};
pub use password::{MasterPassword, PasswordError};
pub use session::{Session, SessionError};
pub use store::{ListedAddress, StoreError, WalletStore, WalletSummary};
pub use vault::{
    decrypt_container, encrypt_container, encrypt_container_with, VaultContainer, VaultError,
    VaultFile, VaultPlaintext, WalletRecord,
};
