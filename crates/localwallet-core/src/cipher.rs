//! Authenticated encryption of the vault payload
//!
//! AES-256-GCM with a random 96-bit nonce per call.
//!
//! Sealed format:
//! [nonce (12 bytes)][ciphertext][tag (16 bytes)]

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::kdf::KEY_LEN;

/// Nonce length for AES-256-GCM
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    /// Wrong key, tampered bytes and truncated input all land here
    #[error("Authentication failed: invalid key or corrupted data")]
    Integrity,
    #[error("Encryption failed")]
    EncryptionFailed,
}

/// Encrypt `plaintext` under `key`
///
/// Each call draws a fresh nonce from the OS RNG, so sealing the same
/// payload twice never produces the same bytes.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CipherError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt and authenticate a payload produced by [`seal`]
pub fn open(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(CipherError::Integrity);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CipherError::Integrity)
}
