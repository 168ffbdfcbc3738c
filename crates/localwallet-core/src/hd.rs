//! Key derivation from BIP-39 seed
//!
//! Walks the BIP-84 path to the first external receive key and exposes it as
//! a bech32 address and, separately, as a WIF private key. Both outputs go
//! through [`derive_leaf`], so they always describe the same key pair.

use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Address, CompressedPublicKey, Network};
use thiserror::Error;
use zeroize::Zeroizing;

/// BIP-84 path of the first receive address: purpose / coin / account / external / index
pub const BIP84_RECEIVE_PATH: &str = "m/84'/0'/0'/0/0";

/// BIP-39 seed length
pub const SEED_LEN: usize = 64;

const NETWORK: Network = Network::Bitcoin;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DerivationError {
    #[error("Invalid seed length: expected 64 bytes, got {0}")]
    InvalidSeedLength(usize),
    #[error("Derivation failed: {0}")]
    Bip32(String),
}

/// Address and exportable private key of one leaf
pub struct DerivationResult {
    pub address: String,
    pub private_key_wif: Zeroizing<String>,
}

impl std::fmt::Debug for DerivationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationResult")
            .field("address", &self.address)
            .field("private_key_wif", &"<redacted>")
            .finish()
    }
}

fn derive_leaf(seed: &[u8]) -> Result<(Secp256k1<All>, Xpriv), DerivationError> {
    if seed.len() != SEED_LEN {
        return Err(DerivationError::InvalidSeedLength(seed.len()));
    }

    let secp = Secp256k1::new();
    let master = Xpriv::new_master(NETWORK, seed)
        .map_err(|e| DerivationError::Bip32(e.to_string()))?;

    let path: DerivationPath = BIP84_RECEIVE_PATH
        .parse()
        .map_err(|e: bitcoin::bip32::Error| DerivationError::Bip32(e.to_string()))?;

    let leaf = master
        .derive_priv(&secp, &path)
        .map_err(|e| DerivationError::Bip32(e.to_string()))?;
    Ok((secp, leaf))
}

fn leaf_address(secp: &Secp256k1<All>, leaf: &Xpriv) -> String {
    let public_key = Xpub::from_priv(secp, leaf);
    let compressed = CompressedPublicKey(public_key.public_key);
    Address::p2wpkh(&compressed, NETWORK).to_string()
}

/// Native segwit receive address at m/84'/0'/0'/0/0
pub fn derive_address(seed: &[u8]) -> Result<String, DerivationError> {
    let (secp, leaf) = derive_leaf(seed)?;
    Ok(leaf_address(&secp, &leaf))
}

/// Compressed mainnet WIF of the key at m/84'/0'/0'/0/0
pub fn derive_private_key(seed: &[u8]) -> Result<Zeroizing<String>, DerivationError> {
    let (_, leaf) = derive_leaf(seed)?;
    Ok(Zeroizing::new(leaf.to_priv().to_wif()))
}

/// Both halves of the leaf from a single walk
pub fn derive(seed: &[u8]) -> Result<DerivationResult, DerivationError> {
    let (secp, leaf) = derive_leaf(seed)?;
    Ok(DerivationResult {
        address: leaf_address(&secp, &leaf),
        private_key_wif: Zeroizing::new(leaf.to_priv().to_wif()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mnemonic::{generate, to_seed, validate};
    use bitcoin::PrivateKey;

    const ABANDON_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn address_of_wif(wif: &str) -> String {
        let secp = Secp256k1::new();
        let private_key = PrivateKey::from_wif(wif).unwrap();
        let compressed = CompressedPublicKey::from_private_key(&secp, &private_key).unwrap();
        Address::p2wpkh(&compressed, Network::Bitcoin).to_string()
    }

    /// Official BIP-84 test vector
    ///
    /// Mnemonic: abandon x11 about, no passphrase
    /// Path: m/84'/0'/0'/0/0
    /// Private key: KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d
    /// Address: bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu
    #[test]
    fn test_bip84_official_vector() {
        let seed = to_seed(&validate(ABANDON_12).unwrap(), "");

        assert_eq!(
            derive_address(seed.as_slice()).unwrap(),
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
        );
        assert_eq!(
            derive_private_key(seed.as_slice()).unwrap().as_str(),
            "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d"
        );
    }

    #[test]
    fn test_derivation_deterministic_and_paired() {
        let seed = to_seed(&generate().unwrap(), "");

        let a = derive(seed.as_slice()).unwrap();
        let b = derive(seed.as_slice()).unwrap();
        assert_eq!(a.address, b.address);
        assert_eq!(*a.private_key_wif, *b.private_key_wif);

        assert_eq!(derive_address(seed.as_slice()).unwrap(), a.address);
        assert_eq!(*derive_private_key(seed.as_slice()).unwrap(), *a.private_key_wif);

        // WIF must control the reported address
        assert_eq!(address_of_wif(&a.private_key_wif), a.address);
    }

    #[test]
    fn test_passphrase_changes_address() {
        let mnemonic = validate(ABANDON_12).unwrap();
        let plain = derive_address(to_seed(&mnemonic, "").as_slice()).unwrap();
        let with_x = derive_address(to_seed(&mnemonic, "x").as_slice()).unwrap();
        assert_ne!(plain, with_x);
    }

    #[test]
    fn test_native_segwit_format() {
        let seed = to_seed(&generate().unwrap(), "");
        let address = derive_address(seed.as_slice()).unwrap();
        assert!(address.starts_with("bc1q"));
        assert_eq!(address.len(), 42);
    }

    #[test]
    fn test_wrong_seed_length_rejected() {
        assert_eq!(
            derive_address(&[0u8; 32]),
            Err(DerivationError::InvalidSeedLength(32))
        );
        assert!(matches!(
            derive_private_key(&[]),
            Err(DerivationError::InvalidSeedLength(0))
        ));
        assert!(matches!(
            derive(&[1u8; 65]),
            Err(DerivationError::InvalidSeedLength(65))
        ));
    }

    #[test]
    fn test_debug_redacts_wif() {
        let seed = to_seed(&validate(ABANDON_12).unwrap(), "");
        let result = derive(seed.as_slice()).unwrap();
        let debug = format!("{:?}", result);
        assert!(debug.contains("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"));
        assert!(!debug.contains(result.private_key_wif.as_str()));
    }
}
