//! In-memory wallet collection
//!
//! Owns the decrypted [`VaultPlaintext`] for one session. Positions are
//! 1-based, matching what the user sees in a listing.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::hd::{self, DerivationError, DerivationResult};
use crate::mnemonic::{self, MnemonicError};
use crate::vault::{VaultPlaintext, WalletRecord};

/// Placeholder shown when a record's address cannot be derived
pub const UNAVAILABLE_ADDRESS: &str = "<error deriving>";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    #[error("No wallet at position {position} (have {len})")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Address column of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListedAddress {
    Derived(String),
    /// Recomputation failed for this record only
    Unavailable,
}

impl fmt::Display for ListedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derived(address) => f.write_str(address),
            Self::Unavailable => f.write_str(UNAVAILABLE_ADDRESS),
        }
    }
}

/// One row of [`WalletStore::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    /// 1-based position
    pub position: usize,
    pub name: String,
    pub address: ListedAddress,
}

/// Re-derive a record's keys from its mnemonic and passphrase
fn derive_record(mnemonic: &str, passphrase: &str) -> Result<DerivationResult, StoreError> {
    let mnemonic = mnemonic::validate(mnemonic)?;
    let seed = mnemonic::to_seed(&mnemonic, passphrase);
    Ok(hd::derive(seed.as_slice())?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletStore {
    plaintext: VaultPlaintext,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plaintext(plaintext: VaultPlaintext) -> Self {
        Self { plaintext }
    }

    pub fn plaintext(&self) -> &VaultPlaintext {
        &self.plaintext
    }

    pub fn into_plaintext(self) -> VaultPlaintext {
        self.plaintext
    }

    pub fn len(&self) -> usize {
        self.plaintext.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plaintext.wallets.is_empty()
    }

    /// Record at a 1-based position
    pub fn get(&self, position: usize) -> Result<&WalletRecord, StoreError> {
        position
            .checked_sub(1)
            .and_then(|i| self.plaintext.wallets.get(i))
            .ok_or(StoreError::PositionOutOfRange {
                position,
                len: self.len(),
            })
    }

    /// Validate, derive, then append a wallet; returns its address
    ///
    /// The same mnemonic may be added more than once. Nothing is appended
    /// if validation or derivation fails.
    pub fn add(
        &mut self,
        name: &str,
        mnemonic: &str,
        passphrase: &str,
    ) -> Result<String, StoreError> {
        let normalized = mnemonic::normalize(mnemonic);
        let derived = derive_record(&normalized, passphrase)?;

        let address = derived.address.clone();
        self.plaintext.wallets.push(WalletRecord {
            name: name.trim().to_string(),
            mnemonic: normalized.to_string(),
            passphrase: passphrase.to_string(),
            address: derived.address,
        });
        log::info!("Added wallet #{}", self.len());
        Ok(address)
    }

    /// Name and freshly derived address of every wallet
    ///
    /// The cached `address` field is never trusted here.
    pub fn list(&self) -> Vec<WalletSummary> {
        self.plaintext
            .wallets
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let address = match derive_record(&record.mnemonic, &record.passphrase) {
                    Ok(derived) => {
                        if !record.address.is_empty() && record.address != derived.address {
                            log::warn!("Cached address of wallet #{} is stale", i + 1);
                        }
                        ListedAddress::Derived(derived.address)
                    }
                    Err(e) => {
                        log::warn!("Cannot derive address of wallet #{}: {}", i + 1, e);
                        ListedAddress::Unavailable
                    }
                };
                WalletSummary {
                    position: i + 1,
                    name: record.name.clone(),
                    address,
                }
            })
            .collect()
    }

    /// Delete wallets at the given 1-based positions
    ///
    /// Every position is checked against the current list before anything
    /// is removed; removal then runs from the highest position down so no
    /// pending position shifts. Returns the number removed.
    pub fn remove(&mut self, positions: &BTreeSet<usize>) -> Result<usize, StoreError> {
        let len = self.len();
        if let Some(&position) = positions.iter().find(|&&p| p == 0 || p > len) {
            return Err(StoreError::PositionOutOfRange { position, len });
        }

        for &position in positions.iter().rev() {
            self.plaintext.wallets.remove(position - 1);
        }
        log::info!("Removed {} wallet(s), {} left", positions.len(), self.len());
        Ok(positions.len())
    }

    /// Delete every wallet; returns the number removed
    pub fn clear(&mut self) -> usize {
        let removed = self.len();
        self.plaintext.wallets.clear();
        log::info!("Removed all {} wallet(s)", removed);
        removed
    }

    /// Re-derive address and WIF for the wallet at `position`
    pub fn export_private_key(&self, position: usize) -> Result<DerivationResult, StoreError> {
        let record = self.get(position)?;
        derive_record(&record.mnemonic, &record.passphrase)
    }
}
