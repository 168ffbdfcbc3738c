//! BIP-39 mnemonic handling
//!
//! Generation, validation of user-supplied phrases, and seed derivation.

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroizing;

/// Word count of freshly generated mnemonics (128 bits of entropy)
pub const GENERATED_WORD_COUNT: usize = 12;

/// Word counts accepted on import
pub const ACCEPTED_WORD_COUNTS: [usize; 2] = [12, 24];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Mnemonic must have 12 or 24 words, got {0}")]
    WrongWordCount(usize),
    #[error("Invalid mnemonic: {0}")]
    Invalid(String),
}

/// Generate a new 12-word English mnemonic
pub fn generate() -> Result<Mnemonic, MnemonicError> {
    Mnemonic::generate_in(Language::English, GENERATED_WORD_COUNT)
        .map_err(|e| MnemonicError::Invalid(e.to_string()))
}

/// Lowercase, trim and collapse whitespace
///
/// The result is the form stored in a wallet record.
pub fn normalize(candidate: &str) -> Zeroizing<String> {
    let words: Vec<String> = candidate
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    Zeroizing::new(words.join(" "))
}

/// Validate a user-supplied phrase
///
/// Checks word count first, then wordlist membership and checksum. Must
/// pass before anything is derived from the phrase.
pub fn validate(candidate: &str) -> Result<Mnemonic, MnemonicError> {
    let normalized = normalize(candidate);
    let count = normalized.split(' ').filter(|w| !w.is_empty()).count();
    if !ACCEPTED_WORD_COUNTS.contains(&count) {
        return Err(MnemonicError::WrongWordCount(count));
    }

    // bip39 errors only carry word indices, never the words themselves
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| MnemonicError::Invalid(e.to_string()))
}

/// Derive seed bytes from mnemonic and passphrase
///
/// An empty passphrase is a valid passphrase of its own; it yields a
/// different seed than any non-empty one.
pub fn to_seed(mnemonic: &Mnemonic, passphrase: &str) -> Zeroizing<[u8; 64]> {
    Zeroizing::new(mnemonic.to_seed(passphrase))
}
