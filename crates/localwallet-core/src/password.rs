//! Master password handling
//!
//! The master password lives in a zeroizing wrapper for the length of a
//! session and is never serialized. Creation flows enter it twice; a
//! mismatch is recoverable and the caller re-prompts.
//!
//! Strength checks are warnings, not a gate, apart from the minimum length.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Shortest master password accepted for a new vault
pub const MIN_MASTER_PASSWORD_LEN: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "12345678", "123456789", "qwerty", "letmein", "iloveyou", "bitcoin", "satoshi",
    "wallet", "passw0rd", "trustno1",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Entries do not match")]
    Mismatch,
    #[error("Use at least {0} characters")]
    TooShort(usize),
}

/// Master password for one session
#[derive(Clone)]
pub struct MasterPassword(Zeroizing<String>);

impl MasterPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterPassword(<redacted>)")
    }
}

/// Compare two entries of the same secret
///
/// Used for both the master password and BIP-39 passphrases.
pub fn confirm(entry: &str, confirmation: &str) -> Result<Zeroizing<String>, PasswordError> {
    if entry != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(Zeroizing::new(entry.to_string()))
}

/// Enforce the minimum length and collect advisory warnings
pub fn check_master_password(candidate: &str) -> Result<Vec<String>, PasswordError> {
    let len = candidate.chars().count();
    if len < MIN_MASTER_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_MASTER_PASSWORD_LEN));
    }

    let mut warnings = Vec::new();

    let lower = candidate.to_lowercase();
    if COMMON_PASSWORDS.iter().any(|&common| lower.contains(common)) {
        warnings.push("Contains a commonly used password".to_string());
    }

    let classes = [
        candidate.chars().any(|c| c.is_ascii_lowercase()),
        candidate.chars().any(|c| c.is_ascii_uppercase()),
        candidate.chars().any(|c| c.is_ascii_digit()),
        candidate.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    if classes.iter().filter(|&&present| present).count() == 1 && len < 16 {
        warnings.push(
            "Single character class; use a longer passphrase or mix in digits and symbols"
                .to_string(),
        );
    }

    let unique: HashSet<char> = candidate.chars().collect();
    if unique.len() * 2 < len {
        warnings.push("Too many repeated characters".to_string());
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_match() {
        assert_eq!(confirm("same", "same").unwrap().as_str(), "same");
        assert_eq!(confirm("", "").unwrap().as_str(), "");
    }

    #[test]
    fn test_confirm_mismatch() {
        assert_eq!(confirm("one", "two"), Err(PasswordError::Mismatch));
        assert_eq!(confirm("pass ", "pass"), Err(PasswordError::Mismatch));
    }

    #[test]
    fn test_too_short_rejected() {
        assert_eq!(
            check_master_password("short"),
            Err(PasswordError::TooShort(MIN_MASTER_PASSWORD_LEN))
        );
        assert!(check_master_password("").is_err());
        assert!(check_master_password("8charsok").is_ok());
    }

    #[test]
    fn test_strong_password_no_warnings() {
        assert!(check_master_password("Plum-Orbit-42-Cedar!")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_weak_patterns_warned() {
        let common = check_master_password("mybitcoinvault").unwrap();
        assert!(common.iter().any(|w| w.contains("commonly used")));

        let single_class = check_master_password("zxkqvmpw").unwrap();
        assert!(single_class.iter().any(|w| w.contains("Single character class")));

        let repeated = check_master_password("aaaaaaab1!").unwrap();
        assert!(repeated.iter().any(|w| w.contains("repeated")));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 4 characters, 12 bytes
        assert!(check_master_password("密码密码").is_err());
    }

    #[test]
    fn test_debug_redacted() {
        let password = MasterPassword::new("correcthorsebatterystaple");
        assert_eq!(password.expose(), "correcthorsebatterystaple");
        assert!(!format!("{:?}", password).contains("correct"));
    }
}
