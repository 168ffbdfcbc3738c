//! Password-based key derivation
//!
//! Stretches the master password into a 256-bit AES key.
//!
//! # Security Notes
//!
//! - PBKDF2-HMAC-SHA256 is the default and what every container written so
//!   far uses
//! - Argon2id is available for callers that want a memory-hard KDF
//! - Parameters are recorded per container and read back on decrypt, so
//!   raising a default never locks out an older vault

use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Instant;
use thiserror::Error;
use zeroize::Zeroizing;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived key length (256 bits for AES-256)
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 round count for new containers
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;

/// Upper bound accepted from a container, to refuse absurd work factors
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Argon2id defaults (OWASP recommendations for 2024+)
/// - t_cost: 3 passes
/// - m_cost: 64 MiB memory
/// - p_cost: 4 lanes
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 3;
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 65536;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 4;

const MAX_ARGON2_ITERATIONS: u32 = 64;
/// 1 GiB; every unlock of a container allocates this much
const MAX_ARGON2_MEMORY_KIB: u32 = 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KdfError {
    #[error("Invalid KDF parameters: {0}")]
    InvalidParameters(String),
}

/// Identifier of the password-hardening function, as written to disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdfId {
    /// PBKDF2 with HMAC-SHA256
    #[default]
    Pbkdf2Sha256,
    /// Argon2id (v0x13)
    Argon2id,
}

impl KdfId {
    /// Default work factor for this KDF
    pub fn default_iterations(self) -> u32 {
        match self {
            Self::Pbkdf2Sha256 => DEFAULT_PBKDF2_ITERATIONS,
            Self::Argon2id => DEFAULT_ARGON2_ITERATIONS,
        }
    }
}

impl std::fmt::Display for KdfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pbkdf2Sha256 => write!(f, "pbkdf2_sha256"),
            Self::Argon2id => write!(f, "argon2id"),
        }
    }
}

impl std::str::FromStr for KdfId {
    type Err = KdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pbkdf2_sha256" => Ok(Self::Pbkdf2Sha256),
            "argon2id" => Ok(Self::Argon2id),
            other => Err(KdfError::InvalidParameters(format!("unknown kdf '{}'", other))),
        }
    }
}

/// Full parameter set needed to reproduce a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub kdf: KdfId,
    /// PBKDF2 rounds, or Argon2 time cost
    pub iterations: u32,
    /// Argon2 only
    pub memory_kib: Option<u32>,
    /// Argon2 only
    pub parallelism: Option<u32>,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::pbkdf2(DEFAULT_PBKDF2_ITERATIONS)
    }
}

impl KdfParams {
    pub fn pbkdf2(iterations: u32) -> Self {
        Self {
            kdf: KdfId::Pbkdf2Sha256,
            iterations,
            memory_kib: None,
            parallelism: None,
        }
    }

    pub fn argon2id(iterations: u32, memory_kib: u32, parallelism: u32) -> Self {
        Self {
            kdf: KdfId::Argon2id,
            iterations,
            memory_kib: Some(memory_kib),
            parallelism: Some(parallelism),
        }
    }

    /// Defaults for the given KDF, with an optional work-factor override
    pub fn for_kdf(kdf: KdfId, iterations: Option<u32>) -> Self {
        let iterations = iterations.unwrap_or_else(|| kdf.default_iterations());
        match kdf {
            KdfId::Pbkdf2Sha256 => Self::pbkdf2(iterations),
            KdfId::Argon2id => Self::argon2id(
                iterations,
                DEFAULT_ARGON2_MEMORY_KIB,
                DEFAULT_ARGON2_PARALLELISM,
            ),
        }
    }

    /// Reject parameter sets that no container written by us could carry
    pub fn validate(&self) -> Result<(), KdfError> {
        if self.iterations == 0 {
            return Err(KdfError::InvalidParameters(
                "iterations must be at least 1".into(),
            ));
        }
        match self.kdf {
            KdfId::Pbkdf2Sha256 => {
                if self.iterations > MAX_PBKDF2_ITERATIONS {
                    return Err(KdfError::InvalidParameters(format!(
                        "pbkdf2 iterations above {}",
                        MAX_PBKDF2_ITERATIONS
                    )));
                }
            }
            KdfId::Argon2id => {
                let (memory, lanes) = self.argon2_costs()?;
                if self.iterations > MAX_ARGON2_ITERATIONS {
                    return Err(KdfError::InvalidParameters(format!(
                        "argon2 time cost above {}",
                        MAX_ARGON2_ITERATIONS
                    )));
                }
                // argon2 needs at least 8 KiB per lane
                let below_minimum = lanes
                    .checked_mul(8)
                    .map_or(true, |min_memory| memory < min_memory);
                if lanes == 0
                    || lanes > Params::MAX_P_COST
                    || below_minimum
                    || memory > MAX_ARGON2_MEMORY_KIB
                {
                    return Err(KdfError::InvalidParameters(
                        "argon2 memory/parallelism out of range".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn argon2_costs(&self) -> Result<(u32, u32), KdfError> {
        match (self.memory_kib, self.parallelism) {
            (Some(m), Some(p)) => Ok((m, p)),
            _ => Err(KdfError::InvalidParameters(
                "argon2 requires memory_kib and parallelism".into(),
            )),
        }
    }
}

/// Derive an encryption key from a password
///
/// Deterministic in `(password, salt, params)`. Deliberately slow.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KdfError> {
    params.validate()?;

    let started = Instant::now();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);

    match params.kdf {
        KdfId::Pbkdf2Sha256 => {
            pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key[..]);
        }
        KdfId::Argon2id => {
            let (memory, lanes) = params.argon2_costs()?;
            let argon2_params = Params::new(memory, params.iterations, lanes, Some(KEY_LEN))
                .map_err(|e| KdfError::InvalidParameters(e.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
                .hash_password_into(password.as_bytes(), salt, &mut key[..])
                .map_err(|e| KdfError::InvalidParameters(e.to_string()))?;
        }
    }

    log::debug!(
        "{} key derivation ({} iterations) took {:?}",
        params.kdf,
        params.iterations,
        started.elapsed()
    );
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [7u8; SALT_LEN];

    #[test]
    fn test_derive_key_deterministic() {
        let params = KdfParams::pbkdf2(1_000);
        let k1 = derive_key("hunter22", &SALT, &params).unwrap();
        let k2 = derive_key("hunter22", &SALT, &params).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_every_input_changes_key() {
        let params = KdfParams::pbkdf2(1_000);
        let base = derive_key("hunter22", &SALT, &params).unwrap();

        let other_pw = derive_key("hunter23", &SALT, &params).unwrap();
        let other_salt = derive_key("hunter22", &[8u8; SALT_LEN], &params).unwrap();
        let other_iter = derive_key("hunter22", &SALT, &KdfParams::pbkdf2(1_001)).unwrap();

        assert_ne!(*base, *other_pw);
        assert_ne!(*base, *other_salt);
        assert_ne!(*base, *other_iter);
    }

    /// RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector (P="passwd", S="salt", c=1),
    /// first 32 bytes
    #[test]
    fn test_pbkdf2_primitive_vector() {
        let mut out = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_argon2id_derives() {
        // Small memory cost keeps the test fast
        let params = KdfParams::argon2id(1, 64, 1);
        let k1 = derive_key("pw", &SALT, &params).unwrap();
        let k2 = derive_key("pw", &SALT, &params).unwrap();
        assert_eq!(*k1, *k2);
        assert_ne!(*k1, *derive_key("pw", &SALT, &KdfParams::pbkdf2(1)).unwrap());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = derive_key("pw", &SALT, &KdfParams::pbkdf2(0));
        assert!(matches!(result, Err(KdfError::InvalidParameters(_))));
    }

    #[test]
    fn test_absurd_parameters_rejected() {
        assert!(KdfParams::pbkdf2(MAX_PBKDF2_ITERATIONS + 1).validate().is_err());
        assert!(KdfParams::argon2id(3, 4, 1).validate().is_err());
        assert!(KdfParams::argon2id(65, 65536, 4).validate().is_err());
        assert!(KdfParams::argon2id(3, MAX_ARGON2_MEMORY_KIB + 1, 4)
            .validate()
            .is_err());
        assert!(KdfParams::argon2id(3, MAX_ARGON2_MEMORY_KIB, 4)
            .validate()
            .is_ok());

        let missing_memory = KdfParams {
            kdf: KdfId::Argon2id,
            iterations: 3,
            memory_kib: None,
            parallelism: Some(4),
        };
        assert!(missing_memory.validate().is_err());
    }

    #[test]
    fn test_huge_parallelism_rejected_without_overflow() {
        for lanes in [1_000_000_000, u32::MAX / 8 + 1, u32::MAX] {
            let err = KdfParams::argon2id(3, 65536, lanes).validate().unwrap_err();
            assert!(matches!(err, KdfError::InvalidParameters(_)));
        }
        assert!(KdfParams::argon2id(3, 65536, 0).validate().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(KdfParams::default(), KdfParams::pbkdf2(200_000));
        assert!(KdfParams::default().validate().is_ok());
        assert!(KdfParams::for_kdf(KdfId::Argon2id, None).validate().is_ok());
        assert_eq!(KdfParams::for_kdf(KdfId::Pbkdf2Sha256, Some(5)).iterations, 5);
    }

    #[test]
    fn test_kdf_id_names() {
        assert_eq!(KdfId::Pbkdf2Sha256.to_string(), "pbkdf2_sha256");
        assert_eq!("argon2id".parse::<KdfId>().unwrap(), KdfId::Argon2id);
        assert!("scrypt".parse::<KdfId>().is_err());
        assert_eq!(
            serde_json::to_string(&KdfId::Pbkdf2Sha256).unwrap(),
            "\"pbkdf2_sha256\""
        );
    }
}
