//! CLI configuration, parsed from an optional TOML file.
//!
//! Priority: command-line flags > config file > defaults.

use anyhow::{Context, Result};
use localwallet_core::kdf::{KdfId, KdfParams};
use localwallet_core::vault::DEFAULT_VAULT_FILENAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILENAME: &str = "localwallet.toml";

/// Below this PBKDF2 count `validate` still passes but warns
const MIN_RECOMMENDED_PBKDF2_ITERATIONS: u32 = 100_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalWalletConfig {
    #[serde(default)]
    pub vault: VaultSection,

    #[serde(default)]
    pub log: LogSection,
}

/// Vault location and key derivation for new writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Vault file path
    #[serde(default = "default_vault_path")]
    pub path: PathBuf,

    /// KDF used when the vault is written
    #[serde(default)]
    pub kdf: KdfId,

    /// Work factor; the KDF's default when omitted
    #[serde(default)]
    pub iterations: Option<u32>,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
            kdf: KdfId::default(),
            iterations: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// env_logger filter (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_vault_path() -> PathBuf {
    PathBuf::from(DEFAULT_VAULT_FILENAME)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl LocalWalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: LocalWalletConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Resolve the config source
    ///
    /// An explicit path must exist. Otherwise `localwallet.toml` in `dir` is
    /// used when present, and the defaults when not.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Self::from_file(&candidate);
        }
        Ok(Self::default())
    }

    /// Apply `--vault`
    pub fn apply_overrides(&mut self, vault_path: Option<PathBuf>) {
        if let Some(path) = vault_path {
            self.vault.path = path;
        }
    }

    /// Parameters for every vault write
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::for_kdf(self.vault.kdf, self.vault.iterations)
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.vault.path.as_os_str().is_empty(),
            "vault.path must not be empty"
        );
        anyhow::ensure!(
            self.vault.iterations != Some(0),
            "vault.iterations must be >= 1"
        );
        self.kdf_params()
            .validate()
            .context("vault.kdf parameters are out of range")?;
        Ok(())
    }

    /// Settings that pass `validate` but weaken the vault
    pub fn warnings(&self) -> Vec<String> {
        let params = self.kdf_params();
        let mut warnings = Vec::new();
        if params.kdf == KdfId::Pbkdf2Sha256
            && params.iterations < MIN_RECOMMENDED_PBKDF2_ITERATIONS
        {
            warnings.push(format!(
                "vault.iterations = {} is below the recommended {} for pbkdf2_sha256",
                params.iterations, MIN_RECOMMENDED_PBKDF2_ITERATIONS
            ));
        }
        warnings
    }
}

// ============================================================================
// Tests
// ============================================================================
