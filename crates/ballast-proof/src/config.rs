use std::path::{Path, PathBuf};

use ballast_types::MciBound;
use serde::{Deserialize, Serialize};

/// Where the witnesses' definition chashes come from before the walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Fresh client: every witness starts at its original definition, the
    /// one whose chash is the address itself.
    #[default]
    Bootstrap,
    /// Client with stable history: ask the ledger store for each witness's
    /// current definition, and skip definition-change units the store
    /// already holds as stable.
    Ledger,
}

/// Configuration for proof verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// How tracked definition chashes are seeded.
    pub seed: SeedMode,
    /// Whether `seen` / `in data feed` definitions may consult the store.
    /// Light verification normally runs without references.
    pub allow_references: bool,
    /// Upper bound for stable ledger lookups in [`SeedMode::Ledger`].
    /// `Unbounded` is an explicit bootstrap relaxation.
    pub max_stable_mci: MciBound,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            seed: SeedMode::Bootstrap,
            allow_references: false,
            max_stable_mci: MciBound::Unbounded,
        }
    }
}

impl VerifierConfig {
    /// Configuration for a client that trusts its store up to `max_stable_mci`.
    pub fn ledger(max_stable_mci: u64) -> Self {
        Self {
            seed: SeedMode::Ledger,
            max_stable_mci: MciBound::AtMost(max_stable_mci),
            ..Default::default()
        }
    }

    /// Parse from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Render as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Errors loading verifier configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config: {0}")]
    Render(#[from] toml::ser::Error),
}
