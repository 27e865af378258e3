//! # Service Configuration
//!
//! Defaults, then an optional YAML file, then `EDL_*` environment
//! overrides. Validation runs last.
//!
//! ```yaml
//! difficulty: 2
//! max_difficulty: 8
//! seal_max_iterations: 100000000
//! seal_timeout_ms: 60000
//! ```

use std::path::Path;
use std::time::Duration;

use edl_ledger::{SealBudget, MAX_DIFFICULTY};
use serde::{Deserialize, Serialize};

pub const ENV_DIFFICULTY: &str = "EDL_DIFFICULTY";
pub const ENV_SEAL_MAX_ITERATIONS: &str = "EDL_SEAL_MAX_ITERATIONS";
pub const ENV_SEAL_TIMEOUT_MS: &str = "EDL_SEAL_TIMEOUT_MS";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("difficulty {difficulty} exceeds max_difficulty {max}")]
    DifficultyTooHigh { difficulty: u32, max: u32 },

    #[error("max_difficulty {max_difficulty} exceeds the hash length limit {limit}")]
    MaxDifficultyTooHigh { max_difficulty: u32, limit: u32 },

    #[error("seal_max_iterations must be positive")]
    ZeroIterations,
}

/// Runtime configuration for a `CredentialService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Leading zero hex characters required of every new block hash.
    pub difficulty: u32,
    /// Upper bound accepted for `difficulty`.
    pub max_difficulty: u32,
    /// Nonce attempts allowed per block.
    pub seal_max_iterations: u64,
    /// Wall-clock limit per block in milliseconds; 0 disables it.
    pub seal_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            max_difficulty: 8,
            seal_max_iterations: SealBudget::DEFAULT_MAX_ITERATIONS,
            seal_timeout_ms: SealBudget::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ServiceConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Apply `EDL_DIFFICULTY`, `EDL_SEAL_MAX_ITERATIONS` and
    /// `EDL_SEAL_TIMEOUT_MS` when set.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = parse_var(&lookup, ENV_DIFFICULTY)? {
            self.difficulty = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SEAL_MAX_ITERATIONS)? {
            self.seal_max_iterations = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SEAL_TIMEOUT_MS)? {
            self.seal_timeout_ms = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::MaxDifficultyTooHigh {
                max_difficulty: self.max_difficulty,
                limit: MAX_DIFFICULTY,
            });
        }
        if self.difficulty > self.max_difficulty {
            return Err(ConfigError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max: self.max_difficulty,
            });
        }
        if self.seal_max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }

    pub fn seal_budget(&self) -> SealBudget {
        let timeout = (self.seal_timeout_ms > 0).then(|| Duration::from_millis(self.seal_timeout_ms));
        SealBudget::new(self.seal_max_iterations, timeout)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
