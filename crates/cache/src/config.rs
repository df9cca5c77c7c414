//! Configuration for the warming engine, the size cache and the service layer
use prewarm_core::{
    Error, Result, COMPLETION_GRACE, DEFAULT_CHUNK_SIZE, DEFAULT_THREADS, SIZE_CACHE_TTL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-file warming parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmerConfig {
    /// Read buffer size in bytes; also the minimum per-worker share of a file
    pub chunk_size: usize,
    /// Maximum number of concurrent segment workers per file
    pub threads: usize,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: DEFAULT_THREADS,
        }
    }
}

impl WarmerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::configuration("chunk size must be greater than zero"));
        }
        if self.threads == 0 {
            return Err(Error::configuration("thread count must be greater than zero"));
        }
        Ok(())
    }
}

/// Allocated-size memo settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizerConfig {
    /// Age after which a memoized size is recomputed
    pub ttl: Duration,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            ttl: SIZE_CACHE_TTL,
        }
    }
}

/// Job registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub warmer: WarmerConfig,
    /// How long a completed job stays queryable
    #[serde(default = "default_grace")]
    pub completion_grace: Duration,
}

fn default_grace() -> Duration {
    COMPLETION_GRACE
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::with_warmer(WarmerConfig::default())
    }
}

impl RegistryConfig {
    pub fn with_warmer(warmer: WarmerConfig) -> Self {
        Self {
            warmer,
            completion_grace: COMPLETION_GRACE,
        }
    }
}

/// Complete configuration of the precache service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root of the slow mount whose files are warmed
    pub mount: PathBuf,
    /// Local directory backing the external cache, used for size reporting
    pub cache_dir: PathBuf,
    pub registry: RegistryConfig,
    pub sizer: SizerConfig,
}

impl ServiceConfig {
    /// Create a configuration with default tuning for the given directories
    pub fn new(mount: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
            cache_dir: cache_dir.into(),
            registry: RegistryConfig::with_warmer(WarmerConfig::default()),
            sizer: SizerConfig::default(),
        }
    }

    /// Override the warming parameters
    #[must_use]
    pub fn with_warmer(mut self, warmer: WarmerConfig) -> Self {
        self.registry.warmer = warmer;
        self
    }

    /// Check that both directories exist and the tuning is usable
    pub fn validate(&self) -> Result<()> {
        require_directory(&self.mount, "mount")?;
        require_directory(&self.cache_dir, "cache")?;
        self.registry.warmer.validate()
    }
}

fn require_directory(path: &Path, label: &str) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::configuration(format!(
            "{label} path '{}' is not a directory",
            path.display()
        ))),
        Err(e) => Err(Error::configuration(format!(
            "{label} path '{}' must exist: {e}",
            path.display()
        ))),
    }
}
