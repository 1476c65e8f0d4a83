use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{NetworkError, Result};
use crate::pipeline::processing::similarity::EdgePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
    pub similarity: SimilarityConfig,
    pub community: CommunityConfig,
    pub aggregate: AggregateConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub data_dir: PathBuf,
    /// Explicit detail files relative to `data_dir`; empty means every `date-details-*.csv`
    pub detail_files: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            detail_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// Recompute the fact table and overwrite the cache even if it is valid
    pub rebuild: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(constants::DEFAULT_CACHE_FILE),
            rebuild: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub threshold: f64,
    /// Whether a score equal to the threshold is kept as an edge
    pub inclusive: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        let policy = EdgePolicy::default();
        Self {
            threshold: policy.threshold,
            inclusive: policy.inclusive,
        }
    }
}

impl SimilarityConfig {
    pub fn edge_policy(&self) -> EdgePolicy {
        EdgePolicy {
            threshold: self.threshold,
            inclusive: self.inclusive,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub seed: u64,
    pub resolution: f64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            resolution: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Fail instead of warn when rows of one venue-year disagree on venue attributes
    pub strict_venue_attributes: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    pub significance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            significance: 0.01,
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file at the default location yields defaults;
    /// a missing file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(constants::DEFAULT_CONFIG_FILE), false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(NetworkError::Config(format!(
                    "Config file '{}' does not exist",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            NetworkError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CLUB_NETWORK_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var(constants::ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.input.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var(constants::ENV_OUTPUT_DIR) {
            if !dir.trim().is_empty() {
                self.output.dir = PathBuf::from(dir);
            }
        }
        if let Ok(seed) = std::env::var(constants::ENV_SEED) {
            self.community.seed = seed.trim().parse().map_err(|_| {
                NetworkError::Config(format!(
                    "{} must be an unsigned integer, got '{}'",
                    constants::ENV_SEED,
                    seed
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity.threshold) {
            return Err(NetworkError::Config(format!(
                "similarity.threshold must be within [0, 1], got {}",
                self.similarity.threshold
            )));
        }
        if self.community.resolution <= 0.0 {
            return Err(NetworkError::Config(format!(
                "community.resolution must be positive, got {}",
                self.community.resolution
            )));
        }
        if !(0.0..=1.0).contains(&self.analysis.significance) {
            return Err(NetworkError::Config(format!(
                "analysis.significance must be within [0, 1], got {}",
                self.analysis.significance
            )));
        }
        Ok(())
    }
}
