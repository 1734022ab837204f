/// Configuration system for ifcwise
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::chunker::{ChunkStrategy, DEFAULT_MAX_ROWS, DEFAULT_MAX_UNITS, DEFAULT_UNIT_DIVISOR};
use crate::error::{ConfigError, IfcWiseError, ValidationError};
use crate::extractor::ExtractOptions;
use crate::transmit::{DEFAULT_MESSAGE_PREFIX, TransmitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Which elements are read and which sources contribute columns
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Chunk budget
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Sending chunks
    #[serde(default)]
    pub transmission: TransmissionConfig,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Element category to read; `IfcProduct` selects every product type
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_true")]
    pub include_placement: bool,

    #[serde(default = "default_true")]
    pub include_property_sets: bool,

    #[serde(default = "default_true")]
    pub include_quantities: bool,

    /// Extract rows on a thread pool
    #[serde(default)]
    pub parallel: bool,
}

/// Chunk budget policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkPolicy {
    #[default]
    RowCount,
    SizeEstimate,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub chunk_policy: ChunkPolicy,

    /// Rows per chunk under `row_count`
    #[serde(default = "default_max_rows")]
    pub max_rows_per_chunk: usize,

    /// Estimated units per chunk under `size_estimate`
    #[serde(default = "default_max_units")]
    pub max_size_units_per_chunk: usize,

    /// Payload bytes per estimated unit
    #[serde(default = "default_unit_divisor")]
    pub size_unit_divisor: usize,
}

/// Transmission configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransmissionConfig {
    /// Pause between two sends in milliseconds
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// First words of every chunk message
    #[serde(default = "default_message_prefix")]
    pub message_prefix: String,

    /// Root directory for the directory transmitter
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

// Default value functions
fn default_category() -> String {
    "IfcProduct".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_max_units() -> usize {
    DEFAULT_MAX_UNITS
}

fn default_unit_divisor() -> usize {
    DEFAULT_UNIT_DIVISOR
}

fn default_send_delay_ms() -> u64 {
    1500
}

fn default_message_prefix() -> String {
    DEFAULT_MESSAGE_PREFIX.to_string()
}

fn default_outbox_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_outbox_dir()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            include_placement: true,
            include_property_sets: true,
            include_quantities: true,
            parallel: false,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_policy: ChunkPolicy::default(),
            max_rows_per_chunk: default_max_rows(),
            max_size_units_per_chunk: default_max_units(),
            size_unit_divisor: default_unit_divisor(),
        }
    }
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            send_delay_ms: default_send_delay_ms(),
            message_prefix: default_message_prefix(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

impl FromStr for ChunkPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "row_count" => Ok(ChunkPolicy::RowCount),
            "size_estimate" => Ok(ChunkPolicy::SizeEstimate),
            other => Err(ConfigError::InvalidValue {
                key: "chunking.chunk_policy".to_string(),
                reason: format!("must be 'row_count' or 'size_estimate', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ChunkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPolicy::RowCount => f.write_str("row_count"),
            ChunkPolicy::SizeEstimate => f.write_str("size_estimate"),
        }
    }
}

impl ExtractionConfig {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            placement: self.include_placement,
            property_sets: self.include_property_sets,
            quantities: self.include_quantities,
        }
    }
}

impl ChunkingConfig {
    pub fn strategy(&self) -> ChunkStrategy {
        match self.chunk_policy {
            ChunkPolicy::RowCount => ChunkStrategy::RowCount(self.max_rows_per_chunk),
            ChunkPolicy::SizeEstimate => ChunkStrategy::SizeEstimate {
                max_units: self.max_size_units_per_chunk,
                unit_divisor: self.size_unit_divisor,
            },
        }
    }
}

impl TransmissionConfig {
    pub fn options(&self, start_at: usize) -> TransmitOptions {
        TransmitOptions {
            start_at,
            delay: Duration::from_millis(self.send_delay_ms),
            message_prefix: self.message_prefix.clone(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, IfcWiseError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, IfcWiseError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), IfcWiseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), IfcWiseError> {
        let positive = [
            ("chunking.max_rows_per_chunk", self.chunking.max_rows_per_chunk),
            (
                "chunking.max_size_units_per_chunk",
                self.chunking.max_size_units_per_chunk,
            ),
            ("chunking.size_unit_divisor", self.chunking.size_unit_divisor),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ValidationError::ConstraintViolation {
                    field: key.to_string(),
                    constraint: "greater than 0".to_string(),
                    actual: value.to_string(),
                }
                .into());
            }
        }

        if self.extraction.category.trim().is_empty() {
            return Err(ValidationError::Empty("extraction.category".to_string()).into());
        }

        Ok(())
    }

    /// Apply environment variable overrides. Values that do not parse are
    /// ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(policy) = std::env::var("IFCWISE_CHUNK_POLICY")
            && let Ok(policy) = policy.parse()
        {
            self.chunking.chunk_policy = policy;
        }

        if let Ok(rows) = std::env::var("IFCWISE_MAX_ROWS")
            && let Ok(rows) = rows.parse()
        {
            self.chunking.max_rows_per_chunk = rows;
        }

        if let Ok(units) = std::env::var("IFCWISE_MAX_UNITS")
            && let Ok(units) = units.parse()
        {
            self.chunking.max_size_units_per_chunk = units;
        }

        if let Ok(divisor) = std::env::var("IFCWISE_UNIT_DIVISOR")
            && let Ok(divisor) = divisor.parse()
        {
            self.chunking.size_unit_divisor = divisor;
        }

        if let Ok(category) = std::env::var("IFCWISE_CATEGORY") {
            self.extraction.category = category;
        }

        if let Ok(delay) = std::env::var("IFCWISE_SEND_DELAY_MS")
            && let Ok(delay) = delay.parse()
        {
            self.transmission.send_delay_ms = delay;
        }

        if let Ok(parallel) = std::env::var("IFCWISE_PARALLEL")
            && let Ok(parallel) = parallel.parse()
        {
            self.extraction.parallel = parallel;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, IfcWiseError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
