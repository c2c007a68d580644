//! TOML-based configuration for relic.
//!
//! Supports a config file (relic.toml) with environment variable expansion
//! in paths.
//!
//! Example configuration:
//! ```toml
//! [storage]
//! path = "${HOME}/.relic/metadata.db"
//!
//! [detection]
//! legacy_charset = "euc-kr"
//! min_confidence = 80
//!
//! [analysis]
//! workers = 4
//! sample_limit = 5000
//!
//! [analysis.domain]
//! enum_max_distinct = 32
//! enum_max_ratio = 0.5
//!
//! [inference]
//! known_tables = ["items", "npcs", "monsters"]
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::MetadataStore;
use crate::encoding::fallback::DEFAULT_MIN_CONFIDENCE;
use crate::encoding::LegacyCharset;
use crate::inference::thresholds::domain;
use crate::inference::ValueDomainAnalyzer;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "RELIC_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported legacy charset: {0}")]
    UnsupportedCharset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Metadata store location.
    pub storage: StorageSettings,

    /// Encoding detection tuning.
    pub detection: DetectionSettings,

    /// Corpus analysis.
    pub analysis: AnalysisSettings,

    /// Column inference.
    pub inference: InferenceSettings,
}

/// Metadata store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path to the SQLite store (supports ${ENV_VAR} expansion).
    /// Defaults to `~/.relic/metadata.db`.
    pub path: Option<String>,
}

/// Encoding detection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Legacy double-byte charset to test for (euc-kr, gbk, shift_jis, big5).
    pub legacy_charset: String,

    /// Minimum confidence (0 to 100) for trusting a raw detector guess.
    pub min_confidence: u8,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            legacy_charset: LegacyCharset::default().label().to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Corpus analysis settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Worker threads. 0 means one per available CPU.
    pub workers: usize,

    /// Maximum values sampled per column.
    pub sample_limit: usize,

    /// Value-domain thresholds.
    pub domain: DomainSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            sample_limit: 5000,
            domain: DomainSettings::default(),
        }
    }
}

/// Value-domain classification thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainSettings {
    /// Maximum distinct values for an enumerated column.
    pub enum_max_distinct: usize,

    /// Maximum distinct/sample ratio (0.0 to 1.0) for an enumerated column.
    pub enum_max_ratio: f64,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            enum_max_distinct: domain::ENUM_MAX_DISTINCT,
            enum_max_ratio: domain::ENUM_MAX_RATIO,
        }
    }
}

/// Column inference settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Table names treated as exact reference targets, in addition to the
    /// tables found in the analyzed corpus.
    pub known_tables: Vec<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RELIC_CONFIG`
    /// 2. `./relic.toml`
    /// 3. `~/.config/relic/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("relic.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relic").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.legacy_charset()?;

        if self.detection.min_confidence > 100 {
            return Err(SettingsError::InvalidConfig(format!(
                "detection.min_confidence must be 0-100, got {}",
                self.detection.min_confidence
            )));
        }

        let ratio = self.analysis.domain.enum_max_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SettingsError::InvalidConfig(format!(
                "analysis.domain.enum_max_ratio must be 0.0-1.0, got {ratio}"
            )));
        }

        if self.analysis.sample_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "analysis.sample_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured legacy charset.
    pub fn legacy_charset(&self) -> Result<LegacyCharset, SettingsError> {
        let name = &self.detection.legacy_charset;
        name.parse::<LegacyCharset>()
            .map_err(|_| SettingsError::UnsupportedCharset(name.clone()))
    }

    /// Resolved store path, with environment variables expanded.
    pub fn store_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.storage.path {
            Some(path) => Ok(PathBuf::from(expand_env_vars(path)?)),
            None => MetadataStore::default_path().map_err(|_| {
                SettingsError::InvalidConfig(
                    "no home directory; set storage.path explicitly".to_string(),
                )
            }),
        }
    }

    /// Worker thread count, resolving 0 to the available parallelism.
    pub fn worker_count(&self) -> usize {
        if self.analysis.workers > 0 {
            return self.analysis.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Value-domain analyzer configured from `[analysis.domain]`.
    pub fn domain_analyzer(&self) -> ValueDomainAnalyzer {
        ValueDomainAnalyzer::new(
            self.analysis.domain.enum_max_distinct,
            self.analysis.domain.enum_max_ratio,
        )
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        // Check for ${VAR} or $VAR
        let var_name = if chars.next_if_eq(&'{').is_some() {
            let mut name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
            name
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
