//! Configuration module for relic.
//!
//! Handles the config file, environment variables, and settings.

mod settings;

pub use settings::{
    expand_env_vars, AnalysisSettings, DetectionSettings, DomainSettings, InferenceSettings,
    Settings, SettingsError, StorageSettings, CONFIG_ENV_VAR,
};
