//! Configuration handling for the GeneCmp CLI
//!
//! Supports loading configuration from genecmp.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use clap::ValueEnum;
use genecmp_core::{CompareOptions, UNKNOWN_NUCLEOTIDE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "genecmp.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Worker threads for the comparison pool
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Print every region result, not only per-gene summaries
    #[serde(default)]
    pub verbose_intermediate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Keep gapped alignments on edit-distance results
    #[serde(default)]
    pub traceback: bool,

    /// Split regions longer than this; 0 keeps whole regions
    #[serde(default)]
    pub max_region_len: usize,

    /// Marker used for positions no read covers (fixed)
    #[serde(default = "default_unknown")]
    pub unknown_nucleotide: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

// Default value functions
fn default_threads() -> usize { num_cpus::get() }
fn default_unknown() -> String { (UNKNOWN_NUCLEOTIDE as char).to_string() }
fn default_format() -> OutputFormat { OutputFormat::Text }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            verbose_intermediate: false,
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            traceback: false,
            max_region_len: 0,
            unknown_nucleotide: default_unknown(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }

    fn validate(&self) -> Result<()> {
        let unknown = (UNKNOWN_NUCLEOTIDE as char).to_string();
        if !self.compare.unknown_nucleotide.eq_ignore_ascii_case(&unknown) {
            return Err(CliError::config(format!(
                "unknown_nucleotide must be \"{}\", got \"{}\"",
                unknown, self.compare.unknown_nucleotide
            ))
            .into());
        }
        Ok(())
    }

    /// Pipeline options from the file; command-line flags are applied on top.
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            threads: Some(self.general.threads),
            traceback: self.compare.traceback,
            max_region_len: Some(self.compare.max_region_len).filter(|&len| len > 0),
            verbose_intermediate: self.general.verbose_intermediate,
        }
    }
}
