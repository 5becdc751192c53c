//! Configuration file support
//!
//! Settings are read from TOML and merged with command-line overrides,
//! the command line taking precedence.
//!
//! Lookup order for [`Config::load`]:
//!
//! 1. `./photo-splitter.toml`
//! 2. `<config dir>/photo-splitter/config.toml`
//!
//! ```toml
//! [detection]
//! tolerance_percentage = 0.2
//! min_region_width = 50
//! min_region_height = 50
//! dilation_margin = 5
//! search_margin_factor = 0.002
//! labeling = "approximate"     # or "union-find"
//! merge = "first-match"        # or "transitive"
//!
//! [output]
//! format = "jpeg"
//! jpeg_quality = 85
//! save_debug = false
//!
//! [processing]
//! threads = 4
//! skip_existing = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::segment::{DetectionOptions, LabelingStrategy, MergeStrategy};

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "photo-splitter.toml";

/// Directory under the user config dir
const USER_CONFIG_DIR: &str = "photo-splitter";

/// Default JPEG quality for exported regions
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Output format
// ============================================================

/// Encoding of exported regions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

// ============================================================
// File config
// ============================================================

/// Output section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    /// Write `<stem>_regions.png` with detected regions outlined
    pub save_debug: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            save_debug: false,
        }
    }
}

/// Processing section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads (None = number of CPUs)
    pub threads: Option<usize>,
    /// Skip inputs whose first output already exists
    pub skip_existing: bool,
}

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionOptions,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load from the first config file found, or defaults when none exists
    pub fn load() -> Result<Self> {
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate config file locations, in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(USER_CONFIG_DIR).join("config.toml"));
        }
        paths
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !(0.0..=1.0).contains(&d.tolerance_percentage) {
            return Err(ConfigError::Invalid(format!(
                "tolerance_percentage must be within 0.0-1.0, got {}",
                d.tolerance_percentage
            )));
        }
        if !d.search_margin_factor.is_finite() || d.search_margin_factor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "search_margin_factor must be a non-negative number, got {}",
                d.search_margin_factor
            )));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.output.jpeg_quality
            )));
        }
        if self.processing.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Apply CLI overrides on top of the file values
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> SplitConfig {
        let mut detection = self.detection.clone();
        if let Some(t) = cli.tolerance_percentage {
            detection.tolerance_percentage = t.clamp(0.0, 1.0);
        }
        if let Some(w) = cli.min_region_width {
            detection.min_region_width = w;
        }
        if let Some(h) = cli.min_region_height {
            detection.min_region_height = h;
        }
        if let Some(m) = cli.dilation_margin {
            detection.dilation_margin = m;
        }
        if let Some(f) = cli.search_margin_factor {
            detection.search_margin_factor = f.max(0.0);
        }
        if let Some(l) = cli.labeling {
            detection.labeling = l;
        }
        if let Some(m) = cli.merge {
            detection.merge = m;
        }

        SplitConfig {
            detection,
            format: cli.format.unwrap_or(self.output.format),
            jpeg_quality: cli
                .jpeg_quality
                .unwrap_or(self.output.jpeg_quality)
                .clamp(1, 100),
            threads: cli.threads.or(self.processing.threads),
            save_debug: cli.save_debug.unwrap_or(self.output.save_debug),
            skip_existing: cli.skip_existing.unwrap_or(self.processing.skip_existing),
        }
    }
}

/// Values explicitly given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub tolerance_percentage: Option<f64>,
    pub min_region_width: Option<u32>,
    pub min_region_height: Option<u32>,
    pub dilation_margin: Option<u32>,
    pub search_margin_factor: Option<f64>,
    pub labeling: Option<LabelingStrategy>,
    pub merge: Option<MergeStrategy>,
    pub format: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    pub threads: Option<usize>,
    pub save_debug: Option<bool>,
    pub skip_existing: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================
// Effective config
// ============================================================

/// Effective settings for a split run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitConfig {
    pub detection: DetectionOptions,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    pub threads: Option<usize>,
    pub save_debug: bool,
    pub skip_existing: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Config::default().merge_with_cli(&CliOverrides::default())
    }
}

impl SplitConfig {
    /// Worker thread count, defaulting to the number of CPUs
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Serialize settings as JSON (for logs and dry runs)
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
