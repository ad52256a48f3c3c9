// TOML config adapter - Configuration loading using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;

use crate::adapters::exec_libav::EncodingSettings;
use crate::adapters::metadata_hachoir;
use crate::domain::model::*;
use crate::domain::rules::DEFAULT_VIDEO_EXTENSIONS;
use crate::error::{SplitError, SplitResult};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "vidsplit.toml";

/// Highest CRF accepted by x264
const MAX_CRF: u8 = 51;

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub split: SplitSettings,
    pub metadata: MetadataSettings,
    pub encoding: EncodingSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitSettings {
    pub mode: SplitMode,
    pub overwrite: OverwritePolicy,
    pub create_output_dir: bool,
    /// A final segment no longer than this is not written
    pub min_tail_seconds: f64,
    pub extensions: Vec<String>,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            mode: SplitMode::Reencode,
            overwrite: OverwritePolicy::Always,
            create_output_dir: true,
            min_tail_seconds: 0.0,
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataSettings {
    pub source: CreationTimeSource,
    /// Extractor executable for the `hachoir` source
    pub command: PathBuf,
    pub label: String,
    pub format: String,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            source: CreationTimeSource::Hachoir,
            command: PathBuf::from(metadata_hachoir::DEFAULT_COMMAND),
            label: metadata_hachoir::DEFAULT_LABEL.to_string(),
            format: metadata_hachoir::DEFAULT_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Reject values that would only fail later, mid-batch
    pub fn validate(&self) -> SplitResult<()> {
        let split = &self.split;
        if !split.min_tail_seconds.is_finite() || split.min_tail_seconds < 0.0 {
            return Err(SplitError::config(format!(
                "split.min_tail_seconds must be a non-negative number, got {}",
                split.min_tail_seconds
            )));
        }
        if split
            .extensions
            .iter()
            .all(|ext| ext.trim().trim_start_matches('.').is_empty())
        {
            return Err(SplitError::config("split.extensions must not be empty"));
        }

        if self.metadata.label.is_empty() {
            return Err(SplitError::config("metadata.label must not be empty"));
        }
        if self.metadata.command.as_os_str().is_empty() {
            return Err(SplitError::config("metadata.command must not be empty"));
        }

        if self.encoding.crf > MAX_CRF {
            return Err(SplitError::config(format!(
                "encoding.crf cannot exceed {}, got {}",
                MAX_CRF, self.encoding.crf
            )));
        }
        if self.encoding.audio_bitrate == 0 {
            return Err(SplitError::config("encoding.audio_bitrate must be positive"));
        }
        if self.encoding.video_encoder.trim().is_empty() {
            return Err(SplitError::config("encoding.video_encoder must not be empty"));
        }

        parse_level(&self.logging.level)?;
        Ok(())
    }
}

/// Parse a log level name (`trace`, `debug`, `info`, `warn`, `error`, `off`)
pub fn parse_level(level: &str) -> SplitResult<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| SplitError::config(format!("Invalid log level: {}", level)))
}

/// TOML configuration loader
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> SplitResult<AppConfig> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| SplitError::config(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist
    pub fn load_file(path: &Path) -> SplitResult<AppConfig> {
        if !path.is_file() {
            return Err(SplitError::config(format!(
                "Config file does not exist: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SplitError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, else `vidsplit.toml` from the working
    /// directory if present, else the defaults
    pub fn load(explicit: Option<&Path>) -> SplitResult<AppConfig> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load_file(fallback);
        }

        debug!("No config file found, using defaults");
        Ok(AppConfig::default())
    }

    /// Serialize configuration back to TOML
    pub fn to_toml(config: &AppConfig) -> SplitResult<String> {
        toml::to_string_pretty(config)
            .map_err(|e| SplitError::config(format!("Failed to serialize config: {}", e)))
    }
}
