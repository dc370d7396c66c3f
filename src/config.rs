use crate::error::{Result, SweepError};
use crate::filter::UnknownLanguagePolicy;
use crate::options::{OptionSet, PipelineOptions};
use crate::pipeline::Dispatch;
use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Overrides of the built-in option defaults. Together they form the
    /// default option set every comparison run is measured against.
    pub options: OptionSet,
    pub engine: EngineConfig,
    pub filter: FilterConfig,
    pub sweep: SweepConfig,
}

/// Transcription engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to a ggml Whisper model file.
    pub model_path: Option<PathBuf>,
    /// Inference threads; `None` lets the engine decide.
    pub threads: Option<usize>,
}

/// Hallucination filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub unknown_language: UnknownLanguagePolicy,
    /// Start from the built-in language table.
    pub builtin: bool,
    /// Per-language additions, keyed by language code.
    pub languages: BTreeMap<String, LanguageRule>,
}

/// One language entry of the `[filter.languages]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LanguageRule {
    pub allow: Option<String>,
    pub deny: Vec<String>,
}

/// Sweep layout and supervision configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub output_dir: PathBuf,
    pub audio_extension: String,
    /// Per-file deadline in humantime format, e.g. "90s" or "10m".
    pub timeout: Option<String>,
    pub dispatch: Dispatch,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            unknown_language: UnknownLanguagePolicy::Reject,
            builtin: true,
            languages: BTreeMap::new(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            audio_extension: defaults::AUDIO_EXTENSION.to_string(),
            timeout: None,
            dispatch: Dispatch::default(),
        }
    }
}

impl SweepConfig {
    /// Parsed per-file deadline.
    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw).map_err(|e| SweepError::ConfigInvalidValue {
                    key: "sweep.timeout".to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SweepError::ConfigFileNotFound {
                path: path.display().to_string(),
            },
            _ => SweepError::Io(e),
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SweepError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ASRSWEEP_MODEL → engine.model_path
    /// - ASRSWEEP_LANGUAGE → options.language
    /// - ASRSWEEP_OUTPUT_DIR → sweep.output_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("ASRSWEEP_MODEL")
            && !model.is_empty()
        {
            self.engine.model_path = Some(PathBuf::from(model));
        }

        if let Ok(language) = std::env::var("ASRSWEEP_LANGUAGE")
            && !language.is_empty()
        {
            self.options.insert("language", language);
        }

        if let Ok(dir) = std::env::var("ASRSWEEP_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.sweep.output_dir = PathBuf::from(dir);
        }

        self
    }

    /// The process-wide default option set: built-in defaults with the
    /// `[options]` table applied on top, validated.
    pub fn default_options(&self) -> Result<OptionSet> {
        let mut set = PipelineOptions::default().to_option_set()?;
        set.overlay(&self.options);
        PipelineOptions::from_option_set(&set)?;
        Ok(set)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/asrsweep/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("asrsweep")
            .join("config.toml")
    }
}
