//! Typed views of the option set.
//!
//! The delta engine works on untyped [`OptionSet`]s so that any key can be
//! compared and labelled. Everything downstream (binarizer, merger, engine)
//! reads these typed structs, parsed from the effective option set.

use crate::defaults;
use crate::error::{Result, SweepError};
use crate::options::set::OptionSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical partition an option belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionGroup {
    Vad,
    Asr,
    Output,
}

pub const VAD_KEYS: &[&str] = &["vad_onset", "vad_offset", "chunk_size"];

pub const ASR_KEYS: &[&str] = &[
    "beam_size",
    "best_of",
    "patience",
    "length_penalty",
    "repetition_penalty",
    "no_repeat_ngram_size",
    "temperature",
    "compression_ratio_threshold",
    "log_prob_threshold",
    "no_speech_threshold",
    "condition_on_previous_text",
    "initial_prompt",
    "suppress_blank",
    "max_initial_timestamp",
    "language",
];

pub const OUTPUT_KEYS: &[&str] = &["max_line_width", "max_line_count", "highlight_words"];

/// Which partition a key belongs to, or `None` for extension keys.
pub fn option_group(key: &str) -> Option<OptionGroup> {
    if VAD_KEYS.contains(&key) {
        Some(OptionGroup::Vad)
    } else if ASR_KEYS.contains(&key) {
        Some(OptionGroup::Asr)
    } else if OUTPUT_KEYS.contains(&key) {
        Some(OptionGroup::Output)
    } else {
        None
    }
}

/// Voice activity options: hysteresis thresholds and chunk ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadOptions {
    pub vad_onset: f64,
    pub vad_offset: f64,
    /// Maximum chunk duration in seconds.
    pub chunk_size: f64,
}

impl Default for VadOptions {
    fn default() -> Self {
        Self {
            vad_onset: defaults::VAD_ONSET,
            vad_offset: defaults::VAD_OFFSET,
            chunk_size: defaults::CHUNK_SIZE_SECS,
        }
    }
}

/// Decoding options forwarded to the transcription engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsrOptions {
    pub beam_size: u32,
    pub best_of: u32,
    pub patience: f64,
    pub length_penalty: f64,
    pub repetition_penalty: f64,
    pub no_repeat_ngram_size: u32,
    pub temperature: f64,
    pub compression_ratio_threshold: f64,
    pub log_prob_threshold: f64,
    pub no_speech_threshold: f64,
    pub condition_on_previous_text: bool,
    pub initial_prompt: Option<String>,
    pub suppress_blank: bool,
    pub max_initial_timestamp: f64,
    pub language: String,
}

impl Default for AsrOptions {
    fn default() -> Self {
        Self {
            beam_size: defaults::BEAM_SIZE as u32,
            best_of: defaults::BEST_OF as u32,
            patience: defaults::PATIENCE,
            length_penalty: defaults::LENGTH_PENALTY,
            repetition_penalty: defaults::REPETITION_PENALTY,
            no_repeat_ngram_size: defaults::NO_REPEAT_NGRAM_SIZE as u32,
            temperature: defaults::TEMPERATURE,
            compression_ratio_threshold: defaults::COMPRESSION_RATIO_THRESHOLD,
            log_prob_threshold: defaults::LOG_PROB_THRESHOLD,
            no_speech_threshold: defaults::NO_SPEECH_THRESHOLD,
            condition_on_previous_text: false,
            initial_prompt: None,
            suppress_blank: true,
            max_initial_timestamp: defaults::MAX_INITIAL_TIMESTAMP,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Layout hints handed to the subtitle writer alongside the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub max_line_width: u32,
    pub max_line_count: u32,
    pub highlight_words: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            max_line_width: defaults::MAX_LINE_WIDTH as u32,
            max_line_count: defaults::MAX_LINE_COUNT as u32,
            highlight_words: false,
        }
    }
}

/// Every option the pipeline interprets, flattened into one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineOptions {
    #[serde(flatten)]
    pub vad: VadOptions,
    #[serde(flatten)]
    pub asr: AsrOptions,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl PipelineOptions {
    /// Flatten into an ordered option set (VAD, then ASR, then output keys).
    pub fn to_option_set(&self) -> Result<OptionSet> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(OptionSet::from(map)),
            other => Err(SweepError::Other(format!(
                "options serialized to a non-object value: {}",
                other
            ))),
        }
    }

    /// Parse and validate the typed options from an effective option set.
    ///
    /// Extension keys are ignored here; they only travel with the option set.
    pub fn from_option_set(set: &OptionSet) -> Result<Self> {
        let options: PipelineOptions =
            serde_json::from_value(set.to_value()).map_err(|e| SweepError::ConfigInvalidValue {
                key: "options".to_string(),
                message: e.to_string(),
            })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        check_probability("vad_onset", self.vad.vad_onset)?;
        check_probability("vad_offset", self.vad.vad_offset)?;
        if !self.vad.chunk_size.is_finite() || self.vad.chunk_size <= 0.0 {
            return Err(invalid("chunk_size", "must be a positive number of seconds"));
        }
        if self.asr.beam_size == 0 {
            return Err(invalid("beam_size", "must be at least 1"));
        }
        if self.asr.best_of == 0 {
            return Err(invalid("best_of", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.asr.temperature) {
            return Err(invalid("temperature", "must be within [0, 1]"));
        }
        if self.asr.language.trim().is_empty() {
            return Err(invalid("language", "must not be empty"));
        }
        Ok(())
    }
}

fn check_probability(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(key, "must be within [0, 1]"))
    }
}

fn invalid(key: &str, message: &str) -> SweepError {
    SweepError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
