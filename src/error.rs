//! Error types for asrsweep.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error(
        "Only one option may change per comparison run, but {} changed: {}",
        keys.len(),
        keys.join(", ")
    )]
    MultipleChanges { keys: Vec<String> },

    #[error("No hallucination filter configured for language '{language}'")]
    UnknownLanguage { language: String },

    #[error("Candidate values {first} and {second} both map to output directory '{label}'")]
    LayoutCollision {
        label: String,
        first: String,
        second: String,
    },

    #[error("Invalid allow-pattern for language '{language}': {source}")]
    Pattern {
        language: String,
        #[source]
        source: regex::Error,
    },

    // Per-item errors
    #[error("Refusing to overwrite {path}: {message}")]
    ArtifactConflict { path: String, message: String },

    #[error("Failed to decode audio {path}: {message}")]
    AudioDecode { path: String, message: String },

    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription inference failed: {message}")]
    TranscriptionInferenceFailed { message: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Processing {item} exceeded the {} deadline", humantime::format_duration(*.timeout))]
    Timeout {
        item: String,
        timeout: std::time::Duration,
    },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SweepError {
    /// Whether this error invalidates the whole run rather than a single file.
    ///
    /// Configuration errors abort a sweep immediately; everything else is
    /// logged against the file being processed and the sweep moves on.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SweepError::ConfigFileNotFound { .. }
                | SweepError::ConfigParse { .. }
                | SweepError::ConfigInvalidValue { .. }
                | SweepError::Config(_)
                | SweepError::MultipleChanges { .. }
                | SweepError::UnknownLanguage { .. }
                | SweepError::LayoutCollision { .. }
                | SweepError::Pattern { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = SweepError::ConfigInvalidValue {
            key: "vad_onset".to_string(),
            message: "must be within [0, 1]".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for vad_onset: must be within [0, 1]"
        );
    }

    #[test]
    fn test_multiple_changes_display_lists_keys() {
        let error = SweepError::MultipleChanges {
            keys: vec!["beam_size".to_string(), "temperature".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Only one option may change per comparison run, but 2 changed: beam_size, temperature"
        );
    }

    #[test]
    fn test_unknown_language_display() {
        let error = SweepError::UnknownLanguage {
            language: "fr".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No hallucination filter configured for language 'fr'"
        );
    }

    #[test]
    fn test_timeout_display() {
        let error = SweepError::Timeout {
            item: "a.wav".to_string(),
            timeout: std::time::Duration::from_secs(600),
        };
        assert_eq!(error.to_string(), "Processing a.wav exceeded the 10m deadline");
    }

    #[test]
    fn test_sub_second_timeout_display() {
        let error = SweepError::Timeout {
            item: "a.wav".to_string(),
            timeout: std::time::Duration::from_millis(250),
        };
        assert_eq!(error.to_string(), "Processing a.wav exceeded the 250ms deadline");
    }

    #[test]
    fn test_config_errors_are_classified() {
        assert!(SweepError::MultipleChanges { keys: vec![] }.is_config_error());
        assert!(
            SweepError::UnknownLanguage {
                language: "xx".to_string()
            }
            .is_config_error()
        );
        assert!(
            SweepError::LayoutCollision {
                label: "1".to_string(),
                first: "1".to_string(),
                second: "1.0".to_string(),
            }
            .is_config_error()
        );
    }

    #[test]
    fn test_item_errors_are_not_config_errors() {
        assert!(
            !SweepError::AudioDecode {
                path: "a.wav".to_string(),
                message: "bad header".to_string(),
            }
            .is_config_error()
        );
        assert!(
            !SweepError::Transcription {
                message: "engine crashed".to_string()
            }
            .is_config_error()
        );
        assert!(
            !SweepError::ArtifactConflict {
                path: "out/a/x/1.json".to_string(),
                message: "different value".to_string(),
            }
            .is_config_error()
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SweepError = io_error.into();
        assert!(error.to_string().contains("file not found"));
        assert!(!error.is_config_error());
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: SweepError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.is_config_error());
    }

    #[test]
    fn test_pattern_error_keeps_source() {
        let regex_error = regex::Regex::new("[unclosed").unwrap_err();
        let error = SweepError::Pattern {
            language: "ko".to_string(),
            source: regex_error,
        };
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SweepError>();
        assert_sync::<SweepError>();
    }
}
