//! Whisper-based speech-to-text transcription.
//!
//! This module provides a Whisper implementation of the Transcriber trait using whisper-rs.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be installed.
//! To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::error::{Result, SweepError};
use crate::options::{AsrOptions, PipelineOptions};
use crate::stt::transcriber::{Transcriber, TranscriberFactory};
use crate::transcript::TranscriptSegment;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for one Whisper engine instance.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    /// Decoding options for this variant
    pub asr: AsrOptions,
}

/// How the decoder explores candidates for a given option set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoding {
    Greedy { best_of: u32 },
    BeamSearch { beam_size: u32, patience: f64 },
}

impl Decoding {
    /// A non-zero temperature means sampling, which whisper.cpp only does
    /// greedily; `best_of` then picks among the samples.
    pub fn for_options(asr: &AsrOptions) -> Self {
        if asr.temperature > 0.0 || asr.beam_size <= 1 {
            Decoding::Greedy {
                best_of: asr.best_of,
            }
        } else {
            Decoding::BeamSearch {
                beam_size: asr.beam_size,
                patience: asr.patience,
            }
        }
    }
}

/// Options whisper.cpp has no knob for. Logged when set to non-defaults.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn unsupported_options(asr: &AsrOptions) -> Vec<&'static str> {
    let defaults = AsrOptions::default();
    let mut unsupported = Vec::new();
    if asr.repetition_penalty != defaults.repetition_penalty {
        unsupported.push("repetition_penalty");
    }
    if asr.no_repeat_ngram_size != defaults.no_repeat_ngram_size {
        unsupported.push("no_repeat_ngram_size");
    }
    unsupported
}

fn model_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Whisper-based transcriber implementation.
///
/// The WhisperContext is wrapped in a Mutex to ensure thread safety.
///
/// # Feature Gate
///
/// This type is only available when the `whisper` feature is enabled.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper-based transcriber placeholder (without whisper feature).
///
/// This is a stub implementation that returns errors when used.
/// Enable the `whisper` feature to use real transcription.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    /// Load a Whisper model configured for one option set.
    ///
    /// # Errors
    /// Returns `SweepError::TranscriptionModelNotFound` if the model file doesn't exist
    /// Returns `SweepError::TranscriptionInferenceFailed` if model loading fails
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(SweepError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_for(&config.model_path);

        let mut context_params = WhisperContextParameters::default();
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            config.model_path.to_str().ok_or_else(|| {
                SweepError::TranscriptionInferenceFailed {
                    message: "Invalid UTF-8 in model path".to_string(),
                }
            })?,
            context_params,
        )
        .map_err(|e| SweepError::TranscriptionInferenceFailed {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        tracing::debug!(
            model = %model_name,
            backend = crate::defaults::gpu_backend(),
            "Loaded Whisper model"
        );

        let unsupported = unsupported_options(&config.asr);
        if !unsupported.is_empty() {
            tracing::warn!(
                options = ?unsupported,
                "whisper.cpp ignores these options; runs varying them will match the baseline"
            );
        }

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    fn params(&self) -> FullParams<'_, '_> {
        let asr = &self.config.asr;
        let strategy = match Decoding::for_options(asr) {
            Decoding::Greedy { best_of } => SamplingStrategy::Greedy {
                best_of: best_of as i32,
            },
            Decoding::BeamSearch {
                beam_size,
                patience,
            } => SamplingStrategy::BeamSearch {
                beam_size: beam_size as i32,
                patience: patience as f32,
            },
        };

        let mut params = FullParams::new(strategy);
        params.set_language(Some(&asr.language));
        params.set_temperature(asr.temperature as f32);
        params.set_length_penalty(asr.length_penalty as f32);
        params.set_entropy_thold(asr.compression_ratio_threshold as f32);
        params.set_logprob_thold(asr.log_prob_threshold as f32);
        params.set_no_speech_thold(asr.no_speech_threshold as f32);
        params.set_no_context(!asr.condition_on_previous_text);
        params.set_suppress_blank(asr.suppress_blank);
        params.set_max_initial_ts(asr.max_initial_timestamp as f32);
        if let Some(prompt) = &asr.initial_prompt {
            params.set_initial_prompt(prompt);
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    /// Create a new Whisper transcriber (stub implementation).
    ///
    /// Validates the model path so configuration mistakes surface the same
    /// way with and without the feature.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(SweepError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_for(&config.model_path);
        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

/// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
///
/// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
pub fn convert_audio(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<TranscriptSegment>> {
        let audio_f32 = convert_audio(audio);

        let context =
            self.context
                .lock()
                .map_err(|e| SweepError::TranscriptionInferenceFailed {
                    message: format!("Failed to acquire context lock: {}", e),
                })?;

        let mut state =
            context
                .create_state()
                .map_err(|e| SweepError::TranscriptionInferenceFailed {
                    message: format!("Failed to create Whisper state: {}", e),
                })?;

        state
            .full(self.params(), &audio_f32)
            .map_err(|e| SweepError::TranscriptionInferenceFailed {
                message: format!("Whisper inference failed: {}", e),
            })?;

        // Timestamps are in centiseconds.
        let segments = state
            .as_iter()
            .map(|segment| {
                TranscriptSegment::new(
                    segment.start_timestamp() as f64 / 100.0,
                    segment.end_timestamp() as f64 / 100.0,
                    segment.to_string(),
                )
            })
            .collect();

        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, _audio: &[i16]) -> Result<Vec<TranscriptSegment>> {
        Err(SweepError::TranscriptionInferenceFailed {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release --features whisper\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// Loads a fresh Whisper engine for every option set.
#[derive(Debug, Clone)]
pub struct WhisperFactory {
    model_path: PathBuf,
    threads: Option<usize>,
}

impl WhisperFactory {
    /// Fails fast when the binary cannot transcribe at all.
    pub fn new(model_path: PathBuf, threads: Option<usize>) -> Result<Self> {
        if !cfg!(feature = "whisper") {
            return Err(SweepError::TranscriptionInferenceFailed {
                message: "Whisper feature not enabled. Rebuild with --features whisper".to_string(),
            });
        }
        if !model_path.exists() {
            return Err(SweepError::TranscriptionModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }
        Ok(Self {
            model_path,
            threads,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl TranscriberFactory for WhisperFactory {
    fn create(&self, options: &PipelineOptions) -> Result<Arc<dyn Transcriber>> {
        let transcriber = WhisperTranscriber::new(WhisperConfig {
            model_path: self.model_path.clone(),
            threads: self.threads,
            asr: options.asr.clone(),
        })?;
        Ok(Arc::new(transcriber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(path: &Path) -> WhisperConfig {
        WhisperConfig {
            model_path: path.to_path_buf(),
            threads: None,
            asr: AsrOptions::default(),
        }
    }

    #[test]
    fn test_default_options_use_beam_search() {
        let decoding = Decoding::for_options(&AsrOptions::default());
        assert_eq!(
            decoding,
            Decoding::BeamSearch {
                beam_size: 5,
                patience: 1.0
            }
        );
    }

    #[test]
    fn test_temperature_switches_to_sampling() {
        let asr = AsrOptions {
            temperature: 0.4,
            ..AsrOptions::default()
        };
        assert_eq!(Decoding::for_options(&asr), Decoding::Greedy { best_of: 5 });
    }

    #[test]
    fn test_beam_size_one_is_greedy() {
        let asr = AsrOptions {
            beam_size: 1,
            best_of: 2,
            ..AsrOptions::default()
        };
        assert_eq!(Decoding::for_options(&asr), Decoding::Greedy { best_of: 2 });
    }

    #[test]
    fn test_unsupported_options_reported_only_when_changed() {
        assert!(unsupported_options(&AsrOptions::default()).is_empty());
        let asr = AsrOptions {
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
            ..AsrOptions::default()
        };
        assert_eq!(
            unsupported_options(&asr),
            vec!["repetition_penalty", "no_repeat_ngram_size"]
        );
    }

    #[test]
    fn test_convert_audio_normalization() {
        let converted = convert_audio(&[0, 16384, -16384, 32767, -32768]);
        assert_eq!(converted[0], 0.0);
        assert!((converted[1] - 0.5).abs() < 0.001);
        assert!((converted[2] + 0.5).abs() < 0.001);
        assert!((converted[3] - 1.0).abs() < 0.001);
        assert_eq!(converted[4], -1.0);
    }

    #[test]
    fn test_new_with_missing_model_returns_error() {
        let result = WhisperTranscriber::new(config_for(Path::new("/nonexistent/model.bin")));
        match result {
            Err(SweepError::TranscriptionModelNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected TranscriptionModelNotFound error"),
        }
    }

    #[test]
    fn test_factory_rejects_missing_model() {
        let result = WhisperFactory::new(PathBuf::from("/nonexistent/model.bin"), None);
        assert!(result.is_err());
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_stub_factory_fails_fast() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let result = WhisperFactory::new(temp_file.path().to_path_buf(), None);
        assert!(matches!(
            result,
            Err(SweepError::TranscriptionInferenceFailed { .. })
        ));
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_stub_transcribe_returns_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let transcriber = WhisperTranscriber::new(config_for(temp_file.path())).unwrap();

        assert!(!transcriber.is_ready());
        assert!(transcriber.transcribe(&[0i16; 1600]).is_err());
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_stub_model_name_from_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ggml-small.bin");
        std::fs::write(&path, b"not a model").unwrap();

        let transcriber = WhisperTranscriber::new(config_for(&path)).unwrap();
        assert_eq!(transcriber.model_name(), "ggml-small");
        assert_eq!(transcriber.config().asr.beam_size, 5);
    }
}
