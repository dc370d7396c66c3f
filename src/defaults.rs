//! Default configuration constants for asrsweep.
//!
//! These values form the built-in default option set. A config file may
//! override any of them; the result becomes the baseline every comparison run
//! is measured against.

/// Audio sample rate in Hz expected by the transcription engine.
pub const SAMPLE_RATE: u32 = 16000;

/// Probability at or above which a frame starts speech.
pub const VAD_ONSET: f64 = 0.5;

/// Probability below which a frame ends speech.
///
/// Lower than the onset so that scores hovering around a single threshold
/// do not flicker between speech and silence.
pub const VAD_OFFSET: f64 = 0.363;

/// Maximum chunk duration in seconds.
///
/// Whisper models consume 30-second windows, so larger chunks are never
/// useful.
pub const CHUNK_SIZE_SECS: f64 = 30.0;

/// Frame length used by the energy activity model, in milliseconds.
pub const ACTIVITY_FRAME_MS: u32 = 20;

/// RMS level treated as a fully confident speech frame by the energy model.
///
/// Scores are `rms / ACTIVITY_FULL_SCALE_RMS`, clamped to 1.0. Normal speech
/// at a typical microphone gain sits around 0.05-0.2 RMS.
pub const ACTIVITY_FULL_SCALE_RMS: f32 = 0.1;

pub const BEAM_SIZE: i64 = 5;
pub const BEST_OF: i64 = 5;
pub const PATIENCE: f64 = 1.0;
pub const LENGTH_PENALTY: f64 = 1.0;
pub const REPETITION_PENALTY: f64 = 1.0;
pub const NO_REPEAT_NGRAM_SIZE: i64 = 0;
pub const TEMPERATURE: f64 = 0.0;
pub const COMPRESSION_RATIO_THRESHOLD: f64 = 2.4;
pub const LOG_PROB_THRESHOLD: f64 = -1.0;
pub const NO_SPEECH_THRESHOLD: f64 = 0.6;
pub const MAX_INITIAL_TIMESTAMP: f64 = 0.0;

/// Default language code for transcription and hallucination filtering.
///
/// The curated hallucination list targets Korean broadcast audio.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// Subtitle layout hints recorded alongside each transcript for the writer.
pub const MAX_LINE_WIDTH: i64 = 1000;
pub const MAX_LINE_COUNT: i64 = 100;

/// Root directory for sweep artifacts.
pub const OUTPUT_DIR: &str = "output";

/// File extension of corpus audio files.
pub const AUDIO_EXTENSION: &str = "wav";

/// Directory name used when a run changes no option at all.
pub const BASELINE_PARAMETER: &str = "defaults";

/// Value label used when a run changes no option at all.
pub const BASELINE_VALUE: &str = "baseline";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
