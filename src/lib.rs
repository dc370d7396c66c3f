//! asrsweep - VAD chunking, hallucination filtering and ASR hyperparameter sweeps
//!
//! Splits recordings into speech chunks with a hysteresis VAD, transcribes them
//! and drops hallucinated segments, and compares configurations that differ in
//! exactly one option across a corpus.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod options;
pub mod pipeline;
pub mod stt;
pub mod sweep;
pub mod transcript;
pub mod vad;

// Core traits (activity model → engine)
pub use stt::transcriber::{Transcriber, TranscriberFactory};
pub use vad::ActivityModel;

// Chunking and filtering
pub use filter::{FilterRegistry, LanguageFilter, UnknownLanguagePolicy};
pub use pipeline::{Dispatch, TranscriptionOutcome, plan_chunks, transcribe_audio};
pub use transcript::{Transcript, TranscriptSegment};
pub use vad::{ActivityTrace, Chunk, Hysteresis, Interval, binarize, merge_chunks};

// Options and sweeps
pub use options::{OptionDelta, OptionSet, PipelineOptions, resolve};
pub use sweep::{Orchestrator, SweepReport, SweepSettings, SweepSpec};

// Error handling
pub use error::{Result, SweepError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
