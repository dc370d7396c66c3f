//! Speech-to-text engine adapters.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockFactory, MockTranscriber, Transcriber, TranscriberFactory};
pub use whisper::{WhisperConfig, WhisperFactory, WhisperTranscriber};
