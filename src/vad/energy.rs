//! Energy-based activity scoring.
//!
//! Stands in for a neural voice-activity model: each fixed-length frame is
//! scored by its RMS level relative to a full-scale reference.

use crate::defaults;
use crate::error::{Result, SweepError};
use crate::vad::trace::ActivityTrace;

/// Produces per-frame speech probabilities for a waveform.
pub trait ActivityModel: Send + Sync {
    /// Score 16-bit PCM `samples` recorded at `sample_rate`.
    fn activity(&self, samples: &[i16], sample_rate: u32) -> Result<ActivityTrace>;
}

/// RMS energy scorer.
#[derive(Debug, Clone, Copy)]
pub struct EnergyActivityModel {
    /// Frame length in milliseconds.
    pub frame_ms: u32,
    /// RMS level that maps to a score of 1.0.
    pub full_scale_rms: f32,
}

impl Default for EnergyActivityModel {
    fn default() -> Self {
        Self {
            frame_ms: defaults::ACTIVITY_FRAME_MS,
            full_scale_rms: defaults::ACTIVITY_FULL_SCALE_RMS,
        }
    }
}

impl ActivityModel for EnergyActivityModel {
    fn activity(&self, samples: &[i16], sample_rate: u32) -> Result<ActivityTrace> {
        if self.frame_ms == 0 || sample_rate == 0 {
            return Err(SweepError::ConfigInvalidValue {
                key: "frame_ms".to_string(),
                message: "frame length and sample rate must be non-zero".to_string(),
            });
        }
        let frame_len = ((sample_rate as u64 * self.frame_ms as u64) / 1000).max(1) as usize;
        let frame_rate = sample_rate as f64 / frame_len as f64;

        let scores = samples
            .chunks(frame_len)
            .map(|frame| (calculate_rms(frame) / self.full_scale_rms).clamp(0.0, 1.0))
            .collect();

        ActivityTrace::new(frame_rate, scores)
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
