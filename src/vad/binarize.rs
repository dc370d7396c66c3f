//! Hysteresis binarization of activity traces.
//!
//! Speech starts on the first frame whose score reaches `onset` and ends on
//! the first later frame whose score drops below `offset`. Using two
//! thresholds keeps a score sitting near one boundary from toggling the
//! state every frame.

use crate::error::{Result, SweepError};
use crate::options::VadOptions;
use crate::vad::trace::{ActivityTrace, Interval};

/// Onset/offset threshold pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    onset: f64,
    offset: f64,
}

impl Hysteresis {
    /// Both thresholds must lie in `[0, 1]`. `offset` may exceed `onset`.
    pub fn new(onset: f64, offset: f64) -> Result<Self> {
        for (key, value) in [("vad_onset", onset), ("vad_offset", offset)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SweepError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: format!("must be within [0, 1], got {}", value),
                });
            }
        }
        Ok(Self { onset, offset })
    }

    pub fn from_options(options: &VadOptions) -> Result<Self> {
        Self::new(options.vad_onset, options.vad_offset)
    }

    pub fn onset(&self) -> f64 {
        self.onset
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Converts a trace into ordered, non-overlapping speech intervals.
    ///
    /// An interval opened by frame `i` and closed by frame `j` spans
    /// `[t(i), t(j))`. Speech still active at the end of the trace closes at
    /// the trace end. Empty traces and traces that never reach `onset` give
    /// an empty result.
    pub fn binarize(&self, trace: &ActivityTrace) -> Vec<Interval> {
        // Compare at score precision so a score written as the threshold
        // value meets it exactly.
        let onset = self.onset as f32;
        let offset = self.offset as f32;

        let mut intervals = Vec::new();
        let mut speech_start: Option<f64> = None;

        for (time, score) in trace.frames() {
            match speech_start {
                None if score >= onset => speech_start = Some(time),
                Some(start) if score < offset => {
                    intervals.push(Interval::new(start, time));
                    speech_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = speech_start {
            intervals.push(Interval::new(start, trace.end_time()));
        }

        intervals
    }
}

/// Convenience wrapper around [`Hysteresis::binarize`].
pub fn binarize(trace: &ActivityTrace, onset: f64, offset: f64) -> Result<Vec<Interval>> {
    Ok(Hysteresis::new(onset, offset)?.binarize(trace))
}
