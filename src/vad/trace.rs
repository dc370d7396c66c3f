//! Activity traces and the intervals derived from them.

use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};

/// Fixed-rate sequence of per-frame speech probabilities.
///
/// Frame `i` starts at `i / frame_rate` seconds. The trace spans
/// `[0, len / frame_rate)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTrace {
    frame_rate: f64,
    scores: Vec<f32>,
}

impl ActivityTrace {
    /// Creates a trace from scores sampled at `frame_rate` frames per second.
    pub fn new(frame_rate: f64, scores: Vec<f32>) -> Result<Self> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(SweepError::ConfigInvalidValue {
                key: "frame_rate".to_string(),
                message: format!("must be a positive number of frames per second, got {}", frame_rate),
            });
        }
        Ok(Self { frame_rate, scores })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Start time of frame `index` in seconds.
    pub fn timestamp(&self, index: usize) -> f64 {
        index as f64 / self.frame_rate
    }

    /// End of the last frame in seconds.
    pub fn end_time(&self) -> f64 {
        self.timestamp(self.scores.len())
    }

    /// Iterates `(timestamp, score)` pairs in time order.
    pub fn frames(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .map(|(i, &score)| (self.timestamp(i), score))
    }
}

/// Half-open time span `[start, end)` in seconds with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        debug_assert!(start < end, "interval start {} must precede end {}", start, end);
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` lies in `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }
}
