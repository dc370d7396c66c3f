//! Transcript types shared by the engine adapters, the filter and the writer.

use serde::{Deserialize, Serialize};

/// One timed piece of recognised text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// `start < end` with finite bounds.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

/// Time-ordered segments in one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            segments: Vec::new(),
        }
    }

    pub fn with_segments(language: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            language: language.into(),
            segments,
        }
    }

    pub fn push(&mut self, segment: TranscriptSegment) {
        debug_assert!(
            self.segments.last().is_none_or(|last| last.start <= segment.start),
            "segments must be pushed in start order"
        );
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment texts joined by single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Starts are non-decreasing and no segment overlaps the next.
    pub fn is_ordered(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| w[0].start <= w[1].start && w[0].end <= w[1].start)
    }
}
