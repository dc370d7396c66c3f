//! Greedy merging of speech intervals into bounded chunks.

use crate::vad::trace::Interval;
use serde::Serialize;

/// A dispatch unit for the transcription engine.
///
/// Spans from its first sub-interval's start to its last sub-interval's end.
/// Silence between sub-intervals is inside the chunk but never extends it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    start: f64,
    end: f64,
    segments: Vec<Interval>,
}

impl Chunk {
    fn open(first: Interval) -> Self {
        Self {
            start: first.start,
            end: first.end,
            segments: vec![first],
        }
    }

    fn push(&mut self, interval: Interval) {
        self.end = interval.end;
        self.segments.push(interval);
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The merged speech intervals, in time order.
    pub fn segments(&self) -> &[Interval] {
        &self.segments
    }

    pub fn as_interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    /// A chunk made of one interval longer than the ceiling. Such chunks are
    /// kept whole rather than cutting speech mid-word.
    pub fn is_oversized(&self, max_duration: f64) -> bool {
        self.segments.len() == 1 && self.duration() > max_duration
    }
}

/// Groups consecutive intervals into chunks no longer than `max_duration`.
///
/// An interval joins the current chunk while `interval.end - chunk.start`
/// stays within the ceiling; otherwise it opens the next chunk. Every input
/// interval lands in exactly one chunk, in input order.
pub fn merge_chunks(intervals: &[Interval], max_duration: f64) -> Vec<Chunk> {
    debug_assert!(
        intervals.windows(2).all(|w| w[0].end <= w[1].start),
        "intervals must be sorted and non-overlapping"
    );

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Option<Chunk> = None;

    for &interval in intervals {
        current = Some(match current.take() {
            Some(mut chunk) if interval.end - chunk.start <= max_duration => {
                chunk.push(interval);
                chunk
            }
            Some(chunk) => {
                chunks.push(chunk);
                Chunk::open(interval)
            }
            None => Chunk::open(interval),
        });
    }

    chunks.extend(current);
    chunks
}
