//! Audio decoding and slicing.

pub mod wav;

pub use wav::{decode_wav, load_wav};

use crate::vad::Interval;

/// Sample index range covered by `interval` at `sample_rate`, clamped to
/// `len` samples.
pub fn sample_range(interval: Interval, sample_rate: u32, len: usize) -> std::ops::Range<usize> {
    let rate = sample_rate as f64;
    let start = ((interval.start * rate).floor().max(0.0) as usize).min(len);
    let end = ((interval.end * rate).ceil().max(0.0) as usize).clamp(start, len);
    start..end
}
