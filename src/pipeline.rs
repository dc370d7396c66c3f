//! Single-file transcription flow.
//!
//! decode → activity trace → binarize → merge → engine (once per window) →
//! timestamp repair → hallucination filter.

use crate::audio::sample_range;
use crate::defaults::SAMPLE_RATE;
use crate::error::Result;
use crate::filter::FilterRegistry;
use crate::options::{PipelineOptions, VadOptions};
use crate::stt::Transcriber;
use crate::transcript::{Transcript, TranscriptSegment};
use crate::vad::{ActivityModel, Chunk, Hysteresis, Interval, merge_chunks};
use serde::{Deserialize, Serialize};

/// Unit of audio handed to the engine per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dispatch {
    /// One call per merged chunk.
    #[default]
    Chunk,
    /// One call per speech interval inside each chunk.
    Segment,
}

/// Result of transcribing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutcome {
    /// Filtered transcript.
    pub transcript: Transcript,
    pub chunks: usize,
    /// Segments that survived timestamp repair and the filter.
    pub kept: usize,
    /// Segments removed by the hallucination filter.
    pub dropped: usize,
}

/// Score `samples`, binarize and merge into chunks.
pub fn plan_chunks(
    samples: &[i16],
    vad: &VadOptions,
    activity: &dyn ActivityModel,
) -> Result<Vec<Chunk>> {
    let hysteresis = Hysteresis::from_options(vad)?;
    let trace = activity.activity(samples, SAMPLE_RATE)?;
    let intervals = hysteresis.binarize(&trace);
    let chunks = merge_chunks(&intervals, vad.chunk_size);

    tracing::debug!(
        frames = trace.len(),
        intervals = intervals.len(),
        chunks = chunks.len(),
        "Planned chunks"
    );
    for chunk in chunks.iter().filter(|c| c.is_oversized(vad.chunk_size)) {
        tracing::debug!(
            start = chunk.start(),
            end = chunk.end(),
            "Speech interval longer than chunk_size kept whole"
        );
    }
    Ok(chunks)
}

fn windows(chunks: &[Chunk], dispatch: Dispatch) -> Vec<Interval> {
    match dispatch {
        Dispatch::Chunk => chunks.iter().map(Chunk::as_interval).collect(),
        Dispatch::Segment => chunks
            .iter()
            .flat_map(|c| c.segments().iter().copied())
            .collect(),
    }
}

/// Transcribe decoded 16kHz mono samples under one effective option set.
///
/// Engine segment times are shifted to file time, clamped into the window
/// they came from and made non-overlapping. Segments that collapse to zero
/// length are discarded. Texts are trimmed, then filtered for the configured
/// language.
pub fn transcribe_audio(
    samples: &[i16],
    options: &PipelineOptions,
    activity: &dyn ActivityModel,
    engine: &dyn Transcriber,
    registry: &FilterRegistry,
    dispatch: Dispatch,
) -> Result<TranscriptionOutcome> {
    let language = options.asr.language.as_str();
    // Unknown languages fail before any inference is spent.
    registry.lookup(language)?;

    let chunks = plan_chunks(samples, &options.vad, activity)?;
    let mut transcript = Transcript::new(language);
    let mut previous_end = 0.0_f64;

    for window in windows(&chunks, dispatch) {
        let range = sample_range(window, SAMPLE_RATE, samples.len());
        if range.is_empty() {
            continue;
        }
        let slice_start = range.start as f64 / SAMPLE_RATE as f64;
        let slice_end = range.end as f64 / SAMPLE_RATE as f64;

        for raw in engine.transcribe(&samples[range])? {
            let start = (slice_start + raw.start)
                .clamp(slice_start, slice_end)
                .max(previous_end);
            let end = (slice_start + raw.end).clamp(slice_start, slice_end);

            let segment = TranscriptSegment::new(start, end, raw.text.trim());
            if !segment.is_well_formed() {
                tracing::debug!(
                    start = raw.start,
                    end = raw.end,
                    window_start = slice_start,
                    "Discarded degenerate segment"
                );
                continue;
            }
            previous_end = end;
            transcript.push(segment);
        }
    }

    let before = transcript.len();
    let transcript = registry.filter_transcript(transcript)?;
    let kept = transcript.len();

    Ok(TranscriptionOutcome {
        transcript,
        chunks: chunks.len(),
        kept,
        dropped: before - kept,
    })
}
