//! WAV decoding into 16kHz mono PCM.

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, SweepError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decode a WAV file on disk.
pub fn load_wav(path: &Path) -> Result<Vec<i16>> {
    let file = File::open(path).map_err(|e| SweepError::AudioDecode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    decode_wav(BufReader::new(file), &path.display().to_string())
}

/// Decode WAV data from any reader.
/// Supports arbitrary sample rates and channel counts, resampling to 16kHz mono.
/// `name` identifies the source in error messages.
pub fn decode_wav<R: Read>(reader: R, name: &str) -> Result<Vec<i16>> {
    let decode_error = |message: String| SweepError::AudioDecode {
        path: name.to_string(),
        message,
    };

    let mut wav_reader = hound::WavReader::new(reader)
        .map_err(|e| decode_error(format!("Failed to parse WAV file: {}", e)))?;

    let spec = wav_reader.spec();
    if spec.channels == 0 {
        return Err(decode_error("WAV header declares zero channels".to_string()));
    }
    if spec.sample_rate == 0 {
        return Err(decode_error("WAV header declares a zero sample rate".to_string()));
    }
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(decode_error(format!(
            "Unsupported sample format: {:?} {}-bit (expected 16-bit PCM)",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| decode_error(format!("Failed to read WAV samples: {}", e)))?;

    let mono_samples = downmix(raw_samples, spec.channels);

    let samples = if spec.sample_rate != SAMPLE_RATE {
        tracing::debug!(
            file = name,
            from = spec.sample_rate,
            to = SAMPLE_RATE,
            "Resampling audio"
        );
        resample(&mono_samples, spec.sample_rate, SAMPLE_RATE)
    } else {
        mono_samples
    };

    Ok(samples)
}

/// Average interleaved channels into one.
fn downmix(samples: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels == 1 {
        return samples;
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(last);
            let fraction = source_pos - source_idx as f64;

            if source_idx >= last {
                samples[last]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
