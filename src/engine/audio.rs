//! WAV input for envelope sources
//!
//! Reads a WAV file through `hound` and downmixes it to a mono f32 clip.
//! No resampling happens here; the envelope extractor works at the file's
//! own sample rate.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::info;

use crate::error::{DatabendError, Result};

/// Mono audio clip used to derive a modulation envelope
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load a WAV file as a mono clip
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a readable WAV file
/// * `MissingInput` - If the file holds no samples
pub fn load_wav(path: &Path) -> Result<AudioClip> {
    if !path.exists() {
        return Err(DatabendError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| DatabendError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(DatabendError::MissingInput {
            what: format!("audio samples in {}", path.display()),
        });
    }

    let samples = downmix(&interleaved, channels);
    info!(
        "Loaded {} ({} Hz, {} channel(s), {} frames)",
        path.display(),
        spec.sample_rate,
        channels,
        samples.len()
    );

    Ok(AudioClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| DatabendError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(DatabendError::InvalidAudio {
                        reason: format!("{}-bit integer audio is not supported", bits_per_sample),
                        source: None,
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid)
        }
    }
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
