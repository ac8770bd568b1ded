//! Companding codec
//!
//! Reinterprets image bytes as 8-bit G.711 audio. Each byte expands to a
//! 16-bit PCM value through the mu-law or a-law table, and the decoded
//! sample buffer carries that value normalised to `[-1.0, 1.0)`.
//!
//! Both directions are total and element-wise. The round trip is lossy:
//! `decode(encode(x))` lands within one quantisation step of `x`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale between 16-bit PCM and normalised samples
const PCM_SCALE: f32 = 32768.0;

// Mu-law constants
const MULAW_BIAS: i32 = 0x84;
const MULAW_CLIP: i32 = 32635;

// A-law segment end points (13-bit magnitudes)
const ALAW_SEG_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

/// Which companding table to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingAlgorithm {
    #[default]
    MuLaw,
    ALaw,
}

impl fmt::Display for EncodingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingAlgorithm::MuLaw => write!(f, "mu-law"),
            EncodingAlgorithm::ALaw => write!(f, "a-law"),
        }
    }
}

impl std::str::FromStr for EncodingAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mu-law" | "mulaw" | "ulaw" => Ok(EncodingAlgorithm::MuLaw),
            "a-law" | "alaw" => Ok(EncodingAlgorithm::ALaw),
            other => Err(format!("unknown encoding: {}", other)),
        }
    }
}

impl EncodingAlgorithm {
    /// Expand one companded byte to 16-bit PCM
    #[inline]
    pub fn expand(self, byte: u8) -> i16 {
        match self {
            EncodingAlgorithm::MuLaw => mulaw_expand(byte),
            EncodingAlgorithm::ALaw => alaw_expand(byte),
        }
    }

    /// Compress one 16-bit PCM value to a companded byte
    #[inline]
    pub fn compress(self, pcm: i16) -> u8 {
        match self {
            EncodingAlgorithm::MuLaw => mulaw_compress(pcm),
            EncodingAlgorithm::ALaw => alaw_compress(pcm),
        }
    }
}

/// Decode image bytes into normalised samples
pub fn decode(bytes: &[u8], algorithm: EncodingAlgorithm) -> Vec<f32> {
    bytes
        .iter()
        .map(|&b| algorithm.expand(b) as f32 / PCM_SCALE)
        .collect()
}

/// Encode normalised samples back into bytes
///
/// Samples outside `[-1.0, 1.0)` saturate at the PCM range.
pub fn encode(samples: &[f32], algorithm: EncodingAlgorithm) -> Vec<u8> {
    samples
        .iter()
        .map(|&s| algorithm.compress(to_pcm(s)))
        .collect()
}

#[inline]
fn to_pcm(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * PCM_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn mulaw_expand(byte: u8) -> i16 {
    let u = !byte;
    let exponent = ((u >> 4) & 0x07) as i32;
    let mantissa = (u & 0x0F) as i32;
    let magnitude = (((mantissa << 3) + MULAW_BIAS) << exponent) - MULAW_BIAS;
    if u & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

fn mulaw_compress(pcm: i16) -> u8 {
    let mut value = pcm as i32;
    let sign = if value < 0 {
        value = -value;
        0x80
    } else {
        0x00
    };
    value = value.min(MULAW_CLIP) + MULAW_BIAS;

    // Highest set bit above bit 7 gives the segment
    let mut exponent = 7;
    let mut mask = 0x4000;
    while exponent > 0 && value & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = (value >> (exponent + 3)) & 0x0F;

    !((sign | (exponent << 4) | mantissa) as u8)
}

fn alaw_expand(byte: u8) -> i16 {
    let a = byte ^ 0x55;
    let segment = ((a & 0x70) >> 4) as i32;
    let mut magnitude = ((a & 0x0F) as i32) << 4;
    match segment {
        0 => magnitude += 8,
        1 => magnitude += 0x108,
        _ => {
            magnitude += 0x108;
            magnitude <<= segment - 1;
        }
    }
    if a & 0x80 != 0 {
        magnitude as i16
    } else {
        -magnitude as i16
    }
}

fn alaw_compress(pcm: i16) -> u8 {
    let mut value = (pcm as i32) >> 3;
    let mask: u8 = if value >= 0 {
        0xD5
    } else {
        value = -value - 1;
        0x55
    };

    let segment = ALAW_SEG_END
        .iter()
        .position(|&end| value <= end)
        .unwrap_or(ALAW_SEG_END.len()) as i32;
    if segment >= 8 {
        return 0x7F ^ mask;
    }

    let quant = if segment < 2 {
        (value >> 1) & 0x0F
    } else {
        (value >> segment) & 0x0F
    };
    ((segment << 4) | quant) as u8 ^ mask
}
