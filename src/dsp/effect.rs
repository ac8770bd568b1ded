//! Effect settings and the trait every effect implements

use serde::{Deserialize, Serialize};

use crate::error::{DatabendError, Result};

/// Base trait for all signal effects
///
/// Effects work on the signal region of a decoded buffer, i.e. everything
/// after the container header. `start_index` is the absolute buffer index of
/// `signal[0]`, for effects whose output depends on position.
pub trait Effect {
    /// Process the signal region in place
    fn process_signal(&self, signal: &mut [f32], start_index: usize);

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;
}

/// Sine amplitude modulation
///
/// Fields missing from serialized settings take the identity defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmpModSettings {
    pub frequency: f64,
    pub phase: f64,
    pub amp: f64,
    pub offset: f64,
}

impl Default for AmpModSettings {
    /// Identity modulation
    fn default() -> Self {
        Self {
            frequency: 0.0,
            phase: 0.0,
            amp: 0.0,
            offset: 1.0,
        }
    }
}

/// Fractional delay line with feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    /// Delay length in samples, may be fractional
    pub delay: f64,
    pub feedback: f64,
    /// Wet/dry balance in [0, 1]
    pub mix: f64,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            delay: 100.0,
            feedback: 0.5,
            mix: 0.5,
        }
    }
}

/// Segment shuffle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleSettings {
    pub segments: u32,
    /// Seed for the segment permutation
    #[serde(default)]
    pub seed: u64,
}

impl Default for ShuffleSettings {
    fn default() -> Self {
        Self {
            segments: 1,
            seed: 0,
        }
    }
}

/// Settings for one render, tagged by effect type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSettings {
    AmpMod(AmpModSettings),
    Delay(DelaySettings),
    Shuffle(ShuffleSettings),
}

impl Default for EffectSettings {
    fn default() -> Self {
        EffectSettings::AmpMod(AmpModSettings::default())
    }
}

impl EffectSettings {
    /// Get the effect type identifier
    pub fn effect_type(&self) -> &'static str {
        match self {
            EffectSettings::AmpMod(_) => "amp_mod",
            EffectSettings::Delay(_) => "delay",
            EffectSettings::Shuffle(_) => "shuffle",
        }
    }

    /// Borrow the settings as a processable effect
    pub fn as_effect(&self) -> &dyn Effect {
        match self {
            EffectSettings::AmpMod(s) => s,
            EffectSettings::Delay(s) => s,
            EffectSettings::Shuffle(s) => s,
        }
    }

    /// Reject settings that cannot produce a meaningful render
    pub fn validate(&self) -> Result<()> {
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(DatabendError::InvalidSettings {
                    reason: format!("{} must be finite, got {}", name, v),
                })
            }
        };

        match self {
            EffectSettings::AmpMod(s) => {
                finite("frequency", s.frequency)?;
                finite("phase", s.phase)?;
                finite("amp", s.amp)?;
                finite("offset", s.offset)
            }
            EffectSettings::Delay(s) => {
                finite("delay", s.delay)?;
                finite("feedback", s.feedback)?;
                finite("mix", s.mix)?;
                if s.delay < 0.0 {
                    return Err(DatabendError::InvalidSettings {
                        reason: format!("delay must be >= 0, got {}", s.delay),
                    });
                }
                if !(0.0..=1.0).contains(&s.mix) {
                    return Err(DatabendError::InvalidSettings {
                        reason: format!("mix must be within [0, 1], got {}", s.mix),
                    });
                }
                Ok(())
            }
            EffectSettings::Shuffle(s) => {
                if s.segments == 0 {
                    return Err(DatabendError::InvalidSettings {
                        reason: "segments must be at least 1".to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Component-wise linear mix of two settings of the same effect type
    ///
    /// Shuffle segment counts round to the nearest integer; the seed comes
    /// from `start`.
    pub fn lerp(start: &EffectSettings, end: &EffectSettings, t: f64) -> Result<EffectSettings> {
        let mix = |a: f64, b: f64| a + (b - a) * t;

        match (start, end) {
            (EffectSettings::AmpMod(a), EffectSettings::AmpMod(b)) => {
                Ok(EffectSettings::AmpMod(AmpModSettings {
                    frequency: mix(a.frequency, b.frequency),
                    phase: mix(a.phase, b.phase),
                    amp: mix(a.amp, b.amp),
                    offset: mix(a.offset, b.offset),
                }))
            }
            (EffectSettings::Delay(a), EffectSettings::Delay(b)) => {
                Ok(EffectSettings::Delay(DelaySettings {
                    delay: mix(a.delay, b.delay),
                    feedback: mix(a.feedback, b.feedback),
                    mix: mix(a.mix, b.mix),
                }))
            }
            (EffectSettings::Shuffle(a), EffectSettings::Shuffle(b)) => {
                let segments = mix(a.segments as f64, b.segments as f64).round().max(1.0);
                Ok(EffectSettings::Shuffle(ShuffleSettings {
                    segments: segments as u32,
                    seed: a.seed,
                }))
            }
            _ => Err(DatabendError::MismatchedEffects {
                start: start.effect_type(),
                end: end.effect_type(),
            }),
        }
    }
}
