//! Animation interpolation
//!
//! Computes the concrete effect settings for each frame of a transition:
//! a linear mix of the two end settings, optionally nudged by an audio
//! envelope bound to one AmpMod field.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::dsp::EffectSettings;
use crate::engine::envelope::envelope_value_at;
use crate::error::Result;

/// AmpMod field an audio link drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    #[default]
    None,
    Frequency,
    Phase,
    Amp,
    Offset,
}

impl std::str::FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(ParameterType::None),
            "frequency" => Ok(ParameterType::Frequency),
            "phase" => Ok(ParameterType::Phase),
            "amp" => Ok(ParameterType::Amp),
            "offset" => Ok(ParameterType::Offset),
            other => Err(format!("unknown parameter type: {}", other)),
        }
    }
}

/// Binds an envelope to one settings field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioLink {
    pub envelope: Vec<f64>,
    #[serde(rename = "parameterType")]
    pub parameter: ParameterType,
    pub amount: f64,
}

impl AudioLink {
    /// Link that leaves every frame untouched
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(envelope: Vec<f64>, parameter: ParameterType, amount: f64) -> Self {
        Self {
            envelope,
            parameter,
            amount,
        }
    }

    pub fn is_active(&self) -> bool {
        self.parameter != ParameterType::None
    }

    /// Add this link's contribution for frame `index` to `settings`
    ///
    /// Only AmpMod settings carry the linked fields; other effects are left
    /// unchanged.
    pub fn apply(&self, settings: &mut EffectSettings, index: usize) {
        if !self.is_active() {
            return;
        }

        let delta = self.amount * envelope_value_at(&self.envelope, index);
        match settings {
            EffectSettings::AmpMod(s) => match self.parameter {
                ParameterType::Frequency => s.frequency += delta,
                ParameterType::Phase => s.phase += delta,
                ParameterType::Amp => s.amp += delta,
                ParameterType::Offset => s.offset += delta,
                ParameterType::None => {}
            },
            other => warn!(
                "audio link on {:?} ignored for {} effect",
                self.parameter,
                other.effect_type()
            ),
        }
    }
}

/// Progress fraction of frame `index` out of `frame_count`
///
/// A single-frame animation sits at the end of the transition.
pub fn progress_at(index: usize, frame_count: usize) -> f64 {
    if frame_count <= 1 {
        1.0
    } else {
        index as f64 / (frame_count - 1) as f64
    }
}

/// Settings for frame `index` of a `frame_count`-frame transition
pub fn frame_settings(
    start: &EffectSettings,
    end: &EffectSettings,
    index: usize,
    frame_count: usize,
    link: &AudioLink,
) -> Result<EffectSettings> {
    let t = progress_at(index, frame_count);
    let mut settings = EffectSettings::lerp(start, end, t)?;
    link.apply(&mut settings, index);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{AmpModSettings, DelaySettings};
    use test_case::test_case;

    fn amp(value: f64) -> EffectSettings {
        EffectSettings::AmpMod(AmpModSettings {
            amp: value,
            ..Default::default()
        })
    }

    fn amp_of(settings: &EffectSettings) -> f64 {
        match settings {
            EffectSettings::AmpMod(s) => s.amp,
            other => panic!("expected amp_mod, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_sequences() {
        let five: Vec<f64> = (0..5).map(|i| progress_at(i, 5)).collect();
        assert_eq!(five, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(progress_at(0, 1), 1.0);
    }

    #[test_case(0, 0 => 1.0 ; "no frames")]
    #[test_case(0, 1 => 1.0 ; "single frame")]
    #[test_case(0, 2 => 0.0 ; "first of two")]
    #[test_case(1, 2 => 1.0 ; "last of two")]
    #[test_case(2, 5 => 0.5 ; "middle")]
    fn test_progress_at(index: usize, frame_count: usize) -> f64 {
        progress_at(index, frame_count)
    }

    #[test]
    fn test_three_frames_without_link() {
        let link = AudioLink::none();
        let amps: Vec<f64> = (0..3)
            .map(|i| amp_of(&frame_settings(&amp(0.0), &amp(10.0), i, 3, &link).unwrap()))
            .collect();
        assert_eq!(amps, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_link_adds_scaled_envelope() {
        let link = AudioLink::new(vec![0.5, 1.0], ParameterType::Amp, 2.0);
        let amps: Vec<f64> = (0..3)
            .map(|i| amp_of(&frame_settings(&amp(0.0), &amp(10.0), i, 3, &link).unwrap()))
            .collect();
        // Envelope runs out on the last frame
        assert_eq!(amps, vec![1.0, 7.0, 10.0]);
    }

    #[test]
    fn test_link_targets_named_field() {
        let link = AudioLink::new(vec![1.0], ParameterType::Offset, 0.5);
        let mut settings = EffectSettings::AmpMod(AmpModSettings::default());
        link.apply(&mut settings, 0);
        assert_eq!(
            settings,
            EffectSettings::AmpMod(AmpModSettings {
                offset: 1.5,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_link_ignored_for_other_effects() {
        let link = AudioLink::new(vec![1.0], ParameterType::Amp, 3.0);
        let mut settings = EffectSettings::Delay(DelaySettings::default());
        link.apply(&mut settings, 0);
        assert_eq!(settings, EffectSettings::Delay(DelaySettings::default()));
    }

    #[test]
    fn test_audio_link_json() {
        let link: AudioLink = serde_json::from_str(
            r#"{"envelope":[0.1,0.2],"parameterType":"frequency","amount":0.5}"#,
        )
        .unwrap();
        assert_eq!(link.parameter, ParameterType::Frequency);
        assert!(link.is_active());
        assert!(!AudioLink::none().is_active());
        assert_eq!("amp".parse::<ParameterType>().unwrap(), ParameterType::Amp);
        assert!("volume".parse::<ParameterType>().is_err());
    }
}
