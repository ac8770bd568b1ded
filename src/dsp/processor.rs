//! Signal processor
//!
//! Applies one effect to a decoded sample buffer. The first
//! [`HEADER_LENGTH`] samples hold the bitmap container header and are never
//! treated as signal.

use log::debug;

use crate::dsp::effect::EffectSettings;

/// Length of the bitmap header that always passes through untouched
pub const HEADER_LENGTH: usize = 54;

/// Apply `settings` to `samples`, returning a buffer of the same length
pub fn process(samples: &[f32], settings: &EffectSettings) -> Vec<f32> {
    let mut output = samples.to_vec();
    if output.len() <= HEADER_LENGTH {
        debug!(
            "buffer of {} samples has no signal past the header",
            output.len()
        );
        return output;
    }

    let effect = settings.as_effect();
    debug!(
        "applying {} to {} samples",
        effect.effect_type(),
        output.len() - HEADER_LENGTH
    );
    effect.process_signal(&mut output[HEADER_LENGTH..], HEADER_LENGTH);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::effect::{AmpModSettings, DelaySettings, ShuffleSettings};
    use approx::assert_relative_eq;

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i as f32) * 0.37).sin() * 0.8).collect()
    }

    fn all_effects() -> Vec<EffectSettings> {
        vec![
            EffectSettings::AmpMod(AmpModSettings {
                frequency: 0.3,
                phase: 0.2,
                amp: 4.0,
                offset: -1.0,
            }),
            EffectSettings::Delay(DelaySettings {
                delay: 7.3,
                feedback: 0.8,
                mix: 0.6,
            }),
            EffectSettings::Shuffle(ShuffleSettings {
                segments: 6,
                seed: 11,
            }),
        ]
    }

    #[test]
    fn test_header_untouched_and_length_kept() {
        let input = test_signal(300);
        for settings in all_effects() {
            let output = process(&input, &settings);
            assert_eq!(output.len(), input.len());
            assert_eq!(&output[..HEADER_LENGTH], &input[..HEADER_LENGTH]);
        }
    }

    #[test]
    fn test_short_buffer_unchanged() {
        let input = test_signal(HEADER_LENGTH);
        for settings in all_effects() {
            assert_eq!(process(&input, &settings), input);
        }
        assert!(process(&[], &EffectSettings::default()).is_empty());
    }

    #[test]
    fn test_amp_zero_scales_signal_by_offset() {
        let input = test_signal(200);
        let settings = EffectSettings::AmpMod(AmpModSettings {
            frequency: 1.7,
            phase: 0.4,
            amp: 0.0,
            offset: 0.25,
        });
        let output = process(&input, &settings);
        for i in HEADER_LENGTH..input.len() {
            assert_relative_eq!(output[i], input[i] * 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_amp_mod_identity() {
        let input = test_signal(200);
        let output = process(&input, &EffectSettings::AmpMod(AmpModSettings::default()));
        assert_eq!(output, input);
    }

    #[test]
    fn test_delay_measured_from_header_end() {
        let input = test_signal(120);
        let settings = EffectSettings::Delay(DelaySettings {
            delay: 5.0,
            feedback: 0.0,
            mix: 1.0,
        });
        let output = process(&input, &settings);
        for i in HEADER_LENGTH..HEADER_LENGTH + 5 {
            assert_eq!(output[i], 0.0);
        }
        for i in HEADER_LENGTH + 5..input.len() {
            assert_relative_eq!(output[i], input[i - 5], epsilon = 1e-6);
        }
    }
}
