//! Amplitude Modulation Effect
//!
//! Multiplies each sample by `offset + sin(phase + i * frequency) * amp`,
//! where `i` is the sample's absolute index in the buffer.

use crate::dsp::effect::{AmpModSettings, Effect};

impl Effect for AmpModSettings {
    fn process_signal(&self, signal: &mut [f32], start_index: usize) {
        for (n, sample) in signal.iter_mut().enumerate() {
            let i = (start_index + n) as f64;
            let gain = self.offset + (self.phase + i * self.frequency).sin() * self.amp;
            *sample = (*sample as f64 * gain) as f32;
        }
    }

    fn effect_type(&self) -> &'static str {
        "amp_mod"
    }
}
