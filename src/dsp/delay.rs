//! Delay Effect
//!
//! Fractional-length circular delay line with a linearly interpolated read
//! tap and clipped feedback. The line is allocated fresh for every call, so
//! no state carries over between buffers.

use crate::dsp::effect::{DelaySettings, Effect};

/// Circular delay line for one processing call
struct DelayLine {
    buffer: Vec<f32>,
    write_index: usize,
    delay: f64,
}

impl DelayLine {
    fn new(delay: f64) -> Self {
        let delay = delay.max(0.0);
        Self {
            buffer: vec![0.0; delay.ceil() as usize],
            write_index: 0,
            delay,
        }
    }

    /// Read the delayed sample for the current write position
    #[inline]
    fn read(&self) -> f32 {
        let len = self.buffer.len();
        let mut read_index = self.write_index as f64 - self.delay;
        if read_index < 0.0 {
            read_index += len as f64;
        }

        // Exact wrap boundary: read fully from the high tap to avoid a click
        let (low, weight) = if read_index == len as f64 {
            (len - 1, 1.0)
        } else {
            (read_index.floor() as usize % len, read_index.rem_euclid(1.0))
        };
        let high = (low + 1) % len;

        (self.buffer[high] as f64 * weight + self.buffer[low] as f64 * (1.0 - weight)) as f32
    }

    #[inline]
    fn write(&mut self, value: f32) {
        self.buffer[self.write_index] = value.clamp(-1.0, 1.0);
        self.write_index = (self.write_index + 1) % self.buffer.len();
    }
}

impl Effect for DelaySettings {
    fn process_signal(&self, signal: &mut [f32], _start_index: usize) {
        let mix = self.mix as f32;
        if self.delay > 0.0 && self.delay >= signal.len() as f64 {
            // The tap never reaches a written sample within this buffer
            for sample in signal.iter_mut() {
                *sample *= 1.0 - mix;
            }
            return;
        }

        let mut line = DelayLine::new(self.delay);
        if line.buffer.is_empty() {
            // Zero delay: the delayed signal is the input itself
            return;
        }

        let feedback = self.feedback as f32;

        for sample in signal.iter_mut() {
            let input = *sample;
            let delayed = line.read();
            line.write(input + delayed * feedback);
            *sample = mix * delayed + (1.0 - mix) * input;
        }
    }

    fn effect_type(&self) -> &'static str {
        "delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / len as f32) - 0.5).collect()
    }

    #[test]
    fn test_integral_delay_shifts_signal() {
        let settings = DelaySettings {
            delay: 8.0,
            feedback: 0.0,
            mix: 1.0,
        };
        let input = ramp(64);
        let mut output = input.clone();
        settings.process_signal(&mut output, 0);

        for n in 0..8 {
            assert_eq!(output[n], 0.0);
        }
        for n in 8..64 {
            assert_abs_diff_eq!(output[n], input[n - 8], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_delay_is_identity() {
        let settings = DelaySettings {
            delay: 0.0,
            feedback: 0.9,
            mix: 1.0,
        };
        let input = ramp(32);
        let mut output = input.clone();
        settings.process_signal(&mut output, 0);
        assert_eq!(output, input);
    }

    #[test]
    fn test_dry_mix_passthrough() {
        let settings = DelaySettings {
            delay: 5.0,
            feedback: 0.7,
            mix: 0.0,
        };
        let input = ramp(40);
        let mut output = input.clone();
        settings.process_signal(&mut output, 0);
        assert_eq!(output, input);
    }

    #[test]
    fn test_fractional_delay_interpolates() {
        let settings = DelaySettings {
            delay: 2.5,
            feedback: 0.0,
            mix: 1.0,
        };
        let mut signal = vec![0.0; 8];
        signal[0] = 1.0;
        settings.process_signal(&mut signal, 0);

        // Impulse lands half on sample 2 and half on sample 3
        assert_abs_diff_eq!(signal[2], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(signal[3], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(signal.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_feedback_repeats_and_clips() {
        let settings = DelaySettings {
            delay: 4.0,
            feedback: 0.5,
            mix: 1.0,
        };
        let mut signal = vec![0.0; 13];
        signal[0] = 1.0;
        settings.process_signal(&mut signal, 0);

        assert_abs_diff_eq!(signal[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(signal[8], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(signal[12], 0.25, epsilon = 1e-6);

        // Feedback path saturates at 1.0
        let loud = DelaySettings {
            delay: 2.0,
            feedback: 1.0,
            mix: 1.0,
        };
        let mut signal = vec![0.9; 12];
        loud.process_signal(&mut signal, 0);
        assert!(signal.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_exact_wrap_reads_high_tap() {
        // A sub-ulp delay wraps the read index to exactly the buffer length
        let delay = 1e-20;
        let mut line = DelayLine::new(delay);
        assert_eq!(line.buffer.len(), 1);
        assert_eq!(0.0 - delay + 1.0, 1.0);

        line.buffer = vec![0.7];
        assert_abs_diff_eq!(line.read(), 0.7, epsilon = 1e-7);

        let settings = DelaySettings {
            delay,
            feedback: 0.0,
            mix: 1.0,
        };
        let input = ramp(16);
        let mut output = input.clone();
        settings.process_signal(&mut output, 0);
        assert_eq!(output[0], 0.0);
        for n in 1..16 {
            assert_abs_diff_eq!(output[n], input[n - 1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_delay_beyond_signal_reads_silence() {
        let input = ramp(32);
        for delay in [32.0, 40.5, 1e30, f64::MAX] {
            let settings = DelaySettings {
                delay,
                feedback: 0.8,
                mix: 0.25,
            };
            let mut output = input.clone();
            settings.process_signal(&mut output, 0);
            for (x, y) in input.iter().zip(&output) {
                assert_abs_diff_eq!(*y, x * 0.75, epsilon = 1e-6);
            }
        }

        // Just inside the signal the line still runs and agrees at the edge
        let settings = DelaySettings {
            delay: 31.0,
            feedback: 0.0,
            mix: 1.0,
        };
        let mut output = input.clone();
        settings.process_signal(&mut output, 0);
        assert_abs_diff_eq!(output[31], input[0], epsilon = 1e-6);
        assert!(output[..31].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_state_not_shared_between_calls() {
        let settings = DelaySettings {
            delay: 3.0,
            feedback: 0.5,
            mix: 1.0,
        };
        let mut first = vec![0.5; 10];
        settings.process_signal(&mut first, 0);
        let mut second = vec![0.0; 10];
        settings.process_signal(&mut second, 0);
        assert!(second.iter().all(|&s| s == 0.0));
    }
}
