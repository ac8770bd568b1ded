//! Audio envelope extraction
//!
//! Turns a raw audio signal into one loudness value per animation frame:
//! square, moving-average lowpass, square root, then average into
//! per-frame buckets.

use std::collections::VecDeque;

use log::{debug, warn};

/// Extract a per-frame RMS-like envelope
///
/// The output has `floor(len / (source_sample_rate / target_frame_rate))`
/// values, capped at one per sample. Degenerate inputs (no samples, non-positive rates, fewer samples
/// than one frame) give an empty envelope rather than NaN.
pub fn extract(
    raw: &[f32],
    smoothing_window: usize,
    target_frame_rate: f64,
    source_sample_rate: f64,
) -> Vec<f64> {
    if raw.is_empty() || target_frame_rate <= 0.0 || source_sample_rate <= 0.0 {
        warn!("envelope requested from empty or rateless audio");
        return Vec::new();
    }

    let source_samples_per_frame = source_sample_rate / target_frame_rate;
    let mut total_frames = (raw.len() as f64 / source_samples_per_frame).floor() as usize;
    if total_frames > raw.len() {
        // Frames shorter than one sample: one value per sample at most
        warn!(
            "frame rate {} exceeds sample rate {}; capping envelope at {} values",
            target_frame_rate,
            source_sample_rate,
            raw.len()
        );
        total_frames = raw.len();
    }
    if total_frames == 0 {
        warn!(
            "{} samples is shorter than one frame ({:.1} samples)",
            raw.len(),
            source_samples_per_frame
        );
        return Vec::new();
    }
    let samples_per_frame = raw.len() / total_frames;

    let smoothed = smooth(raw, smoothing_window);
    let envelope: Vec<f64> = smoothed
        .chunks_exact(samples_per_frame)
        .take(total_frames)
        .map(|bucket| bucket.iter().sum::<f64>() / bucket.len() as f64)
        .collect();

    debug!(
        "extracted {} envelope frames from {} samples",
        envelope.len(),
        raw.len()
    );
    envelope
}

/// Square, moving-average, square root
fn smooth(raw: &[f32], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut queue: VecDeque<f64> = std::iter::repeat(0.0).take(window).collect();
    let mut sum = 0.0;

    raw.iter()
        .map(|&x| {
            let squared = x as f64 * x as f64;
            queue.push_back(squared);
            sum += squared;
            if let Some(oldest) = queue.pop_front() {
                sum -= oldest;
            }
            // Running subtraction can dip a hair below zero
            (sum / window as f64).max(0.0).sqrt()
        })
        .collect()
}

/// Envelope value for frame `index`, or 0 past the end
#[inline]
pub fn envelope_value_at(envelope: &[f64], index: usize) -> f64 {
    envelope.get(index).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_length_matches_total_frames() {
        // 1000 Hz source at 10 fps: 100 samples per frame
        let raw: Vec<f32> = (0..1050).map(|i| ((i as f32) * 0.1).sin()).collect();
        let envelope = extract(&raw, 8, 10.0, 1000.0);
        assert_eq!(envelope.len(), 10);
        assert!(envelope.iter().all(|v| *v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn test_constant_signal_settles_to_magnitude() {
        let raw = vec![-0.5f32; 400];
        let envelope = extract(&raw, 4, 4.0, 400.0);
        assert_eq!(envelope.len(), 4);
        // The first bucket includes the window warm-up, the rest do not
        assert!(envelope[0] < 0.5);
        for v in &envelope[1..] {
            assert_abs_diff_eq!(*v, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_window_warm_up() {
        let smoothed = smooth(&[1.0, 1.0, 1.0, 1.0], 2);
        assert_abs_diff_eq!(smoothed[0], (0.5f64).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(extract(&[], 4, 30.0, 44100.0).is_empty());
        assert!(extract(&[0.5; 10], 4, 0.0, 44100.0).is_empty());
        assert!(extract(&[0.5; 10], 4, 30.0, 44100.0).is_empty());
        assert_eq!(extract(&[0.5; 10], 0, 1.0, 10.0).len(), 1);
    }

    #[test]
    fn test_frame_rate_above_sample_rate() {
        let envelope = extract(&[0.5f32; 10], 4, 100.0, 10.0);
        assert_eq!(envelope.len(), 10);
        assert!(envelope.iter().all(|v| v.is_finite() && *v >= 0.0));

        let envelope = extract(&[0.5f32; 10], 4, f64::INFINITY, 10.0);
        assert_eq!(envelope.len(), 10);
    }

    #[test]
    fn test_value_past_end_is_zero() {
        let envelope = vec![0.2, 0.4];
        assert_eq!(envelope_value_at(&envelope, 1), 0.4);
        assert_eq!(envelope_value_at(&envelope, 2), 0.0);
        assert_eq!(envelope_value_at(&[], 0), 0.0);
    }
}
