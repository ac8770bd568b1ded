//! Segment Shuffle Effect
//!
//! Splits the signal into `segments` contiguous groups of `len / segments`
//! samples (the last group absorbs the remainder) and reorders the groups
//! with a Fisher-Yates shuffle driven by SplitMix64 seeded from
//! `ShuffleSettings::seed`. The same settings always give the same order.

use crate::dsp::effect::{Effect, ShuffleSettings};

/// SplitMix64 generator
struct Rng64 {
    state: u64,
}

impl Rng64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `0..bound`
    fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// Order in which the groups are laid out in the output
pub fn segment_order(segments: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..segments).collect();
    let mut rng = Rng64::new(seed);
    for i in (1..segments).rev() {
        let j = rng.below(i + 1);
        order.swap(i, j);
    }
    order
}

/// Group boundaries as `(start, end)` pairs over a signal of `len` samples
fn segment_bounds(len: usize, segments: usize) -> Vec<(usize, usize)> {
    let size = len / segments;
    (0..segments)
        .map(|k| {
            let start = k * size;
            let end = if k + 1 == segments { len } else { start + size };
            (start, end)
        })
        .collect()
}

impl Effect for ShuffleSettings {
    fn process_signal(&self, signal: &mut [f32], _start_index: usize) {
        let segments = (self.segments as usize).clamp(1, signal.len().max(1));
        if segments == 1 {
            return;
        }

        let bounds = segment_bounds(signal.len(), segments);
        let order = segment_order(segments, self.seed);

        let mut shuffled = Vec::with_capacity(signal.len());
        for &group in &order {
            let (start, end) = bounds[group];
            shuffled.extend_from_slice(&signal[start..end]);
        }
        signal.copy_from_slice(&shuffled);
    }

    fn effect_type(&self) -> &'static str {
        "shuffle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_order_is_permutation() {
        for segments in 1..20 {
            let mut order = segment_order(segments, 42);
            order.sort_unstable();
            assert_eq!(order, (0..segments).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        assert_eq!(segment_order(8, 3), segment_order(8, 3));
        assert_ne!(segment_order(8, 3), segment_order(8, 4));
    }

    #[test]
    fn test_single_segment_is_identity() {
        let settings = ShuffleSettings {
            segments: 1,
            seed: 9,
        };
        let mut signal = numbered(10);
        settings.process_signal(&mut signal, 54);
        assert_eq!(signal, numbered(10));
    }

    #[test]
    fn test_groups_stay_contiguous() {
        let settings = ShuffleSettings {
            segments: 3,
            seed: 5,
        };
        // 10 samples: groups [0..3], [3..6], [6..10]
        let mut signal = numbered(10);
        settings.process_signal(&mut signal, 0);

        let order = segment_order(3, 5);
        let bounds = segment_bounds(10, 3);
        let expected: Vec<f32> = order
            .iter()
            .flat_map(|&g| (bounds[g].0..bounds[g].1).map(|i| i as f32))
            .collect();
        assert_eq!(signal, expected);

        let mut sorted = signal.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, numbered(10));
    }

    #[test]
    fn test_more_segments_than_samples() {
        let settings = ShuffleSettings {
            segments: 50,
            seed: 1,
        };
        let mut signal = numbered(4);
        settings.process_signal(&mut signal, 0);
        let mut sorted = signal.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, numbered(4));

        let mut empty: Vec<f32> = Vec::new();
        settings.process_signal(&mut empty, 0);
        assert!(empty.is_empty());
    }
}
