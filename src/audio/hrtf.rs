use crate::audio::spatial::SpatialProcessor;
use crate::audio::{WaveformBuffer, PI};
use crate::state::Position3D;
use once_cell::sync::Lazy;

/// Discrete azimuths the filter bank covers, in degrees.
pub const HRTF_ANGLES: [f32; 5] = [-90.0, -45.0, 0.0, 45.0, 90.0];

/// Samples per filter.
pub const FILTER_LEN: usize = 64;

// Precomputed once, read-only afterwards. Each filter is a decaying
// cosine whose phase offset encodes the source azimuth:
// filter[j] = exp(-2j/N) * cos(4π·j/N + angle·π/180).
static FILTER_BANK: Lazy<[[f32; FILTER_LEN]; HRTF_ANGLES.len()]> = Lazy::new(|| {
    let mut bank = [[0.0; FILTER_LEN]; HRTF_ANGLES.len()];
    for (k, angle) in HRTF_ANGLES.iter().enumerate() {
        for (j, coeff) in bank[k].iter_mut().enumerate() {
            let n = j as f32 / FILTER_LEN as f32;
            *coeff = (-2.0 * n).exp() * (4.0 * PI * n + angle * PI / 180.0).cos();
        }
    }
    bank
});

/// Approximates directional timbre with a five-angle filter bank: the
/// signal azimuth picks the nearest table angle, whose filter is applied
/// as a cyclic elementwise gain. A lightweight stand-in for convolution
/// against measured head data, which is an explicit non-goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct HrtfProcessor;

impl HrtfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Index of the table angle nearest to `angle_deg`. Ties keep the
    /// earlier entry (table iteration order, most negative first).
    pub fn nearest_angle_index(angle_deg: f32) -> usize {
        let mut best = 0;
        let mut best_dist = (angle_deg - HRTF_ANGLES[0]).abs();
        for (k, angle) in HRTF_ANGLES.iter().enumerate().skip(1) {
            let dist = (angle_deg - angle).abs();
            if dist < best_dist {
                best = k;
                best_dist = dist;
            }
        }
        best
    }

    pub fn filter(index: usize) -> &'static [f32; FILTER_LEN] {
        &FILTER_BANK[index]
    }

    pub fn apply(&self, stereo: &mut WaveformBuffer, position: Position3D) {
        let angle = SpatialProcessor::angle_degrees(position);
        let filter = &FILTER_BANK[Self::nearest_angle_index(angle)];
        for (i, sample) in stereo.samples.iter_mut().enumerate() {
            *sample *= filter[i % FILTER_LEN];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn test_nearest_angle_selection() {
        assert_eq!(HrtfProcessor::nearest_angle_index(0.0), 2);
        assert_eq!(HrtfProcessor::nearest_angle_index(50.0), 3);
        assert_eq!(HrtfProcessor::nearest_angle_index(89.0), 4);
        assert_eq!(HrtfProcessor::nearest_angle_index(-60.0), 0);
        assert_eq!(HrtfProcessor::nearest_angle_index(-44.0), 1);
        // Out-of-table azimuths clamp to the edge entries.
        assert_eq!(HrtfProcessor::nearest_angle_index(179.0), 4);
        assert_eq!(HrtfProcessor::nearest_angle_index(-179.0), 0);
    }

    #[test]
    fn test_ties_keep_the_earlier_table_entry() {
        // -67.5° is exactly halfway between -90° and -45°.
        assert_eq!(HrtfProcessor::nearest_angle_index(-67.5), 0);
        // 67.5° is exactly halfway between 45° and 90°.
        assert_eq!(HrtfProcessor::nearest_angle_index(67.5), 3);
    }

    #[test]
    fn test_filter_values_decay_and_stay_finite() {
        for k in 0..HRTF_ANGLES.len() {
            let filter = HrtfProcessor::filter(k);
            assert!(filter.iter().all(|c| c.is_finite()));
            // The exponential keeps every coefficient within the first
            // sample's envelope.
            let head = filter[0].abs().max(1.0);
            assert!(
                filter.iter().all(|c| c.abs() <= head),
                "filter {} grew past its head coefficient",
                k
            );
        }
        // First coefficient of the 0° filter is exp(0)*cos(0) = 1.
        assert!((HrtfProcessor::filter(2)[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_cycles_the_filter() {
        let mut stereo = WaveformBuffer::new(vec![1.0; FILTER_LEN * 2 + 3], SAMPLE_RATE);
        HrtfProcessor::new().apply(&mut stereo, Position3D::new(0.0, 0.0, 1.0));
        let filter = HrtfProcessor::filter(2);

        assert!((stereo.samples[0] - filter[0]).abs() < 1e-6);
        assert!((stereo.samples[FILTER_LEN] - filter[0]).abs() < 1e-6);
        assert!((stereo.samples[FILTER_LEN + 5] - filter[5]).abs() < 1e-6);
    }
}
