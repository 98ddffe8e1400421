use crate::audio::WaveformBuffer;
use crate::state::Position3D;

/// Distance attenuation constant k in `1 / (1 + k·d)`.
pub const DISTANCE_ATTENUATION_K: f32 = 0.1;

/// Pans a mono cue into interleaved stereo from a listener-relative
/// position. Azimuth comes from `atan2(x, z)` so straight ahead is 0°
/// and +90° is hard left of the pan law's zero; gains follow a
/// constant-power half-angle law: equal on both channels at 0°, right
/// channel fully closed at +90°, left fully closed at −90°.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialProcessor;

impl SpatialProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Azimuth of a position in degrees.
    pub fn angle_degrees(position: Position3D) -> f32 {
        position.x.atan2(position.z).to_degrees()
    }

    /// Per-channel (left, right) gains including distance attenuation.
    pub fn gains(position: Position3D) -> (f32, f32) {
        let angle = Self::angle_degrees(position);
        let distance = position.magnitude();
        let attenuation = 1.0 / (1.0 + DISTANCE_ATTENUATION_K * distance);
        let left = ((angle - 90.0) / 2.0).to_radians().cos() * attenuation;
        let right = ((angle + 90.0) / 2.0).to_radians().cos() * attenuation;
        (left, right)
    }

    pub fn process(&self, mono: &WaveformBuffer, position: Position3D) -> WaveformBuffer {
        let (left_gain, right_gain) = Self::gains(position);
        let mut samples = Vec::with_capacity(mono.len() * 2);
        for &s in &mono.samples {
            samples.push(s * left_gain);
            samples.push(s * right_gain);
        }
        WaveformBuffer::new(samples, mono.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn test_centered_source_has_equal_gains() {
        let (left, right) = SpatialProcessor::gains(Position3D::new(0.0, 0.0, 1.0));
        assert!(
            (left - right).abs() < 1e-4,
            "gains at 0° should match: left={}, right={}",
            left,
            right
        );
        assert!(left > 0.0);
    }

    #[test]
    fn test_ninety_degrees_closes_the_right_channel() {
        let (left, right) = SpatialProcessor::gains(Position3D::new(1.0, 0.0, 0.0));
        assert!(
            right.abs() < 1e-4,
            "right gain at +90° should vanish, got {}",
            right
        );
        assert!(left > 0.5, "left gain at +90° should carry the signal");
    }

    #[test]
    fn test_minus_ninety_closes_the_left_channel() {
        let (left, right) = SpatialProcessor::gains(Position3D::new(-1.0, 0.0, 0.0));
        assert!(left.abs() < 1e-4, "left gain at −90° should vanish, got {}", left);
        assert!(right > 0.5);
    }

    #[test]
    fn test_distance_attenuation_curve() {
        let near = SpatialProcessor::gains(Position3D::new(0.0, 0.0, 0.5)).0;
        let far = SpatialProcessor::gains(Position3D::new(0.0, 0.0, 10.0)).0;
        let expected_near = (45.0f32).to_radians().cos() / (1.0 + 0.1 * 0.5);
        let expected_far = (45.0f32).to_radians().cos() / (1.0 + 0.1 * 10.0);

        assert!((near - expected_near).abs() < 1e-5);
        assert!((far - expected_far).abs() < 1e-5);
        assert!(near > far, "closer sources should be louder");
    }

    #[test]
    fn test_process_interleaves_stereo() {
        let mono = WaveformBuffer::new(vec![0.5, -0.5, 0.25], SAMPLE_RATE);
        let stereo = SpatialProcessor::new().process(&mono, Position3D::new(0.0, 0.0, 1.0));

        assert_eq!(stereo.len(), 6, "stereo output is twice the mono length");
        let (left_gain, right_gain) = SpatialProcessor::gains(Position3D::new(0.0, 0.0, 1.0));
        assert!((stereo.samples[0] - 0.5 * left_gain).abs() < 1e-6);
        assert!((stereo.samples[1] - 0.5 * right_gain).abs() < 1e-6);
    }
}
