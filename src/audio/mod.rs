pub mod envelopes;
pub mod environment;
pub mod hrtf;
pub mod pcm;
pub mod pipeline;
pub mod spatial;
pub mod synthesizer;

pub const PI: f32 = std::f32::consts::PI;
pub const TWO_PI: f32 = 2.0 * PI;

/// Engine-wide default output sample rate in Hz.
pub const SAMPLE_RATE: f32 = 44100.0;

pub fn sec_to_samples(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate).round() as usize
}

/// A finite run of samples in [-1, 1], mono or interleaved stereo,
/// tagged with the rate it was rendered at. Cues are always bounded;
/// nothing in the engine streams indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: f32,
}

impl WaveformBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn silence(len: usize, sample_rate: f32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sec_to_samples_rounds() {
        assert_eq!(sec_to_samples(0.2, SAMPLE_RATE), 8820);
        assert_eq!(sec_to_samples(1.0, SAMPLE_RATE), 44100);
        // 0.0000113 s * 44100 = 0.498... rounds down
        assert_eq!(sec_to_samples(0.0000113, SAMPLE_RATE), 0);
    }

    #[test]
    fn test_waveform_buffer_peak() {
        let buffer = WaveformBuffer::new(vec![0.1, -0.4, 0.2], SAMPLE_RATE);
        assert!((buffer.peak() - 0.4).abs() < 1e-7);
        assert!(WaveformBuffer::silence(16, SAMPLE_RATE).peak() == 0.0);
    }
}
