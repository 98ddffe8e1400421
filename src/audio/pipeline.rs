use crate::audio::environment::EnvironmentAdapter;
use crate::audio::hrtf::HrtfProcessor;
use crate::audio::pcm::encode_pcm16;
use crate::audio::spatial::SpatialProcessor;
use crate::audio::synthesizer::AudioSynthesizer;
use crate::error::EngineError;
use crate::events::GuidanceEvent;
use crate::state::{Environment, Orientation};
use tracing::debug;

/// The full cue render chain: synthesize a mono waveform, pan it to the
/// event's position, shade it with the HRTF bank, run the environment
/// profile, and emit PCM16 bytes for the sink.
pub struct RenderPipeline {
    synthesizer: AudioSynthesizer,
    spatial: SpatialProcessor,
    hrtf: HrtfProcessor,
    environment: EnvironmentAdapter,
}

impl RenderPipeline {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            synthesizer: AudioSynthesizer::new(sample_rate),
            spatial: SpatialProcessor::new(),
            hrtf: HrtfProcessor::new(),
            environment: EnvironmentAdapter::new(),
        }
    }

    pub fn render(
        &self,
        event: &GuidanceEvent,
        orientation: Orientation,
        environment: Environment,
    ) -> Result<Vec<u8>, EngineError> {
        let mono = self.synthesizer.cue(event.label);
        if mono.is_empty() {
            return Err(EngineError::Synthesis(format!(
                "cue '{}' rendered an empty buffer",
                event.label.as_str()
            )));
        }

        // World-anchored target heard through the current head pose.
        let position = orientation.rotate_inverse(event.target.scaled(event.distance));

        let mut stereo = self.spatial.process(&mono, position);
        self.hrtf.apply(&mut stereo, position);
        self.environment.apply(&mut stereo, environment);

        if stereo.samples.iter().any(|s| !s.is_finite()) {
            return Err(EngineError::Synthesis(format!(
                "cue '{}' produced non-finite samples",
                event.label.as_str()
            )));
        }

        debug!(
            label = event.label.as_str(),
            samples = stereo.len(),
            "rendered cue"
        );
        Ok(encode_pcm16(&stereo.samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::decode_pcm16;
    use crate::audio::{sec_to_samples, SAMPLE_RATE};
    use crate::events::{CueLabel, GuidanceEvent, GuidanceKind};

    #[test]
    fn test_confirmation_cue_renders_expected_byte_count() {
        let pipeline = RenderPipeline::new(SAMPLE_RATE);
        let event = GuidanceEvent::confirmation();
        let bytes = pipeline
            .render(&event, Orientation::identity(), Environment::Outdoor)
            .expect("render should succeed");

        // 0.2 s mono at 44100 Hz, stereo-interleaved, two bytes a sample.
        let expected = sec_to_samples(0.2, SAMPLE_RATE) * 2 * 2;
        assert_eq!(bytes.len(), expected);
    }

    #[test]
    fn test_right_cue_lands_on_the_correct_channel() {
        let pipeline = RenderPipeline::new(SAMPLE_RATE);
        let event = GuidanceEvent::new(GuidanceKind::Position, CueLabel::Right, 0.03);
        let bytes = pipeline
            .render(&event, Orientation::identity(), Environment::Outdoor)
            .expect("render should succeed");
        let samples = decode_pcm16(&bytes);

        // A 'right' cue sits at +90°, which the pan law renders with the
        // right channel closed.
        let mut left_peak = 0.0f32;
        let mut right_peak = 0.0f32;
        for frame in samples.chunks_exact(2) {
            left_peak = left_peak.max(frame[0].abs());
            right_peak = right_peak.max(frame[1].abs());
        }
        println!("right cue peaks: left={}, right={}", left_peak, right_peak);
        assert!(left_peak > 0.05, "open channel should carry the cue");
        assert!(
            right_peak < 1e-3,
            "closed channel should stay silent, got {}",
            right_peak
        );
    }

    #[test]
    fn test_putting_green_render_is_attenuated() {
        let pipeline = RenderPipeline::new(SAMPLE_RATE);
        let event = GuidanceEvent::confirmation();

        let outdoor = pipeline
            .render(&event, Orientation::identity(), Environment::Outdoor)
            .unwrap();
        let green = pipeline
            .render(&event, Orientation::identity(), Environment::PuttingGreen)
            .unwrap();

        let outdoor_samples = decode_pcm16(&outdoor);
        let green_samples = decode_pcm16(&green);
        for (o, g) in outdoor_samples.iter().zip(green_samples.iter()) {
            // One LSB of slack for the double quantization.
            assert!(
                (g - o * 0.8).abs() < 2.0 / 32768.0,
                "green sample {} should be 0.8x outdoor sample {}",
                g,
                o
            );
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let pipeline = RenderPipeline::new(SAMPLE_RATE);
        let event = GuidanceEvent::new(GuidanceKind::Alignment, CueLabel::RotateLeft, 1.0);
        let a = pipeline
            .render(&event, Orientation::identity(), Environment::Indoor)
            .unwrap();
        let b = pipeline
            .render(&event, Orientation::identity(), Environment::Indoor)
            .unwrap();
        assert_eq!(a, b);
    }
}
