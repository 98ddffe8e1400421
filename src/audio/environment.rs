use crate::audio::WaveformBuffer;
use crate::state::Environment;

/// Echo tap position in samples.
const REVERB_DELAY_SAMPLES: usize = 1000;

/// Per-environment effects profiles applied in place after
/// spatialization. Indoor spaces get a single delayed input tap,
/// putting greens soak up level uniformly, open air passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentAdapter;

impl EnvironmentAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, buffer: &mut WaveformBuffer, environment: Environment) {
        match environment {
            Environment::Outdoor => {}
            Environment::Indoor => echo_tap(buffer, 0.2, 0.3),
            Environment::DrivingRange => echo_tap(buffer, 0.1, 0.2),
            Environment::PuttingGreen => {
                for sample in &mut buffer.samples {
                    *sample *= 0.8;
                }
            }
        }
    }
}

/// `out[i] = in[i] + decay·in[i−1000]·amount`, zero tap for i < 1000.
/// The tap reads the dry input, so the echo never compounds.
fn echo_tap(buffer: &mut WaveformBuffer, decay: f32, amount: f32) {
    if buffer.len() <= REVERB_DELAY_SAMPLES {
        return;
    }
    let dry = buffer.samples.clone();
    for i in REVERB_DELAY_SAMPLES..buffer.samples.len() {
        buffer.samples[i] = dry[i] + decay * dry[i - REVERB_DELAY_SAMPLES] * amount;
    }
}
