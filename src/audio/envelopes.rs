use crate::audio::{sec_to_samples, WaveformBuffer};

/// Linear attack/release shaping for finite cue buffers. Ramps the first
/// `attack_time` seconds up from zero and the last `release_time` seconds
/// back down, so cues start and end without clicks. Each ramp is clipped
/// to the buffer length.
#[derive(Debug, Clone, Copy)]
pub struct AttackReleaseEnvelope {
    attack_time: f32,
    release_time: f32,
}

impl AttackReleaseEnvelope {
    pub fn new(attack_time: f32, release_time: f32) -> Self {
        Self {
            attack_time: attack_time.max(0.0),
            release_time: release_time.max(0.0),
        }
    }

    pub fn apply(&self, buffer: &mut WaveformBuffer) {
        let len = buffer.len();
        if len == 0 {
            return;
        }

        let attack = sec_to_samples(self.attack_time, buffer.sample_rate).min(len);
        let release = sec_to_samples(self.release_time, buffer.sample_rate).min(len);

        for i in 0..attack {
            buffer.samples[i] *= i as f32 / attack as f32;
        }
        for i in (len - release)..len {
            buffer.samples[i] *= (len - i) as f32 / release as f32;
        }
    }
}

impl Default for AttackReleaseEnvelope {
    fn default() -> Self {
        Self::new(0.1, 0.1)
    }
}
