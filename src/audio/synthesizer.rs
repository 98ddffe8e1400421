use crate::audio::envelopes::AttackReleaseEnvelope;
use crate::audio::{sec_to_samples, WaveformBuffer, TWO_PI};
use crate::events::CueLabel;

const RHYTHM_FREQ: f32 = 440.0;
const SWEEP_DURATION: f32 = 0.8;
const RHYTHM_DURATION: f32 = 1.0;
const CHORD_DURATION: f32 = 0.6;

/// Pure waveform generators for guidance cues. Deterministic by design:
/// the same inputs always produce bit-identical buffers, which keeps the
/// whole render chain testable sample-for-sample.
#[derive(Debug, Clone, Copy)]
pub struct AudioSynthesizer {
    sample_rate: f32,
    envelope: AttackReleaseEnvelope,
}

impl AudioSynthesizer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            envelope: AttackReleaseEnvelope::default(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Sine tone at half scale: `sin(2π·f·i/sr) * 0.5`.
    pub fn tone(&self, freq_hz: f32, duration: f32) -> WaveformBuffer {
        let len = sec_to_samples(duration, self.sample_rate);
        let samples = (0..len)
            .map(|i| (TWO_PI * freq_hz * i as f32 / self.sample_rate).sin() * 0.5)
            .collect();
        self.finish(samples)
    }

    /// Glide from `f0` to `f1`. The instantaneous frequency is linearly
    /// interpolated and accumulated into a running phase; evaluating
    /// `sin(2π·f(i)·i/sr)` directly would chirp twice as far.
    pub fn sweep(&self, f0: f32, f1: f32, duration: f32) -> WaveformBuffer {
        let len = sec_to_samples(duration, self.sample_rate);
        let mut samples = Vec::with_capacity(len);
        let mut phase = 0.0f32;
        for i in 0..len {
            let t = if len > 1 {
                i as f32 / (len - 1) as f32
            } else {
                0.0
            };
            let freq = f0 + (f1 - f0) * t;
            samples.push((TWO_PI * phase).sin() * 0.5);
            phase += freq / self.sample_rate;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }
        self.finish(samples)
    }

    /// 440 Hz bursts on a fixed grid: the first quarter of every beat
    /// period sounds, the rest is silence.
    pub fn rhythm(&self, beat_interval: f32, duration: f32) -> WaveformBuffer {
        let len = sec_to_samples(duration, self.sample_rate);
        let beat_samples = sec_to_samples(beat_interval, self.sample_rate).max(1);
        let burst_samples = beat_samples / 4;
        let samples = (0..len)
            .map(|i| {
                if i % beat_samples < burst_samples {
                    (TWO_PI * RHYTHM_FREQ * i as f32 / self.sample_rate).sin() * 0.5
                } else {
                    0.0
                }
            })
            .collect();
        self.finish(samples)
    }

    /// Sum of tones, each contributing `1/len(freqs)` of the total so the
    /// peak stays at or below 0.5.
    pub fn chord(&self, freqs: &[f32], duration: f32) -> WaveformBuffer {
        let len = sec_to_samples(duration, self.sample_rate);
        if freqs.is_empty() {
            return WaveformBuffer::silence(len, self.sample_rate);
        }
        let share = 1.0 / freqs.len() as f32;
        let samples = (0..len)
            .map(|i| {
                freqs
                    .iter()
                    .map(|f| (TWO_PI * f * i as f32 / self.sample_rate).sin() * 0.5 * share)
                    .sum()
            })
            .collect();
        self.finish(samples)
    }

    /// Fixed cue-label → generator lookup.
    pub fn cue(&self, label: CueLabel) -> WaveformBuffer {
        match label {
            CueLabel::Left
            | CueLabel::Right
            | CueLabel::Up
            | CueLabel::Down
            | CueLabel::Forward
            | CueLabel::Back => self.rhythm(0.25, RHYTHM_DURATION),
            CueLabel::RotateLeft => self.sweep(440.0, 330.0, SWEEP_DURATION),
            CueLabel::RotateRight => self.sweep(440.0, 550.0, SWEEP_DURATION),
            CueLabel::SlowDown => self.sweep(550.0, 330.0, SWEEP_DURATION),
            CueLabel::SpeedUp => self.sweep(330.0, 550.0, SWEEP_DURATION),
            CueLabel::Confirmation => self.tone(660.0, 0.2),
            CueLabel::Startup => self.chord(&[330.0, 440.0, 550.0], CHORD_DURATION),
            CueLabel::Shutdown => self.chord(&[550.0, 440.0, 330.0], CHORD_DURATION),
        }
    }

    fn finish(&self, samples: Vec<f32>) -> WaveformBuffer {
        let mut buffer = WaveformBuffer::new(samples, self.sample_rate);
        self.envelope.apply(&mut buffer);
        buffer
    }
}
