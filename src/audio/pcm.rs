/// Encode float samples in [-1, 1] as little-endian signed 16-bit PCM.
/// Non-finite samples become silence, matching the guard the output
/// callback applies before handing frames to the device.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let sample = if sample.is_finite() { sample } else { 0.0 };
        let value = (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode little-endian PCM16 back to floats. Trailing odd bytes are
/// ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32767.0)
        .collect()
}
