//! 16-bit little-endian PCM (`audio/L16`) helpers.

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM (little-endian bytes).
///
/// Clamps out-of-range values. Output length = `samples.len() * 2` bytes.
pub fn encode_i16_le(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// Convert 16-bit little-endian PCM back to f32 samples.
pub fn decode_i16_le(data: &[u8]) -> Result<Vec<f32>, String> {
    if data.len() % 2 != 0 {
        return Err(format!("truncated PCM payload: {} bytes is not a whole number of samples", data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / i16::MAX as f32)
        .collect())
}
