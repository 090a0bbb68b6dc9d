use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::audio_models::AudioBuffer;
use super::options::AudioConstraints;

/// Returned by `start()`; identifies the recording that `stop()` will finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHandle {
    pub id: String,
    pub mime_type: String,
    pub started_at: String,
}

/// Result of a finished recording. Owned by the caller of `stop()`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    /// `None` when the captured bytes could not be decoded.
    pub audio_buffer: Option<AudioBuffer>,
    /// Concatenation of every captured chunk, in arrival order.
    pub raw: Vec<u8>,
    pub mime_type: String,
    pub duration_secs: f64,
    pub sample_rate: f64,
    pub channels: u16,
    pub decode_error: Option<String>,
    pub metadata: RecordingMetadata,
}

impl RecordingResult {
    pub fn is_decoded(&self) -> bool {
        self.audio_buffer.is_some()
    }
}

/// Descriptive record of a capture, serializable for the project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub mime_type: String,
    pub bit_rate: u32,
    pub constraints: AudioConstraints,
    pub chunk_count: usize,
    pub byte_length: usize,
    pub checksum: String,
    /// Elapsed time counted by the recording ticker.
    pub recorded_secs: f64,
}

impl RecordingMetadata {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("failed to serialize metadata: {}", e))
    }
}

/// SHA-256 hex digest of captured bytes.
pub fn checksum(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_empty_input() {
        assert_eq!(
            checksum(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn metadata_json_uses_camel_case() {
        let metadata = RecordingMetadata {
            id: "rec-1".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
            mime_type: "audio/webm".into(),
            bit_rate: 128_000,
            constraints: AudioConstraints::default(),
            chunk_count: 3,
            byte_length: 450,
            checksum: checksum(b"abc"),
            recorded_secs: 0.3,
        };

        let json = metadata.to_json().unwrap();
        assert!(json.contains("\"chunkCount\": 3"));
        assert!(json.contains("\"echoCancellation\": true"));

        let parsed: RecordingMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }
}
