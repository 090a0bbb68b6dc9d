use serde::{Deserialize, Serialize};

/// Lifecycle of the audio-processing context.
///
/// ```text
/// uninitialized → suspended ⇄ running → closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Uninitialized,
    Suspended,
    Running,
    Closed,
}

/// Latency preference handed to the host when constructing a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyHint {
    Interactive,
    Balanced,
    Playback,
}

/// Options used to construct an audio context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextOptions {
    pub sample_rate: f64,
    pub latency_hint: LatencyHint,
}

/// Microphone permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    /// The host has no permission query; capture should be attempted anyway.
    Unsupported,
}

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub label: String,
    pub is_default: bool,
}

/// Real-time input level (both normalized to 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelSample {
    pub average: f32,
    pub peak: f32,
}

/// Decoded, sample-accurate audio: one `Vec<f32>` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: f64,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Channels shorter than the longest one are zero-padded so every channel
    /// has the same length.
    pub fn new(sample_rate: f64, mut channels: Vec<Vec<f32>>) -> Self {
        let length = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(length, 0.0);
        }
        Self { sample_rate, channels }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Frames per channel.
    pub fn length(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.length() as f64 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

/// Read-only capability report assembled before a capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureDiagnostics {
    pub permission: PermissionState,
    pub capture_supported: bool,
    /// Container the recorder would use, if any is supported.
    pub selected_mime_type: Option<String>,
    /// `None` when the host cannot enumerate devices without prompting.
    pub input_devices: Option<usize>,
    pub needs_user_interaction: bool,
}
