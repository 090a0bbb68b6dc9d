use serde::{Deserialize, Serialize};

/// Constraints applied when requesting the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    pub sample_rate: u32,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: false,
            sample_rate: 44100,
        }
    }
}

/// Per-recording overrides; unset fields keep the engine defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintOverrides {
    pub echo_cancellation: Option<bool>,
    pub noise_suppression: Option<bool>,
    pub auto_gain_control: Option<bool>,
    pub sample_rate: Option<u32>,
}

impl ConstraintOverrides {
    pub fn apply_to(&self, base: AudioConstraints) -> AudioConstraints {
        AudioConstraints {
            echo_cancellation: self.echo_cancellation.unwrap_or(base.echo_cancellation),
            noise_suppression: self.noise_suppression.unwrap_or(base.noise_suppression),
            auto_gain_control: self.auto_gain_control.unwrap_or(base.auto_gain_control),
            sample_rate: self.sample_rate.unwrap_or(base.sample_rate),
        }
    }
}

/// Options accepted by `start()`.
///
/// Deserializes from the JSON the studio UI sends:
/// `{"audioConstraints": {"echoCancellation": false}, "bitRate": 192000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingOptions {
    pub audio_constraints: ConstraintOverrides,
    pub bit_rate: Option<u32>,
}

impl RecordingOptions {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid recording options: {}", e))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bit_rate == Some(0) {
            return Err("bit rate must be positive".into());
        }
        if self.audio_constraints.sample_rate == Some(0) {
            return Err("sample rate constraint must be positive".into());
        }
        Ok(())
    }
}

/// Options handed to the recorder factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderOptions {
    pub mime_type: String,
    pub bits_per_second: u32,
}
