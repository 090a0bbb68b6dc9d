use std::time::Duration;

use super::audio_models::{ContextOptions, LatencyHint};
use super::options::AudioConstraints;

/// Default container preference, most preferred first.
pub const DEFAULT_MIME_PREFERENCES: [&str; 3] = ["audio/webm;codecs=opus", "audio/webm", "audio/mp4"];

/// Engine-wide configuration shared by every component of a studio session.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Target sample rate of the audio context in Hz (default: 44100).
    pub sample_rate: f64,

    /// Latency preference for the audio context (default: interactive).
    pub latency_hint: LatencyHint,

    /// Analyser window size used by the level monitor (default: 512).
    pub fft_size: usize,

    /// Level sampling period (default: 16 ms, roughly the display refresh).
    pub meter_interval: Duration,

    /// Multiplicative peak-hold decay applied every meter tick (default: 0.95).
    pub peak_decay: f32,

    /// Chunk delivery interval requested from the recorder (default: 100 ms).
    pub chunk_timeslice: Duration,

    /// Resolution of the elapsed-time counter (default: 100 ms).
    pub tick_interval: Duration,

    /// Recording containers in order of preference.
    pub mime_preferences: Vec<String>,

    /// Constraints used when a recording does not override them.
    pub default_constraints: AudioConstraints,

    /// Encoder bit rate used when a recording does not set one (default: 128000).
    pub default_bit_rate: u32,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(format!("unsupported fft size: {}", self.fft_size));
        }
        if !(0.0..1.0).contains(&self.peak_decay) {
            return Err(format!("peak decay must be in [0, 1): {}", self.peak_decay));
        }
        if self.meter_interval.is_zero() || self.chunk_timeslice.is_zero() || self.tick_interval.is_zero() {
            return Err("intervals must be non-zero".into());
        }
        if self.mime_preferences.is_empty() {
            return Err("at least one container preference is required".into());
        }
        if self.default_bit_rate == 0 {
            return Err("default bit rate must be positive".into());
        }
        Ok(())
    }

    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            sample_rate: self.sample_rate,
            latency_hint: self.latency_hint,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            latency_hint: LatencyHint::Interactive,
            fft_size: 512,
            meter_interval: Duration::from_millis(16),
            peak_decay: 0.95,
            chunk_timeslice: Duration::from_millis(100),
            tick_interval: Duration::from_millis(100),
            mime_preferences: DEFAULT_MIME_PREFERENCES.iter().map(|m| m.to_string()).collect(),
            default_constraints: AudioConstraints::default(),
            default_bit_rate: 128_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mime_preferences[0], "audio/webm;codecs=opus");
        assert_eq!(config.context_options().latency_hint, LatencyHint::Interactive);
    }

    #[test]
    fn rejects_bad_fft_size() {
        let config = EngineConfig {
            fft_size: 500,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("fft size"));
    }

    #[test]
    fn rejects_non_decaying_peak() {
        let config = EngineConfig {
            peak_decay: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_preferences() {
        let config = EngineConfig {
            mime_preferences: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
