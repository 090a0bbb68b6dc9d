use serde::Serialize;

use vocal_capture_core::{LevelSample, RecordingResult, RecordingState, SessionError, SessionObserver};

/// SessionObserver that prints every event as one JSON line on stdout.
pub struct ConsoleObserver {
    show_levels: bool,
}

impl ConsoleObserver {
    pub fn new(show_levels: bool) -> Self {
        Self { show_levels }
    }

    fn emit<T: Serialize>(&self, event: &str, payload: T) {
        match serde_json::to_string(&Event { event, payload }) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Failed to serialize {} event: {}", event, e),
        }
    }
}

#[derive(Serialize)]
struct Event<'a, T> {
    event: &'a str,
    payload: T,
}

// -- Event payloads --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateChangedPayload {
    state: &'static str,
    elapsed_secs: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelsPayload {
    average: f32,
    peak: f32,
    meter: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    kind: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinishedPayload {
    id: String,
    mime_type: String,
    byte_length: usize,
    decoded: bool,
    duration_secs: f64,
}

impl SessionObserver for ConsoleObserver {
    fn on_state_changed(&self, state: &RecordingState) {
        self.emit(
            "state-changed",
            StateChangedPayload {
                state: state.label(),
                elapsed_secs: state.elapsed().unwrap_or(0.0),
            },
        );
    }

    fn on_levels_updated(&self, levels: &LevelSample) {
        if !self.show_levels {
            return;
        }
        self.emit(
            "levels-updated",
            LevelsPayload {
                average: levels.average,
                peak: levels.peak,
                meter: meter_bar(levels.peak, 20),
            },
        );
    }

    fn on_error(&self, error: &SessionError) {
        self.emit(
            "error",
            ErrorPayload {
                kind: error.kind.to_string(),
                message: error.message.clone(),
            },
        );
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.emit(
            "recording-finished",
            FinishedPayload {
                id: result.metadata.id.clone(),
                mime_type: result.mime_type.clone(),
                byte_length: result.raw.len(),
                decoded: result.is_decoded(),
                duration_secs: result.duration_secs,
            },
        );
    }
}

fn meter_bar(level: f32, width: usize) -> String {
    let filled = ((level.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_bar_is_clamped() {
        assert_eq!(meter_bar(0.0, 4), "----");
        assert_eq!(meter_bar(0.5, 4), "##--");
        assert_eq!(meter_bar(3.0, 4), "####");
    }
}
