use crate::models::audio_models::LevelSample;
use crate::models::error::SessionError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecordingState;

/// Event sink for recording session notifications.
///
/// Methods may be called from timer tasks, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait SessionObserver: Send + Sync {
    /// Called when the recording state changes, and on every elapsed-time tick.
    fn on_state_changed(&self, state: &RecordingState);

    /// Called with the current levels on every elapsed-time tick.
    fn on_levels_updated(&self, levels: &LevelSample);

    /// Called when a start or stop fails.
    fn on_error(&self, error: &SessionError);

    /// Called when a recording is finalized, before `stop()` returns it.
    fn on_recording_finished(&self, result: &RecordingResult);
}
