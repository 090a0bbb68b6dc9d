use super::error::CaptureError;
use super::recording_result::RecordingMetadata;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → requesting → recording → finalizing → completed / failed → idle
///            ↓
///          idle (precondition failure)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingState {
    Idle,
    Requesting,
    Recording { elapsed_secs: f64 },
    Finalizing,
    Completed(Box<RecordingMetadata>),
    Failed(CaptureError),
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Whether a session currently owns (or is acquiring) capture resources.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Requesting | Self::Recording { .. } | Self::Finalizing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    pub fn elapsed(&self) -> Option<f64> {
        match self {
            Self::Recording { elapsed_secs } => Some(*elapsed_secs),
            Self::Completed(metadata) => Some(metadata.recorded_secs),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Recording { .. } => "recording",
            Self::Finalizing => "finalizing",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}
