use thiserror::Error;

/// Errors surfaced by the capture engine.
///
/// Every variant is recoverable by a user action (grant access, plug in a
/// device, free the device, press record again). Decode failures are not
/// represented here: they are folded into a successful
/// [`RecordingResult`](crate::RecordingResult).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("audio context initialization failed: {0}")]
    ContextInit(String),

    #[error("audio context is closed")]
    ContextClosed,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no microphone found")]
    DeviceNotFound,

    #[error("microphone is busy")]
    DeviceBusy,

    #[error("audio constraints cannot be satisfied: {0}")]
    ConstraintsUnsupported(String),

    #[error("capture requires a secure context")]
    InsecureContext,

    #[error("microphone error: {0}")]
    DeviceFailed(String),

    #[error("audio capture is not supported on this host")]
    CaptureUnsupported,

    #[error("no supported recording container")]
    EncodingUnsupported,

    #[error("a recording session is already active")]
    SessionAlreadyActive,

    #[error("no recording in progress")]
    NoActiveSession,

    #[error("no audio data recorded")]
    EmptyRecording,

    #[error("recording failed: {0}")]
    RecorderFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("recording start was cancelled by teardown")]
    Cancelled,
}

impl CaptureError {
    /// User-facing remediation text for this kind of failure.
    ///
    /// The text depends only on the variant, never on the payload, so a
    /// repeated failure always shows the same instructions.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ContextInit(_) => {
                "Audio could not be initialized. Reload the studio and try again."
            }
            Self::ContextClosed => {
                "The audio engine was shut down. Reload the studio to record again."
            }
            Self::PermissionDenied => {
                "Microphone access denied. To fix this:\n\
                 1. Open the site or system privacy settings\n\
                 2. Set Microphone access to \"Allow\"\n\
                 3. Press Record again"
            }
            Self::DeviceNotFound => {
                "No microphone found. Please connect a microphone and try again."
            }
            Self::DeviceBusy => {
                "The microphone is in use by another application. Close it and try again."
            }
            Self::ConstraintsUnsupported(_) => {
                "Your microphone does not support the requested audio settings. \
                 Try the default settings."
            }
            Self::InsecureContext => {
                "Microphone access requires a secure (HTTPS) connection."
            }
            Self::DeviceFailed(_) => {
                "The microphone reported an error. Check the connection and try again."
            }
            Self::CaptureUnsupported => {
                "Audio recording is not supported here. Use a current browser or device."
            }
            Self::EncodingUnsupported => {
                "No supported recording format is available on this device."
            }
            Self::SessionAlreadyActive => "A recording is already in progress.",
            Self::NoActiveSession => "There is no recording in progress.",
            Self::EmptyRecording => {
                "No audio was captured. Check that your microphone is working and try again."
            }
            Self::RecorderFailed(_) => "Recording failed. Please try again.",
            Self::ConfigurationFailed(_) => {
                "The recording settings are invalid. Reset them and try again."
            }
            Self::Cancelled => "Recording was cancelled.",
        }
    }
}

/// What the session controller reports: the originating kind plus the
/// user-facing message for it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SessionError {
    pub kind: CaptureError,
    pub message: String,
}

impl From<CaptureError> for SessionError {
    fn from(kind: CaptureError) -> Self {
        let message = kind.user_message().to_string();
        Self { kind, message }
    }
}

/// Failures reported by an [`AudioContext`](crate::AudioContext) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context construction failed: {0}")]
    InitFailed(String),

    #[error("context is closed")]
    Closed,

    #[error("resume failed: {0}")]
    ResumeFailed(String),

    #[error("analyser unavailable: {0}")]
    AnalyserUnavailable(String),
}

/// Device-request failure categories, named after the host's error classes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("access refused")]
    NotAllowed,

    #[error("no input device")]
    NotFound,

    #[error("device could not be read")]
    NotReadable,

    #[error("constraint cannot be satisfied: {0}")]
    Overconstrained(String),

    #[error("insecure context")]
    Security,

    #[error("{0}")]
    Other(String),
}

/// Failures reported by a [`MediaRecorder`](crate::MediaRecorder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("unsupported container: {0}")]
    UnsupportedType(String),

    #[error("{0}")]
    Failed(String),
}

/// Decoding of captured bytes failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<ContextError> for CaptureError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Closed => Self::ContextClosed,
            ContextError::InitFailed(msg)
            | ContextError::ResumeFailed(msg)
            | ContextError::AnalyserUnavailable(msg) => Self::ContextInit(msg),
        }
    }
}

impl From<DeviceError> for CaptureError {
    fn from(e: DeviceError) -> Self {
        match e {
            DeviceError::NotAllowed => Self::PermissionDenied,
            DeviceError::NotFound => Self::DeviceNotFound,
            DeviceError::NotReadable => Self::DeviceBusy,
            DeviceError::Overconstrained(constraint) => Self::ConstraintsUnsupported(constraint),
            DeviceError::Security => Self::InsecureContext,
            DeviceError::Other(msg) => Self::DeviceFailed(msg),
        }
    }
}

impl From<RecorderError> for CaptureError {
    fn from(e: RecorderError) -> Self {
        match e {
            RecorderError::UnsupportedType(_) => Self::EncodingUnsupported,
            RecorderError::Failed(msg) => Self::RecorderFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_errors_map_to_specific_kinds() {
        assert_eq!(CaptureError::from(DeviceError::NotAllowed), CaptureError::PermissionDenied);
        assert_eq!(CaptureError::from(DeviceError::NotFound), CaptureError::DeviceNotFound);
        assert_eq!(CaptureError::from(DeviceError::NotReadable), CaptureError::DeviceBusy);
        assert_eq!(
            CaptureError::from(DeviceError::Overconstrained("sampleRate".into())),
            CaptureError::ConstraintsUnsupported("sampleRate".into())
        );
        assert_eq!(CaptureError::from(DeviceError::Security), CaptureError::InsecureContext);
        assert_eq!(
            CaptureError::from(DeviceError::Other("boom".into())),
            CaptureError::DeviceFailed("boom".into())
        );
    }

    #[test]
    fn closed_context_maps_to_context_closed() {
        assert_eq!(CaptureError::from(ContextError::Closed), CaptureError::ContextClosed);
        assert_eq!(
            CaptureError::from(ContextError::InitFailed("no hw".into())),
            CaptureError::ContextInit("no hw".into())
        );
    }

    #[test]
    fn user_message_ignores_payload() {
        let a = CaptureError::DeviceFailed("first".into());
        let b = CaptureError::DeviceFailed("second".into());
        assert_eq!(a.user_message(), b.user_message());
        assert!(CaptureError::PermissionDenied.user_message().contains("1."));
    }

    #[test]
    fn session_error_carries_kind_and_message() {
        let error = SessionError::from(CaptureError::DeviceBusy);
        assert_eq!(error.kind, CaptureError::DeviceBusy);
        assert_eq!(error.to_string(), CaptureError::DeviceBusy.user_message());
    }
}
