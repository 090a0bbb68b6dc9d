//! # vocal-capture-core
//!
//! Microphone capture engine for a vocal recording studio.
//!
//! Acquires a live input stream, meters its level in real time, records it
//! as encoded chunks and decodes the result into an [`AudioBuffer`] for the
//! processing stages downstream. The host platform (audio context, media
//! devices, encoder, permission query) is reached only through the traits in
//! [`traits`]; [`sim`] provides an in-memory implementation of all of them.
//!
//! ## Architecture
//!
//! ```text
//! vocal-capture-core (this crate)
//! ├── traits/       ← AudioContext, MediaDevices, MediaRecorder, PermissionQuery, SessionObserver
//! ├── models/       ← CaptureError, RecordingState, EngineConfig, RecordingOptions, RecordingResult
//! ├── processing/   ← LevelMeter, ChunkBuffer, PCM helpers
//! ├── session/      ← ContextManager → PermissionProber → LevelMonitor → CaptureSession → SessionController
//! └── sim/          ← SimulatedPlatform (audio/L16 encoder and decoder)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sim;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioBuffer, AudioSource, CaptureDiagnostics, ContextOptions, ContextState, LatencyHint, LevelSample,
    PermissionState,
};
pub use models::config::EngineConfig;
pub use models::error::{CaptureError, ContextError, DecodeError, DeviceError, RecorderError, SessionError};
pub use models::options::{AudioConstraints, ConstraintOverrides, RecorderOptions, RecordingOptions};
pub use models::recording_result::{RecordingHandle, RecordingMetadata, RecordingResult};
pub use models::state::RecordingState;
pub use processing::chunk_buffer::ChunkBuffer;
pub use processing::level_meter::LevelMeter;
pub use session::capture_session::{CaptureSession, StreamLease};
pub use session::context_manager::ContextManager;
pub use session::controller::SessionController;
pub use session::level_monitor::LevelMonitor;
pub use session::permission_prober::PermissionProber;
pub use traits::audio_context::{AudioContext, ContextFactory, FrequencyAnalyser};
pub use traits::media_devices::{MediaDevices, MediaStream};
pub use traits::permissions::{NoPermissionApi, PermissionQuery};
pub use traits::recorder::{ChunkCallback, MediaRecorder, RecorderFactory};
pub use traits::session_observer::SessionObserver;
