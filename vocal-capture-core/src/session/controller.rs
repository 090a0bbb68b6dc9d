use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{CaptureDiagnostics, ContextState};
use crate::models::config::EngineConfig;
use crate::models::error::{CaptureError, SessionError};
use crate::models::options::RecordingOptions;
use crate::models::recording_result::{RecordingHandle, RecordingResult};
use crate::models::state::RecordingState;
use crate::session::capture_session::CaptureSession;
use crate::session::context_manager::ContextManager;
use crate::traits::audio_context::ContextFactory;
use crate::traits::media_devices::MediaDevices;
use crate::traits::permissions::PermissionQuery;
use crate::traits::recorder::RecorderFactory;
use crate::traits::session_observer::SessionObserver;

/// The recording API the studio UI binds to.
///
/// Wraps a [`CaptureSession`] and the shared [`ContextManager`], keeps the
/// last failure as a [`SessionError`] with user-facing text, and exposes the
/// observable values a recording panel renders.
pub struct SessionController<F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    contexts: Arc<ContextManager<F>>,
    session: CaptureSession<F, D, R, P>,
    error: Mutex<Option<SessionError>>,
}

impl<F, D, R, P> SessionController<F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    pub fn new(
        config: EngineConfig,
        context_factory: F,
        devices: D,
        recorders: R,
        permissions: P,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        let contexts = Arc::new(ContextManager::new(context_factory, config.context_options()));
        let session = CaptureSession::new(config, Arc::clone(&contexts), devices, recorders, permissions);
        Ok(Self {
            contexts,
            session,
            error: Mutex::new(None),
        })
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.session.set_observer(observer);
    }

    /// Start a recording. Clears any previous error first.
    pub async fn start_recording(&self, options: RecordingOptions) -> Result<RecordingHandle, SessionError> {
        *self.error.lock() = None;
        self.session.start(options).await.map_err(|e| self.record_error(e))
    }

    pub async fn stop_recording(&self) -> Result<RecordingResult, SessionError> {
        self.session.stop().await.map_err(|e| self.record_error(e))
    }

    /// Stop any recording, release the microphone, then close the audio
    /// context. Never fails.
    pub async fn cleanup(&self) {
        self.session.cleanup().await;
        self.contexts.close().await;
    }

    /// The last failure, if any.
    pub fn error(&self) -> Option<SessionError> {
        self.error.lock().clone()
    }

    pub fn state(&self) -> RecordingState {
        self.session.state()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    pub fn recording_time(&self) -> f64 {
        self.session.recording_time()
    }

    pub fn audio_level(&self) -> f32 {
        self.session.levels().average
    }

    pub fn peak_level(&self) -> f32 {
        self.session.levels().peak
    }

    pub fn context_state(&self) -> ContextState {
        self.contexts.state()
    }

    /// Create the audio context if needed and resume it. Call only from a
    /// user gesture.
    pub async fn resume_context(&self) -> bool {
        let resumed = match self.contexts.ensure_context() {
            Ok(_) => self.contexts.resume().await,
            Err(e) => Err(e),
        };
        match resumed {
            Ok(running) => running,
            Err(e) => {
                log::warn!("Cannot resume audio context: {}", e);
                self.record_error(e.into());
                false
            }
        }
    }

    pub fn needs_user_interaction(&self) -> bool {
        self.contexts.needs_user_interaction()
    }

    pub async fn diagnostics(&self) -> CaptureDiagnostics {
        self.session.diagnostics().await
    }

    fn record_error(&self, kind: CaptureError) -> SessionError {
        let error = SessionError::from(kind);
        *self.error.lock() = Some(error.clone());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::DeviceError;
    use crate::sim::{SimSettings, SimulatedPlatform};
    use crate::traits::audio_context::AudioContext;
    use std::time::Duration;

    type SimController = SessionController<SimulatedPlatform, SimulatedPlatform, SimulatedPlatform, SimulatedPlatform>;

    fn controller(platform: &SimulatedPlatform) -> SimController {
        SessionController::new(
            EngineConfig::default(),
            platform.clone(),
            platform.clone(),
            platform.clone(),
            platform.clone(),
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let platform = SimulatedPlatform::default();
        let config = EngineConfig {
            fft_size: 500,
            ..Default::default()
        };

        let result = SessionController::new(config, platform.clone(), platform.clone(), platform.clone(), platform);

        assert!(matches!(result, Err(CaptureError::ConfigurationFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn records_and_reports_progress() {
        let platform = SimulatedPlatform::default();
        platform.set_frequency_data(vec![102; 256]);
        let controller = controller(&platform);

        controller.start_recording(RecordingOptions::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(220)).await;

        assert!(controller.is_recording());
        assert!((controller.recording_time() - 0.2).abs() < 1e-9);
        assert!((controller.audio_level() - 0.4).abs() < 1e-6);
        assert!((controller.peak_level() - 0.4).abs() < 1e-6);

        platform.emit_chunk(vec![0; 64]);
        let result = controller.stop_recording().await.unwrap();

        assert_eq!(result.raw.len(), 64);
        assert!(!controller.is_recording());
        assert_eq!(controller.audio_level(), 0.0);
        assert_eq!(controller.error(), None);
    }

    #[tokio::test]
    async fn failure_is_stored_with_remediation_text() {
        let platform = SimulatedPlatform::new(SimSettings {
            device_error: Some(DeviceError::NotAllowed),
            ..Default::default()
        });
        let controller = controller(&platform);

        let err = controller.start_recording(RecordingOptions::default()).await.unwrap_err();

        assert_eq!(err.kind, CaptureError::PermissionDenied);
        assert!(err.message.starts_with("Microphone access denied. To fix this:"));
        assert_eq!(controller.error(), Some(err));
        assert!(!controller.is_recording());
    }

    #[tokio::test]
    async fn repeated_failures_show_the_same_message() {
        let platform = SimulatedPlatform::new(SimSettings {
            device_error: Some(DeviceError::Other("first".into())),
            ..Default::default()
        });
        let controller = controller(&platform);

        let first = controller.start_recording(RecordingOptions::default()).await.unwrap_err();
        platform.configure(|s| s.device_error = Some(DeviceError::Other("second".into())));
        let second = controller.start_recording(RecordingOptions::default()).await.unwrap_err();

        assert_ne!(first.kind, second.kind);
        assert_eq!(first.message, second.message);
    }

    #[tokio::test(start_paused = true)]
    async fn new_start_clears_previous_error() {
        let platform = SimulatedPlatform::default();
        let controller = controller(&platform);
        controller.stop_recording().await.unwrap_err();
        assert_eq!(controller.error().map(|e| e.kind), Some(CaptureError::NoActiveSession));

        controller.start_recording(RecordingOptions::default()).await.unwrap();

        assert_eq!(controller.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_releases_stream_before_closing_context() {
        let platform = SimulatedPlatform::default();
        let controller = controller(&platform);
        controller.start_recording(RecordingOptions::default()).await.unwrap();
        platform.emit_chunk(vec![0; 4]);

        controller.cleanup().await;

        assert!(!controller.is_recording());
        assert_eq!(platform.streams()[0].track_stop_counts(), vec![1]);
        assert_eq!(controller.context_state(), ContextState::Closed);
        assert_eq!(platform.last_context().unwrap().state(), ContextState::Closed);
        assert_eq!(controller.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn recording_after_cleanup_reports_closed_context() {
        let platform = SimulatedPlatform::default();
        let controller = controller(&platform);
        controller.start_recording(RecordingOptions::default()).await.unwrap();
        controller.cleanup().await;

        let err = controller.start_recording(RecordingOptions::default()).await.unwrap_err();

        assert_eq!(err.kind, CaptureError::ContextClosed);
        assert!(!controller.resume_context().await);
        assert_eq!(platform.contexts().len(), 1);
        assert_eq!(controller.context_state(), ContextState::Closed);
        assert_eq!(platform.streams().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_stop_does_not_block_the_next_recording() {
        let platform = SimulatedPlatform::new(SimSettings {
            decode_latency: Duration::from_secs(5),
            ..Default::default()
        });
        let controller = controller(&platform);
        controller.start_recording(RecordingOptions::default()).await.unwrap();
        platform.emit_chunk(vec![0; 8]);

        let stopped = tokio::time::timeout(Duration::from_millis(100), controller.stop_recording()).await;
        assert!(stopped.is_err());
        assert_eq!(controller.state(), RecordingState::Idle);

        platform.configure(|s| s.decode_latency = Duration::ZERO);
        controller.start_recording(RecordingOptions::default()).await.unwrap();
        platform.emit_chunk(vec![0; 8]);
        let result = controller.stop_recording().await.unwrap();

        assert_eq!(result.raw.len(), 8);
        assert_eq!(controller.error(), None);
    }

    #[tokio::test]
    async fn cleanup_twice_is_harmless() {
        let platform = SimulatedPlatform::default();
        let controller = controller(&platform);

        controller.cleanup().await;
        controller.cleanup().await;

        assert!(!controller.is_recording());
    }

    #[tokio::test]
    async fn resume_context_runs_suspended_audio() {
        let platform = SimulatedPlatform::new(SimSettings {
            initial_context_state: ContextState::Suspended,
            ..Default::default()
        });
        let controller = controller(&platform);
        assert!(controller.needs_user_interaction());

        assert!(controller.resume_context().await);

        assert!(!controller.needs_user_interaction());
        assert_eq!(controller.context_state(), ContextState::Running);
    }

    #[tokio::test]
    async fn resume_context_reports_init_failure() {
        let platform = SimulatedPlatform::new(SimSettings {
            context_init_error: Some("no audio hardware".into()),
            ..Default::default()
        });
        let controller = controller(&platform);

        assert!(!controller.resume_context().await);

        assert_eq!(
            controller.error().map(|e| e.kind),
            Some(CaptureError::ContextInit("no audio hardware".into()))
        );
    }

    #[tokio::test]
    async fn diagnostics_pass_through() {
        let platform = SimulatedPlatform::default();
        platform.configure(|s| s.input_devices = None);
        let controller = controller(&platform);

        let report = controller.diagnostics().await;

        assert!(report.capture_supported);
        assert_eq!(report.input_devices, None);
        assert_eq!(report.selected_mime_type.as_deref(), Some("audio/webm"));
    }
}
