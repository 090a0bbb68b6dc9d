use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::audio_models::{CaptureDiagnostics, ContextState, LevelSample, PermissionState};
use crate::models::config::EngineConfig;
use crate::models::error::{CaptureError, SessionError};
use crate::models::options::{AudioConstraints, RecorderOptions, RecordingOptions};
use crate::models::recording_result::{checksum, RecordingHandle, RecordingMetadata, RecordingResult};
use crate::models::state::RecordingState;
use crate::processing::chunk_buffer::{concat, ChunkBuffer};
use crate::session::context_manager::ContextManager;
use crate::session::elapsed_ticker::ElapsedTicker;
use crate::session::level_monitor::LevelMonitor;
use crate::session::permission_prober::PermissionProber;
use crate::traits::audio_context::{AudioContext, ContextFactory};
use crate::traits::media_devices::{MediaDevices, MediaStream};
use crate::traits::permissions::PermissionQuery;
use crate::traits::recorder::{select_mime_type, MediaRecorder, RecorderFactory};
use crate::traits::session_observer::SessionObserver;

/// Reported for recordings whose bytes could not be decoded.
const FALLBACK_SAMPLE_RATE: f64 = 44100.0;

/// Owns a live stream and stops its tracks exactly once.
///
/// Released explicitly on stop, or implicitly when dropped on any error path.
pub struct StreamLease<S: MediaStream> {
    stream: S,
    released: bool,
}

impl<S: MediaStream> StreamLease<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, released: false }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stream.stop_tracks();
        log::debug!(
            "Released stream {} ({} tracks)",
            self.stream.id(),
            self.stream.track_count()
        );
    }
}

impl<S: MediaStream> Drop for StreamLease<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Resources held by one recording between `start` and `stop`.
struct ActiveCapture<S: MediaStream, M: MediaRecorder> {
    lease: StreamLease<S>,
    recorder: M,
    chunks: Arc<Mutex<ChunkBuffer>>,
    handle: RecordingHandle,
    constraints: AudioConstraints,
    bit_rate: u32,
}

struct Status {
    state: RecordingState,
    /// Bumped by `cleanup`; a start that began under an older epoch is
    /// cancelled at its next checkpoint.
    epoch: u64,
}

/// One microphone recording at a time: acquire, encode, finalize, decode.
///
/// Data flow:
/// ```text
/// [MediaDevices] → StreamLease ─┬→ [MediaRecorder] → ChunkBuffer → concat → decode → RecordingResult
///                               └→ [LevelMonitor] → LevelSample
/// ```
pub struct CaptureSession<F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    config: EngineConfig,
    contexts: Arc<ContextManager<F>>,
    devices: D,
    recorders: R,
    prober: PermissionProber<P>,
    monitor: Arc<LevelMonitor>,
    ticker: ElapsedTicker,
    status: Arc<Mutex<Status>>,
    active: Mutex<Option<ActiveCapture<D::Stream, R::Recorder>>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl<F, D, R, P> CaptureSession<F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    pub fn new(
        config: EngineConfig,
        contexts: Arc<ContextManager<F>>,
        devices: D,
        recorders: R,
        permissions: P,
    ) -> Self {
        let monitor = LevelMonitor::new(config.fft_size, config.meter_interval, config.peak_decay);
        let ticker = ElapsedTicker::new(config.tick_interval);
        Self {
            config,
            contexts,
            devices,
            recorders,
            prober: PermissionProber::new(permissions),
            monitor: Arc::new(monitor),
            ticker,
            status: Arc::new(Mutex::new(Status {
                state: RecordingState::Idle,
                epoch: 0,
            })),
            active: Mutex::new(None),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> RecordingState {
        self.status.lock().state.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.status.lock().state.is_recording()
    }

    /// Seconds recorded so far; zero when no recording is running.
    pub fn recording_time(&self) -> f64 {
        self.ticker.elapsed_secs()
    }

    pub fn levels(&self) -> LevelSample {
        self.monitor.levels()
    }

    pub async fn diagnostics(&self) -> CaptureDiagnostics {
        self.prober
            .diagnose(
                &self.devices,
                &self.recorders,
                &self.config.mime_preferences,
                self.contexts.needs_user_interaction(),
            )
            .await
    }

    /// Acquire the microphone and begin recording.
    ///
    /// Fails without side effects if another recording is active. Every
    /// resource acquired before a failure is released before returning.
    pub async fn start(&self, options: RecordingOptions) -> Result<RecordingHandle, CaptureError> {
        options.validate().map_err(CaptureError::ConfigurationFailed)?;
        let epoch = self.begin_request()?;

        match self.acquire(&options, epoch).await {
            Ok(handle) => {
                log::info!("Recording {} started ({})", handle.id, handle.mime_type);
                self.notify(|o| o.on_state_changed(&RecordingState::Recording { elapsed_secs: 0.0 }));
                Ok(handle)
            }
            Err(e) => {
                log::warn!("Failed to start recording: {}", e);
                self.abandon_request(epoch);
                self.notify(|o| o.on_error(&SessionError::from(e.clone())));
                Err(e)
            }
        }
    }

    /// Finish the recording and hand back its bytes and decoded audio.
    ///
    /// Decode failures still resolve `Ok`, with `audio_buffer = None` and
    /// `decode_error` set.
    pub async fn stop(&self) -> Result<RecordingResult, CaptureError> {
        let capture = {
            let mut status = self.status.lock();
            if !status.state.is_recording() {
                return Err(CaptureError::NoActiveSession);
            }
            let Some(capture) = self.active.lock().take() else {
                return Err(CaptureError::NoActiveSession);
            };
            status.state = RecordingState::Finalizing;
            capture
        };
        self.notify(|o| o.on_state_changed(&RecordingState::Finalizing));

        let mut guard = FinalizeGuard { session: self, armed: true };
        let outcome = self.finalize(capture).await;
        guard.armed = false;
        self.ticker.reset();

        let terminal = match &outcome {
            Ok(result) => RecordingState::Completed(Box::new(result.metadata.clone())),
            Err(e) => RecordingState::Failed(e.clone()),
        };
        self.set_state(terminal);
        self.set_state(RecordingState::Idle);

        match &outcome {
            Ok(result) => {
                log::info!(
                    "Recording {} finished: {} chunks, {} bytes, decoded: {}",
                    result.metadata.id,
                    result.metadata.chunk_count,
                    result.raw.len(),
                    result.is_decoded()
                );
                self.notify(|o| o.on_recording_finished(result));
            }
            Err(e) => {
                log::error!("Recording failed during stop: {}", e);
                self.notify(|o| o.on_error(&SessionError::from(e.clone())));
            }
        }
        outcome
    }

    /// Tear everything down. Never fails.
    ///
    /// A recording in progress is stopped and its result discarded. A start
    /// still acquiring resources is cancelled.
    pub async fn cleanup(&self) {
        let (cancelled, recording) = {
            let mut status = self.status.lock();
            status.epoch += 1;
            let cancelled = matches!(status.state, RecordingState::Requesting);
            if cancelled {
                status.state = RecordingState::Idle;
            }
            (cancelled, status.state.is_recording())
        };
        if cancelled {
            log::debug!("Cancelled start still acquiring resources");
            self.notify(|o| o.on_state_changed(&RecordingState::Idle));
        }

        if recording {
            if let Err(e) = self.stop().await {
                log::warn!("Implicit stop during cleanup failed: {}", e);
            }
        }

        self.monitor.detach();
        self.ticker.reset();
        if let Some(mut capture) = self.active.lock().take() {
            capture.lease.release();
        }
        log::debug!("Capture session cleaned up");
    }

    fn begin_request(&self) -> Result<u64, CaptureError> {
        let epoch = {
            let mut status = self.status.lock();
            if status.state.is_active() {
                return Err(CaptureError::SessionAlreadyActive);
            }
            status.state = RecordingState::Requesting;
            status.epoch
        };
        self.notify(|o| o.on_state_changed(&RecordingState::Requesting));
        Ok(epoch)
    }

    fn abandon_request(&self, epoch: u64) {
        let reset = {
            let mut status = self.status.lock();
            let reset = status.epoch == epoch && matches!(status.state, RecordingState::Requesting);
            if reset {
                status.state = RecordingState::Idle;
            }
            reset
        };
        if reset {
            self.notify(|o| o.on_state_changed(&RecordingState::Idle));
        }
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), CaptureError> {
        if self.status.lock().epoch == epoch {
            Ok(())
        } else {
            Err(CaptureError::Cancelled)
        }
    }

    async fn acquire(&self, options: &RecordingOptions, epoch: u64) -> Result<RecordingHandle, CaptureError> {
        if !self.devices.is_supported() {
            return Err(CaptureError::CaptureUnsupported);
        }
        if self.prober.probe().await == PermissionState::Denied {
            return Err(CaptureError::PermissionDenied);
        }
        self.ensure_current(epoch)?;

        let context = self.contexts.ensure_context()?;
        if context.state() == ContextState::Suspended {
            match self.contexts.resume().await {
                Ok(true) => {}
                Ok(false) => log::warn!("Audio context still suspended, recording anyway"),
                Err(e) => log::warn!("Failed to resume audio context: {}", e),
            }
        }

        let constraints = options.audio_constraints.apply_to(self.config.default_constraints);
        let stream = self.devices.get_user_media(&constraints).await?;
        let lease = StreamLease::new(stream);
        self.ensure_current(epoch)?;

        let mime_type =
            select_mime_type(&self.recorders, &self.config.mime_preferences).ok_or(CaptureError::EncodingUnsupported)?;
        let bit_rate = options.bit_rate.unwrap_or(self.config.default_bit_rate);
        let mut recorder = self.recorders.create_recorder(
            lease.stream(),
            &RecorderOptions {
                mime_type,
                bits_per_second: bit_rate,
            },
        )?;

        let chunks = Arc::new(Mutex::new(ChunkBuffer::new()));
        let sink = Arc::clone(&chunks);
        recorder.start(
            self.config.chunk_timeslice,
            Arc::new(move |chunk: Vec<u8>| {
                if !sink.lock().push(chunk) {
                    log::debug!("Dropped chunk delivered after finalization began");
                }
            }),
        )?;

        let handle = RecordingHandle {
            id: Uuid::new_v4().to_string(),
            mime_type: recorder.mime_type().to_string(),
            started_at: Utc::now().to_rfc3339(),
        };

        {
            let mut status = self.status.lock();
            if status.epoch == epoch {
                if let Err(e) = self.monitor.attach(&*context, lease.stream()) {
                    log::warn!("Level monitoring unavailable: {}", e);
                }
                self.start_ticker();
                *self.active.lock() = Some(ActiveCapture {
                    lease,
                    recorder,
                    chunks,
                    handle: handle.clone(),
                    constraints,
                    bit_rate,
                });
                status.state = RecordingState::Recording { elapsed_secs: 0.0 };
                return Ok(handle);
            }
        }

        if let Err(e) = recorder.stop().await {
            log::warn!("Failed to stop recorder of a cancelled start: {}", e);
        }
        Err(CaptureError::Cancelled)
    }

    fn start_ticker(&self) {
        let status = Arc::clone(&self.status);
        let monitor = Arc::clone(&self.monitor);
        let observer = self.observer.clone();

        self.ticker.start(move |elapsed| {
            let state = {
                let mut status = status.lock();
                match &mut status.state {
                    RecordingState::Recording { elapsed_secs } => *elapsed_secs = elapsed,
                    _ => return,
                }
                status.state.clone()
            };
            if let Some(observer) = &observer {
                observer.on_state_changed(&state);
                observer.on_levels_updated(&monitor.levels());
            }
        });
    }

    async fn finalize(
        &self,
        capture: ActiveCapture<D::Stream, R::Recorder>,
    ) -> Result<RecordingResult, CaptureError> {
        let ActiveCapture {
            mut lease,
            mut recorder,
            chunks,
            handle,
            constraints,
            bit_rate,
        } = capture;

        let stopped = recorder.stop().await;
        self.monitor.detach();
        let recorded_secs = self.ticker.stop();
        lease.release();
        stopped?;

        let sealed = chunks.lock().seal();
        if sealed.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }
        let raw = concat(&sealed);

        let metadata = RecordingMetadata {
            id: handle.id,
            created_at: handle.started_at,
            mime_type: handle.mime_type.clone(),
            bit_rate,
            constraints,
            chunk_count: sealed.len(),
            byte_length: raw.len(),
            checksum: checksum(&raw),
            recorded_secs,
        };

        let decoded = match self.contexts.current() {
            Some(context) => context.decode_audio_data(raw.clone()).await.map_err(|e| e.to_string()),
            None => Err("audio context is closed".to_string()),
        };

        Ok(match decoded {
            Ok(buffer) => RecordingResult {
                duration_secs: buffer.duration_secs(),
                sample_rate: buffer.sample_rate(),
                channels: buffer.number_of_channels(),
                audio_buffer: Some(buffer),
                raw,
                mime_type: handle.mime_type,
                decode_error: None,
                metadata,
            },
            Err(detail) => {
                log::warn!("Failed to decode recording {}: {}", metadata.id, detail);
                RecordingResult {
                    audio_buffer: None,
                    raw,
                    mime_type: handle.mime_type,
                    duration_secs: 0.0,
                    sample_rate: FALLBACK_SAMPLE_RATE,
                    channels: 1,
                    decode_error: Some(detail),
                    metadata,
                }
            }
        })
    }

    fn set_state(&self, state: RecordingState) {
        self.status.lock().state = state.clone();
        log::debug!("Recording state: {}", state.label());
        self.notify(|o| o.on_state_changed(&state));
    }

    fn notify(&self, event: impl FnOnce(&dyn SessionObserver)) {
        if let Some(observer) = &self.observer {
            event(observer.as_ref());
        }
    }
}

/// Returns the session to `Idle` if a `stop` future is dropped mid-finalize.
///
/// The in-flight capture is owned by that future, so its stream lease is
/// released when the future goes away.
struct FinalizeGuard<'a, F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    session: &'a CaptureSession<F, D, R, P>,
    armed: bool,
}

impl<F, D, R, P> Drop for FinalizeGuard<'_, F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::warn!("Stop abandoned while finalizing, discarding recording");
        let session = self.session;
        session.monitor.detach();
        session.ticker.reset();
        let reset = {
            let mut status = session.status.lock();
            let reset = matches!(status.state, RecordingState::Finalizing);
            if reset {
                status.state = RecordingState::Idle;
            }
            reset
        };
        if reset {
            session.notify(|o| o.on_state_changed(&RecordingState::Idle));
        }
    }
}

impl<F, D, R, P> Drop for CaptureSession<F, D, R, P>
where
    F: ContextFactory,
    D: MediaDevices,
    R: RecorderFactory,
    P: PermissionQuery,
{
    fn drop(&mut self) {
        if let Some(mut capture) = self.active.get_mut().take() {
            log::warn!("Capture session dropped while recording, releasing microphone");
            capture.lease.release();
        }
        self.monitor.detach();
        self.ticker.stop();
    }
}
