//! In-memory platform implementing every host trait.
//!
//! Used by the engine's tests and by the demo binary. Every failure mode
//! the engine distinguishes can be injected through [`SimSettings`], and the
//! resources it hands out (contexts, streams, tracks) stay observable after
//! the engine is done with them.
//!
//! The simulated encoder produces `audio/L16` payloads (16-bit little-endian
//! mono PCM) and the simulated decoder reads any payload as such, whatever
//! container label was negotiated.

pub mod context;
pub mod recorder;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, ContextOptions, ContextState, PermissionState};
use crate::models::error::{ContextError, DeviceError, RecorderError};
use crate::models::options::{AudioConstraints, RecorderOptions};
use crate::traits::audio_context::ContextFactory;
use crate::traits::media_devices::{MediaDevices, MediaStream};
use crate::traits::permissions::PermissionQuery;
use crate::traits::recorder::{ChunkCallback, RecorderFactory};

pub use context::{SimAnalyser, SimContext};
pub use recorder::SimRecorder;
pub use stream::{SimStream, SimTrack};

/// Raw PCM container produced by the simulated encoder.
pub const L16_MIME_TYPE: &str = "audio/L16";

/// A sine tone fed through the simulated microphone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub amplitude: f32,
}

/// Knobs for the simulated host.
#[derive(Debug, Clone)]
pub struct SimSettings {
    /// State a freshly created context starts in.
    pub initial_context_state: ContextState,
    pub context_init_error: Option<String>,
    pub resume_error: Option<String>,
    pub capture_supported: bool,
    /// `None` simulates a host without a permission API.
    pub permission: Option<PermissionState>,
    pub device_error: Option<DeviceError>,
    /// Time spent "waiting on the permission prompt".
    pub device_latency: Duration,
    pub track_count: usize,
    pub input_devices: Option<Vec<AudioSource>>,
    pub supported_mime_types: Vec<String>,
    pub recorder_start_error: Option<String>,
    pub recorder_stop_error: Option<String>,
    pub decode_error: Option<String>,
    /// Time the decoder takes before answering.
    pub decode_latency: Duration,
    /// Returned verbatim by analysers when no tone is configured.
    pub frequency_data: Vec<u8>,
    pub tone: Option<Tone>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            initial_context_state: ContextState::Running,
            context_init_error: None,
            resume_error: None,
            capture_supported: true,
            permission: Some(PermissionState::Granted),
            device_error: None,
            device_latency: Duration::ZERO,
            track_count: 1,
            input_devices: Some(vec![AudioSource {
                id: "default".into(),
                label: "Simulated Microphone".into(),
                is_default: true,
            }]),
            supported_mime_types: vec!["audio/webm".into(), L16_MIME_TYPE.into()],
            recorder_start_error: None,
            recorder_stop_error: None,
            decode_error: None,
            decode_latency: Duration::ZERO,
            frequency_data: Vec::new(),
            tone: None,
        }
    }
}

pub(crate) struct SimState {
    pub(crate) settings: SimSettings,
    pub(crate) sink: Option<ChunkCallback>,
    pub(crate) final_chunks: Vec<Vec<u8>>,
    pub(crate) decode_calls: usize,
    pub(crate) analysers_created: usize,
    pub(crate) recorder_starts: usize,
    contexts: Vec<SimContext>,
    streams: Vec<SimStream>,
    device_requests: Vec<AudioConstraints>,
    recorders_created: Vec<RecorderOptions>,
    permission_queries: usize,
}

/// The simulated host. Clones share state, so one instance can be handed to
/// every component slot and still be inspected by the test.
#[derive(Clone)]
pub struct SimulatedPlatform {
    shared: Arc<Mutex<SimState>>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new(SimSettings::default())
    }
}

impl SimulatedPlatform {
    pub fn new(settings: SimSettings) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimState {
                settings,
                sink: None,
                final_chunks: Vec::new(),
                decode_calls: 0,
                analysers_created: 0,
                recorder_starts: 0,
                contexts: Vec::new(),
                streams: Vec::new(),
                device_requests: Vec::new(),
                recorders_created: Vec::new(),
                permission_queries: 0,
            })),
        }
    }

    /// Change settings in place; affects subsequent calls only.
    pub fn configure(&self, update: impl FnOnce(&mut SimSettings)) {
        update(&mut self.shared.lock().settings);
    }

    /// Deliver a chunk to the running recorder's callback.
    ///
    /// Returns `false` when no recorder is running.
    pub fn emit_chunk(&self, chunk: Vec<u8>) -> bool {
        let sink = self.shared.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink(chunk);
                true
            }
            None => false,
        }
    }

    /// Queue a chunk the recorder flushes while stopping.
    pub fn queue_final_chunk(&self, chunk: Vec<u8>) {
        self.shared.lock().final_chunks.push(chunk);
    }

    pub fn is_recorder_running(&self) -> bool {
        self.shared.lock().sink.is_some()
    }

    pub fn set_frequency_data(&self, data: Vec<u8>) {
        self.shared.lock().settings.frequency_data = data;
    }

    /// Every context created so far, oldest first.
    pub fn contexts(&self) -> Vec<SimContext> {
        self.shared.lock().contexts.clone()
    }

    pub fn last_context(&self) -> Option<SimContext> {
        self.shared.lock().contexts.last().cloned()
    }

    /// Every stream handed out so far, oldest first.
    pub fn streams(&self) -> Vec<SimStream> {
        self.shared.lock().streams.clone()
    }

    pub fn device_requests(&self) -> Vec<AudioConstraints> {
        self.shared.lock().device_requests.clone()
    }

    pub fn recorders_created(&self) -> Vec<RecorderOptions> {
        self.shared.lock().recorders_created.clone()
    }

    pub fn decode_calls(&self) -> usize {
        self.shared.lock().decode_calls
    }

    pub fn analysers_created(&self) -> usize {
        self.shared.lock().analysers_created
    }

    pub fn recorder_starts(&self) -> usize {
        self.shared.lock().recorder_starts
    }

    pub fn permission_queries(&self) -> usize {
        self.shared.lock().permission_queries
    }
}

impl ContextFactory for SimulatedPlatform {
    type Context = SimContext;

    fn create_context(&self, options: &ContextOptions) -> Result<SimContext, ContextError> {
        let mut shared = self.shared.lock();
        if let Some(reason) = shared.settings.context_init_error.clone() {
            return Err(ContextError::InitFailed(reason));
        }
        let context = SimContext::new(
            shared.settings.initial_context_state,
            options.sample_rate,
            Arc::clone(&self.shared),
        );
        shared.contexts.push(context.clone());
        Ok(context)
    }
}

impl MediaDevices for SimulatedPlatform {
    type Stream = SimStream;

    fn is_supported(&self) -> bool {
        self.shared.lock().settings.capture_supported
    }

    async fn get_user_media(&self, constraints: &AudioConstraints) -> Result<SimStream, DeviceError> {
        let latency = {
            let mut shared = self.shared.lock();
            shared.device_requests.push(*constraints);
            shared.settings.device_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut shared = self.shared.lock();
        if let Some(error) = shared.settings.device_error.clone() {
            return Err(error);
        }
        let stream = SimStream::new(format!("sim-stream-{}", shared.streams.len() + 1), shared.settings.track_count);
        shared.streams.push(stream.clone());
        Ok(stream)
    }

    async fn enumerate_audio_inputs(&self) -> Option<Vec<AudioSource>> {
        self.shared.lock().settings.input_devices.clone()
    }
}

impl RecorderFactory for SimulatedPlatform {
    type Recorder = SimRecorder;

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.shared
            .lock()
            .settings
            .supported_mime_types
            .iter()
            .any(|m| m == mime_type)
    }

    fn create_recorder<S: MediaStream>(&self, stream: &S, options: &RecorderOptions) -> Result<SimRecorder, RecorderError> {
        if !self.is_type_supported(&options.mime_type) {
            return Err(RecorderError::UnsupportedType(options.mime_type.clone()));
        }
        if stream.live_track_count() == 0 {
            return Err(RecorderError::Failed("stream has no live tracks".into()));
        }
        let sample_rate = {
            let mut shared = self.shared.lock();
            shared.recorders_created.push(options.clone());
            shared
                .device_requests
                .last()
                .map(|c| c.sample_rate)
                .unwrap_or(44100)
        };
        Ok(SimRecorder::new(options.mime_type.clone(), sample_rate, Arc::clone(&self.shared)))
    }
}

impl PermissionQuery for SimulatedPlatform {
    async fn query_microphone(&self) -> Option<PermissionState> {
        let mut shared = self.shared.lock();
        shared.permission_queries += 1;
        shared.settings.permission
    }
}
