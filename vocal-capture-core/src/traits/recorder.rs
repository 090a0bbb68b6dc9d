use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::error::RecorderError;
use crate::models::options::RecorderOptions;
use crate::traits::media_devices::MediaStream;

/// Callback invoked with each encoded chunk, in delivery order.
///
/// May fire on any thread; keep it short.
pub type ChunkCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Chunked encoder attached to a live stream.
pub trait MediaRecorder: Send + 'static {
    fn mime_type(&self) -> &str;

    /// Begin encoding, delivering a chunk roughly every `timeslice`.
    fn start(&mut self, timeslice: Duration, on_chunk: ChunkCallback) -> Result<(), RecorderError>;

    /// Stop encoding.
    ///
    /// Resolves only after every pending chunk has been handed to the
    /// callback; no chunk is delivered afterwards.
    fn stop(&mut self) -> impl Future<Output = Result<(), RecorderError>> + Send;
}

/// Creates recorders and reports which containers the host can encode.
pub trait RecorderFactory: Send + Sync + 'static {
    type Recorder: MediaRecorder;

    fn is_type_supported(&self, mime_type: &str) -> bool;

    fn create_recorder<S: MediaStream>(
        &self,
        stream: &S,
        options: &RecorderOptions,
    ) -> Result<Self::Recorder, RecorderError>;
}

/// First container in `preferences` the factory supports.
pub fn select_mime_type<R: RecorderFactory>(recorders: &R, preferences: &[String]) -> Option<String> {
    preferences
        .iter()
        .find(|mime| recorders.is_type_supported(mime))
        .cloned()
}
