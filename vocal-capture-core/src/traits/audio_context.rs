use std::future::Future;

use crate::models::audio_models::{AudioBuffer, ContextOptions, ContextState};
use crate::models::error::{ContextError, DecodeError};
use crate::traits::media_devices::MediaStream;

/// Frequency-domain view of a live stream.
///
/// Dropping the analyser disconnects it from the stream; it never owns or
/// stops the stream's tracks.
pub trait FrequencyAnalyser: Send + 'static {
    /// Number of bins filled by [`get_byte_frequency_data`](Self::get_byte_frequency_data),
    /// i.e. half the FFT size.
    fn frequency_bin_count(&self) -> usize;

    /// Copy the current magnitudes (0–255 per bin) into `out`.
    fn get_byte_frequency_data(&self, out: &mut [u8]);
}

/// The host's audio-processing graph.
///
/// Implemented by:
/// - `SimContext` (in-memory, see `crate::sim`)
/// - a browser binding wrapping `AudioContext`
pub trait AudioContext: Send + Sync + 'static {
    type Analyser: FrequencyAnalyser;

    fn state(&self) -> ContextState;

    fn sample_rate(&self) -> f64;

    /// Resume a suspended context. Hosts may refuse unless called from a user gesture.
    fn resume(&self) -> impl Future<Output = Result<(), ContextError>> + Send;

    /// Release the processing graph. Closing twice is not an error.
    fn close(&self) -> impl Future<Output = Result<(), ContextError>> + Send;

    /// Decode an encoded byte buffer into planar samples.
    fn decode_audio_data(&self, data: Vec<u8>) -> impl Future<Output = Result<AudioBuffer, DecodeError>> + Send;

    /// Create an analyser node fed by `stream`.
    fn create_analyser<S: MediaStream>(&self, stream: &S, fft_size: usize) -> Result<Self::Analyser, ContextError>;
}

/// Constructs audio contexts on behalf of the context manager.
pub trait ContextFactory: Send + Sync + 'static {
    type Context: AudioContext;

    fn create_context(&self, options: &ContextOptions) -> Result<Self::Context, ContextError>;
}
