use std::future::Future;

use crate::models::audio_models::AudioSource;
use crate::models::error::DeviceError;
use crate::models::options::AudioConstraints;

/// A live microphone stream.
pub trait MediaStream: Send + Sync + 'static {
    fn id(&self) -> String;

    /// Number of audio tracks carried by the stream.
    fn track_count(&self) -> usize;

    /// Number of tracks that have not been stopped yet.
    fn live_track_count(&self) -> usize;

    /// Stop every track, releasing the hardware.
    fn stop_tracks(&self);
}

/// Host microphone access.
pub trait MediaDevices: Send + Sync + 'static {
    type Stream: MediaStream;

    /// Whether the host can capture audio at all.
    fn is_supported(&self) -> bool;

    /// Request a microphone stream. May wait on a permission prompt.
    fn get_user_media(
        &self,
        constraints: &AudioConstraints,
    ) -> impl Future<Output = Result<Self::Stream, DeviceError>> + Send;

    /// List audio inputs without prompting. `None` when the host cannot tell.
    fn enumerate_audio_inputs(&self) -> impl Future<Output = Option<Vec<AudioSource>>> + Send;
}
