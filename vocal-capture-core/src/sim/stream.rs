use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::traits::media_devices::MediaStream;

/// One simulated audio track. Counts how often it was stopped.
#[derive(Debug)]
pub struct SimTrack {
    label: String,
    stops: AtomicUsize,
}

impl SimTrack {
    fn new(label: String) -> Self {
        Self {
            label,
            stops: AtomicUsize::new(0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.stop_count() == 0
    }
}

/// Simulated microphone stream. Clones share the same tracks.
#[derive(Debug, Clone)]
pub struct SimStream {
    id: String,
    tracks: Arc<Vec<SimTrack>>,
}

impl SimStream {
    pub(crate) fn new(id: String, track_count: usize) -> Self {
        let tracks = (0..track_count)
            .map(|i| SimTrack::new(format!("Simulated Microphone {}", i + 1)))
            .collect();
        Self {
            id,
            tracks: Arc::new(tracks),
        }
    }

    pub fn tracks(&self) -> &[SimTrack] {
        &self.tracks
    }

    /// Stop invocations per track, in track order.
    pub fn track_stop_counts(&self) -> Vec<usize> {
        self.tracks.iter().map(SimTrack::stop_count).collect()
    }
}

impl MediaStream for SimStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    fn stop_tracks(&self) {
        for track in self.tracks.iter() {
            track.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_tracks_counts_each_track() {
        let stream = SimStream::new("s1".into(), 2);
        assert_eq!(stream.live_track_count(), 2);

        stream.stop_tracks();

        assert_eq!(stream.live_track_count(), 0);
        assert_eq!(stream.track_stop_counts(), vec![1, 1]);
        assert_eq!(stream.tracks()[1].label(), "Simulated Microphone 2");
    }

    #[test]
    fn clones_share_tracks() {
        let stream = SimStream::new("s1".into(), 1);
        let clone = stream.clone();
        clone.stop_tracks();
        assert_eq!(stream.live_track_count(), 0);
    }
}
