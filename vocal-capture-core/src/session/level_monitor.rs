use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::audio_models::LevelSample;
use crate::models::error::ContextError;
use crate::processing::level_meter::LevelMeter;
use crate::traits::audio_context::{AudioContext, FrequencyAnalyser};
use crate::traits::media_devices::MediaStream;

struct MeterState {
    sample: LevelSample,
    /// Bumped on every attach/detach; a sampling task only writes while its
    /// generation is current.
    generation: u64,
}

/// Samples input levels from a live stream at display-refresh cadence.
///
/// Attaching spawns a cancellable periodic task bound to this monitor;
/// detaching aborts it and zeroes the levels. The monitor reads through an
/// analyser and never touches the stream's tracks.
pub struct LevelMonitor {
    fft_size: usize,
    interval: Duration,
    peak_decay: f32,
    state: Arc<Mutex<MeterState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LevelMonitor {
    pub fn new(fft_size: usize, interval: Duration, peak_decay: f32) -> Self {
        Self {
            fft_size,
            interval,
            peak_decay,
            state: Arc::new(Mutex::new(MeterState {
                sample: LevelSample::default(),
                generation: 0,
            })),
            task: Mutex::new(None),
        }
    }

    /// Start sampling `stream` through an analyser created on `context`.
    ///
    /// Replaces any previous attachment. Must be called within a tokio runtime.
    pub fn attach<C, S>(&self, context: &C, stream: &S) -> Result<(), ContextError>
    where
        C: AudioContext,
        S: MediaStream,
    {
        self.detach();
        let analyser = context.create_analyser(stream, self.fft_size)?;
        let generation = self.state.lock().generation;

        let state = Arc::clone(&self.state);
        let period = self.interval;
        let mut meter = LevelMeter::new(self.peak_decay);

        let handle = tokio::spawn(async move {
            let mut bins = vec![0u8; analyser.frequency_bin_count()];
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                analyser.get_byte_frequency_data(&mut bins);
                let sample = meter.update(&bins);

                let mut current = state.lock();
                if current.generation != generation {
                    break;
                }
                current.sample = sample;
            }
        });

        *self.task.lock() = Some(handle);
        log::debug!("Level monitor attached to stream {}", stream.id());
        Ok(())
    }

    /// Stop sampling and reset both levels to zero.
    ///
    /// Safe to call repeatedly and without a prior attach.
    pub fn detach(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        state.generation += 1;
        state.sample = LevelSample::default();
    }

    pub fn is_attached(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Most recent level sample.
    pub fn levels(&self) -> LevelSample {
        self.state.lock().sample
    }
}

impl Drop for LevelMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{ContextOptions, LatencyHint};
    use crate::models::options::AudioConstraints;
    use crate::sim::{SimContext, SimStream, SimulatedPlatform};
    use crate::traits::audio_context::ContextFactory;
    use crate::traits::media_devices::MediaDevices;
    use approx::assert_relative_eq;

    async fn setup() -> (SimulatedPlatform, SimContext, SimStream) {
        let platform = SimulatedPlatform::default();
        let context = platform
            .create_context(&ContextOptions {
                sample_rate: 44100.0,
                latency_hint: LatencyHint::Interactive,
            })
            .unwrap();
        let stream = platform.get_user_media(&AudioConstraints::default()).await.unwrap();
        (platform, context, stream)
    }

    fn monitor() -> LevelMonitor {
        LevelMonitor::new(512, Duration::from_millis(16), 0.95)
    }

    #[tokio::test(start_paused = true)]
    async fn samples_average_and_peak() {
        let (platform, context, stream) = setup().await;
        let mut frame = vec![0u8; 256];
        frame[0] = 255;
        platform.set_frequency_data(frame);
        let monitor = monitor();

        monitor.attach(&context, &stream).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let levels = monitor.levels();
        assert_relative_eq!(levels.peak, 1.0);
        assert_relative_eq!(levels.average, 1.0 / 256.0, epsilon = 1e-6);
        assert!(monitor.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn peak_decays_after_signal_drops() {
        let (platform, context, stream) = setup().await;
        platform.set_frequency_data(vec![204; 256]);
        let monitor = monitor();
        monitor.attach(&context, &stream).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_relative_eq!(monitor.levels().peak, 0.8, epsilon = 1e-6);

        platform.set_frequency_data(vec![0; 256]);
        tokio::time::sleep(Duration::from_millis(16)).await;

        let levels = monitor.levels();
        assert_relative_eq!(levels.average, 0.0);
        assert_relative_eq!(levels.peak, 0.76, epsilon = 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_resets_and_stops_sampling() {
        let (platform, context, stream) = setup().await;
        platform.set_frequency_data(vec![128; 256]);
        let monitor = monitor();
        monitor.attach(&context, &stream).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(monitor.levels().average > 0.0);

        monitor.detach();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(monitor.levels(), LevelSample::default());
        assert!(!monitor.is_attached());
        assert_eq!(stream.live_track_count(), 1);
    }

    #[test]
    fn detach_without_attach_is_harmless() {
        let monitor = monitor();
        monitor.detach();
        monitor.detach();
        assert_eq!(monitor.levels(), LevelSample::default());
    }

    #[tokio::test]
    async fn attach_fails_on_closed_context() {
        let (_platform, context, stream) = setup().await;
        context.force_close();

        let result = monitor().attach(&context, &stream);

        assert_eq!(result.unwrap_err(), ContextError::Closed);
    }
}
