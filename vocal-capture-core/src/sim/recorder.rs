use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::models::error::RecorderError;
use crate::processing::pcm;
use crate::traits::recorder::{ChunkCallback, MediaRecorder};

use super::{SimState, Tone};

/// Simulated chunked encoder.
///
/// Chunks reach the session either through
/// [`SimulatedPlatform::emit_chunk`](super::SimulatedPlatform::emit_chunk) or, when a
/// tone is configured, from a generator task that encodes a sine wave as
/// `audio/L16` every timeslice.
pub struct SimRecorder {
    mime_type: String,
    sample_rate: u32,
    shared: Arc<Mutex<SimState>>,
    generator: Option<JoinHandle<()>>,
    recording: bool,
}

impl SimRecorder {
    pub(crate) fn new(mime_type: String, sample_rate: u32, shared: Arc<Mutex<SimState>>) -> Self {
        Self {
            mime_type,
            sample_rate,
            shared,
            generator: None,
            recording: false,
        }
    }

    fn spawn_generator(&mut self, tone: Tone, timeslice: Duration) {
        let shared = Arc::clone(&self.shared);
        let sample_rate = self.sample_rate;
        let frames_per_chunk = (sample_rate as f64 * timeslice.as_secs_f64()) as usize;

        self.generator = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);
            let mut phase = 0.0f32;
            let step = 2.0 * std::f32::consts::PI * tone.frequency_hz / sample_rate as f32;
            loop {
                ticker.tick().await;
                let samples: Vec<f32> = (0..frames_per_chunk)
                    .map(|_| {
                        let s = tone.amplitude * phase.sin();
                        phase = (phase + step) % (2.0 * std::f32::consts::PI);
                        s
                    })
                    .collect();
                let sink = shared.lock().sink.clone();
                match sink {
                    Some(sink) => sink(pcm::encode_i16_le(&samples)),
                    None => break,
                }
            }
        }));
    }
}

impl MediaRecorder for SimRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, timeslice: Duration, on_chunk: ChunkCallback) -> Result<(), RecorderError> {
        if self.recording {
            return Err(RecorderError::Failed("recorder already started".into()));
        }
        let tone = {
            let mut shared = self.shared.lock();
            if let Some(reason) = shared.settings.recorder_start_error.clone() {
                return Err(RecorderError::Failed(reason));
            }
            shared.sink = Some(on_chunk);
            shared.recorder_starts += 1;
            shared.settings.tone
        };
        if let Some(tone) = tone {
            self.spawn_generator(tone, timeslice);
        }
        self.recording = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        if let Some(generator) = self.generator.take() {
            generator.abort();
        }
        if !self.recording {
            return Ok(());
        }
        self.recording = false;

        // Pending data is flushed before the stop is acknowledged.
        let (sink, pending, failure) = {
            let mut shared = self.shared.lock();
            let pending = std::mem::take(&mut shared.final_chunks);
            (shared.sink.take(), pending, shared.settings.recorder_stop_error.clone())
        };
        if let Some(sink) = sink {
            for chunk in pending {
                sink(chunk);
            }
        }
        match failure {
            Some(reason) => Err(RecorderError::Failed(reason)),
            None => Ok(()),
        }
    }
}

impl Drop for SimRecorder {
    fn drop(&mut self) {
        if let Some(generator) = self.generator.take() {
            generator.abort();
        }
    }
}
