use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioBuffer, ContextState};
use crate::models::error::{ContextError, DecodeError};
use crate::processing::pcm;
use crate::traits::audio_context::{AudioContext, FrequencyAnalyser};
use crate::traits::media_devices::MediaStream;

use super::{SimState, Tone};

/// Simulated audio context. Clones share the same lifecycle state.
#[derive(Clone)]
pub struct SimContext {
    state: Arc<Mutex<ContextState>>,
    sample_rate: f64,
    shared: Arc<Mutex<SimState>>,
}

impl SimContext {
    pub(crate) fn new(initial: ContextState, sample_rate: f64, shared: Arc<Mutex<SimState>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            sample_rate,
            shared,
        }
    }

    /// Host-initiated suspension (e.g. the page went to the background).
    pub fn suspend(&self) {
        let mut state = self.state.lock();
        if *state == ContextState::Running {
            *state = ContextState::Suspended;
        }
    }

    /// Host-initiated close, bypassing the manager.
    pub fn force_close(&self) {
        *self.state.lock() = ContextState::Closed;
    }
}

impl AudioContext for SimContext {
    type Analyser = SimAnalyser;

    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    async fn resume(&self) -> Result<(), ContextError> {
        let refusal = self.shared.lock().settings.resume_error.clone();
        let mut state = self.state.lock();
        match *state {
            ContextState::Closed => Err(ContextError::Closed),
            ContextState::Running => Ok(()),
            _ => match refusal {
                Some(reason) => Err(ContextError::ResumeFailed(reason)),
                None => {
                    *state = ContextState::Running;
                    Ok(())
                }
            },
        }
    }

    async fn close(&self) -> Result<(), ContextError> {
        *self.state.lock() = ContextState::Closed;
        Ok(())
    }

    async fn decode_audio_data(&self, data: Vec<u8>) -> Result<AudioBuffer, DecodeError> {
        let (forced, latency) = {
            let mut shared = self.shared.lock();
            shared.decode_calls += 1;
            (shared.settings.decode_error.clone(), shared.settings.decode_latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.state() == ContextState::Closed {
            return Err(DecodeError("audio context is closed".into()));
        }
        if let Some(reason) = forced {
            return Err(DecodeError(reason));
        }
        let samples = pcm::decode_i16_le(&data).map_err(DecodeError)?;
        Ok(AudioBuffer::new(self.sample_rate, vec![samples]))
    }

    fn create_analyser<S: MediaStream>(&self, stream: &S, fft_size: usize) -> Result<SimAnalyser, ContextError> {
        if self.state() == ContextState::Closed {
            return Err(ContextError::Closed);
        }
        if stream.live_track_count() == 0 {
            return Err(ContextError::AnalyserUnavailable("stream has no live tracks".into()));
        }
        self.shared.lock().analysers_created += 1;
        Ok(SimAnalyser {
            bin_count: fft_size / 2,
            frame: AtomicU64::new(0),
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Analyser that replays the platform's configured frequency data, or
/// synthesizes a spectrum for a configured tone.
pub struct SimAnalyser {
    bin_count: usize,
    frame: AtomicU64,
    shared: Arc<Mutex<SimState>>,
}

impl FrequencyAnalyser for SimAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.bin_count
    }

    fn get_byte_frequency_data(&self, out: &mut [u8]) {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        let shared = self.shared.lock();
        if let Some(tone) = shared.settings.tone {
            tone_spectrum(tone, frame, out);
            return;
        }
        let data = &shared.settings.frequency_data;
        for (i, bin) in out.iter_mut().enumerate() {
            *bin = data.get(i).copied().unwrap_or(0);
        }
    }
}

/// A single spectral line with a slow tremolo so meters visibly move.
fn tone_spectrum(tone: Tone, frame: u64, out: &mut [u8]) {
    if out.is_empty() {
        return;
    }
    let tremolo = 0.75 + 0.25 * ((frame as f32) * 0.2).sin();
    let center = ((tone.frequency_hz / 22050.0) * out.len() as f32) as isize;
    for (i, bin) in out.iter_mut().enumerate() {
        let distance = (i as isize - center).unsigned_abs() as f32;
        let magnitude = tone.amplitude * tremolo / (1.0 + distance * distance * 0.05);
        *bin = (magnitude.clamp(0.0, 1.0) * 255.0) as u8;
    }
}
