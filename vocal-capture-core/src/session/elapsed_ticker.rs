use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

struct TickerState {
    ticks: u64,
    generation: u64,
}

/// Monotonic recording clock advanced by a fixed-period task.
///
/// Elapsed time is `ticks × period`, so it never drifts from the tick count.
pub struct ElapsedTicker {
    period: Duration,
    state: Arc<Mutex<TickerState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ElapsedTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: Arc::new(Mutex::new(TickerState { ticks: 0, generation: 0 })),
            task: Mutex::new(None),
        }
    }

    /// Reset to zero and start ticking. `on_tick` receives the elapsed seconds.
    ///
    /// Must be called within a tokio runtime.
    pub fn start<F>(&self, on_tick: F)
    where
        F: Fn(f64) + Send + 'static,
    {
        let generation = self.reset();
        let state = Arc::clone(&self.state);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let elapsed = {
                    let mut current = state.lock();
                    if current.generation != generation {
                        break;
                    }
                    current.ticks += 1;
                    current.ticks as f64 * period.as_secs_f64()
                };
                on_tick(elapsed);
            }
        });

        *self.task.lock() = Some(handle);
    }

    /// Stop ticking and return the elapsed seconds reached.
    ///
    /// The counter keeps its value until the next `start` or `reset`.
    pub fn stop(&self) -> f64 {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        state.generation += 1;
        state.ticks as f64 * self.period.as_secs_f64()
    }

    /// Stop ticking and zero the counter.
    pub fn reset(&self) -> u64 {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        state.generation += 1;
        state.ticks = 0;
        state.generation
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.state.lock().ticks as f64 * self.period.as_secs_f64()
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn counts_whole_periods() {
        let ticker = ElapsedTicker::new(Duration::from_millis(100));
        ticker.start(|_| {});

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_relative_eq!(ticker.elapsed_secs(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(ticker.stop(), 0.3, epsilon = 1e-9);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let ticker = ElapsedTicker::new(Duration::from_millis(100));
        ticker.start(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(250)).await;

        ticker.stop();
        let seen = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(seen, 2);
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_begins_from_zero() {
        let ticker = ElapsedTicker::new(Duration::from_millis(100));
        ticker.start(|_| {});
        tokio::time::sleep(Duration::from_millis(250)).await;
        ticker.stop();

        ticker.start(|_| {});
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_relative_eq!(ticker.elapsed_secs(), 0.1, epsilon = 1e-9);
        ticker.reset();
        assert_eq!(ticker.elapsed_secs(), 0.0);
    }
}
