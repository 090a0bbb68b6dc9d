use crate::models::audio_models::LevelSample;

/// Pure-math level meter over byte frequency magnitudes.
///
/// `average` is the mean of the normalized bins, the peak is an
/// exponential-decay hold: every update multiplies the held value by
/// `decay` and replaces it when the new maximum is higher.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    decay: f32,
    peak: f32,
}

impl LevelMeter {
    pub fn new(decay: f32) -> Self {
        Self { decay, peak: 0.0 }
    }

    /// Feed one analyser frame (0–255 per bin) and return the new sample.
    pub fn update(&mut self, bins: &[u8]) -> LevelSample {
        let average = Self::average_level(bins);
        let max = Self::max_level(bins);
        LevelSample {
            average,
            peak: self.hold(max),
        }
    }

    /// Apply one decay step and fold in `instantaneous_max`.
    pub fn hold(&mut self, instantaneous_max: f32) -> f32 {
        self.peak = (self.peak * self.decay).max(instantaneous_max);
        self.peak
    }

    /// Mean of bins normalized to 0.0–1.0.
    pub fn average_level(bins: &[u8]) -> f32 {
        if bins.is_empty() {
            return 0.0;
        }
        let sum: u32 = bins.iter().map(|&b| b as u32).sum();
        sum as f32 / 255.0 / bins.len() as f32
    }

    /// Largest bin normalized to 0.0–1.0.
    pub fn max_level(bins: &[u8]) -> f32 {
        bins.iter().copied().max().unwrap_or(0) as f32 / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_decays_by_factor_per_tick() {
        let mut meter = LevelMeter::new(0.95);
        let peaks: Vec<f32> = [0.8, 0.1, 0.1, 0.1].iter().map(|&m| meter.hold(m)).collect();

        assert_relative_eq!(peaks[0], 0.8, epsilon = 1e-6);
        assert_relative_eq!(peaks[1], 0.76, epsilon = 1e-6);
        assert_relative_eq!(peaks[2], 0.722, epsilon = 1e-6);
        assert_relative_eq!(peaks[3], 0.6859, epsilon = 1e-6);
    }

    #[test]
    fn higher_max_replaces_decayed_peak() {
        let mut meter = LevelMeter::new(0.95);
        meter.hold(0.5);
        assert_relative_eq!(meter.hold(0.9), 0.9);
        assert_relative_eq!(meter.hold(0.0), 0.855, epsilon = 1e-6);
    }

    #[test]
    fn update_normalizes_bins() {
        let mut meter = LevelMeter::new(0.95);
        let sample = meter.update(&[0, 255, 51, 102]);

        assert_relative_eq!(sample.average, 0.4, epsilon = 1e-6);
        assert_relative_eq!(sample.peak, 1.0);
    }

    #[test]
    fn silence_and_empty_frames() {
        let mut meter = LevelMeter::new(0.95);
        assert_eq!(meter.update(&[]), LevelSample::default());
        assert_eq!(meter.update(&[0; 256]), LevelSample::default());
    }
}
