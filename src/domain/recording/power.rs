//! Input level metering

use serde::{Deserialize, Serialize};

/// Lowest reportable level, used for digital silence
pub const MIN_POWER_DB: f32 = -160.0;

/// Average and peak input power in dBFS (0 dB is full scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerReading {
    pub average: f32,
    pub peak: f32,
}

impl PowerReading {
    /// Reading for digital silence
    pub const fn silent() -> Self {
        Self {
            average: MIN_POWER_DB,
            peak: MIN_POWER_DB,
        }
    }

    /// Meter a block of samples: RMS level for `average`, max magnitude for `peak`
    pub fn from_samples(samples: &[i16]) -> Self {
        if samples.is_empty() {
            return Self::silent();
        }

        let mut sum_sq = 0.0f64;
        let mut max = 0.0f64;
        for &s in samples {
            let normalized = f64::from(s) / 32768.0;
            sum_sq += normalized * normalized;
            max = max.max(normalized.abs());
        }
        let rms = (sum_sq / samples.len() as f64).sqrt();

        Self {
            average: amplitude_to_db(rms),
            peak: amplitude_to_db(max),
        }
    }
}

impl Default for PowerReading {
    fn default() -> Self {
        Self::silent()
    }
}

/// Convert a linear amplitude (0.0..=1.0) to dBFS, clamped to the meter range
pub fn amplitude_to_db(amplitude: f64) -> f32 {
    if amplitude <= 0.0 {
        return MIN_POWER_DB;
    }
    let db = 20.0 * amplitude.log10();
    (db as f32).clamp(MIN_POWER_DB, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_floor() {
        let reading = PowerReading::from_samples(&[0; 160]);
        assert_eq!(reading, PowerReading::silent());
        assert_eq!(PowerReading::from_samples(&[]), PowerReading::silent());
    }

    #[test]
    fn full_scale_is_zero_db() {
        let reading = PowerReading::from_samples(&[i16::MIN; 160]);
        assert!(reading.peak.abs() < 0.01);
        assert!(reading.average.abs() < 0.01);
    }

    #[test]
    fn half_scale_is_about_minus_six_db() {
        let reading = PowerReading::from_samples(&[16384; 100]);
        assert!((reading.peak + 6.02).abs() < 0.05);
        assert!((reading.average + 6.02).abs() < 0.05);
    }

    #[test]
    fn peak_is_never_below_average() {
        let samples: Vec<i16> = (0..800).map(|i| ((i * 37) % 2000) as i16 - 1000).collect();
        let reading = PowerReading::from_samples(&samples);
        assert!(reading.peak >= reading.average);
    }
}
