//! One-sided FFT magnitude spectrum of a track

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitudes for bins `0..n/2`; bin `k` sits at `k · sample_rate / n` Hz
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Strongest bin as `(frequency, magnitude)`
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .fold(None, |best: Option<(f64, f64)>, (&f, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((f, m)),
            })
    }

    /// Upper edge of the last bin
    pub fn max_frequency(&self) -> f64 {
        match (self.frequencies.first(), self.frequencies.get(1)) {
            (Some(_), Some(&step)) => step * self.len() as f64,
            _ => 0.0,
        }
    }

    /// Peak magnitude per bucket, `buckets` values spanning the spectrum
    pub fn downsample(&self, buckets: usize) -> Vec<f64> {
        let len = self.len();
        if len == 0 {
            return vec![0.0; buckets];
        }
        (0..buckets)
            .map(|b| {
                let start = b * len / buckets;
                let end = ((b + 1) * len / buckets).max(start + 1).min(len);
                self.magnitudes[start..end].iter().fold(0.0f64, |peak, &m| peak.max(m))
            })
            .collect()
    }
}

/// Forward FFT over the whole signal, keeping the positive-frequency half
pub fn magnitude_spectrum(samples: &[f32], sample_rate: u32) -> Spectrum {
    let n = samples.len();
    let half = n / 2;
    if half == 0 {
        return Spectrum::default();
    }

    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let bin_width = sample_rate as f64 / n as f64;
    Spectrum {
        frequencies: (0..half).map(|k| k as f64 * bin_width).collect(),
        magnitudes: buffer[..half].iter().map(|c| c.norm()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn tone(freq: f64, rate: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (TAU * freq * i as f64 / rate as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn test_pure_tone_peaks_at_its_bin() {
        let spectrum = magnitude_spectrum(&tone(50.0, 1000, 1000), 1000);

        assert_eq!(spectrum.len(), 500);
        assert_relative_eq!(spectrum.frequencies[1], 1.0);
        let (freq, mag) = spectrum.peak().unwrap();
        assert_relative_eq!(freq, 50.0);
        // unit sine over n samples: n/2 in its bin
        assert_relative_eq!(mag, 500.0, max_relative = 1e-4);
        assert!(spectrum.magnitudes[10] < 1e-3);
    }

    #[test]
    fn test_dc_signal_lands_in_bin_zero() {
        let spectrum = magnitude_spectrum(&[0.5; 8], 8);
        assert_eq!(spectrum.peak().map(|(f, _)| f), Some(0.0));
        assert_relative_eq!(spectrum.magnitudes[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(spectrum.max_frequency(), 4.0);
    }

    #[test]
    fn test_short_input_is_empty() {
        assert!(magnitude_spectrum(&[], 44100).is_empty());
        assert!(magnitude_spectrum(&[1.0], 44100).is_empty());
        assert_eq!(Spectrum::default().peak(), None);
        assert_eq!(Spectrum::default().downsample(4), vec![0.0; 4]);
    }

    #[test]
    fn test_downsample_keeps_bucket_peaks() {
        let spectrum = Spectrum {
            frequencies: vec![0.0, 1.0, 2.0, 3.0],
            magnitudes: vec![1.0, 3.0, 2.0, 0.5],
        };
        assert_eq!(spectrum.downsample(2), vec![3.0, 2.0]);
        assert_eq!(spectrum.downsample(8).len(), 8);
    }
}
