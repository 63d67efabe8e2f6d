//! Sweep analysis - turns two captures into a quality score.
//!
//! Each raw channel is smoothed with a Savitzky-Golay filter before any
//! peak is located; raw samples are too noisy for a stable arg-max.
//!
//! - Phase channels contribute the shift of their peak position between
//!   the initial and the normal capture. These three numbers are the
//!   user-visible quality triple.
//! - Magnitude channels contribute the change in distance between their
//!   highest and lowest sample.

pub mod savgol;

pub use savgol::SavitzkyGolay;

use crate::acquisition::{Ambient, SweepCapture};
use crate::error::{Error, MalformedCapture};

/// Number of phase/magnitude channel pairs in a sweep.
pub const CHANNEL_PAIRS: usize = 3;

/// Outcome of comparing the initial and normal captures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityResult {
    /// Peak shift per phase channel (samples). The primary result.
    pub phase: [usize; CHANNEL_PAIRS],
    /// Change of max/min separation per magnitude channel (samples).
    pub magnitude: [usize; CHANNEL_PAIRS],
    /// Ambient values reported with the normal capture.
    pub ambient: Ambient,
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(data: &[f64]) -> Option<usize> {
    extreme_index(data, |candidate, best| candidate > best)
}

/// Index of the smallest value; ties go to the lowest index.
pub fn argmin(data: &[f64]) -> Option<usize> {
    extreme_index(data, |candidate, best| candidate < best)
}

fn extreme_index(data: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let (first, rest) = data.split_first()?;
    let mut best = (0, *first);
    for (i, &v) in rest.iter().enumerate() {
        if better(v, best.1) {
            best = (i + 1, v);
        }
    }
    Some(best.0)
}

pub struct Analyzer {
    filter: SavitzkyGolay,
}

impl Analyzer {
    pub fn new(window: usize, order: usize) -> Result<Self, Error> {
        Ok(Self {
            filter: SavitzkyGolay::new(window, order)?,
        })
    }

    pub fn filter(&self) -> &SavitzkyGolay {
        &self.filter
    }

    /// Position of the smoothed channel's maximum.
    ///
    /// A constant channel has no peak and reports index 0.
    pub fn characteristic_index(&self, raw: &[f64]) -> Result<usize, MalformedCapture> {
        let smoothed = self.smooth(raw)?;
        if is_flat(raw) {
            return Ok(0);
        }
        Ok(argmax(&smoothed).unwrap_or(0))
    }

    /// Distance between the smoothed channel's maximum and minimum.
    pub fn peak_separation(&self, raw: &[f64]) -> Result<usize, MalformedCapture> {
        let smoothed = self.smooth(raw)?;
        if is_flat(raw) {
            return Ok(0);
        }
        let max = argmax(&smoothed).unwrap_or(0);
        let min = argmin(&smoothed).unwrap_or(0);
        Ok(max.abs_diff(min))
    }

    /// Compare a baseline capture with the capture under test.
    pub fn quality_diff(
        &self,
        initial: &SweepCapture,
        normal: &SweepCapture,
    ) -> Result<QualityResult, MalformedCapture> {
        if initial.samples() != normal.samples() {
            return Err(MalformedCapture::CaptureSizeMismatch {
                initial: initial.samples(),
                normal: normal.samples(),
            });
        }

        let mut phase = [0; CHANNEL_PAIRS];
        let mut magnitude = [0; CHANNEL_PAIRS];
        for pair in 0..CHANNEL_PAIRS {
            phase[pair] = self
                .characteristic_index(initial.phase(pair))?
                .abs_diff(self.characteristic_index(normal.phase(pair))?);
            magnitude[pair] = self
                .peak_separation(initial.magnitude(pair))?
                .abs_diff(self.peak_separation(normal.magnitude(pair))?);
        }

        Ok(QualityResult {
            phase,
            magnitude,
            ambient: normal.ambient(),
        })
    }

    fn smooth(&self, raw: &[f64]) -> Result<Vec<f64>, MalformedCapture> {
        self.filter.smooth(raw)
    }
}

fn is_flat(raw: &[f64]) -> bool {
    raw.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SMOOTHING_ORDER, SMOOTHING_WINDOW};

    const N: usize = 128;

    fn analyzer() -> Analyzer {
        Analyzer::new(SMOOTHING_WINDOW, SMOOTHING_ORDER).unwrap()
    }

    fn bump(center: f64, sigma: f64) -> Vec<f64> {
        (0..N)
            .map(|i| {
                let d = (i as f64 - center) / sigma;
                10.0 * (-0.5 * d * d).exp()
            })
            .collect()
    }

    /// Bump at `peak` plus a dip at `trough`.
    fn bump_and_dip(peak: f64, trough: f64) -> Vec<f64> {
        bump(peak, 8.0)
            .iter()
            .zip(bump(trough, 8.0))
            .map(|(p, t)| p - t)
            .collect()
    }

    fn capture(phase: Vec<f64>, magnitude: Vec<f64>) -> SweepCapture {
        SweepCapture::new(
            [
                phase.clone(),
                magnitude.clone(),
                phase.clone(),
                magnitude.clone(),
                phase,
                magnitude,
            ],
            Ambient {
                temperature: 4.0,
                humidity: Some(80.0),
            },
        )
        .unwrap()
    }

    #[test]
    fn argmax_ties_resolve_to_lowest_index() {
        assert_eq!(argmax(&[1.0, 3.0, 2.0, 3.0]), Some(1));
        assert_eq!(argmin(&[2.0, 0.0, 0.0, 1.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn characteristic_index_finds_smoothed_peak() {
        assert_eq!(analyzer().characteristic_index(&bump(50.0, 10.0)).unwrap(), 50);
    }

    /// Five-point spike `1,5,9,5,1` centred at `center` in `len` samples.
    fn spike(center: usize, len: usize) -> Vec<f64> {
        let mut v = vec![0.0; len];
        for (k, x) in [1.0, 5.0, 9.0, 5.0, 1.0].into_iter().enumerate() {
            v[center - 2 + k] = x;
        }
        v
    }

    #[test]
    fn spike_near_the_start_follows_the_edge_fit() {
        // Within half a window of the start the cubic fit over the first
        // window peaks at the boundary, not at the spike.
        let a = analyzer();
        assert_eq!(a.characteristic_index(&spike(3, 64)).unwrap(), 0);
        assert_eq!(a.characteristic_index(&spike(5, 64)).unwrap(), 5);
    }

    #[test]
    fn interior_spike_shift_is_reported_exactly() {
        let a = analyzer();
        let before = a.characteristic_index(&spike(40, N)).unwrap();
        let after = a.characteristic_index(&spike(42, N)).unwrap();
        assert_eq!((before, after), (40, 42));
        assert_eq!(before.abs_diff(after), 2);
    }

    #[test]
    fn characteristic_index_is_stable_under_noise() {
        let noisy: Vec<f64> = bump(64.0, 12.0)
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let index = analyzer().characteristic_index(&noisy).unwrap();
        assert!(index.abs_diff(64) <= 1, "peak at {index}");
    }

    #[test]
    fn flat_channel_reports_zero() {
        let a = analyzer();
        assert_eq!(a.characteristic_index(&[2.5; N]).unwrap(), 0);
        assert_eq!(a.peak_separation(&[2.5; N]).unwrap(), 0);
    }

    #[test]
    fn peak_separation_is_index_distance() {
        assert_eq!(analyzer().peak_separation(&bump_and_dip(40.0, 90.0)).unwrap(), 50);
        assert_eq!(analyzer().peak_separation(&bump_and_dip(90.0, 40.0)).unwrap(), 50);
    }

    #[test]
    fn quality_diff_reports_phase_shift() {
        let initial = capture(bump(50.0, 10.0), bump_and_dip(30.0, 90.0));
        let normal = capture(bump(52.0, 10.0), bump_and_dip(30.0, 80.0));
        let result = analyzer().quality_diff(&initial, &normal).unwrap();
        assert_eq!(result.phase, [2, 2, 2]);
        assert_eq!(result.magnitude, [10, 10, 10]);
        assert_eq!(result.ambient.humidity, Some(80.0));
    }

    #[test]
    fn identical_captures_score_zero() {
        let c = capture(bump(70.0, 9.0), bump_and_dip(20.0, 100.0));
        let result = analyzer().quality_diff(&c, &c).unwrap();
        assert_eq!(result.phase, [0; 3]);
        assert_eq!(result.magnitude, [0; 3]);
    }

    #[test]
    fn size_mismatch_is_malformed() {
        let initial = capture(bump(50.0, 10.0), bump(50.0, 10.0));
        let short = SweepCapture::new(
            core::array::from_fn(|_| vec![1.0; 64]),
            Ambient::default(),
        )
        .unwrap();
        assert_eq!(
            analyzer().quality_diff(&initial, &short),
            Err(MalformedCapture::CaptureSizeMismatch {
                initial: N,
                normal: 64
            })
        );
    }

    #[test]
    fn captures_shorter_than_window_are_malformed() {
        let tiny = SweepCapture::new(
            core::array::from_fn(|i| vec![i as f64, 1.0, 0.0]),
            Ambient::default(),
        )
        .unwrap();
        assert_eq!(
            analyzer().quality_diff(&tiny, &tiny),
            Err(MalformedCapture::TooShort {
                samples: 3,
                window: SMOOTHING_WINDOW
            })
        );
    }
}
