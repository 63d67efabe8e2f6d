//! Savitzky-Golay smoothing.
//!
//! Every output sample is the value, at that sample, of a least-squares
//! polynomial fitted over a `window`-sample neighbourhood. Interior samples
//! use the centred window. The first and last `window / 2` samples reuse
//! the first and last full window ("interp" edge handling), so no padding
//! is invented.

use crate::error::{Error, MalformedCapture};

pub struct SavitzkyGolay {
    window: usize,
    order: usize,
    /// Row `r` holds the weights that give the fitted value at window
    /// position `r` (row-major, `window × window`).
    projection: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<Self, Error> {
        if window == 0 || window % 2 == 0 || order >= window {
            return Err(Error::InvalidFilter { window, order });
        }
        let projection =
            projection_matrix(window, order).ok_or(Error::InvalidFilter { window, order })?;
        Ok(Self {
            window,
            order,
            projection,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Convolution weights for an interior sample.
    pub fn coefficients(&self) -> &[f64] {
        let half = self.window / 2;
        &self.projection[half * self.window..(half + 1) * self.window]
    }

    /// Smooth `data`. Needs at least `window` samples.
    pub fn smooth(&self, data: &[f64]) -> Result<Vec<f64>, MalformedCapture> {
        let n = data.len();
        let w = self.window;
        if n < w {
            return Err(MalformedCapture::TooShort {
                samples: n,
                window: w,
            });
        }
        let half = w / 2;
        let last_start = n - w;

        let out = (0..n)
            .map(|i| {
                let (start, row) = if i < half {
                    (0, i)
                } else if i > last_start + half {
                    (last_start, i - last_start)
                } else {
                    (i - half, half)
                };
                let weights = &self.projection[row * w..(row + 1) * w];
                weights
                    .iter()
                    .zip(&data[start..start + w])
                    .map(|(c, x)| c * x)
                    .sum()
            })
            .collect();
        Ok(out)
    }
}

/// `A (AᵀA)⁻¹ Aᵀ` for the Vandermonde matrix `A` of a centred window.
///
/// Positions are scaled to [-1, 1] to keep `AᵀA` well conditioned; the
/// projection does not depend on that scaling.
fn projection_matrix(window: usize, order: usize) -> Option<Vec<f64>> {
    let half = window / 2;
    let cols = order + 1;
    let scale = half.max(1) as f64;

    let vander: Vec<Vec<f64>> = (0..window)
        .map(|k| {
            let u = (k as f64 - half as f64) / scale;
            (0..cols).map(|j| u.powi(j as i32)).collect()
        })
        .collect();

    // Normal equations: (AᵀA) X = Aᵀ, solved for all window columns at once.
    let mut aug: Vec<Vec<f64>> = (0..cols)
        .map(|r| {
            let mut row: Vec<f64> = (0..cols)
                .map(|c| vander.iter().map(|a| a[r] * a[c]).sum())
                .collect();
            row.extend(vander.iter().map(|a| a[r]));
            row
        })
        .collect();
    gauss_jordan(&mut aug, cols)?;

    let mut projection = vec![0.0; window * window];
    for (r, a) in vander.iter().enumerate() {
        for k in 0..window {
            projection[r * window + k] = (0..cols).map(|j| a[j] * aug[j][cols + k]).sum();
        }
    }
    Some(projection)
}

/// Reduce the left `n × n` block of `aug` to the identity in place.
fn gauss_jordan(aug: &mut [Vec<f64>], n: usize) -> Option<()> {
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))?;
        if aug[pivot][col].abs() < f64::EPSILON {
            return None;
        }
        aug.swap(col, pivot);

        let p = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= p;
        }
        let pivot_row = aug[col].clone();
        for (r, row) in aug.iter_mut().enumerate().take(n) {
            let factor = row[col];
            if r == col || factor == 0.0 {
                continue;
            }
            for (v, pv) in row.iter_mut().zip(&pivot_row) {
                *v -= factor * pv;
            }
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn textbook_five_point_quadratic() {
        let filter = SavitzkyGolay::new(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (c, e) in filter.coefficients().iter().zip(expected) {
            assert!(close(*c, e), "{c} != {e}");
        }
    }

    #[test]
    fn coefficients_sum_to_one() {
        let filter = SavitzkyGolay::new(31, 3).unwrap();
        let sum: f64 = filter.coefficients().iter().sum();
        assert!(close(sum, 1.0));
    }

    #[test]
    fn cubic_passes_through_unchanged() {
        let filter = SavitzkyGolay::new(31, 3).unwrap();
        let data: Vec<f64> = (0..80)
            .map(|i| {
                let x = i as f64 / 10.0;
                0.5 * x * x * x - 2.0 * x * x + x - 7.0
            })
            .collect();
        let smoothed = filter.smooth(&data).unwrap();
        for (s, d) in smoothed.iter().zip(&data) {
            assert!((s - d).abs() < 1e-6, "{s} != {d}");
        }
    }

    #[test]
    fn window_equal_to_length_is_accepted() {
        let filter = SavitzkyGolay::new(5, 2).unwrap();
        let smoothed = filter.smooth(&[1.0, 4.0, 9.0, 16.0, 25.0]).unwrap();
        assert!(close(smoothed[0], 1.0));
        assert!(close(smoothed[4], 25.0));
    }

    #[test]
    fn short_input_is_malformed() {
        let filter = SavitzkyGolay::new(31, 3).unwrap();
        assert_eq!(
            filter.smooth(&[0.0; 30]),
            Err(MalformedCapture::TooShort {
                samples: 30,
                window: 31
            })
        );
    }

    #[test]
    fn bad_parameters_are_rejected() {
        assert!(matches!(
            SavitzkyGolay::new(30, 3),
            Err(Error::InvalidFilter { window: 30, order: 3 })
        ));
        assert!(SavitzkyGolay::new(3, 3).is_err());
        assert!(SavitzkyGolay::new(0, 0).is_err());
        assert!(SavitzkyGolay::new(1, 0).is_ok());
    }
}
