//! Gaussian kernel construction and padding.
//!
//! The kernel is a small `K × K` matrix of 2-D Gaussian densities sampled
//! around the kernel midpoint and normalized to unit mass, so convolving
//! with it preserves average brightness.
//!
//! Before transformation it is zero-padded into a buffer of the full working
//! size. The default [`KernelPlacement::TopLeft`] puts the kernel flush at the
//! origin; this shifts the blurred image by the kernel midpoint.
//! [`KernelPlacement::Centered`] wraps the midpoint onto the origin instead.
//!
//! # Example
//!
//! ```rust
//! use fftb_ops::kernel::{GaussianKernel, KernelPlacement};
//!
//! let k = GaussianKernel::new(16, 3.0).unwrap();
//! let padded = k.padded(32, 32, KernelPlacement::TopLeft).unwrap();
//! assert_eq!(padded.len(), 32 * 32);
//! assert!((padded.iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! ```

use crate::{OpsError, OpsResult};
use std::f64::consts::PI;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Default kernel extent in samples.
pub const DEFAULT_KERNEL_SIZE: usize = 16;

/// Default standard deviation in samples.
pub const DEFAULT_SIGMA: f64 = 3.0;

/// 2-D Gaussian density `G(x, y)` with standard deviation `sigma`.
#[inline]
pub fn gaussian_density(x: f64, y: f64, sigma: f64) -> f64 {
    let s2 = sigma * sigma;
    (1.0 / (2.0 * PI * s2)) * (-(x * x + y * y) / (2.0 * s2)).exp()
}

/// Where the kernel lands inside the padded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelPlacement {
    /// Kernel cell `(0, 0)` at buffer origin.
    #[default]
    TopLeft,
    /// Kernel midpoint at buffer origin, wrapping around the edges.
    Centered,
}

/// Normalized square Gaussian kernel.
#[derive(Debug, Clone)]
pub struct GaussianKernel {
    extent: usize,
    sigma: f64,
    weights: Vec<f64>,
}

impl GaussianKernel {
    /// Builds a `extent × extent` kernel with standard deviation `sigma`.
    ///
    /// Cell `(row, col)` holds the density at `(col - K/2, row - K/2)`
    /// divided by the sum over all cells.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for a zero extent or a non-positive
    /// or non-finite sigma.
    pub fn new(extent: usize, sigma: f64) -> OpsResult<Self> {
        if extent == 0 {
            return Err(OpsError::InvalidParameter(
                "kernel extent must be at least 1".into(),
            ));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "sigma must be positive and finite, got {sigma}"
            )));
        }

        let half = (extent / 2) as f64;
        let mut weights = Vec::with_capacity(extent * extent);
        let mut sum = 0.0f64;
        for row in 0..extent {
            for col in 0..extent {
                let w = gaussian_density(col as f64 - half, row as f64 - half, sigma);
                weights.push(w);
                sum += w;
            }
        }
        for w in &mut weights {
            *w /= sum;
        }

        trace!(extent, sigma, "gaussian kernel built");
        Ok(Self {
            extent,
            sigma,
            weights,
        })
    }

    /// Kernel extent `K`.
    #[inline]
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Standard deviation.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Row-major normalized weights (`K * K` values).
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.extent + col]
    }

    /// Writes the kernel into a `rows × cols` buffer, zeroing every other cell.
    ///
    /// # Errors
    ///
    /// - [`OpsError::SizeMismatch`] if `dst` is not `rows * cols` long
    /// - [`OpsError::InvalidParameter`] if the kernel does not fit
    pub fn pad_into(
        &self,
        dst: &mut [f64],
        rows: usize,
        cols: usize,
        placement: KernelPlacement,
    ) -> OpsResult<()> {
        if dst.len() != rows * cols {
            return Err(OpsError::SizeMismatch(format!(
                "padded kernel buffer has {} cells, expected {rows}x{cols}",
                dst.len()
            )));
        }
        if self.extent > rows || self.extent > cols {
            return Err(OpsError::InvalidParameter(format!(
                "kernel extent {} exceeds working size {rows}x{cols}",
                self.extent
            )));
        }

        dst.fill(0.0);
        let k = self.extent;
        match placement {
            KernelPlacement::TopLeft => {
                for row in 0..k {
                    dst[row * cols..row * cols + k]
                        .copy_from_slice(&self.weights[row * k..(row + 1) * k]);
                }
            }
            KernelPlacement::Centered => {
                let half = k / 2;
                for row in 0..k {
                    let y = (row + rows - half) % rows;
                    for col in 0..k {
                        let x = (col + cols - half) % cols;
                        dst[y * cols + x] = self.at(row, col);
                    }
                }
            }
        }
        debug!(extent = k, rows, cols, ?placement, "kernel padded");
        Ok(())
    }

    /// Returns the kernel padded to `rows × cols`.
    pub fn padded(
        &self,
        rows: usize,
        cols: usize,
        placement: KernelPlacement,
    ) -> OpsResult<Vec<f64>> {
        let mut out = vec![0.0; rows * cols];
        self.pad_into(&mut out, rows, cols, placement)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mass_is_one() {
        for extent in [1, 2, 3, 5, 8, 16, 31] {
            for sigma in [0.3, 1.0, 3.0, 10.0] {
                let k = GaussianKernel::new(extent, sigma).unwrap();
                assert_abs_diff_eq!(k.weights().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn peak_at_midpoint() {
        let k = GaussianKernel::new(16, 3.0).unwrap();
        let peak = k.at(8, 8);
        assert!(k.weights().iter().all(|&w| w <= peak));
        assert_abs_diff_eq!(k.at(8, 7), k.at(7, 8), epsilon = 1e-15);
    }

    #[test]
    fn top_left_padding_is_zero_outside() {
        let k = GaussianKernel::new(4, 1.0).unwrap();
        let (rows, cols) = (7, 9);
        let padded = k.padded(rows, cols, KernelPlacement::TopLeft).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                let v = padded[y * cols + x];
                if y < 4 && x < 4 {
                    assert_eq!(v, k.at(y, x));
                } else {
                    assert_eq!(v, 0.0);
                }
            }
        }
    }

    #[test]
    fn centered_padding_wraps_midpoint_to_origin() {
        let k = GaussianKernel::new(5, 1.0).unwrap();
        let padded = k.padded(8, 8, KernelPlacement::Centered).unwrap();
        assert_eq!(padded[0], k.at(2, 2));
        assert_eq!(padded[7 * 8 + 7], k.at(1, 1));
        assert_abs_diff_eq!(padded.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_eq!(padded.iter().filter(|&&v| v != 0.0).count(), 25);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(GaussianKernel::new(0, 1.0).is_err());
        assert!(GaussianKernel::new(3, 0.0).is_err());
        assert!(GaussianKernel::new(3, f64::NAN).is_err());
        let k = GaussianKernel::new(16, 3.0).unwrap();
        assert!(k.padded(8, 32, KernelPlacement::TopLeft).is_err());
        let mut small = vec![0.0; 3];
        assert!(k.pad_into(&mut small, 32, 32, KernelPlacement::TopLeft).is_err());
    }
}
