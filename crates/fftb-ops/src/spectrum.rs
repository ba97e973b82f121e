//! Frequency-domain multiply (convolution theorem).
//!
//! Circular convolution in the spatial domain is pointwise multiplication of
//! the spectra. For real inputs only the half-spectra are stored, and the
//! product of two half-spectra is the half-spectrum of the convolution.
//!
//! No scaling happens here. The engine's inverse transform is unnormalized,
//! so results must be divided by the total sample count afterwards
//! ([`normalize_inverse`]).

use crate::{OpsError, OpsResult};
use num_complex::Complex;

/// `(a_re, a_im) × (b_re, b_im)`.
#[inline]
pub fn complex_multiply(a_re: f64, a_im: f64, b_re: f64, b_im: f64) -> (f64, f64) {
    (a_re * b_re - a_im * b_im, a_re * b_im + a_im * b_re)
}

/// Writes `signal[i] * kernel[i]` into `out[i]` for every shared bin.
///
/// # Errors
///
/// [`OpsError::SizeMismatch`] if the three spectra differ in length.
pub fn multiply_spectra(
    signal: &[Complex<f64>],
    kernel: &[Complex<f64>],
    out: &mut [Complex<f64>],
) -> OpsResult<()> {
    if signal.len() != kernel.len() || signal.len() != out.len() {
        return Err(OpsError::SizeMismatch(format!(
            "spectra lengths differ: signal {}, kernel {}, output {}",
            signal.len(),
            kernel.len(),
            out.len()
        )));
    }
    for ((dst, a), b) in out.iter_mut().zip(signal).zip(kernel) {
        let (re, im) = complex_multiply(a.re, a.im, b.re, b.im);
        *dst = Complex::new(re, im);
    }
    Ok(())
}

/// Divides unnormalized inverse-transform output by the sample count `n`.
pub fn normalize_inverse(samples: &mut [f64], n: usize) {
    let scale = 1.0 / n as f64;
    for v in samples {
        *v *= scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_matches_formula() {
        let (re, im) = complex_multiply(1.0, 2.0, 3.0, 4.0);
        assert_eq!(re, -5.0);
        assert_eq!(im, 10.0);
    }

    #[test]
    fn multiply_commutes() {
        let samples = [
            (0.5, -1.25, 3.0, 7.5),
            (1e10, -3e-7, 2.5e-3, 42.0),
            (-0.0, 0.0, 123.456, -654.321),
            (f64::MAX.sqrt(), 1.0, -1.0, f64::MIN_POSITIVE),
        ];
        for (a, b, c, d) in samples {
            assert_eq!(complex_multiply(a, b, c, d), complex_multiply(c, d, a, b));
        }
    }

    #[test]
    fn multiply_spectra_pointwise() {
        let a = [Complex::new(1.0, 1.0), Complex::new(0.0, 2.0)];
        let b = [Complex::new(2.0, 0.0), Complex::new(0.0, 1.0)];
        let mut out = [Complex::new(0.0, 0.0); 2];
        multiply_spectra(&a, &b, &mut out).unwrap();
        assert_eq!(out[0], Complex::new(2.0, 2.0));
        assert_eq!(out[1], Complex::new(-2.0, 0.0));
    }

    #[test]
    fn multiply_spectra_rejects_mismatch() {
        let a = [Complex::new(1.0, 1.0); 3];
        let b = [Complex::new(1.0, 1.0); 2];
        let mut out = [Complex::new(0.0, 0.0); 3];
        assert!(matches!(
            multiply_spectra(&a, &b, &mut out),
            Err(OpsError::SizeMismatch(_))
        ));
    }

    #[test]
    fn normalize_divides_by_count() {
        let mut v = vec![8.0, -4.0];
        normalize_inverse(&mut v, 4);
        assert_eq!(v, vec![2.0, -1.0]);
    }
}
