//! Problem shapes for real-input transforms.
//!
//! A [`Shape`] is the row-major list of dimension sizes `n₁ × … × n_R`.
//! The last dimension is contiguous in memory. A real-to-complex transform
//! only stores the non-redundant half of the spectrum along that axis, so
//! the half-spectrum has `n₁ × … × (n_R/2 + 1)` entries.

use crate::{Error, Result};
use std::fmt;

/// Row-major problem shape of rank ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a shape, validating rank and sizes.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if the rank is zero, any dimension is zero,
    /// or the total sample count overflows `usize`.
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        if dims.is_empty() {
            return Err(Error::invalid_shape(dims, "rank must be at least 1"));
        }
        if let Some(axis) = dims.iter().position(|&n| n == 0) {
            return Err(Error::invalid_shape(
                dims,
                format!("dimension {axis} has size 0"),
            ));
        }
        if dims.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n)).is_none() {
            return Err(Error::invalid_shape(dims, "total sample count overflows"));
        }
        Ok(Self { dims })
    }

    /// Shape of a `rows × cols` image.
    pub fn image(rows: usize, cols: usize) -> Result<Self> {
        Self::new(vec![rows, cols])
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Dimension sizes.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Size of the last (contiguous) dimension.
    #[inline]
    pub fn last(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    /// Total number of real samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Always `false`; shapes cannot be empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Dimensions of the half-spectrum.
    pub fn spectrum_dims(&self) -> Vec<usize> {
        let mut dims = self.dims.clone();
        let last = dims.len() - 1;
        dims[last] = dims[last] / 2 + 1;
        dims
    }

    /// Number of complex entries in the half-spectrum.
    #[inline]
    pub fn spectrum_len(&self) -> usize {
        self.len() / self.last() * (self.last() / 2 + 1)
    }

    /// Row-major element strides of `dims`.
    pub fn strides_of(dims: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; dims.len()];
        for axis in (0..dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * dims[axis + 1];
        }
        strides
    }

    /// Row-major element strides of the real layout.
    pub fn strides(&self) -> Vec<usize> {
        Self::strides_of(&self.dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.dims.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join(" x "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_shape() {
        let s = Shape::image(4, 6).unwrap();
        assert_eq!(s.rank(), 2);
        assert_eq!(s.len(), 24);
        assert_eq!(s.spectrum_dims(), vec![4, 4]);
        assert_eq!(s.spectrum_len(), 16);
        assert_eq!(s.to_string(), "4 x 6");
    }

    #[test]
    fn odd_last_dimension() {
        let s = Shape::new(vec![3, 2, 7]).unwrap();
        assert_eq!(s.spectrum_dims(), vec![3, 2, 4]);
        assert_eq!(s.spectrum_len(), 24);
        assert_eq!(s.strides(), vec![14, 7, 1]);
    }

    #[test]
    fn rank_one() {
        let s = Shape::new(vec![8]).unwrap();
        assert_eq!(s.spectrum_len(), 5);
        assert_eq!(s.strides(), vec![1]);
    }

    #[test]
    fn rejects_invalid() {
        assert!(Shape::new(Vec::<usize>::new()).is_err());
        assert!(Shape::new(vec![4, 0]).is_err());
        assert!(Shape::new(vec![usize::MAX, 2]).is_err());
    }
}
