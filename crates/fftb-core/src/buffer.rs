//! Aligned, transform-ready sample buffers.
//!
//! [`AlignedBuffer`] owns a zero-initialized, fixed-length allocation whose
//! start address sits on a caller-chosen boundary (page size by default).
//! Vectorized transform kernels run fastest on aligned data; misalignment
//! only costs speed, so it is reported, never treated as an error.
//!
//! Allocation is fallible: instead of aborting the process through the
//! global allocation error handler, a failed allocation comes back as
//! [`Error::AllocationFailed`] carrying the buffer's name.
//!
//! # Example
//!
//! ```rust
//! use fftb_core::buffer::{AlignedBuffer, DEFAULT_ALIGNMENT};
//!
//! let mut buf = AlignedBuffer::<f64>::zeroed("red.spatial_in", 64, DEFAULT_ALIGNMENT).unwrap();
//! buf[3] = 0.5;
//! assert!(buf.is_aligned(DEFAULT_ALIGNMENT));
//! assert_eq!(buf.iter().sum::<f64>(), 0.5);
//! ```

use crate::{Error, Result};
use bytemuck::Zeroable;
use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Default alignment boundary in bytes (one page).
pub const DEFAULT_ALIGNMENT: usize = 4096;

/// Fixed-length, zero-initialized buffer aligned to a byte boundary.
///
/// Dereferences to `[T]`. `T` must be valid when all bits are zero
/// ([`Zeroable`]), which holds for `f64` and `Complex<f64>`.
pub struct AlignedBuffer<T: Zeroable + Copy> {
    ptr: NonNull<T>,
    len: usize,
    layout: Option<Layout>,
    name: String,
}

// SAFETY: the buffer uniquely owns its allocation, like `Vec<T>`.
unsafe impl<T: Zeroable + Copy + Send> Send for AlignedBuffer<T> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<T: Zeroable + Copy + Sync> Sync for AlignedBuffer<T> {}

impl<T: Zeroable + Copy> AlignedBuffer<T> {
    /// Allocates `len` zeroed elements aligned to `alignment` bytes.
    ///
    /// The effective alignment is never below `align_of::<T>()`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAlignment`] if `alignment` is not a power of two
    /// - [`Error::AllocationFailed`] if the size overflows or the allocator
    ///   returns null
    pub fn zeroed(name: impl Into<String>, len: usize, alignment: usize) -> Result<Self> {
        let name = name.into();
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        let align = alignment.max(mem::align_of::<T>());
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or_else(|| Error::allocation_failed(name.as_str(), usize::MAX))?;

        if bytes == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
                layout: None,
                name,
            });
        }

        let layout = Layout::from_size_align(bytes, align)
            .map_err(|_| Error::allocation_failed(name.as_str(), bytes))?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>())
            .ok_or_else(|| Error::allocation_failed(name.as_str(), bytes))?;

        #[cfg(debug_assertions)]
        debug!(buffer = %name, bytes, addr = ?ptr.as_ptr(), "allocated buffer");

        Ok(Self {
            ptr,
            len,
            layout: Some(layout),
            name,
        })
    }

    /// Allocates an aligned copy of `src`.
    pub fn from_slice(name: impl Into<String>, src: &[T], alignment: usize) -> Result<Self> {
        let mut buf = Self::zeroed(name, src.len(), alignment)?;
        buf.copy_from_slice(src);
        Ok(buf)
    }

    /// Buffer name used in diagnostics.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the allocation in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len * mem::size_of::<T>()
    }

    /// Distance in bytes from the start address to the previous `boundary`.
    ///
    /// Zero means aligned.
    #[inline]
    pub fn misalignment(&self, boundary: usize) -> usize {
        if boundary == 0 || self.layout.is_none() {
            return 0;
        }
        (self.ptr.as_ptr() as usize) % boundary
    }

    /// Returns `true` if the start address is a multiple of `boundary`.
    #[inline]
    pub fn is_aligned(&self, boundary: usize) -> bool {
        self.misalignment(boundary) == 0
    }

    /// Overwrites the contents with `src`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if `src` has a different length.
    pub fn fill_from(&mut self, src: &[T]) -> Result<()> {
        if src.len() != self.len {
            return Err(Error::length_mismatch(self.len, src.len()));
        }
        self.copy_from_slice(src);
        Ok(())
    }

    /// Resets every element to zero.
    pub fn clear(&mut self) {
        self.fill(T::zeroed());
    }
}

impl<T: Zeroable + Copy> Deref for AlignedBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid for len zero-initialized elements (or dangling with len 0).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable + Copy> DerefMut for AlignedBuffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable + Copy> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}

impl<T: Zeroable + Copy> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("addr", &self.ptr.as_ptr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn zeroed_is_zero_and_aligned() {
        let buf = AlignedBuffer::<f64>::zeroed("a", 1000, DEFAULT_ALIGNMENT).unwrap();
        assert_eq!(buf.len(), 1000);
        assert!(buf.iter().all(|&v| v == 0.0));
        assert!(buf.is_aligned(DEFAULT_ALIGNMENT));
        assert_eq!(buf.size_in_bytes(), 8000);
    }

    #[test]
    fn complex_buffer() {
        let mut buf = AlignedBuffer::<Complex<f64>>::zeroed("spec", 17, 64).unwrap();
        assert!(buf.iter().all(|c| c.re == 0.0 && c.im == 0.0));
        buf[16] = Complex::new(1.0, -1.0);
        assert_eq!(buf[16].im, -1.0);
        assert!(buf.is_aligned(64));
    }

    #[test]
    fn rejects_bad_alignment() {
        assert!(matches!(
            AlignedBuffer::<f64>::zeroed("a", 4, 24),
            Err(Error::InvalidAlignment(24))
        ));
        assert!(matches!(
            AlignedBuffer::<f64>::zeroed("a", 4, 0),
            Err(Error::InvalidAlignment(0))
        ));
    }

    #[test]
    fn overflow_reports_buffer_name() {
        let err = AlignedBuffer::<f64>::zeroed("huge", usize::MAX, 16).unwrap_err();
        assert!(err.to_string().contains("huge"));
    }

    #[test]
    fn fill_from_checks_length() {
        let mut buf = AlignedBuffer::<f64>::zeroed("a", 3, 16).unwrap();
        buf.fill_from(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(&buf[..], &[1.0, 2.0, 3.0]);
        assert!(buf.fill_from(&[1.0]).is_err());
        buf.clear();
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_buffer() {
        let buf = AlignedBuffer::<f64>::zeroed("empty", 0, 4096).unwrap();
        assert!(buf.is_empty());
        assert!(buf.is_aligned(4096));
    }
}
