//! Planar RGB sample data.
//!
//! The codec hands images over as three planes of normalized `[0, 1]`
//! samples in row-major order; the blur harness hands its result back in the
//! same form.

use crate::{Error, Result};

/// Three row-major planes of normalized samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbChannels {
    /// Image width (columns)
    pub width: usize,
    /// Image height (rows)
    pub height: usize,
    /// Red plane
    pub red: Vec<f64>,
    /// Green plane
    pub green: Vec<f64>,
    /// Blue plane
    pub blue: Vec<f64>,
}

impl RgbChannels {
    /// Creates channels from planes, checking every plane is `width * height`.
    pub fn new(
        width: usize,
        height: usize,
        red: Vec<f64>,
        green: Vec<f64>,
        blue: Vec<f64>,
    ) -> Result<Self> {
        let expected = width * height;
        for plane in [&red, &green, &blue] {
            if plane.len() != expected {
                return Err(Error::length_mismatch(expected, plane.len()));
            }
        }
        Ok(Self {
            width,
            height,
            red,
            green,
            blue,
        })
    }

    /// Image of a single color.
    pub fn uniform(width: usize, height: usize, rgb: [f64; 3]) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            red: vec![rgb[0]; n],
            green: vec![rgb[1]; n],
            blue: vec![rgb[2]; n],
        }
    }

    /// Number of pixels per plane.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Planes in red, green, blue order.
    pub fn planes(&self) -> [&[f64]; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// Interleaved `[r, g, b]` of one pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f64; 3] {
        let i = y * self.width + x;
        [self.red[i], self.green[i], self.blue[i]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_planes() {
        assert!(RgbChannels::new(2, 2, vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]).is_ok());
        assert!(RgbChannels::new(2, 2, vec![0.0; 4], vec![0.0; 3], vec![0.0; 4]).is_err());
    }

    #[test]
    fn uniform_pixel() {
        let img = RgbChannels::uniform(3, 2, [0.1, 0.2, 0.3]);
        assert_eq!(img.pixel_count(), 6);
        assert_eq!(img.pixel(2, 1), [0.1, 0.2, 0.3]);
    }
}
