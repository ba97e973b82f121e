//! Image codec adapter.
//!
//! Decodes PNG/JPEG files through the `image` crate into planar
//! [`RgbChannels`] and writes them back as 8-bit RGB.
//!
//! Samples are read at 16 bits per channel, so 8-bit sources are scaled up
//! by the codec (`v * 257`) before normalization by 65535. The result is
//! clamped to `≤ 1.0`.

use crate::{IoError, IoResult};
use fftb_core::RgbChannels;
use ::image::{ImageReader, Rgb, RgbImage};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

const U16_MAX: f64 = u16::MAX as f64;

/// Loads an image as normalized RGB planes.
///
/// # Errors
///
/// [`IoError::Decode`] naming the path if the file cannot be opened or
/// decoded.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> IoResult<RgbChannels> {
    let path = path.as_ref();
    let decode_err = |reason: String| IoError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let img = ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?
        .to_rgb16();

    let (width, height) = (img.width() as usize, img.height() as usize);
    let n = width * height;
    let mut red = Vec::with_capacity(n);
    let mut green = Vec::with_capacity(n);
    let mut blue = Vec::with_capacity(n);
    for px in img.pixels() {
        red.push(normalize(px[0]));
        green.push(normalize(px[1]));
        blue.push(normalize(px[2]));
    }

    debug!(path = %path.display(), width, height, "image loaded");
    Ok(RgbChannels::new(width, height, red, green, blue)?)
}

#[inline]
fn normalize(v: u16) -> f64 {
    (v as f64 / U16_MAX).min(1.0)
}

#[inline]
fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes normalized RGB planes as an 8-bit image; format follows the file
/// extension.
///
/// # Errors
///
/// [`IoError::Encode`] naming the path.
pub fn save_rgb<P: AsRef<Path>>(path: P, image: &RgbChannels) -> IoResult<()> {
    let path = path.as_ref();
    let encode_err = |reason: String| IoError::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let width = u32::try_from(image.width).map_err(|e| encode_err(e.to_string()))?;
    let height = u32::try_from(image.height).map_err(|e| encode_err(e.to_string()))?;
    let out = RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.pixel(x as usize, y as usize);
        Rgb([quantize(r), quantize(g), quantize(b)])
    });
    out.save(path).map_err(|e| encode_err(e.to_string()))?;

    debug!(path = %path.display(), width, height, "image saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_and_quantize() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(u16::MAX), 1.0);
        assert_eq!(quantize(1.5), 255);
        assert_eq!(quantize(-0.1), 0);
        assert_eq!(quantize(128.0 / 255.0), 128);
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_rgb("/nonexistent/fftb/cat.jpeg").unwrap_err();
        assert!(matches!(err, IoError::Decode { .. }));
        assert!(err.to_string().contains("cat.jpeg"));
    }
}
