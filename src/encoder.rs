//! Raster encoders for recorded frame pairs.
//!
//! Depth frames persist as single-channel 16-bit greyscale PNG, which
//! round-trips Z16 samples bit-exactly. Color frames persist as RGB JPEG.

use crate::traits::{ColorRaster, DepthRaster, Error, Result};
use image::{ImageBuffer, ImageFormat, Luma, Rgb};
use std::path::Path;

/// Write a depth raster as a 16-bit greyscale PNG at `path`.
///
/// The encoding is lossless: decoding the file with any 16-bit greyscale
/// PNG reader reproduces the input samples exactly. Fails with
/// [`Error::ShapeMismatch`] when the sample count does not match the
/// declared dimensions, and propagates I/O failures; it never truncates
/// or pads.
pub fn write_depth_png(path: &Path, depth: &DepthRaster) -> Result<()> {
    let expected = (depth.width as usize) * (depth.height as usize);
    if depth.data.len() != expected {
        return Err(Error::ShapeMismatch {
            expected,
            actual: depth.data.len(),
        });
    }

    // from_raw tolerates oversized buffers; exact equality is enforced above
    let image: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(depth.width, depth.height, depth.data.clone()).ok_or(
            Error::ShapeMismatch {
                expected,
                actual: depth.data.len(),
            },
        )?;

    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Write a color raster as an RGB JPEG at `path`.
///
/// Same shape contract as [`write_depth_png`]: the sample count must
/// match the declared dimensions exactly.
pub fn write_color_jpeg(path: &Path, color: &ColorRaster) -> Result<()> {
    let expected = (color.width as usize) * (color.height as usize) * 3;
    if color.data.len() != expected {
        return Err(Error::ShapeMismatch {
            expected,
            actual: color.data.len(),
        });
    }

    let image: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(color.width, color.height, color.data.clone()).ok_or(
            Error::ShapeMismatch {
                expected,
                actual: color.data.len(),
            },
        )?;

    image.save_with_format(path, ImageFormat::Jpeg)?;
    Ok(())
}
