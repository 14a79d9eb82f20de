//! Raster map decoding.
//!
//! Accepts any format the `image` crate can decode (PNG, JPEG, BMP, WebP)
//! and produces an 8-bit RGB raster. Alpha is dropped; marker colors are
//! compared on RGB only.

use std::path::Path;

use racesplice_pipeline::RgbImage;

use crate::IoError;

/// Decode raw image bytes into an RGB raster.
///
/// # Errors
///
/// Returns [`IoError::EmptyImage`] if `bytes` is empty.
/// Returns [`IoError::ImageDecode`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode_map_image(bytes: &[u8]) -> Result<RgbImage, IoError> {
    if bytes.is_empty() {
        return Err(IoError::EmptyImage);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Read and decode the raster at `path`.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read, otherwise the
/// errors of [`decode_map_image`].
pub fn load_map_image(path: &Path) -> Result<RgbImage, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_map_image(&bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode an RGBA image as PNG bytes.
    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_map_image(&[]), Err(IoError::EmptyImage)));
    }

    #[test]
    fn corrupt_bytes_return_decode_error() {
        let result = decode_map_image(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(IoError::ImageDecode(_))));
    }

    #[test]
    fn alpha_is_dropped_and_colors_kept_exactly() {
        let img = image::RgbaImage::from_fn(3, 2, |x, _| {
            if x == 1 {
                image::Rgba([0x84, 0x36, 0x7b, 128])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let rgb = decode_map_image(&encode_png(&img)).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(*rgb.get_pixel(1, 1), image::Rgb([0x84, 0x36, 0x7b]));
        assert_eq!(*rgb.get_pixel(0, 0), image::Rgb([255, 255, 255]));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_map_image(Path::new("/nonexistent/racesplice/map.png"));
        assert!(matches!(result, Err(IoError::Read { .. })));
    }
}
