//! Representative-image selection and perceptual fingerprinting.

pub mod exif;
pub mod phash;
pub mod select;

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use tracing::{debug, instrument};

pub use phash::{hamming_distance, perceptual_hash};
pub use select::{background_image_url, representative_image_source, resolve_image_path};

use crate::error::Result;

/// Fingerprint an encoded image.
///
/// The EXIF orientation is sanitized and applied before hashing; decode
/// failures are errors, but unreadable EXIF is ignored.
pub fn compute_image_hash(bytes: &[u8]) -> Result<u64> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = match decoder.exif_metadata() {
        Ok(Some(block)) => exif::read_orientation(&block),
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable EXIF block");
            None
        }
    };
    let mut image = DynamicImage::from_decoder(decoder)?;
    if let Some(raw) = orientation {
        let sanitized = exif::sanitize_orientation(raw);
        if sanitized != raw.0 {
            debug!(raw = raw.0, sanitized, "clamped EXIF orientation");
        }
        if let Some(transform) = exif::orientation_transform(sanitized) {
            image.apply_orientation(transform);
        }
    }
    Ok(hash_pixels(image))
}

#[instrument(level = "debug")]
pub fn hash_image_file(path: &Path) -> Result<u64> {
    compute_image_hash(&fs::read(path)?)
}

/// Hash decoded pixels, making alpha-only images visible first.
pub fn hash_pixels(image: DynamicImage) -> u64 {
    let mut rgba = image.into_rgba8();
    if remap_black_alpha(&mut rgba) {
        debug!("all pixels black; hashing the alpha channel");
    }
    perceptual_hash(&DynamicImage::ImageRgba8(rgba).into_rgb8())
}

/// When every pixel is pure black, copy alpha into R, G and B.
///
/// Line art is often stored as black with varying alpha, which would
/// otherwise hash as a blank image. Returns whether the remap happened.
pub fn remap_black_alpha(image: &mut RgbaImage) -> bool {
    if !image.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0) {
        return false;
    }
    for pixel in image.pixels_mut() {
        let alpha = pixel[3];
        pixel[0] = alpha;
        pixel[1] = alpha;
        pixel[2] = alpha;
    }
    true
}
