//! Image fixtures.

use image::{GrayImage, ImageFormat, Luma};
use std::path::{Path, PathBuf};

/// A white page.
#[must_use]
pub fn blank_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// A white page with a dark horizontal bar, like a printed rule.
#[must_use]
pub fn ruled_page(width: u32, height: u32) -> GrayImage {
    let mut page = blank_page(width, height);
    let top = height / 3;
    for y in top..(top + 3).min(height) {
        for x in width / 10..width - width / 10 {
            page.put_pixel(x, y, Luma([20]));
        }
    }
    page
}

/// Writes `image` as PNG into `dir` and returns the path.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[allow(clippy::missing_panics_doc)]
pub fn write_png(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    image
        .save_with_format(&path, ImageFormat::Png)
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
    path
}
