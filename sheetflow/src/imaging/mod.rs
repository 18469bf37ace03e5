//! Pixel-level building blocks shared by the removers and the OCR stage.
//!
//! Everything here is a pure function of pixel data and parameters: the same
//! input always yields bit-identical output.

mod clahe;
mod morphology;
mod ocr_prep;
mod threshold;

pub use clahe::{equalize_adaptive, ClaheParams};
pub use morphology::open_square;
pub use ocr_prep::{preprocess_for_ocr, OcrPrepParams};
pub use threshold::{adaptive_threshold, Polarity};

use image::{DynamicImage, GrayImage};

/// Converts any decoded image to a single-channel 8-bit buffer.
#[must_use]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Returns the photographic negative of a grayscale buffer.
#[must_use]
pub fn invert(gray: &GrayImage) -> GrayImage {
    let mut out = gray.clone();
    image::imageops::invert(&mut out);
    out
}
