//! Image preparation ahead of text recognition.

use super::{adaptive_threshold, equalize_adaptive, invert, to_grayscale, ClaheParams, Polarity};
use image::{DynamicImage, GrayImage};

/// Parameters for [`preprocess_for_ocr`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrPrepParams {
    /// Adaptive threshold window size in pixels.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub bias: i32,
    /// Contrast equalization settings.
    pub clahe: ClaheParams,
}

impl Default for OcrPrepParams {
    fn default() -> Self {
        Self {
            block_size: 11,
            bias: 2,
            clahe: ClaheParams::default(),
        }
    }
}

/// Grayscale, invert, equalize, then binarize.
///
/// Inversion turns dark ink into bright foreground before equalization, and
/// the final threshold keeps pixels brighter than their neighbourhood.
#[must_use]
pub fn preprocess_for_ocr(image: &DynamicImage, params: &OcrPrepParams) -> GrayImage {
    let gray = to_grayscale(image);
    let inverted = invert(&gray);
    let equalized = equalize_adaptive(&inverted, params.clahe);
    adaptive_threshold(&equalized, params.block_size, params.bias, Polarity::Binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_output_is_binary() {
        let mut rgb = RgbImage::from_pixel(40, 40, Rgb([250, 250, 250]));
        for x in 10..30 {
            rgb.put_pixel(x, 20, Rgb([20, 20, 20]));
        }

        let prepared = preprocess_for_ocr(&DynamicImage::ImageRgb8(rgb), &OcrPrepParams::default());
        assert_eq!(prepared.dimensions(), (40, 40));
        assert!(prepared.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_deterministic() {
        let gray = GrayImage::from_fn(32, 32, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let image = DynamicImage::ImageLuma8(gray);
        let params = OcrPrepParams::default();

        assert_eq!(preprocess_for_ocr(&image, &params), preprocess_for_ocr(&image, &params));
    }
}
