//! Adaptive-threshold handwriting removal.

use super::HandwritingRemover;
use crate::imaging::{adaptive_threshold, invert, open_square, to_grayscale, Polarity};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};

/// Calibration constant reported by [`ThresholdRemover`].
pub const THRESHOLD_CONFIDENCE: f64 = 0.7;

/// Tunables of the threshold strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Odd side length of the averaging window.
    pub block_size: u32,
    /// Subtracted from the local mean before comparing.
    pub bias: i32,
    /// Odd side length of the square opening element.
    pub kernel_size: u32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 11,
            bias: 2,
            kernel_size: 3,
        }
    }
}

/// Separates print from pencil by local luminance.
///
/// Print stays darker than its neighbourhood while light pencil washes out,
/// and the opening deletes specks smaller than the structuring element.
#[derive(Debug, Clone, Default)]
pub struct ThresholdRemover {
    params: ThresholdParams,
}

impl ThresholdRemover {
    /// Creates a remover with the given parameters.
    #[must_use]
    pub const fn new(params: ThresholdParams) -> Self {
        Self { params }
    }

    /// Returns the configured parameters.
    #[must_use]
    pub const fn params(&self) -> ThresholdParams {
        self.params
    }
}

impl HandwritingRemover for ThresholdRemover {
    fn remove(&self, image: &DynamicImage) -> GrayImage {
        let gray = to_grayscale(image);
        // Foreground (print) becomes 255 here.
        let binary = adaptive_threshold(&gray, self.params.block_size, self.params.bias, Polarity::Inverted);
        let opened = open_square(&binary, self.params.kernel_size);
        invert(&opened)
    }

    fn method_name(&self) -> &str {
        "grayscale_adaptive_threshold"
    }

    fn confidence(&self) -> f64 {
        THRESHOLD_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn page_with_bar_and_speck() -> DynamicImage {
        let mut rgb = RgbImage::from_pixel(60, 40, Rgb([245, 245, 245]));
        for x in 5..55 {
            for y in 10..13 {
                rgb.put_pixel(x, y, Rgb([15, 15, 15]));
            }
        }
        rgb.put_pixel(30, 30, Rgb([120, 120, 120]));
        DynamicImage::ImageRgb8(rgb)
    }

    #[test]
    fn test_white_page_stays_white() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([255])));
        let cleaned = ThresholdRemover::default().remove(&page);

        assert_eq!(cleaned.dimensions(), (100, 100));
        assert!(cleaned.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_keeps_print_and_drops_speck() {
        let cleaned = ThresholdRemover::default().remove(&page_with_bar_and_speck());

        assert_eq!(cleaned.get_pixel(30, 11).0[0], 0);
        assert_eq!(cleaned.get_pixel(30, 30).0[0], 255);
        assert_eq!(cleaned.get_pixel(2, 2).0[0], 255);
    }

    #[test]
    fn test_output_is_binary() {
        let cleaned = ThresholdRemover::default().remove(&page_with_bar_and_speck());
        assert!(cleaned.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_idempotent_on_same_input() {
        let remover = ThresholdRemover::default();
        let page = page_with_bar_and_speck();

        assert_eq!(remover.remove(&page), remover.remove(&page));
    }

    #[test]
    fn test_params_are_kept() {
        let params = ThresholdParams {
            block_size: 15,
            bias: 4,
            kernel_size: 5,
        };
        assert_eq!(ThresholdRemover::new(params).params(), params);
    }
}
