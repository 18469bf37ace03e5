//! Locally-adaptive binarization.

use image::{GrayImage, Luma};

/// Which side of the local threshold becomes white.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels brighter than the local threshold become 255.
    Binary,
    /// Pixels at or below the local threshold become 255 (ink as foreground).
    Inverted,
}

/// Thresholds every pixel against the mean of the `block_size` square around
/// it, minus `bias`.
///
/// The window is clipped at the image border, so edge pixels average over
/// fewer neighbours instead of replicated ones. `block_size` must be odd.
#[must_use]
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, bias: i32, polarity: Polarity) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = block_size / 2;
    let integral = integral_image(gray);

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let threshold = region_mean(&integral, width, height, x, y, radius) - f64::from(bias);
            let value = f64::from(gray.get_pixel(x, y).0[0]);
            let above = value > threshold;
            let white = match polarity {
                Polarity::Binary => above,
                Polarity::Inverted => !above,
            };
            output.put_pixel(x, y, Luma([if white { 255 } else { 0 }]));
        }
    }
    output
}

/// Summed-area table with a zero-padded first row and column.
///
/// `table[y * (width + 1) + x]` holds the sum over `[0, x) x [0, y)`.
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = w as usize + 1;
    let mut table = vec![0u64; stride * (h as usize + 1)];

    for y in 0..h as usize {
        let mut row_sum = 0u64;
        for x in 0..w as usize {
            row_sum += u64::from(gray.get_pixel(x as u32, y as u32).0[0]);
            table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
        }
    }
    table
}

#[allow(clippy::cast_precision_loss)]
fn region_mean(integral: &[u64], width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = width as usize + 1;
    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx.saturating_add(radius) as usize + 1).min(width as usize);
    let y2 = (cy.saturating_add(radius) as usize + 1).min(height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = integral[y2 * stride + x2] + integral[y1 * stride + x1]
        - integral[y1 * stride + x2]
        - integral[y2 * stride + x1];
    sum as f64 / area
}
