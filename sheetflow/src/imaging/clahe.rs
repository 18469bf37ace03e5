//! Contrast-limited adaptive histogram equalization.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Parameters for tile-based equalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    /// Histogram clip limit, relative to a flat histogram.
    pub clip_limit: f64,
    /// Number of tiles along each axis.
    pub tiles: u32,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles: 8,
        }
    }
}

/// Equalizes contrast per tile, clipping each tile histogram and blending the
/// four nearest tile mappings bilinearly so tile seams do not show.
///
/// Images smaller than the tile grid use one tile per pixel row/column.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn equalize_adaptive(gray: &GrayImage, params: ClaheParams) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(params.tiles.clamp(1, width));
    let tile_h = height.div_ceil(params.tiles.clamp(1, height));
    let cols = width.div_ceil(tile_w);
    let rows = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((cols * rows) as usize);
    for ty in 0..rows {
        for tx in 0..cols {
            luts.push(tile_lut(gray, tx * tile_w, ty * tile_h, tile_w, tile_h, params.clip_limit));
        }
    }

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        let (ty1, ty2, ya) = neighbours(y, tile_h, rows);
        for x in 0..width {
            let (tx1, tx2, xa) = neighbours(x, tile_w, cols);
            let v = gray.get_pixel(x, y).0[0] as usize;

            let lut = |tx: u32, ty: u32| f64::from(luts[(ty * cols + tx) as usize][v]);
            let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
            let blended = top * (1.0 - ya) + bottom * ya;

            output.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    output
}

/// Returns the two tile indices around `pos` and the weight of the second.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f64) {
    let centre = (f64::from(pos) + 0.5) / f64::from(tile) - 0.5;
    let lower = centre.floor();
    let weight = centre - lower;

    let last = i64::from(count) - 1;
    let first = (lower as i64).clamp(0, last) as u32;
    let second = (lower as i64 + 1).clamp(0, last) as u32;
    (first, second, weight)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, tile_w: u32, tile_h: u32, clip_limit: f64) -> [u8; BINS] {
    let x1 = (x0 + tile_w).min(gray.width());
    let y1 = (y0 + tile_h).min(gray.height());

    let mut hist = [0usize; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let area = ((x1 - x0) * (y1 - y0)) as usize;

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f64 / BINS as f64) as usize).max(1);
        let mut excess = 0usize;
        for count in &mut hist {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }

        let batch = excess / BINS;
        let mut residual = excess % BINS;
        for count in &mut hist {
            *count += batch;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            let mut i = 0;
            while i < BINS && residual > 0 {
                hist[i] += 1;
                residual -= 1;
                i += step;
            }
        }
    }

    let scale = (BINS - 1) as f64 / area as f64;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0usize;
    for (i, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[i] = (cumulative as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_dimensions() {
        let gray = GrayImage::from_pixel(37, 23, Luma([90]));
        let out = equalize_adaptive(&gray, ClaheParams::default());
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn test_uniform_image_stays_uniform() {
        let gray = GrayImage::from_pixel(64, 64, Luma([0]));
        let out = equalize_adaptive(&gray, ClaheParams::default());

        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
        // Clipping spreads the spike, so a black page lifts only slightly.
        assert!(first < 16);
    }

    #[test]
    fn test_stretches_low_contrast() {
        let mut gray = GrayImage::new(64, 64);
        for (x, _, pixel) in gray.enumerate_pixels_mut() {
            *pixel = Luma([if x < 32 { 100 } else { 110 }]);
        }

        let out = equalize_adaptive(&gray, ClaheParams { clip_limit: 40.0, tiles: 1 });
        let dark = i32::from(out.get_pixel(0, 0).0[0]);
        let light = i32::from(out.get_pixel(63, 0).0[0]);
        assert!(light - dark > 10);
    }

    #[test]
    fn test_single_pixel() {
        let gray = GrayImage::from_pixel(1, 1, Luma([200]));
        let out = equalize_adaptive(&gray, ClaheParams::default());
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_neighbours_clamp_at_edges() {
        assert_eq!(neighbours(0, 8, 4).0, 0);
        let (first, second, _) = neighbours(31, 8, 4);
        assert_eq!((first, second), (3, 3));
    }
}
