//! Morphological cleanup of binary images.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

/// Applies an opening (erosion then dilation) with a `kernel_size` square.
///
/// Foreground is any non-zero pixel. Specks smaller than the element vanish;
/// strokes at least as thick as the element survive unchanged. A kernel of 1
/// is the identity.
#[must_use]
pub fn open_square(binary: &GrayImage, kernel_size: u32) -> GrayImage {
    let radius = u8::try_from(kernel_size / 2).unwrap_or(u8::MAX);
    if radius == 0 {
        return binary.clone();
    }
    open(binary, Norm::LInf, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_open_removes_isolated_speck() {
        let mut binary = GrayImage::new(20, 20);
        binary.put_pixel(10, 10, Luma([255]));

        let opened = open_square(&binary, 3);
        assert!(opened.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_open_keeps_thick_stroke() {
        let mut binary = GrayImage::new(20, 20);
        for y in 5..9 {
            for x in 0..20 {
                binary.put_pixel(x, y, Luma([255]));
            }
        }

        let opened = open_square(&binary, 3);
        assert_eq!(opened, binary);
    }

    #[test]
    fn test_kernel_of_one_is_identity() {
        let mut binary = GrayImage::new(8, 8);
        binary.put_pixel(3, 3, Luma([255]));

        assert_eq!(open_square(&binary, 1), binary);
    }
}
