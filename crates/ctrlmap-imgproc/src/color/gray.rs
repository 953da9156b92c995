use crate::parallel;
use ctrlmap_image::{Image, ImageError};

/// BT.709 weights used by the edge pipeline and the normal-map heightmap.
const BT709_RW: f32 = 0.2126;
const BT709_GW: f32 = 0.7152;
const BT709_BW: f32 = 0.0722;

/// Legacy NTSC (BT.601) weights used by the light extractor.
const NTSC_RW: f32 = 0.299;
const NTSC_GW: f32 = 0.587;
const NTSC_BW: f32 = 0.114;

/// Convert an RGBA8 image to a luminance image using the formula:
///
/// Y = 0.2126 * R + 0.7152 * G + 0.0722 * B
///
/// The output stays in the 0-255 range. The alpha channel is ignored.
///
/// # Arguments
///
/// * `src` - The input RGBA image.
/// * `dst` - The output luminance image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::color::luminance_from_rgba;
///
/// let image = Image::<u8, 4>::new(
///     ImageSize {
///         width: 1,
///         height: 1,
///     },
///     vec![255, 255, 255, 255],
/// )
/// .unwrap();
///
/// let mut gray = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// luminance_from_rgba(&image, &mut gray).unwrap();
/// assert!((gray.as_slice()[0] - 255.0).abs() < 1e-3);
/// ```
pub fn luminance_from_rgba(src: &Image<u8, 4>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = bt709_luminance(src_pixel[0], src_pixel[1], src_pixel[2]);
    });

    Ok(())
}

/// Convert an RGBA8 image to a normalized brightness mask using the formula:
///
/// Y = (0.299 * R + 0.587 * G + 0.114 * B) / 255
///
/// The output is in the 0-1 range. The alpha channel is ignored.
///
/// # Arguments
///
/// * `src` - The input RGBA image.
/// * `dst` - The output brightness mask.
///
/// Precondition: the input and output images must have the same size.
pub fn brightness_from_rgba(src: &Image<u8, 4>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let r = src_pixel[0] as f32;
        let g = src_pixel[1] as f32;
        let b = src_pixel[2] as f32;
        dst_pixel[0] = (NTSC_RW * r + NTSC_GW * g + NTSC_BW * b) / 255.0;
    });

    Ok(())
}

/// BT.709 luminance of a single 8-bit RGB triplet, in the 0-255 range.
#[inline]
pub fn bt709_luminance(r: u8, g: u8, b: u8) -> f32 {
    BT709_RW * r as f32 + BT709_GW * g as f32 + BT709_BW * b as f32
}
