//! Pre- and post-processing around a monocular depth network.
//!
//! The network itself is not part of this crate. [`prepare_depth_input`]
//! builds its fixed size input and [`visualize_depth`] turns its output back
//! into a gray control image.

use serde::{Deserialize, Serialize};

use ctrlmap_image::{ops, Image, ImageError, ImageSize};

use crate::interpolation::InterpolationMode;
use crate::{parallel, resize};

/// Side of the square RGB input expected by the depth network.
pub const DEPTH_INPUT_SIZE: usize = 256;

/// Parameters of the depth visualizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DepthParams {
    /// Interpolation used to bring the depth buffer back to the image size.
    pub interpolation: InterpolationMode,
}

/// Prepare an RGBA image as depth network input.
///
/// The image is scaled to `[0, 1]`, stripped of its alpha channel and
/// resampled to [`DEPTH_INPUT_SIZE`] x [`DEPTH_INPUT_SIZE`] with bilinear
/// interpolation, ignoring the aspect ratio.
pub fn prepare_depth_input(src: &Image<u8, 4>) -> Result<Image<f32, 3>, ImageError> {
    let rgba = src.cast_and_scale::<f32>(1.0 / 255.0)?;

    let mut rgb = Image::<f32, 3>::from_size_val(src.size(), 0.0)?;
    parallel::par_iter_rows(&rgba, &mut rgb, |src_pixel, dst_pixel| {
        dst_pixel.copy_from_slice(&src_pixel[..3]);
    });

    let mut input = Image::<f32, 3>::from_size_val(
        ImageSize {
            width: DEPTH_INPUT_SIZE,
            height: DEPTH_INPUT_SIZE,
        },
        0.0,
    )?;
    resize::resize_native(&rgb, &mut input, InterpolationMode::Bilinear)?;

    Ok(input)
}

/// Render a depth buffer as an opaque gray RGBA image.
///
/// Depth values are min-max normalized to `0..=255`; a constant buffer maps
/// to black. The normalized buffer is then resized to `target_size`.
///
/// # Arguments
///
/// * `depth` - The raw depth network output.
/// * `target_size` - The size of the output image, usually the source image size.
/// * `params` - The visualizer parameters.
pub fn visualize_depth(
    depth: &Image<f32, 1>,
    target_size: ImageSize,
    params: &DepthParams,
) -> Result<Image<u8, 4>, ImageError> {
    if target_size.area() == 0 {
        return Err(ImageError::InvalidParameter(
            "target_size",
            target_size.to_string(),
        ));
    }

    let (min, max) = ops::find_min_max(depth);
    let range = max - min;
    if !range.is_finite() {
        log::warn!("depth buffer has a non-finite range [{min}, {max}]");
    }
    let scale = if range > 0.0 { 255.0 / range } else { 0.0 };

    let mut normalized = Image::<f32, 1>::from_size_val(depth.size(), 0.0)?;
    parallel::par_iter_rows_val(depth, &mut normalized, |&src, dst| {
        *dst = (src - min) * scale;
    });

    let mut resized = Image::<f32, 1>::from_size_val(target_size, 0.0)?;
    resize::resize_native(&normalized, &mut resized, params.interpolation)?;

    let gray = Image::<u8, 1>::new(
        target_size,
        resized
            .as_slice()
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect(),
    )?;

    let mut dst = Image::<u8, 4>::from_size_val(target_size, 0)?;
    ops::rgba_from_gray(&gray, &mut dst)?;

    Ok(dst)
}
