use serde::{Deserialize, Serialize};

use ctrlmap_image::{Image, ImageError};

use super::{erode_half, hysteresis_threshold, suppress_gradient, thin_zhang_suen};
use crate::{color, filter};

/// Parameters of the edge detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeParams {
    /// Weak edge threshold, in the 0-255 range of the normalized magnitude.
    pub low_threshold: f32,
    /// Strong edge threshold, in the 0-255 range of the normalized magnitude.
    pub high_threshold: f32,
    /// Sigma of the gaussian pre-blur.
    pub sigma: f32,
    /// Interpolate neighbours during non-maximum suppression.
    pub subpixel: bool,
    /// Thin the linked edges to a one pixel wide skeleton.
    pub thinning: bool,
    /// Run the half-thickness erosion after thinning.
    pub half_thickness: bool,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            sigma: 1.4,
            subpixel: true,
            thinning: true,
            half_thickness: false,
        }
    }
}

/// Detect edges in an RGBA image.
///
/// # Arguments
///
/// * `src` - The input RGBA image.
/// * `params` - The detector parameters.
///
/// # Returns
///
/// A binary mask of the same size as `src` with edges set to
/// [`super::EDGE_VALUE`].
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::edges::{detect_edges, EdgeParams};
///
/// let image = Image::<u8, 4>::from_size_val(ImageSize { width: 4, height: 4 }, 255).unwrap();
/// let edges = detect_edges(&image, &EdgeParams::default()).unwrap();
///
/// assert!(edges.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn detect_edges(src: &Image<u8, 4>, params: &EdgeParams) -> Result<Image<u8, 1>, ImageError> {
    let mut luminance = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    color::luminance_from_rgba(src, &mut luminance)?;

    let mut blurred = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    filter::gaussian_blur(&luminance, &mut blurred, params.sigma)?;

    let gradient = filter::scharr_gradient(&blurred)?;
    let suppressed = suppress_gradient(&gradient, params.subpixel)?;

    let mut mask = Image::<u8, 1>::from_size_val(src.size(), 0)?;
    let passes = hysteresis_threshold(
        &suppressed,
        &mut mask,
        params.low_threshold,
        params.high_threshold,
    )?;

    let iterations = if params.thinning {
        thin_zhang_suen(&mut mask)
    } else {
        0
    };

    if params.half_thickness {
        let thinned = mask.clone();
        erode_half(&thinned, &mut mask)?;
    }

    log::debug!(
        "edges: {} hysteresis passes, {} thinning iterations, {} edge pixels",
        passes,
        iterations,
        mask.as_slice().iter().filter(|&&v| v != 0).count()
    );

    Ok(mask)
}
