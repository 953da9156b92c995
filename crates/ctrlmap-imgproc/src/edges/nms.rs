use ctrlmap_image::{Image, ImageError};

use crate::filter::Gradient;
use crate::interpolation::bilinear_sample_or_edge;

/// Range the gradient magnitude is scaled to before suppression.
pub const MAGNITUDE_RANGE: f32 = 255.0;

/// Scale a magnitude image in place so that its maximum becomes [`MAGNITUDE_RANGE`].
///
/// An all-zero image is left untouched (scale of 1).
pub fn normalize_magnitude(magnitude: &mut Image<f32, 1>) {
    let max = magnitude
        .as_slice()
        .iter()
        .fold(0.0f32, |acc, &v| acc.max(v));

    let scale = if max > 0.0 {
        MAGNITUDE_RANGE / max
    } else {
        log::debug!("zero gradient magnitude, skipping normalization");
        1.0
    };

    magnitude.as_slice_mut().iter_mut().for_each(|v| *v *= scale);
}

/// Suppress gradient magnitudes that are not local maxima along the
/// gradient direction.
///
/// In sub-pixel mode the two neighbours are sampled at `(x, y) ± (cosθ, sinθ)`
/// with [`bilinear_sample_or_edge`]. Otherwise the direction is folded into
/// `[0°, 180°)` and quantized into four 45° bins, and the two lattice
/// neighbours of that bin are compared.
///
/// A pixel survives when its magnitude is greater than or equal to both
/// neighbours. Border pixels are always zero in the output.
///
/// # Arguments
///
/// * `magnitude` - The gradient magnitude, usually normalized with [`normalize_magnitude`].
/// * `direction` - The gradient direction in radians.
/// * `dst` - The suppressed magnitude.
/// * `subpixel` - Whether to interpolate the neighbours.
pub fn non_maximum_suppression(
    magnitude: &Image<f32, 1>,
    direction: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    subpixel: bool,
) -> Result<(), ImageError> {
    for other in [direction.size(), dst.size()] {
        if magnitude.size() != other {
            return Err(ImageError::InvalidImageSize(
                magnitude.cols(),
                magnitude.rows(),
                other.width,
                other.height,
            ));
        }
    }

    let (rows, cols) = (magnitude.rows(), magnitude.cols());
    dst.as_slice_mut().iter_mut().for_each(|v| *v = 0.0);
    if rows < 3 || cols < 3 {
        return Ok(());
    }

    let mag = magnitude.as_slice();
    let dir = direction.as_slice();
    let out = dst.as_slice_mut();

    for y in 1..rows - 1 {
        for x in 1..cols - 1 {
            let idx = y * cols + x;
            let m = mag[idx];
            let theta = dir[idx];

            let (n1, n2) = if subpixel {
                let (sin, cos) = theta.sin_cos();
                let (xf, yf) = (x as f32, y as f32);
                (
                    bilinear_sample_or_edge(magnitude, xf + cos, yf + sin),
                    bilinear_sample_or_edge(magnitude, xf - cos, yf - sin),
                )
            } else {
                let (dx, dy) = quantized_step(theta);
                let fwd = ((y as isize + dy) as usize) * cols + (x as isize + dx) as usize;
                let bwd = ((y as isize - dy) as usize) * cols + (x as isize - dx) as usize;
                (mag[fwd], mag[bwd])
            };

            if m >= n1 && m >= n2 {
                out[idx] = m;
            }
        }
    }

    Ok(())
}

/// Lattice step along the gradient for one of the four 45° orientation bins.
fn quantized_step(theta: f32) -> (isize, isize) {
    let mut angle = theta.to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }

    if !(22.5..157.5).contains(&angle) {
        (1, 0)
    } else if angle < 67.5 {
        (1, 1)
    } else if angle < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    }
}

/// Run the magnitude normalization and suppression on a gradient.
pub fn suppress_gradient(gradient: &Gradient, subpixel: bool) -> Result<Image<f32, 1>, ImageError> {
    let mut magnitude = gradient.magnitude.clone();
    normalize_magnitude(&mut magnitude);

    let mut suppressed = Image::<f32, 1>::from_size_val(magnitude.size(), 0.0)?;
    non_maximum_suppression(&magnitude, &gradient.direction, &mut suppressed, subpixel)?;
    Ok(suppressed)
}
