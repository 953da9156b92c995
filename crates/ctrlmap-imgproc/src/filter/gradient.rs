use ctrlmap_image::{Image, ImageError};

use super::{kernels, separable_filter::clamp_index};
use crate::parallel;

/// First order derivatives of a single channel image.
#[derive(Clone, Debug)]
pub struct Gradient {
    /// Derivative along x.
    pub gx: Image<f32, 1>,
    /// Derivative along y.
    pub gy: Image<f32, 1>,
    /// Gradient magnitude `sqrt(gx² + gy²)`.
    pub magnitude: Image<f32, 1>,
    /// Gradient direction `atan2(gy, gx)` in radians.
    pub direction: Image<f32, 1>,
}

/// Compute the image gradient with the 3x3 Scharr operator.
///
/// Only interior pixels are evaluated: the first and last rows and columns
/// keep a zero gradient. Images smaller than 3x3 yield an all-zero gradient.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
///
/// # Returns
///
/// The derivatives, magnitude and direction, all with the size of `src`.
pub fn scharr_gradient(src: &Image<f32, 1>) -> Result<Gradient, ImageError> {
    let size = src.size();
    let mut gx = Image::<f32, 1>::from_size_val(size, 0.0)?;
    let mut gy = Image::<f32, 1>::from_size_val(size, 0.0)?;
    let mut magnitude = Image::<f32, 1>::from_size_val(size, 0.0)?;
    let mut direction = Image::<f32, 1>::from_size_val(size, 0.0)?;

    let (rows, cols) = (src.rows(), src.cols());
    if rows < 3 || cols < 3 {
        return Ok(Gradient {
            gx,
            gy,
            magnitude,
            direction,
        });
    }

    let (kernel_x, kernel_y) = kernels::scharr_kernel3();
    let data = src.as_slice();

    let gx_data = gx.as_slice_mut();
    let gy_data = gy.as_slice_mut();
    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (dy, (row_x, row_y)) in kernel_x.iter().zip(kernel_y.iter()).enumerate() {
                let offset = (r + dy - 1) * cols + c - 1;
                for dx in 0..3 {
                    let val = data[offset + dx];
                    sum_x += val * row_x[dx];
                    sum_y += val * row_y[dx];
                }
            }
            gx_data[r * cols + c] = sum_x;
            gy_data[r * cols + c] = sum_y;
        }
    }

    magnitude
        .as_slice_mut()
        .iter_mut()
        .zip(direction.as_slice_mut().iter_mut())
        .zip(gx.as_slice().iter().zip(gy.as_slice().iter()))
        .for_each(|((mag, dir), (&x, &y))| {
            *mag = (x * x + y * y).sqrt();
            *dir = y.atan2(x);
        });

    Ok(Gradient {
        gx,
        gy,
        magnitude,
        direction,
    })
}

/// Compute the first order image derivative in both x and y using a Sobel
/// operator with replicate (edge-clamped) padding.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dx` - The destination image for the x derivative.
/// * `dy` - The destination image for the y derivative.
pub fn spatial_gradient_replicate(
    src: &Image<f32, 1>,
    dx: &mut Image<f32, 1>,
    dy: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    if src.size() != dx.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dx.cols(),
            dx.rows(),
        ));
    }

    if src.size() != dy.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dy.cols(),
            dy.rows(),
        ));
    }

    let (sobel_x, sobel_y) = kernels::sobel_kernel3();
    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();

    let sample = |r: usize, c: usize, kernel: &[[f32; 3]; 3]| -> f32 {
        let mut sum = 0.0;
        for (ky, kernel_row) in kernel.iter().enumerate() {
            let y = clamp_index(r as isize + ky as isize - 1, rows);
            for (kx, &w) in kernel_row.iter().enumerate() {
                let x = clamp_index(c as isize + kx as isize - 1, cols);
                sum += data[y * cols + x] * w;
            }
        }
        sum
    };

    parallel::par_fill_rows(dx, |r, row| {
        row.iter_mut()
            .enumerate()
            .for_each(|(c, v)| *v = sample(r, c, &sobel_x));
    });
    parallel::par_fill_rows(dy, |r, row| {
        row.iter_mut()
            .enumerate()
            .for_each(|(c, v)| *v = sample(r, c, &sobel_y));
    });

    Ok(())
}
