use ctrlmap_image::{Image, ImageError};

use crate::parallel;

/// Apply a separable filter to an image with edge-clamped sampling.
///
/// The horizontal kernel is applied first into a temporary buffer, then the
/// vertical kernel. Samples that fall outside the image are replaced by the
/// nearest border sample, and each pass divides by the sum of the kernel
/// weights.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidParameter(
            "kernel",
            "kernels must not be empty".to_string(),
        ));
    }

    let rows = src.rows();
    let cols = src.cols();
    let norm_x = kernel_sum(kernel_x);
    let norm_y = kernel_sum(kernel_y);
    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;

    // horizontal pass
    let mut temp = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    let src_data = src.as_slice();
    parallel::par_fill_rows(&mut temp, |r, row_temp| {
        let row_offset = r * cols * C;
        for c in 0..cols {
            let mut acc = [0.0f32; C];
            for (k, &w) in kernel_x.iter().enumerate() {
                let x = clamp_index(c as isize + k as isize - half_x, cols);
                let idx = row_offset + x * C;
                for (ch, acc_val) in acc.iter_mut().enumerate() {
                    *acc_val += src_data[idx + ch] * w;
                }
            }
            for (ch, &acc_val) in acc.iter().enumerate() {
                row_temp[c * C + ch] = acc_val / norm_x;
            }
        }
    });

    // vertical pass
    let temp_data = temp.as_slice();
    parallel::par_fill_rows(dst, |r, row_dst| {
        for c in 0..cols {
            let mut acc = [0.0f32; C];
            for (k, &w) in kernel_y.iter().enumerate() {
                let y = clamp_index(r as isize + k as isize - half_y, rows);
                let idx = (y * cols + c) * C;
                for (ch, acc_val) in acc.iter_mut().enumerate() {
                    *acc_val += temp_data[idx + ch] * w;
                }
            }
            for (ch, &acc_val) in acc.iter().enumerate() {
                row_dst[c * C + ch] = acc_val / norm_y;
            }
        }
    });

    Ok(())
}

/// Clamp a signed index into `[0, len - 1]`.
#[inline]
pub(crate) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn kernel_sum(kernel: &[f32]) -> f32 {
    let sum = kernel.iter().sum::<f32>();
    if sum == 0.0 {
        1.0
    } else {
        sum
    }
}
