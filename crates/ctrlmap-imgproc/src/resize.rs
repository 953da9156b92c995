use ctrlmap_image::{Image, ImageError};

use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel;

/// Resize an image to a new size.
///
/// The output pixel grid is mapped linearly onto the input so that the
/// corner pixels of both images coincide.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, its size is the target size.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::interpolation::InterpolationMode;
/// use ctrlmap_imgproc::resize::resize_native;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let mut image_resized = Image::<_, 3>::from_size_val([2, 3].into(), 0.0).unwrap();
///
/// resize_native(&image, &mut image_resized, InterpolationMode::Nearest).unwrap();
///
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
pub fn resize_native<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    let step = |src_len: usize, dst_len: usize| {
        if dst_len > 1 {
            (src_len - 1) as f32 / (dst_len - 1) as f32
        } else {
            0.0
        }
    };

    let step_x = step(src.cols(), dst.cols());
    let step_y = step(src.rows(), dst.rows());

    parallel::par_fill_rows(dst, |r, row| {
        let v = r as f32 * step_y;
        row.chunks_exact_mut(C).enumerate().for_each(|(c, out)| {
            let u = c as f32 * step_x;
            out.copy_from_slice(&interpolate_pixel(src, u, v, interpolation));
        });
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::interpolation::InterpolationMode;
    use approx::assert_relative_eq;
    use ctrlmap_image::{Image, ImageError};

    #[test]
    fn resize_bilinear_upsample() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([2, 1].into(), vec![0.0, 10.0])?;
        let mut resized = Image::<f32, 1>::from_size_val([5, 2].into(), 0.0)?;
        super::resize_native(&image, &mut resized, InterpolationMode::Bilinear)?;

        let expected = [0.0, 2.5, 5.0, 7.5, 10.0];
        for row in resized.as_slice().chunks_exact(5) {
            for (&v, &e) in row.iter().zip(expected.iter()) {
                assert_relative_eq!(v, e, epsilon = 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn resize_nearest_downsample() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([4, 1].into(), vec![1.0, 2.0, 3.0, 4.0])?;
        let mut resized = Image::<f32, 1>::from_size_val([2, 1].into(), 0.0)?;
        super::resize_native(&image, &mut resized, InterpolationMode::Nearest)?;
        assert_eq!(resized.as_slice(), &[1.0, 4.0]);
        Ok(())
    }
}
