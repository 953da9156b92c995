use ctrlmap_image::{Image, ImageError};

use super::{kernels, separable_filter};

/// Blur an image using a gaussian blur filter
///
/// The kernel size is derived from sigma with [`kernels::gaussian_kernel_size`]
/// and the same 1-D kernel is used for both directions.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The sigma of the gaussian kernel. Must be finite and positive.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::filter::gaussian_blur;
///
/// let image = Image::<f32, 1>::from_size_val(ImageSize { width: 8, height: 8 }, 10.0).unwrap();
/// let mut blurred = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// gaussian_blur(&image, &mut blurred, 1.4).unwrap();
/// assert!((blurred.as_slice()[0] - 10.0).abs() < 1e-4);
/// ```
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
) -> Result<(), ImageError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ImageError::InvalidParameter(
            "sigma",
            format!("must be finite and positive, got {sigma}"),
        ));
    }

    let kernel_size = kernels::gaussian_kernel_size(sigma);
    let kernel = kernels::gaussian_kernel_1d(kernel_size, sigma);
    separable_filter(src, dst, &kernel, &kernel)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ctrlmap_image::{Image, ImageError};

    #[test]
    fn test_gaussian_blur_invalid_sigma() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_size_val([4, 4].into(), 1.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        assert!(super::gaussian_blur(&img, &mut dst, 0.0).is_err());
        assert!(super::gaussian_blur(&img, &mut dst, f32::NAN).is_err());
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_preserves_mass() -> Result<(), ImageError> {
        let mut img = Image::<f32, 1>::from_size_val([21, 21].into(), 0.0)?;
        img.set_pixel(10, 10, 0, 100.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        super::gaussian_blur(&img, &mut dst, 1.4)?;

        // the footprint stays inside the image, so nothing is lost
        assert_relative_eq!(dst.as_slice().iter().sum::<f32>(), 100.0, epsilon = 1e-3);
        let center = dst.get_pixel(10, 10, 0)?;
        assert!(center < 100.0);
        assert!(dst.as_slice().iter().all(|&v| v <= center));

        Ok(())
    }
}
