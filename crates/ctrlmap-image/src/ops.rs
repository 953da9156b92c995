use crate::{Image, ImageError};

/// Find the minimum and maximum values in an image.
///
/// # Arguments
///
/// * `image` - The input image of shape (height, width, channels).
///
/// # Returns
///
/// A tuple containing the minimum and maximum values in the image.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_image::ops::find_min_max;
///
/// let image = Image::<f32, 1>::new(
///   ImageSize {
///     width: 2,
///     height: 2,
///   },
///   vec![0.5, -1.0, 3.0, 2.0],
/// )
/// .unwrap();
///
/// let (min, max) = find_min_max(&image);
/// assert_eq!(min, -1.0);
/// assert_eq!(max, 3.0);
/// ```
pub fn find_min_max<T, const C: usize>(image: &Image<T, C>) -> (T, T)
where
    T: Copy + PartialOrd,
{
    // images are never empty, so the first sample always exists
    let first = image.as_slice()[0];

    image
        .as_slice()
        .iter()
        .fold((first, first), |(min, max), &x| {
            let min = if x < min { x } else { min };
            let max = if x > max { x } else { max };
            (min, max)
        })
}

/// Expand a single channel image into an opaque gray RGBA image.
///
/// # Arguments
///
/// * `src` - The input gray image.
/// * `dst` - The output RGBA image.
///
/// Precondition: the input and output images must have the same size.
pub fn rgba_from_gray(src: &Image<u8, 1>, dst: &mut Image<u8, 4>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    dst.as_slice_mut()
        .chunks_exact_mut(4)
        .zip(src.as_slice().iter())
        .for_each(|(dst_pixel, &v)| {
            dst_pixel[0] = v;
            dst_pixel[1] = v;
            dst_pixel[2] = v;
            dst_pixel[3] = 255;
        });

    Ok(())
}
