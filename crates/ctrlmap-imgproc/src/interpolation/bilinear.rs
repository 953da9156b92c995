use ctrlmap_image::Image;

/// Kernel for bilinear interpolation with clamped corners.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u = u.max(0.0);
    let v = v.max(0.0);

    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);

    let frac_u = u.fract();
    let frac_v = v.fract();

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let data = image.as_slice();
    let p00 = &data[(iv0 * cols + iu0) * C..][..C];
    let p01 = &data[(iv0 * cols + iu1) * C..][..C];
    let p10 = &data[(iv1 * cols + iu0) * C..][..C];
    let p11 = &data[(iv1 * cols + iu1) * C..][..C];

    let mut pixel = [0.0; C];
    for k in 0..C {
        pixel[k] = p00[k] * w00 + p01[k] * w01 + p10[k] * w10 + p11[k] * w11;
    }

    pixel
}

/// Sample a single channel image at a sub-pixel location.
///
/// The sample is the bilinear blend of the four pixels surrounding `(x, y)`
/// with two edge fallbacks:
///
/// * if the top-left corner `(floor(x), floor(y))` lies outside the image the
///   sample is `0`;
/// * if the bottom-right corner `(floor(x) + 1, floor(y) + 1)` lies outside
///   the image the top-left sample is returned unchanged.
///
/// # Arguments
///
/// * `image` - The input image.
/// * `x` - The x coordinate of the sample.
/// * `y` - The y coordinate of the sample.
pub fn bilinear_sample_or_edge(image: &Image<f32, 1>, x: f32, y: f32) -> f32 {
    let (rows, cols) = (image.rows() as isize, image.cols() as isize);

    let x0 = x.floor() as isize;
    let y0 = y.floor() as isize;

    if x0 < 0 || y0 < 0 || x0 >= cols || y0 >= rows {
        return 0.0;
    }

    let data = image.as_slice();
    let at = |xi: isize, yi: isize| data[(yi * cols + xi) as usize];

    let (x1, y1) = (x0 + 1, y0 + 1);
    if x1 >= cols || y1 >= rows {
        return at(x0, y0);
    }

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
    let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}
