use serde::{Deserialize, Serialize};

use ctrlmap_image::{Image, ImageError};

use crate::{color, filter, parallel};

/// Parameters of the normal-map synthesizer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalParams {
    /// Multiplier applied to the height gradients.
    pub strength: f32,
    /// Flip the green channel (DirectX style normal maps).
    pub invert_y: bool,
    /// Read the height from the red channel only.
    pub grayscale_source: bool,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self {
            strength: 2.0,
            invert_y: false,
            grayscale_source: false,
        }
    }
}

/// Build a heightmap in `[0, 1]` from an RGBA image.
///
/// The height is the BT.709 luminance, or the red channel alone when
/// `red_only` is set.
pub fn heightmap_from_rgba(
    src: &Image<u8, 4>,
    dst: &mut Image<f32, 1>,
    red_only: bool,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let height = if red_only {
            src_pixel[0] as f32
        } else {
            color::bt709_luminance(src_pixel[0], src_pixel[1], src_pixel[2])
        };
        dst_pixel[0] = height / 255.0;
    });

    Ok(())
}

/// Encode a surface normal from its height gradients as an RGB triplet.
///
/// The normal `(-gx, -gy, 1)` is normalized and each component is mapped from
/// `[-1, 1]` to `[0, 255]`.
#[inline]
pub fn encode_normal(gx: f32, gy: f32) -> [u8; 3] {
    let (nx, ny, nz) = (-gx, -gy, 1.0f32);
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    let len = if len > 0.0 { len } else { 1.0 };
    [nx, ny, nz].map(|v| ((v / len * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Synthesize a tangent-space normal map from an RGBA image.
///
/// The image brightness is treated as a heightmap whose Sobel derivatives
/// give the surface slope. Borders replicate the edge pixels, so the output
/// has no dark frame.
///
/// # Arguments
///
/// * `src` - The input RGBA image.
/// * `params` - The synthesizer parameters.
///
/// # Returns
///
/// An opaque RGBA image of the same size encoding the normals.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::normal::{normal_map, NormalParams};
///
/// let image = Image::<u8, 4>::from_size_val(ImageSize { width: 3, height: 3 }, 90).unwrap();
/// let normals = normal_map(&image, &NormalParams::default()).unwrap();
///
/// assert_eq!(&normals.as_slice()[..4], &[128, 128, 255, 255]);
/// ```
pub fn normal_map(src: &Image<u8, 4>, params: &NormalParams) -> Result<Image<u8, 4>, ImageError> {
    let mut height = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    heightmap_from_rgba(src, &mut height, params.grayscale_source)?;

    let mut dx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut dy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    filter::spatial_gradient_replicate(&height, &mut dx, &mut dy)?;

    let strength = params.strength;
    let y_sign = if params.invert_y { -1.0 } else { 1.0 };
    let cols = src.cols();
    let (dx, dy) = (dx.as_slice(), dy.as_slice());

    let mut dst = Image::<u8, 4>::from_size_val(src.size(), 255)?;
    parallel::par_fill_rows(&mut dst, |r, row| {
        row.chunks_exact_mut(4).enumerate().for_each(|(c, pixel)| {
            let idx = r * cols + c;
            let rgb = encode_normal(dx[idx] * strength, dy[idx] * strength * y_sign);
            pixel[..3].copy_from_slice(&rgb);
        });
    });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ctrlmap_image::{Image, ImageError, ImageSize};

    use super::{normal_map, NormalParams};

    fn decode(pixel: &[u8]) -> [f32; 3] {
        [pixel[0], pixel[1], pixel[2]].map(|v| v as f32 / 255.0 * 2.0 - 1.0)
    }

    fn horizontal_ramp(width: usize, height: usize) -> Result<Image<u8, 4>, ImageError> {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..height {
            for x in 0..width {
                let v = (x * 255 / (width - 1)) as u8;
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Image::new(ImageSize { width, height }, data)
    }

    #[test]
    fn test_normals_are_unit_length() -> Result<(), ImageError> {
        let mut data = Vec::new();
        for y in 0..8usize {
            for x in 0..8usize {
                data.extend_from_slice(&[(x * 31) as u8, (y * 29) as u8, ((x * y) % 256) as u8, 255]);
            }
        }
        let image = Image::<u8, 4>::new([8, 8].into(), data)?;
        let normals = normal_map(&image, &NormalParams::default())?;

        for pixel in normals.as_slice().chunks_exact(4) {
            let [x, y, z] = decode(pixel);
            assert_relative_eq!((x * x + y * y + z * z).sqrt(), 1.0, epsilon = 0.02);
            assert!(z > 0.0);
            assert_eq!(pixel[3], 255);
        }
        Ok(())
    }

    #[test]
    fn test_ramp_tilts_against_slope() -> Result<(), ImageError> {
        let image = horizontal_ramp(6, 4)?;
        let normals = normal_map(&image, &NormalParams::default())?;

        let center = normals.as_slice()[(2 * 6 + 2) * 4..(2 * 6 + 2) * 4 + 4].to_vec();
        assert!(center[0] < 128);
        assert_eq!(center[1], 128);

        let inverted = normal_map(
            &image,
            &NormalParams {
                invert_y: true,
                ..Default::default()
            },
        )?;
        // no vertical slope, flipping y changes nothing
        assert_eq!(inverted.as_slice(), normals.as_slice());
        Ok(())
    }

    #[test]
    fn test_strength_scales_tilt() -> Result<(), ImageError> {
        let image = horizontal_ramp(6, 4)?;
        let soft = normal_map(&image, &NormalParams { strength: 0.5, ..Default::default() })?;
        let hard = normal_map(&image, &NormalParams { strength: 4.0, ..Default::default() })?;
        let idx = (2 * 6 + 2) * 4;
        assert!(hard.as_slice()[idx] < soft.as_slice()[idx]);
        assert!(hard.as_slice()[idx + 2] < soft.as_slice()[idx + 2]);
        Ok(())
    }

    #[test]
    fn test_grayscale_source_uses_red() -> Result<(), ImageError> {
        // red ramp under constant green: only the red channel carries height
        let mut data = Vec::new();
        for _ in 0..3 {
            for x in 0..5usize {
                data.extend_from_slice(&[(x * 60) as u8, 200 - (x * 40) as u8, 0, 255]);
            }
        }
        let image = Image::<u8, 4>::new([5, 3].into(), data)?;

        let red = normal_map(&image, &NormalParams { grayscale_source: true, ..Default::default() })?;
        let luma = normal_map(&image, &NormalParams::default())?;
        let idx = (5 + 2) * 4;
        assert!(red.as_slice()[idx] < 128);
        // green falls faster than red rises in luminance
        assert!(luma.as_slice()[idx] > 128);
        Ok(())
    }
}
