use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use ctrlmap_image::{Image, ImageError};

use super::{find_blobs, LightBlob};
use crate::angle::turn_fraction;
use crate::color;

/// Smallest blob kept by the extractor, in pixels.
pub const MIN_LIGHT_AREA: usize = 100;

/// Smallest blob kept by the extractor, as a fraction of the image area.
pub const MIN_LIGHT_AREA_FRACTION: f64 = 0.0005;

/// Maximum number of light sources returned.
pub const MAX_LIGHTS: usize = 10;

const MIN_LIGHT_SIZE: f64 = 0.15;
const MIN_LIGHT_POWER: f64 = 0.3;

/// Parameters of the light-source extractor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightParams {
    /// Minimum brightness in `[0, 1]` of a light pixel.
    pub threshold: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self { threshold: 0.7 }
    }
}

/// A light source found in an image.
///
/// All positional fields are normalized by the image dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSource {
    /// One-based rank of the light, largest first.
    pub id: u32,
    /// Centroid as `[x / width, y / height]`.
    pub position: [f64; 2],
    /// How circular the light is, in `[0.15, 0.5]`.
    pub circle_amount: f64,
    /// Normalized diameter of the light.
    pub size: f64,
    /// Mean color as `#rrggbb`.
    pub color: String,
    /// Light power in `[0, 1]`.
    pub power: f64,
    /// Orientation of the major axis as a fraction of a turn in `[0, 1)`.
    pub rotation: f64,
    /// Light intensity in `[0, 1]`.
    pub intensity: f64,
}

impl LightSource {
    fn from_blob(blob: &LightBlob, id: u32, width: usize, height: usize) -> Self {
        let (cx, cy) = blob.centroid();
        let shape = blob.shape();
        let max_side = width.max(height) as f64;

        let radius = (blob.area as f64 / PI).sqrt() / max_side;
        let power = blob.mean_luminance().max(MIN_LIGHT_POWER).clamp(0.0, 1.0);
        let [r, g, b] = blob.mean_color();

        Self {
            id,
            position: [cx / width as f64, cy / height as f64],
            circle_amount: 0.15 + 0.35 * shape.roundness,
            size: 2.0 * radius.max(MIN_LIGHT_SIZE),
            color: format!("#{r:02x}{g:02x}{b:02x}"),
            power,
            rotation: turn_fraction(shape.angle),
            intensity: power,
        }
    }
}

/// Extract light sources from a brightness mask.
///
/// Pixels with a mask value `>= threshold` are grouped into 8-connected
/// blobs. Blobs smaller than `max(100, 0.0005 * width * height)` pixels are
/// dropped, the rest are described, sorted by area (largest first, ties in
/// discovery order) and truncated to [`MAX_LIGHTS`].
///
/// # Arguments
///
/// * `mask` - The brightness mask in `[0, 1]`.
/// * `color` - The RGBA image the colors are averaged from.
/// * `threshold` - The minimum brightness of a light pixel.
///
/// Precondition: the mask and color images must have the same size.
///
/// Returns [`ImageError::InvalidParameter`] if `threshold` is not finite.
pub fn extract_lights(
    mask: &Image<f32, 1>,
    color: &Image<u8, 4>,
    threshold: f32,
) -> Result<Vec<LightSource>, ImageError> {
    if !threshold.is_finite() {
        return Err(ImageError::InvalidParameter(
            "threshold",
            format!("must be finite, got {threshold}"),
        ));
    }

    let (width, height) = (mask.width(), mask.height());
    let min_area =
        MIN_LIGHT_AREA.max((MIN_LIGHT_AREA_FRACTION * mask.size().area() as f64).ceil() as usize);

    let mut blobs = find_blobs(mask, color, threshold)?;
    let found = blobs.len();
    blobs.retain(|blob| blob.area >= min_area);

    // sort_by is stable, equal areas keep their discovery order
    blobs.sort_by(|a, b| b.area.cmp(&a.area));
    blobs.truncate(MAX_LIGHTS);

    log::debug!(
        "lights: {} blobs above {threshold}, {} with at least {min_area} px",
        found,
        blobs.len()
    );

    Ok(blobs
        .iter()
        .enumerate()
        .map(|(i, blob)| LightSource::from_blob(blob, i as u32 + 1, width, height))
        .collect())
}

/// Detect light sources in an RGBA image.
///
/// Builds the brightness mask with [`color::brightness_from_rgba`] and runs
/// [`extract_lights`] with `params.threshold`.
pub fn detect_lights(
    src: &Image<u8, 4>,
    params: &LightParams,
) -> Result<Vec<LightSource>, ImageError> {
    if params.threshold.is_finite() && !(0.0..=1.0).contains(&params.threshold) {
        log::warn!("light threshold {} is outside [0, 1]", params.threshold);
    }

    let mut mask = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    color::brightness_from_rgba(src, &mut mask)?;

    extract_lights(&mask, src, params.threshold)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ctrlmap_image::{Image, ImageError, ImageSize};

    use super::{detect_lights, extract_lights, LightParams};

    fn paint_rect(image: &mut Image<u8, 4>, x0: usize, y0: usize, w: usize, h: usize, rgb: [u8; 3]) {
        let cols = image.cols();
        let data = image.as_slice_mut();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let idx = (y * cols + x) * 4;
                data[idx..idx + 3].copy_from_slice(&rgb);
                data[idx + 3] = 255;
            }
        }
    }

    #[test]
    fn test_small_white_image_has_no_lights() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::from_size_val(ImageSize { width: 4, height: 4 }, 255)?;
        let lights = detect_lights(&image, &LightParams { threshold: 0.5 })?;
        assert!(lights.is_empty());
        Ok(())
    }

    #[test]
    fn test_full_white_frame() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::from_size_val(ImageSize { width: 40, height: 20 }, 255)?;
        let lights = detect_lights(&image, &LightParams::default())?;

        assert_eq!(lights.len(), 1);
        let light = &lights[0];
        assert_eq!(light.id, 1);
        assert_eq!(light.color, "#ffffff");
        assert!(light.power >= 0.99);
        assert!(light.intensity >= 0.99);
        assert_relative_eq!(light.position[0], 19.5 / 40.0, epsilon = 1e-9);
        assert_relative_eq!(light.position[1], 9.5 / 20.0, epsilon = 1e-9);
        assert!((0.0..1.0).contains(&light.rotation));
        Ok(())
    }

    #[test]
    fn test_lights_sorted_and_capped() -> Result<(), ImageError> {
        // twelve squares of distinct sizes in scrambled order, all above the area floor
        let sides = [13, 21, 10, 17, 11, 20, 15, 12, 19, 14, 18, 16];
        let mut image = Image::<u8, 4>::from_size_val(ImageSize { width: 600, height: 60 }, 0)?;
        for (i, &side) in sides.iter().enumerate() {
            paint_rect(&mut image, 2 + i * 48, 2, side, side, [255, 240, 220]);
        }

        let lights = detect_lights(&image, &LightParams::default())?;
        assert_eq!(lights.len(), 10);

        // map each light back to the square whose center it sits on
        let found = lights
            .iter()
            .map(|light| {
                let cx = light.position[0] * 600.0;
                sides
                    .iter()
                    .enumerate()
                    .find(|&(i, &side)| {
                        let expected = (2 + i * 48) as f64 + (side - 1) as f64 / 2.0;
                        (cx - expected).abs() < 0.5
                    })
                    .map(|(_, &side)| side)
            })
            .collect::<Option<Vec<_>>>();

        assert_eq!(found, Some(vec![21, 20, 19, 18, 17, 16, 15, 14, 13, 12]));
        for (i, light) in lights.iter().enumerate() {
            assert_eq!(light.id, i as u32 + 1);
        }
        assert_eq!(lights[0].color, "#fff0dc");
        Ok(())
    }

    #[test]
    fn test_non_finite_threshold_is_rejected() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::from_size_val(ImageSize { width: 40, height: 20 }, 255)?;
        let mask = Image::<f32, 1>::from_size_val(image.size(), 1.0)?;

        for threshold in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                detect_lights(&image, &LightParams { threshold }),
                Err(ImageError::InvalidParameter("threshold", _))
            ));
            assert!(matches!(
                extract_lights(&mask, &image, threshold),
                Err(ImageError::InvalidParameter("threshold", _))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_blob_below_area_floor_is_dropped() -> Result<(), ImageError> {
        let mut image = Image::<u8, 4>::from_size_val(ImageSize { width: 64, height: 64 }, 0)?;
        paint_rect(&mut image, 4, 4, 9, 11, [255, 255, 255]);
        paint_rect(&mut image, 30, 30, 10, 10, [255, 255, 255]);

        let lights = detect_lights(&image, &LightParams::default())?;
        assert_eq!(lights.len(), 1);
        assert_relative_eq!(lights[0].position[0], 34.5 / 64.0, epsilon = 1e-9);
        // a square is round
        assert_relative_eq!(lights[0].circle_amount, 0.5, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_dim_light_power_floor() -> Result<(), ImageError> {
        let mut image = Image::<u8, 4>::from_size_val(ImageSize { width: 32, height: 32 }, 0)?;
        paint_rect(&mut image, 0, 0, 16, 16, [60, 60, 60]);

        let lights = detect_lights(&image, &LightParams { threshold: 0.2 })?;
        assert_eq!(lights.len(), 1);
        assert_relative_eq!(lights[0].power, 0.3);
        assert_eq!(lights[0].color, "#3c3c3c");
        Ok(())
    }

    #[test]
    fn test_light_serializes_camel_case() -> Result<(), Box<dyn std::error::Error>> {
        let image = Image::<u8, 4>::from_size_val(ImageSize { width: 20, height: 20 }, 255)?;
        let lights = detect_lights(&image, &LightParams::default())?;
        let json = serde_json::to_value(&lights[0])?;
        assert!(json.get("circleAmount").is_some());
        assert_eq!(json["id"], 1);

        let params: LightParams = serde_json::from_str(r#"{"threshold": 0.9}"#)?;
        assert_eq!(params.threshold, 0.9);
        Ok(())
    }
}
