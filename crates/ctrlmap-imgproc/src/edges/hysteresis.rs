use ctrlmap_image::{Image, ImageError};

/// Maximum number of linking passes run by [`hysteresis_threshold`].
pub const MAX_HYSTERESIS_PASSES: usize = 100;

/// Value written for edge pixels in binary masks.
pub const EDGE_VALUE: u8 = 255;

#[derive(Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    None,
    Weak,
    Strong,
}

/// Link weak edges to strong edges.
///
/// Pixels with a value `>= high` are strong, pixels in `[low, high)` are weak.
/// Each pass scans the image in raster order and promotes, in place, every
/// weak pixel that has a strong pixel among its 8 neighbours. Passes repeat
/// until one makes no change, so weak pixels are linked transitively through
/// chains of other weak pixels, but never more than
/// [`MAX_HYSTERESIS_PASSES`] times.
///
/// Strong pixels are written as [`EDGE_VALUE`], everything else as 0.
///
/// # Arguments
///
/// * `src` - The suppressed gradient magnitude.
/// * `dst` - The output binary mask.
/// * `low` - The weak threshold.
/// * `high` - The strong threshold.
///
/// # Returns
///
/// The number of passes that were run.
pub fn hysteresis_threshold(
    src: &Image<f32, 1>,
    dst: &mut Image<u8, 1>,
    low: f32,
    high: f32,
) -> Result<usize, ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());

    let mut classes = src
        .as_slice()
        .iter()
        .map(|&v| {
            if v >= high {
                EdgeClass::Strong
            } else if v >= low {
                EdgeClass::Weak
            } else {
                EdgeClass::None
            }
        })
        .collect::<Vec<_>>();

    let mut passes = 0;
    while passes < MAX_HYSTERESIS_PASSES {
        passes += 1;
        let mut changed = false;

        for y in 0..rows {
            for x in 0..cols {
                let idx = y * cols + x;
                if classes[idx] != EdgeClass::Weak {
                    continue;
                }

                if has_strong_neighbor(&classes, x, y, cols, rows) {
                    classes[idx] = EdgeClass::Strong;
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    if passes == MAX_HYSTERESIS_PASSES {
        log::debug!("hysteresis stopped at the {MAX_HYSTERESIS_PASSES} pass cap");
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(classes.iter())
        .for_each(|(out, &class)| {
            *out = if class == EdgeClass::Strong {
                EDGE_VALUE
            } else {
                0
            };
        });

    Ok(passes)
}

fn has_strong_neighbor(classes: &[EdgeClass], x: usize, y: usize, cols: usize, rows: usize) -> bool {
    let y0 = y.saturating_sub(1);
    let y1 = (y + 1).min(rows - 1);
    let x0 = x.saturating_sub(1);
    let x1 = (x + 1).min(cols - 1);

    (y0..=y1).any(|ny| {
        (x0..=x1).any(|nx| (nx != x || ny != y) && classes[ny * cols + nx] == EdgeClass::Strong)
    })
}
