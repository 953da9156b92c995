use ctrlmap_image::{Image, ImageError};

use super::union_find::DisjointSet;

const BACKGROUND: u32 = u32::MAX;

/// A maximal 8-connected set of bright pixels with its accumulated statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightBlob {
    /// Number of pixels in the blob.
    pub area: usize,
    /// Bounding box as `[min_x, min_y, max_x, max_y]`, inclusive.
    pub bounds: [usize; 4],
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
    sum_rgb: [u64; 3],
    sum_luminance: f64,
    /// Brightest mask value inside the blob.
    pub max_luminance: f32,
}

/// Second-moment shape of a blob.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobShape {
    /// Largest eigenvalue of the coordinate covariance.
    pub major: f64,
    /// Smallest eigenvalue of the coordinate covariance.
    pub minor: f64,
    /// `1 - (major - minor) / major` in `[0, 1]`, 1 for circular blobs.
    pub roundness: f64,
    /// Orientation of the major axis in radians, in `[-π/2, π/2]`.
    pub angle: f64,
}

impl LightBlob {
    fn new(x: usize, y: usize) -> Self {
        Self {
            bounds: [x, y, x, y],
            ..Default::default()
        }
    }

    fn push(&mut self, x: usize, y: usize, rgb: &[u8], luminance: f32) {
        let (xf, yf) = (x as f64, y as f64);
        self.area += 1;
        self.bounds[0] = self.bounds[0].min(x);
        self.bounds[1] = self.bounds[1].min(y);
        self.bounds[2] = self.bounds[2].max(x);
        self.bounds[3] = self.bounds[3].max(y);
        self.sum_x += xf;
        self.sum_y += yf;
        self.sum_xx += xf * xf;
        self.sum_yy += yf * yf;
        self.sum_xy += xf * yf;
        for (acc, &v) in self.sum_rgb.iter_mut().zip(rgb.iter()) {
            *acc += v as u64;
        }
        self.sum_luminance += luminance as f64;
        self.max_luminance = self.max_luminance.max(luminance);
    }

    /// Center of mass of the blob pixels.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.area as f64;
        (self.sum_x / n, self.sum_y / n)
    }

    /// Covariance `(sxx, syy, sxy)` of the pixel coordinates about the centroid.
    pub fn covariance(&self) -> (f64, f64, f64) {
        let n = self.area as f64;
        let (cx, cy) = self.centroid();
        let sxx = (self.sum_xx / n - cx * cx).max(0.0);
        let syy = (self.sum_yy / n - cy * cy).max(0.0);
        let sxy = self.sum_xy / n - cx * cy;
        (sxx, syy, sxy)
    }

    /// Eigen-decomposition based shape of the blob.
    pub fn shape(&self) -> BlobShape {
        let (sxx, syy, sxy) = self.covariance();

        // closed form eigenvalues of a symmetric 2x2 matrix
        let half_trace = (sxx + syy) / 2.0;
        let det = sxx * syy - sxy * sxy;
        let disc = (half_trace * half_trace - det).max(0.0).sqrt();
        let major = half_trace + disc;
        let minor = half_trace - disc;

        let roundness = if major > 0.0 {
            (1.0 - (major - minor) / major).clamp(0.0, 1.0)
        } else {
            1.0
        };

        BlobShape {
            major,
            minor,
            roundness,
            angle: 0.5 * (2.0 * sxy).atan2(sxx - syy),
        }
    }

    /// Mean raw RGB color of the blob, rounded.
    pub fn mean_color(&self) -> [u8; 3] {
        let n = self.area as f64;
        self.sum_rgb
            .map(|s| (s as f64 / n).round().clamp(0.0, 255.0) as u8)
    }

    /// Mean mask value of the blob.
    pub fn mean_luminance(&self) -> f64 {
        self.sum_luminance / self.area as f64
    }
}

/// Find the 8-connected blobs of pixels whose mask value is `>= threshold`.
///
/// Labeling runs in two raster passes: the first assigns provisional labels
/// and records equivalences between touching labels in a disjoint-set
/// forest, the second resolves every pixel to its root and accumulates the
/// blob statistics. Blobs are returned in the raster order of their first
/// pixel.
///
/// # Arguments
///
/// * `mask` - The brightness mask, usually in `[0, 1]`.
/// * `color` - The RGBA image the mask was computed from.
/// * `threshold` - The minimum mask value of a blob pixel.
pub fn find_blobs(
    mask: &Image<f32, 1>,
    color: &Image<u8, 4>,
    threshold: f32,
) -> Result<Vec<LightBlob>, ImageError> {
    if mask.size() != color.size() {
        return Err(ImageError::InvalidImageSize(
            mask.cols(),
            mask.rows(),
            color.cols(),
            color.rows(),
        ));
    }

    let (rows, cols) = (mask.rows(), mask.cols());
    let values = mask.as_slice();
    let mut labels = vec![BACKGROUND; rows * cols];
    let mut set = DisjointSet::default();

    // first pass: provisional labels from the already visited neighbours
    for y in 0..rows {
        for x in 0..cols {
            let idx = y * cols + x;
            if values[idx] < threshold {
                continue;
            }

            let mut label = BACKGROUND;
            for (dx, dy) in [(-1isize, 0isize), (-1, -1), (0, -1), (1, -1)] {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= cols as isize {
                    continue;
                }
                let neighbor = labels[ny as usize * cols + nx as usize];
                if neighbor == BACKGROUND {
                    continue;
                }
                label = if label == BACKGROUND {
                    neighbor
                } else {
                    set.union(label, neighbor)
                };
            }

            labels[idx] = if label == BACKGROUND {
                set.make_set()
            } else {
                label
            };
        }
    }

    // second pass: resolve roots and accumulate statistics
    let mut blob_of_root = vec![usize::MAX; set.len()];
    let mut blobs: Vec<LightBlob> = Vec::new();
    let rgba = color.as_slice();

    for y in 0..rows {
        for x in 0..cols {
            let idx = y * cols + x;
            if labels[idx] == BACKGROUND {
                continue;
            }

            let root = set.find(labels[idx]) as usize;
            if blob_of_root[root] == usize::MAX {
                blob_of_root[root] = blobs.len();
                blobs.push(LightBlob::new(x, y));
            }

            blobs[blob_of_root[root]].push(x, y, &rgba[idx * 4..idx * 4 + 3], values[idx]);
        }
    }

    Ok(blobs)
}
