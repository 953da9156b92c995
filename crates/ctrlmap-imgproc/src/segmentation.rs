use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ctrlmap_image::{Image, ImageError};

/// Parameters of the k-means color segmenter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SegmentationParams {
    /// Number of color clusters, at least 1.
    pub k: usize,
    /// Number of Lloyd iterations.
    pub iterations: usize,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            k: 5,
            iterations: 10,
        }
    }
}

/// Result of clustering the colors of an image.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorClusters {
    /// Cluster centers in RGB.
    pub centroids: Vec<[f64; 3]>,
    /// Cluster index of every pixel, row-major.
    pub labels: Vec<usize>,
}

fn distance_sq(pixel: &[u8], centroid: &[f64; 3]) -> f64 {
    pixel
        .iter()
        .zip(centroid.iter())
        .map(|(&p, &c)| (p as f64 - c) * (p as f64 - c))
        .sum()
}

// strict comparison keeps the lowest index on ties
fn nearest_centroid(pixel: &[u8], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = distance_sq(pixel, centroid);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn assign(src: &Image<u8, 4>, centroids: &[[f64; 3]], labels: &mut [usize]) {
    src.as_slice()
        .par_chunks_exact(4)
        .zip(labels.par_iter_mut())
        .for_each(|(pixel, label)| *label = nearest_centroid(&pixel[..3], centroids));
}

/// Cluster the RGB colors of an image with Lloyd's k-means.
///
/// Centroids start at `k` pixels sampled uniformly at random from `rng`.
/// Each iteration assigns every pixel to its nearest centroid (squared RGB
/// distance, ties to the lowest index) and moves each centroid to the mean of
/// its pixels. Empty clusters keep their previous center. The labels are
/// those of the last assignment step.
///
/// # Errors
///
/// Returns [`ImageError::InvalidParameter`] if `k` is zero.
pub fn kmeans_clusters(
    src: &Image<u8, 4>,
    params: &SegmentationParams,
    rng: &mut impl Rng,
) -> Result<ColorClusters, ImageError> {
    if params.k == 0 {
        return Err(ImageError::InvalidParameter(
            "k",
            "at least one cluster is required".to_string(),
        ));
    }

    let data = src.as_slice();
    let num_pixels = src.size().area();

    let mut centroids = (0..params.k)
        .map(|_| {
            let idx = rng.random_range(0..num_pixels) * 4;
            [data[idx] as f64, data[idx + 1] as f64, data[idx + 2] as f64]
        })
        .collect::<Vec<_>>();

    let mut labels = vec![0usize; num_pixels];
    let mut sums = vec![[0.0f64; 3]; params.k];
    let mut counts = vec![0usize; params.k];

    for _ in 0..params.iterations {
        assign(src, &centroids, &mut labels);

        sums.fill([0.0; 3]);
        counts.fill(0);
        for (pixel, &label) in data.chunks_exact(4).zip(labels.iter()) {
            for (s, &p) in sums[label].iter_mut().zip(pixel.iter()) {
                *s += p as f64;
            }
            counts[label] += 1;
        }

        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums.iter()).zip(counts.iter()) {
            if count > 0 {
                *centroid = sum.map(|s| s / count as f64);
            }
        }
    }

    if params.iterations == 0 {
        assign(src, &centroids, &mut labels);
    }

    log::debug!("kmeans: k={} sizes={:?}", params.k, counts);

    Ok(ColorClusters { centroids, labels })
}

/// Segment an RGBA image into `k` flat color regions.
///
/// Every pixel is replaced by the rounded color of its cluster center; alpha
/// is always opaque.
///
/// # Arguments
///
/// * `src` - The input RGBA image.
/// * `params` - The segmenter parameters.
/// * `rng` - The random source used to pick the initial centroids.
///
/// # Example
///
/// ```
/// use ctrlmap_image::{Image, ImageSize};
/// use ctrlmap_imgproc::segmentation::{kmeans_segment, SegmentationParams};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let image = Image::<u8, 4>::from_size_val(ImageSize { width: 2, height: 2 }, 10).unwrap();
/// let mut rng = StdRng::seed_from_u64(0);
/// let segmented = kmeans_segment(&image, &SegmentationParams::default(), &mut rng).unwrap();
///
/// assert_eq!(&segmented.as_slice()[..4], &[10, 10, 10, 255]);
/// ```
pub fn kmeans_segment(
    src: &Image<u8, 4>,
    params: &SegmentationParams,
    rng: &mut impl Rng,
) -> Result<Image<u8, 4>, ImageError> {
    let clusters = kmeans_clusters(src, params, rng)?;
    let palette = clusters
        .centroids
        .iter()
        .map(|c| c.map(|v| v.round().clamp(0.0, 255.0) as u8))
        .collect::<Vec<_>>();

    let mut dst = Image::<u8, 4>::from_size_val(src.size(), 255)?;
    dst.as_slice_mut()
        .par_chunks_exact_mut(4)
        .zip(clusters.labels.par_iter())
        .for_each(|(pixel, &label)| pixel[..3].copy_from_slice(&palette[label]));

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ctrlmap_image::{Image, ImageError, ImageSize};
    use rand::{rngs::StdRng, SeedableRng};

    use super::{kmeans_clusters, kmeans_segment, SegmentationParams};

    fn red_square() -> Result<Image<u8, 4>, ImageError> {
        let mut image = Image::<u8, 4>::from_size_val(ImageSize { width: 100, height: 100 }, 0)?;
        for y in 0..100 {
            for x in 0..100 {
                image.set_pixel(x, y, 3, 255)?;
                if (25..75).contains(&x) && (25..75).contains(&y) {
                    image.set_pixel(x, y, 0, 255)?;
                }
            }
        }
        Ok(image)
    }

    #[test]
    fn test_zero_clusters_is_an_error() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::from_size_val([2, 2].into(), 0)?;
        let mut rng = StdRng::seed_from_u64(1);
        let params = SegmentationParams { k: 0, iterations: 3 };
        assert!(kmeans_segment(&image, &params, &mut rng).is_err());
        Ok(())
    }

    #[test]
    fn test_single_cluster_is_the_mean() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::new(
            [2, 2].into(),
            vec![0, 0, 0, 255, 100, 0, 0, 255, 200, 50, 10, 255, 100, 50, 30, 255],
        )?;
        let mut rng = StdRng::seed_from_u64(7);
        let params = SegmentationParams { k: 1, iterations: 1 };
        let segmented = kmeans_segment(&image, &params, &mut rng)?;

        for pixel in segmented.as_slice().chunks_exact(4) {
            assert_eq!(pixel, &[100, 25, 10, 255]);
        }
        Ok(())
    }

    #[test]
    fn test_red_square_two_clusters() -> Result<(), ImageError> {
        let image = red_square()?;
        let params = SegmentationParams { k: 2, iterations: 5 };

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let clusters = kmeans_clusters(&image, &params, &mut rng)?;

            let mut centroids = clusters.centroids.clone();
            centroids.sort_by(|a, b| a[0].total_cmp(&b[0]));
            assert_relative_eq!(centroids[0][0], 0.0);
            assert_relative_eq!(centroids[1][0], 255.0);
            assert_relative_eq!(centroids[1][1], 0.0);

            let red = clusters.labels[50 * 100 + 50];
            let black = clusters.labels[0];
            assert_ne!(red, black);
        }
        Ok(())
    }

    #[test]
    fn test_segment_output_colors() -> Result<(), ImageError> {
        let image = red_square()?;
        let mut rng = StdRng::seed_from_u64(42);
        let segmented = kmeans_segment(&image, &SegmentationParams { k: 2, iterations: 5 }, &mut rng)?;

        assert_eq!(segmented.size(), image.size());
        assert_eq!(segmented.as_slice(), image.as_slice());
        Ok(())
    }

    #[test]
    fn test_params_from_json() -> Result<(), serde_json::Error> {
        let params: SegmentationParams = serde_json::from_str(r#"{"k": 3}"#)?;
        assert_eq!(params, SegmentationParams { k: 3, iterations: 10 });
        Ok(())
    }
}
