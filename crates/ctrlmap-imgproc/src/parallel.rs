use rayon::prelude::*;

use ctrlmap_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// The closure receives the source pixel (`C1` samples) and the destination
/// pixel (`C2` samples). Rows are distributed across the rayon thread pool.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each sample in the image in parallel with a value.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Fill each row of the destination in parallel.
///
/// The closure receives the row index and the mutable row slice
/// (`cols * C` samples). It is used by operators whose output pixel depends
/// on a neighbourhood of the source rather than a single pixel.
pub fn par_fill_rows<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(r, row)| f(r, row));
}

#[cfg(test)]
mod tests {
    use ctrlmap_image::{Image, ImageError};

    #[test]
    fn test_par_iter_rows() -> Result<(), ImageError> {
        let src = Image::<u8, 2>::new([2, 2].into(), vec![1, 2, 3, 4, 5, 6, 7, 8])?;
        let mut dst = Image::<u16, 1>::from_size_val(src.size(), 0)?;
        super::par_iter_rows(&src, &mut dst, |s, d| d[0] = s[0] as u16 + s[1] as u16);
        assert_eq!(dst.as_slice(), &[3, 7, 11, 15]);
        Ok(())
    }

    #[test]
    fn test_par_fill_rows() -> Result<(), ImageError> {
        let mut dst = Image::<usize, 1>::from_size_val([3, 2].into(), 0)?;
        super::par_fill_rows(&mut dst, |r, row| {
            row.iter_mut().enumerate().for_each(|(c, v)| *v = r * 10 + c)
        });
        assert_eq!(dst.as_slice(), &[0, 1, 2, 10, 11, 12]);
        Ok(())
    }
}
