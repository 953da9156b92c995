use ctrlmap_image::{Image, ImageError};

use super::EDGE_VALUE;

/// Thin a binary mask to a one pixel wide skeleton with the Zhang-Suen algorithm.
///
/// Any non-zero pixel is foreground. Each iteration runs two sub-iterations
/// over the interior pixels; a pixel is removed when it has between 2 and 6
/// foreground neighbours, exactly one 0 → 1 transition around its
/// neighbourhood, and satisfies the directional conditions of the
/// sub-iteration. Iterations repeat until a full iteration removes nothing.
///
/// # Arguments
///
/// * `mask` - The binary mask, thinned in place. Foreground pixels are
///   rewritten as [`EDGE_VALUE`].
///
/// # Returns
///
/// The number of full iterations that were run.
pub fn thin_zhang_suen(mask: &mut Image<u8, 1>) -> usize {
    let (rows, cols) = (mask.rows(), mask.cols());
    let mut fg = mask.as_slice().iter().map(|&v| v != 0).collect::<Vec<_>>();

    let mut iterations = 0;
    if rows >= 3 && cols >= 3 {
        let mut to_remove = Vec::new();
        loop {
            iterations += 1;
            let mut removed = false;

            for first in [true, false] {
                to_remove.clear();
                for y in 1..rows - 1 {
                    for x in 1..cols - 1 {
                        if fg[y * cols + x] && removable(&fg, x, y, cols, first) {
                            to_remove.push(y * cols + x);
                        }
                    }
                }
                removed |= !to_remove.is_empty();
                to_remove.iter().for_each(|&idx| fg[idx] = false);
            }

            if !removed {
                break;
            }
        }
    }

    mask.as_slice_mut()
        .iter_mut()
        .zip(fg.iter())
        .for_each(|(v, &f)| *v = if f { EDGE_VALUE } else { 0 });

    iterations
}

/// Zhang-Suen removal test for an interior foreground pixel.
fn removable(fg: &[bool], x: usize, y: usize, cols: usize, first: bool) -> bool {
    let at = |dx: isize, dy: isize| {
        fg[((y as isize + dy) as usize) * cols + (x as isize + dx) as usize] as u8
    };

    // P2..P9, clockwise starting north
    let p = [
        at(0, -1),
        at(1, -1),
        at(1, 0),
        at(1, 1),
        at(0, 1),
        at(-1, 1),
        at(-1, 0),
        at(-1, -1),
    ];
    let (p2, p4, p6, p8) = (p[0], p[2], p[4], p[6]);

    let b = p.iter().map(|&v| v as u32).sum::<u32>();
    if !(2..=6).contains(&b) {
        return false;
    }

    let a = (0..8).filter(|&i| p[i] == 0 && p[(i + 1) % 8] == 1).count();
    if a != 1 {
        return false;
    }

    if first {
        p2 * p4 * p6 == 0 && p4 * p6 * p8 == 0
    } else {
        p2 * p4 * p8 == 0 && p2 * p6 * p8 == 0
    }
}

/// Remove foreground pixels that have no 4-connected foreground neighbour.
///
/// This is a single half-thickness erosion pass evaluated on a snapshot of
/// the input. Pixels with fewer than two 4-neighbours are eroded, except
/// endpoints with exactly one neighbour, so only isolated pixels disappear.
///
/// # Arguments
///
/// * `src` - The binary mask.
/// * `dst` - The eroded mask.
pub fn erode_half(src: &Image<u8, 1>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    let is_set = |x: isize, y: isize| {
        x >= 0
            && y >= 0
            && (x as usize) < cols
            && (y as usize) < rows
            && data[y as usize * cols + x as usize] != 0
    };

    let out = dst.as_slice_mut();
    for y in 0..rows {
        for x in 0..cols {
            let idx = y * cols + x;
            if data[idx] == 0 {
                out[idx] = 0;
                continue;
            }

            let (xi, yi) = (x as isize, y as isize);
            let neighbors = [(0, -1), (1, 0), (0, 1), (-1, 0)]
                .iter()
                .filter(|(dx, dy)| is_set(xi + dx, yi + dy))
                .count();

            out[idx] = if neighbors > 0 { data[idx] } else { 0 };
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ctrlmap_image::{Image, ImageError};

    fn from_rows(rows: &[&str]) -> Result<Image<u8, 1>, ImageError> {
        let width = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        Image::new([width, rows.len()].into(), data)
    }

    fn count(mask: &Image<u8, 1>) -> usize {
        mask.as_slice().iter().filter(|&&v| v != 0).count()
    }

    #[test]
    fn test_thin_thick_bar() -> Result<(), ImageError> {
        let mut mask = from_rows(&[
            "..........",
            ".########.",
            ".########.",
            ".########.",
            "..........",
        ])?;
        let iterations = super::thin_zhang_suen(&mut mask);
        assert!(iterations >= 2);

        // the bar collapses to its middle row
        for x in 0..10 {
            assert_eq!(mask.get_pixel(x, 1, 0)?, 0);
            assert_eq!(mask.get_pixel(x, 3, 0)?, 0);
        }
        assert!(count(&mask) > 0);
        assert!(mask.as_slice().iter().all(|&v| v == 0 || v == 255));
        Ok(())
    }

    #[test]
    fn test_thin_keeps_single_line() -> Result<(), ImageError> {
        let mut mask = from_rows(&[".......", ".#####.", "......."])?;
        let before = mask.clone();
        let iterations = super::thin_zhang_suen(&mut mask);
        assert_eq!(iterations, 1);
        // line endpoints have a single neighbour and are never removed
        assert_eq!(mask, before);
        Ok(())
    }

    #[test]
    fn test_erode_half() -> Result<(), ImageError> {
        let src = from_rows(&["#....", "..##.", "...#.", "#.#.."])?;
        let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        super::erode_half(&src, &mut dst)?;

        // isolated pixels go, endpoints and connected pixels stay
        let expected = from_rows(&[".....", "..##.", "...#.", "....."])?;
        assert_eq!(dst, expected);
        Ok(())
    }
}
