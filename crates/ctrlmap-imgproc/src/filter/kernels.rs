/// Smallest gaussian kernel produced by [`gaussian_kernel_size`].
pub const MIN_GAUSSIAN_KERNEL_SIZE: usize = 3;

/// Largest gaussian kernel produced by [`gaussian_kernel_size`].
pub const MAX_GAUSSIAN_KERNEL_SIZE: usize = 15;

/// Compute the gaussian kernel size for a given sigma.
///
/// The size is `ceil(6 * sigma)`, forced odd and clamped to `[3, 15]`.
///
/// # Arguments
///
/// * `sigma` - The sigma of the gaussian kernel.
pub fn gaussian_kernel_size(sigma: f32) -> usize {
    let mut size = (6.0 * sigma).ceil().max(0.0) as usize;
    if size % 2 == 0 {
        size += 1;
    }
    size.clamp(MIN_GAUSSIAN_KERNEL_SIZE, MAX_GAUSSIAN_KERNEL_SIZE)
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, normalized to unit sum.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size / 2) as f32;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create the 3x3 Scharr kernels.
///
/// # Returns
///
/// The x and y derivative kernels, indexed as `kernel[row][col]`.
pub fn scharr_kernel3() -> ([[f32; 3]; 3], [[f32; 3]; 3]) {
    (
        [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]],
        [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]],
    )
}

/// Create the 3x3 Sobel kernels.
///
/// # Returns
///
/// The x and y derivative kernels, indexed as `kernel[row][col]`.
pub fn sobel_kernel3() -> ([[f32; 3]; 3], [[f32; 3]; 3]) {
    (
        [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]],
        [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]],
    )
}
