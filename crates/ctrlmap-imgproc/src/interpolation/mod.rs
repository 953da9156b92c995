//! Pixel interpolation methods.
//!
//! - **Nearest**: uses the nearest pixel value (no interpolation)
//! - **Bilinear**: linear interpolation between the four surrounding pixels
//!
//! The kernels are used by [`crate::resize`] and by the sub-pixel
//! non-maximum suppression in [`crate::edges`].

mod bilinear;
mod interpolate;
mod nearest;

pub use bilinear::bilinear_sample_or_edge;
pub use interpolate::{interpolate_pixel, InterpolationMode};
