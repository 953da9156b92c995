#![deny(missing_docs)]
//! Pixel buffer types for the control-map preprocessing pipeline

/// image representation for computer vision purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// basic operations over images.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
