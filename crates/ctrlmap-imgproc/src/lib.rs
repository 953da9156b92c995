#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod angle;

/// color transformations module.
pub mod color;

/// depth network input preparation and output visualization.
pub mod depth;

/// edge detection module.
pub mod edges;

/// image filtering module.
pub mod filter;

/// utilities for interpolation.
pub mod interpolation;

/// light-source extraction module.
pub mod lights;

/// normal map synthesis.
pub mod normal;

/// module containing parallization utilities.
pub mod parallel;

/// pose descriptor conversion.
pub mod pose;

/// utility functions for resizing images.
pub mod resize;

/// k-means color segmentation.
pub mod segmentation;
