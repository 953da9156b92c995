//! Edge detection.
//!
//! The edge detector chains the luminance extractor, the gaussian blur, the
//! Scharr gradient, non-maximum suppression, hysteresis linking and optional
//! skeleton thinning into a single binary edge mask.

mod detector;
pub use detector::*;

mod hysteresis;
pub use hysteresis::*;

mod nms;
pub use nms::*;

mod thinning;
pub use thinning::*;
