#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
mod mode;
mod pipeline;

pub use error::{ControlError, EstimatorError};
pub use mode::{ControlMode, ControlOutput};
pub use pipeline::{process, ControlPipeline, DepthEstimator, PoseEstimator};

#[doc(inline)]
pub use ctrlmap_image as image;

#[doc(inline)]
pub use ctrlmap_imgproc as imgproc;
