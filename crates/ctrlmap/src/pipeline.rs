use rand::Rng;

use ctrlmap_image::{ops, Image};
use ctrlmap_imgproc::{depth, edges, lights, normal, pose::convert_poses, pose::Pose, segmentation};

use crate::{ControlError, ControlMode, ControlOutput, EstimatorError};

/// A monocular depth network.
pub trait DepthEstimator {
    /// Estimate depth from a [`depth::DEPTH_INPUT_SIZE`] square RGB image in `[0, 1]`.
    ///
    /// Larger output values are closer to the camera.
    fn estimate_depth(&mut self, input: &Image<f32, 3>) -> Result<Image<f32, 1>, EstimatorError>;
}

/// A multi-person pose network.
pub trait PoseEstimator {
    /// Detect the poses in an RGBA image, keypoints in its pixel coordinates.
    fn estimate_poses(&mut self, image: &Image<u8, 4>) -> Result<Vec<Pose>, EstimatorError>;
}

/// Runs the control-map operations, delegating to the optional estimators
/// for the depth and pose modes.
#[derive(Default)]
pub struct ControlPipeline {
    depth: Option<Box<dyn DepthEstimator>>,
    pose: Option<Box<dyn PoseEstimator>>,
}

impl ControlPipeline {
    /// Create a pipeline without estimators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `estimator` for [`ControlMode::Depth`].
    pub fn with_depth_estimator(mut self, estimator: impl DepthEstimator + 'static) -> Self {
        self.depth = Some(Box::new(estimator));
        self
    }

    /// Use `estimator` for [`ControlMode::Pose`].
    pub fn with_pose_estimator(mut self, estimator: impl PoseEstimator + 'static) -> Self {
        self.pose = Some(Box::new(estimator));
        self
    }

    /// Process an RGBA image in the given mode.
    ///
    /// # Arguments
    ///
    /// * `image` - The input RGBA image.
    /// * `mode` - The control mode and its parameters.
    /// * `rng` - The random source of the segmentation mode.
    ///
    /// # Errors
    ///
    /// Fails when an image operation rejects its parameters, when the mode
    /// needs a missing estimator, or when the estimator fails.
    pub fn process(
        &mut self,
        image: &Image<u8, 4>,
        mode: &ControlMode,
        rng: &mut impl Rng,
    ) -> Result<ControlOutput, ControlError> {
        log::debug!("processing {} image in {} mode", image.size(), mode.name());

        let output = match mode {
            ControlMode::Edge(params) => {
                let mask = edges::detect_edges(image, params)?;
                let mut dst = Image::<u8, 4>::from_size_val(image.size(), 0)?;
                ops::rgba_from_gray(&mask, &mut dst)?;
                ControlOutput::Image(dst)
            }
            ControlMode::Segmentation(params) => {
                ControlOutput::Image(segmentation::kmeans_segment(image, params, rng)?)
            }
            ControlMode::Depth(params) => {
                let estimator = self
                    .depth
                    .as_mut()
                    .ok_or(ControlError::MissingEstimator("depth"))?;
                let input = depth::prepare_depth_input(image)?;
                let prediction = estimator
                    .estimate_depth(&input)
                    .map_err(ControlError::Estimator)?;
                ControlOutput::Image(depth::visualize_depth(&prediction, image.size(), params)?)
            }
            ControlMode::Pose(params) => {
                let estimator = self
                    .pose
                    .as_mut()
                    .ok_or(ControlError::MissingEstimator("pose"))?;
                let poses = estimator
                    .estimate_poses(image)
                    .map_err(ControlError::Estimator)?;
                ControlOutput::Poses(convert_poses(
                    &poses,
                    image.size(),
                    params.confidence_threshold,
                )?)
            }
            ControlMode::Light(params) => ControlOutput::Lights(lights::detect_lights(image, params)?),
            ControlMode::Normal(params) => ControlOutput::Image(normal::normal_map(image, params)?),
        };

        Ok(output)
    }
}

/// Process an RGBA image in a mode that needs no external estimator.
///
/// The depth and pose modes return [`ControlError::MissingEstimator`]; use a
/// [`ControlPipeline`] with estimators for them.
///
/// # Example
///
/// ```
/// use ctrlmap::{process, ControlMode, ControlOutput};
/// use ctrlmap::image::{Image, ImageSize};
///
/// let image = Image::<u8, 4>::from_size_val(ImageSize { width: 8, height: 8 }, 255).unwrap();
/// let mode = ControlMode::from_name("normal").unwrap();
///
/// let ControlOutput::Image(normals) = process(&image, &mode, &mut rand::rng()).unwrap() else {
///     panic!("normal mode yields an image");
/// };
/// assert_eq!(normals.size(), image.size());
/// ```
pub fn process(
    image: &Image<u8, 4>,
    mode: &ControlMode,
    rng: &mut impl Rng,
) -> Result<ControlOutput, ControlError> {
    ControlPipeline::new().process(image, mode, rng)
}
