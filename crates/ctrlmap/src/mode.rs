use serde::Deserialize;

use ctrlmap_image::Image;
use ctrlmap_imgproc::{
    depth::DepthParams,
    edges::EdgeParams,
    lights::{LightParams, LightSource},
    normal::NormalParams,
    pose::{PoseDescriptor, PoseParams},
    segmentation::SegmentationParams,
};

/// The kind of control map to produce, with its parameters.
///
/// Deserializes from a flat JSON object tagged by `mode`, e.g.
/// `{"mode": "edge", "lowThreshold": 30}`. Missing parameters take their
/// default values.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ControlMode {
    /// Binary edge map.
    Edge(EdgeParams),
    /// Flat color regions.
    Segmentation(SegmentationParams),
    /// Gray depth visualization.
    Depth(DepthParams),
    /// Polar body pose descriptors.
    Pose(PoseParams),
    /// Light-source descriptors.
    Light(LightParams),
    /// Tangent-space normal map.
    Normal(NormalParams),
}

impl ControlMode {
    /// Lowercase name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            ControlMode::Edge(_) => "edge",
            ControlMode::Segmentation(_) => "segmentation",
            ControlMode::Depth(_) => "depth",
            ControlMode::Pose(_) => "pose",
            ControlMode::Light(_) => "light",
            ControlMode::Normal(_) => "normal",
        }
    }

    /// The mode called `name` with default parameters.
    pub fn from_name(name: &str) -> Option<Self> {
        let mode = match name {
            "edge" => ControlMode::Edge(Default::default()),
            "segmentation" => ControlMode::Segmentation(Default::default()),
            "depth" => ControlMode::Depth(Default::default()),
            "pose" => ControlMode::Pose(Default::default()),
            "light" => ControlMode::Light(Default::default()),
            "normal" => ControlMode::Normal(Default::default()),
            _ => return None,
        };
        Some(mode)
    }
}

/// The result of processing an image in one [`ControlMode`].
#[derive(Clone, Debug, PartialEq)]
pub enum ControlOutput {
    /// An RGBA control image with the size of the input.
    Image(Image<u8, 4>),
    /// Up to ten light sources, largest first.
    Lights(Vec<LightSource>),
    /// One descriptor per accepted person, in detection order.
    Poses(Vec<PoseDescriptor>),
}
