//! Conversion of detected body keypoints into polar pose descriptors.
//!
//! A pose network (not part of this crate) yields 17 keypoints per person in
//! COCO order. [`convert_poses`] re-expresses them relative to the person's
//! center, normalized by the image size, and adds a coarse head rotation.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use ctrlmap_image::{ImageError, ImageSize};

use crate::angle::turn_fraction;

/// Number of keypoints of a pose.
pub const NUM_KEYPOINTS: usize = 17;

/// Emitted for `head.nose.distance` instead of a measured value.
pub const NOSE_DISTANCE: f64 = 0.05;
/// Emitted for `head.left_eye.angle` instead of a measured value.
pub const LEFT_EYE_ANGLE: f64 = 0.625;
/// Emitted for `head.right_eye.angle` instead of a measured value.
pub const RIGHT_EYE_ANGLE: f64 = 0.875;
/// Emitted for `head_rotation.tilt_side` instead of a measured value.
pub const HEAD_TILT_SIDE: f64 = 0.0;
/// Emitted for `head_rotation.rotation_z` instead of a measured value.
pub const HEAD_ROTATION_Z: f64 = 0.0;

const PITCH_SCALE: f64 = 0.1;

/// Body parts in COCO keypoint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// A detected keypoint in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
    /// Detection confidence in `[0, 1]`.
    pub score: f32,
}

/// The keypoints of one detected person, indexed by [`BodyPart`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Keypoints in COCO order.
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl Pose {
    /// Get the keypoint of a body part.
    pub fn keypoint(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part as usize]
    }
}

/// A keypoint expressed relative to the pose center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolarKeypoint {
    /// Distance to the center divided by the longest image side.
    pub distance: f64,
    /// Direction from the center as a fraction of a turn in `[0, 1)`.
    pub angle: f64,
    /// Detection confidence copied from the keypoint.
    pub score: f64,
}

/// Head keypoints of a pose descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct HeadKeypoints {
    pub nose: PolarKeypoint,
    pub left_eye: PolarKeypoint,
    pub right_eye: PolarKeypoint,
    pub left_ear: PolarKeypoint,
    pub right_ear: PolarKeypoint,
}

/// Arm keypoints of a pose descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ArmKeypoints {
    pub left_shoulder: PolarKeypoint,
    pub right_shoulder: PolarKeypoint,
    pub left_elbow: PolarKeypoint,
    pub right_elbow: PolarKeypoint,
    pub left_wrist: PolarKeypoint,
    pub right_wrist: PolarKeypoint,
}

/// Leg keypoints of a pose descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct LegKeypoints {
    pub left_hip: PolarKeypoint,
    pub right_hip: PolarKeypoint,
    pub left_knee: PolarKeypoint,
    pub right_knee: PolarKeypoint,
    pub left_ankle: PolarKeypoint,
    pub right_ankle: PolarKeypoint,
}

/// Coarse head orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadRotation {
    /// Eye line angle in `[-1, 1]`, 0 when the eyes are level.
    pub yaw: f64,
    /// Nose offset below the eye line in `[-1, 1]`.
    pub pitch: f64,
    /// Always [`HEAD_TILT_SIDE`].
    pub tilt_side: f64,
    /// Always [`HEAD_ROTATION_Z`].
    pub rotation_z: f64,
}

/// Polar description of one person.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseDescriptor {
    /// Reference center as `[x / width, y / height]`.
    pub center: [f64; 2],
    #[allow(missing_docs)]
    pub head: HeadKeypoints,
    #[allow(missing_docs)]
    pub arms: ArmKeypoints,
    #[allow(missing_docs)]
    pub legs: LegKeypoints,
    #[allow(missing_docs)]
    pub head_rotation: HeadRotation,
}

/// Parameters of the pose converter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoseParams {
    /// Minimum score of the keypoints used to place the center and head.
    pub confidence_threshold: f32,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
        }
    }
}

fn pose_center(pose: &Pose, threshold: f32) -> Option<(f64, f64)> {
    let left = pose.keypoint(BodyPart::LeftShoulder);
    let right = pose.keypoint(BodyPart::RightShoulder);
    if left.score >= threshold && right.score >= threshold {
        return Some((
            (left.x as f64 + right.x as f64) / 2.0,
            (left.y as f64 + right.y as f64) / 2.0,
        ));
    }

    let nose = pose.keypoint(BodyPart::Nose);
    (nose.score >= threshold).then_some((nose.x as f64, nose.y as f64))
}

fn head_rotation(pose: &Pose, height: f64, threshold: f32) -> HeadRotation {
    let nose = pose.keypoint(BodyPart::Nose);
    let left_eye = pose.keypoint(BodyPart::LeftEye);
    let right_eye = pose.keypoint(BodyPart::RightEye);
    let eyes = left_eye.score >= threshold && right_eye.score >= threshold;

    // the subject's left eye sits on the image right for a frontal face
    let yaw = if eyes {
        let dx = (left_eye.x - right_eye.x) as f64;
        let dy = (left_eye.y - right_eye.y) as f64;
        dy.atan2(dx) / PI
    } else {
        0.0
    };

    let pitch = if eyes && nose.score >= threshold {
        let eye_center_y = (left_eye.y as f64 + right_eye.y as f64) / 2.0;
        ((nose.y as f64 - eye_center_y) / (PITCH_SCALE * height)).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    HeadRotation {
        yaw,
        pitch,
        tilt_side: HEAD_TILT_SIDE,
        rotation_z: HEAD_ROTATION_Z,
    }
}

/// Convert detected poses into polar descriptors.
///
/// The center of a pose is the shoulder midpoint when both shoulders reach
/// `threshold`, otherwise the nose when it does. Poses with neither are
/// skipped; the others keep their detection order.
///
/// Some head fields are not measured: `head.nose.distance`,
/// `head.left_eye.angle`, `head.right_eye.angle`, `head_rotation.tilt_side`
/// and `head_rotation.rotation_z` always hold the constants of this module.
///
/// # Arguments
///
/// * `poses` - The detected poses.
/// * `size` - The size of the image the keypoints refer to.
/// * `threshold` - The minimum keypoint confidence.
///
/// # Errors
///
/// Returns an error if `size` has a zero area.
pub fn convert_poses(
    poses: &[Pose],
    size: ImageSize,
    threshold: f32,
) -> Result<Vec<PoseDescriptor>, ImageError> {
    if size.area() == 0 {
        return Err(ImageError::ZeroSizedImage(size.width, size.height));
    }

    let (width, height) = (size.width as f64, size.height as f64);
    let max_side = size.max_side() as f64;

    let descriptors = poses
        .iter()
        .filter_map(|pose| {
            let (cx, cy) = pose_center(pose, threshold)?;

            let polar = |part: BodyPart| {
                let kp = pose.keypoint(part);
                let dx = kp.x as f64 - cx;
                let dy = kp.y as f64 - cy;
                PolarKeypoint {
                    distance: dx.hypot(dy) / max_side,
                    angle: turn_fraction(dy.atan2(dx)),
                    score: kp.score as f64,
                }
            };

            // TODO: derive the nose distance and eye angles from the ear and eye keypoints
            let head = HeadKeypoints {
                nose: PolarKeypoint {
                    distance: NOSE_DISTANCE,
                    ..polar(BodyPart::Nose)
                },
                left_eye: PolarKeypoint {
                    angle: LEFT_EYE_ANGLE,
                    ..polar(BodyPart::LeftEye)
                },
                right_eye: PolarKeypoint {
                    angle: RIGHT_EYE_ANGLE,
                    ..polar(BodyPart::RightEye)
                },
                left_ear: polar(BodyPart::LeftEar),
                right_ear: polar(BodyPart::RightEar),
            };

            Some(PoseDescriptor {
                center: [cx / width, cy / height],
                head,
                arms: ArmKeypoints {
                    left_shoulder: polar(BodyPart::LeftShoulder),
                    right_shoulder: polar(BodyPart::RightShoulder),
                    left_elbow: polar(BodyPart::LeftElbow),
                    right_elbow: polar(BodyPart::RightElbow),
                    left_wrist: polar(BodyPart::LeftWrist),
                    right_wrist: polar(BodyPart::RightWrist),
                },
                legs: LegKeypoints {
                    left_hip: polar(BodyPart::LeftHip),
                    right_hip: polar(BodyPart::RightHip),
                    left_knee: polar(BodyPart::LeftKnee),
                    right_knee: polar(BodyPart::RightKnee),
                    left_ankle: polar(BodyPart::LeftAnkle),
                    right_ankle: polar(BodyPart::RightAnkle),
                },
                head_rotation: head_rotation(pose, height, threshold),
            })
        })
        .collect::<Vec<_>>();

    log::debug!("poses: {} of {} converted", descriptors.len(), poses.len());

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ctrlmap_image::{ImageError, ImageSize};

    use super::*;

    fn set(pose: &mut Pose, part: BodyPart, x: f32, y: f32, score: f32) {
        pose.keypoints[part as usize] = Keypoint { x, y, score };
    }

    fn frontal_pose() -> Pose {
        let mut pose = Pose::default();
        set(&mut pose, BodyPart::Nose, 50.0, 20.0, 0.9);
        set(&mut pose, BodyPart::LeftEye, 55.0, 15.0, 0.9);
        set(&mut pose, BodyPart::RightEye, 45.0, 15.0, 0.9);
        set(&mut pose, BodyPart::LeftShoulder, 70.0, 40.0, 0.9);
        set(&mut pose, BodyPart::RightShoulder, 30.0, 40.0, 0.9);
        set(&mut pose, BodyPart::LeftWrist, 70.0, 90.0, 0.8);
        set(&mut pose, BodyPart::RightHip, 40.0, 80.0, 0.8);
        pose
    }

    const SIZE: ImageSize = ImageSize {
        width: 100,
        height: 200,
    };

    #[test]
    fn test_center_from_shoulders() -> Result<(), ImageError> {
        let descriptors = convert_poses(&[frontal_pose()], SIZE, 0.3)?;
        assert_eq!(descriptors.len(), 1);

        let d = &descriptors[0];
        assert_relative_eq!(d.center[0], 0.5);
        assert_relative_eq!(d.center[1], 0.2);

        // right shoulder lies straight left of the center
        assert_relative_eq!(d.arms.right_shoulder.distance, 20.0 / 200.0);
        assert_relative_eq!(d.arms.right_shoulder.angle, 0.5);
        // and the left one straight right, which folds to zero and never to one
        assert_eq!(d.arms.left_shoulder.angle, 0.0);
        // left wrist is 20 right and 50 down, y grows downwards
        let expected = (50.0f64).atan2(20.0) / (2.0 * std::f64::consts::PI);
        assert_relative_eq!(d.arms.left_wrist.angle, expected, epsilon = 1e-12);
        assert_relative_eq!(d.arms.left_wrist.score, 0.8, epsilon = 1e-6);
        assert_relative_eq!(
            d.legs.right_hip.angle,
            0.25 + (10.0f64).atan2(40.0) / (2.0 * std::f64::consts::PI),
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn test_center_falls_back_to_nose() -> Result<(), ImageError> {
        let mut pose = frontal_pose();
        set(&mut pose, BodyPart::LeftShoulder, 70.0, 40.0, 0.1);
        let descriptors = convert_poses(&[pose], SIZE, 0.3)?;
        assert_relative_eq!(descriptors[0].center[0], 0.5);
        assert_relative_eq!(descriptors[0].center[1], 0.1);
        Ok(())
    }

    #[test]
    fn test_unanchored_pose_is_skipped() -> Result<(), ImageError> {
        let mut lost = frontal_pose();
        set(&mut lost, BodyPart::Nose, 50.0, 20.0, 0.2);
        set(&mut lost, BodyPart::RightShoulder, 30.0, 40.0, 0.2);

        let mut shifted = frontal_pose();
        set(&mut shifted, BodyPart::LeftShoulder, 90.0, 40.0, 0.9);

        let descriptors = convert_poses(&[lost, frontal_pose(), shifted], SIZE, 0.3)?;
        assert_eq!(descriptors.len(), 2);
        assert_relative_eq!(descriptors[0].center[0], 0.5);
        assert_relative_eq!(descriptors[1].center[0], 0.6);

        assert!(convert_poses(&[], SIZE, 0.3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_head_rotation() -> Result<(), ImageError> {
        let d = convert_poses(&[frontal_pose()], SIZE, 0.3)?[0];
        // level eyes, nose 5 px below the eye line over a 20 px range
        assert_relative_eq!(d.head_rotation.yaw, 0.0);
        assert_relative_eq!(d.head_rotation.pitch, 0.25);

        let mut tilted = frontal_pose();
        set(&mut tilted, BodyPart::LeftEye, 55.0, 25.0, 0.9);
        set(&mut tilted, BodyPart::Nose, 50.0, 80.0, 0.9);
        let d = convert_poses(&[tilted], SIZE, 0.3)?[0];
        assert_relative_eq!(d.head_rotation.yaw, 0.25, epsilon = 1e-12);
        assert_relative_eq!(d.head_rotation.pitch, 1.0);

        let mut blind = frontal_pose();
        set(&mut blind, BodyPart::RightEye, 45.0, 15.0, 0.0);
        let d = convert_poses(&[blind], SIZE, 0.3)?[0];
        assert_eq!(d.head_rotation.yaw, 0.0);
        assert_eq!(d.head_rotation.pitch, 0.0);
        Ok(())
    }

    #[test]
    fn test_head_fields_are_fixed_constants() -> Result<(), ImageError> {
        // these fields ignore the keypoints; pin them until they are measured
        let mut other = frontal_pose();
        set(&mut other, BodyPart::Nose, 10.0, 190.0, 0.9);
        set(&mut other, BodyPart::LeftEye, 0.0, 0.0, 0.9);
        set(&mut other, BodyPart::RightEye, 99.0, 199.0, 0.9);

        for pose in [frontal_pose(), other] {
            let d = convert_poses(&[pose], SIZE, 0.3)?[0];
            assert_eq!(d.head.nose.distance, NOSE_DISTANCE);
            assert_eq!(d.head.left_eye.angle, LEFT_EYE_ANGLE);
            assert_eq!(d.head.right_eye.angle, RIGHT_EYE_ANGLE);
            assert_eq!(d.head_rotation.tilt_side, HEAD_TILT_SIDE);
            assert_eq!(d.head_rotation.rotation_z, HEAD_ROTATION_Z);
        }

        let d = convert_poses(&[frontal_pose()], SIZE, 0.3)?[0];
        assert_relative_eq!(d.head.nose.angle, 0.75, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_zero_size_is_an_error() {
        let size = ImageSize {
            width: 0,
            height: 10,
        };
        assert!(convert_poses(&[frontal_pose()], size, 0.3).is_err());
    }

    #[test]
    fn test_pose_json() -> Result<(), serde_json::Error> {
        let keypoints = (0..NUM_KEYPOINTS)
            .map(|i| serde_json::json!({"x": i as f32, "y": 1.0, "score": 0.5}))
            .collect::<Vec<_>>();
        let pose: Pose = serde_json::from_value(serde_json::json!({ "keypoints": keypoints }))?;
        assert_eq!(pose.keypoint(BodyPart::RightAnkle).x, 16.0);

        let json = serde_json::to_value(PoseDescriptor::default())?;
        assert!(json.get("headRotation").is_some());
        assert!(json["arms"].get("leftShoulder").is_some());
        Ok(())
    }
}
