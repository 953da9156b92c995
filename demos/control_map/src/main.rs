use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::{Path, PathBuf};

use ctrlmap::image::Image;
use ctrlmap::imgproc::pose::Pose;
use ctrlmap::{ControlMode, ControlOutput, ControlPipeline, DepthEstimator, EstimatorError, PoseEstimator};

#[derive(FromArgs)]
/// Turn an image into a control map
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// control mode: edge, segmentation, depth, pose, light or normal
    #[argh(option, short = 'm', default = "String::from(\"edge\")")]
    mode: String,

    /// path to a JSON file with the mode parameters
    #[argh(option, short = 'p')]
    params: Option<PathBuf>,

    /// path of the output PNG image or JSON file
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// longest side the input is downscaled to
    #[argh(option, default = "1024")]
    max_side: u32,

    /// seed of the segmentation random source
    #[argh(option)]
    seed: Option<u64>,

    /// grayscale image used as the depth network output
    #[argh(option)]
    depth_map: Option<PathBuf>,

    /// JSON file with the pose network output
    #[argh(option)]
    poses: Option<PathBuf>,
}

/// Replays a depth prediction stored on disk.
struct StoredDepth(Image<f32, 1>);

impl DepthEstimator for StoredDepth {
    fn estimate_depth(&mut self, _input: &Image<f32, 3>) -> Result<Image<f32, 1>, EstimatorError> {
        Ok(self.0.clone())
    }
}

/// Replays pose detections stored on disk.
struct StoredPoses(Vec<Pose>);

impl PoseEstimator for StoredPoses {
    fn estimate_poses(&mut self, _image: &Image<u8, 4>) -> Result<Vec<Pose>, EstimatorError> {
        Ok(self.0.clone())
    }
}

fn read_rgba(path: &Path, max_side: u32) -> Result<Image<u8, 4>, Box<dyn std::error::Error>> {
    let mut decoded = image::open(path)?;
    if decoded.width().max(decoded.height()) > max_side {
        decoded = decoded.resize(max_side, max_side, image::imageops::FilterType::Triangle);
    }

    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize].into();
    Ok(Image::new(size, rgba.into_raw())?)
}

fn read_mode(name: &str, params: Option<&Path>) -> Result<ControlMode, Box<dyn std::error::Error>> {
    let mut value = match params {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::json!({}),
    };

    let Some(object) = value.as_object_mut() else {
        return Err("the parameter file must hold a JSON object".into());
    };
    object.insert("mode".to_string(), name.into());

    Ok(serde_json::from_value(value)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let image = read_rgba(&args.image_path, args.max_side)?;
    let mode = read_mode(&args.mode, args.params.as_deref())?;

    let mut pipeline = ControlPipeline::new();
    if let Some(path) = &args.depth_map {
        let depth = image::open(path)?.to_luma32f();
        let size = [depth.width() as usize, depth.height() as usize].into();
        pipeline = pipeline.with_depth_estimator(StoredDepth(Image::new(size, depth.into_raw())?));
    }
    if let Some(path) = &args.poses {
        let poses: Vec<Pose> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        pipeline = pipeline.with_pose_estimator(StoredPoses(poses));
    }

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    log::info!("mode {} on {} (seed {seed})", mode.name(), image.size());

    let now = std::time::Instant::now();
    let output = pipeline.process(&image, &mode, &mut rng)?;
    log::info!("processed in {:?}", now.elapsed());

    match output {
        ControlOutput::Image(control) => {
            let [width, height]: [u32; 2] = control.size().into();
            let buffer = image::RgbaImage::from_raw(width, height, control.into_vec())
                .ok_or("control image buffer does not match its size")?;
            buffer.save(&args.output)?;
        }
        ControlOutput::Lights(lights) => {
            println!("found {} light sources", lights.len());
            std::fs::write(&args.output, serde_json::to_string_pretty(&lights)?)?;
        }
        ControlOutput::Poses(poses) => {
            println!("converted {} poses", poses.len());
            std::fs::write(&args.output, serde_json::to_string_pretty(&poses)?)?;
        }
    }

    println!("wrote {}", args.output.display());

    Ok(())
}
