//! Calibration files.
//!
//! A rig is described by a JSON document:
//!
//! ```json
//! {
//!   "model": "stereo",
//!   "capture_size": { "width": 1280, "height": 1024 },
//!   "vfov_deg": 60.0,
//!   "left": {
//!     "intrinsic": [[1402.8, 0.3, 638.2], [0.0, 1403.1, 513.7], [0.0, 0.0, 1.0]],
//!     "distortion": [-0.12, 0.35, 0.0004, -0.0002],
//!     "xi": 1.78
//!   },
//!   "right": { "intrinsic": "...", "distortion": "...", "xi": 1.75, "rotation": "..." },
//!   "translation": [-0.12, 0.0, 0.0]
//! }
//! ```
//!
//! `matcher`, `depth` and `execution` are optional and fall back to their defaults.

use std::path::Path;

use fisheye_3d::depth::DepthConfig;
use fisheye_image::ImageSize;
use fisheye_imgproc::{
    calibration::{distortion::UnifiedDistortion, CalibrationError, CameraExtrinsic, CameraIntrinsic},
    parallel::ExecutionStrategy,
};
use serde::{Deserialize, Serialize};

use crate::{error::StereoError, matcher::MatcherParams};

/// The vertical field of view of the rectified views when none is configured.
pub const DEFAULT_VFOV_DEG: f64 = 60.0;

/// The number of physical cameras of the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraModel {
    /// A single fisheye camera.
    Mono,
    /// A calibrated fisheye pair.
    Stereo,
}

/// An image size in the calibration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// The width in pixels.
    pub width: usize,
    /// The height in pixels.
    pub height: usize,
}

impl From<FrameSize> for ImageSize {
    fn from(size: FrameSize) -> Self {
        ImageSize {
            width: size.width,
            height: size.height,
        }
    }
}

fn identity_rotation() -> [[f64; 3]; 3] {
    CameraExtrinsic::identity().rotation
}

/// The calibration of one physical camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// The row-major 3x3 camera matrix.
    pub intrinsic: [[f64; 3]; 3],
    /// The `[k1, k2, p1, p2]` distortion coefficients.
    pub distortion: [f64; 4],
    /// The mirror parameter of the unified model.
    pub xi: f64,
    /// The rectifying rotation, identity when omitted.
    #[serde(default = "identity_rotation")]
    pub rotation: [[f64; 3]; 3],
}

impl CameraConfig {
    /// The camera intrinsic.
    pub fn intrinsic(&self) -> CameraIntrinsic {
        CameraIntrinsic::from_matrix(&self.intrinsic)
    }

    /// The unified model parameters.
    pub fn distortion(&self) -> UnifiedDistortion {
        UnifiedDistortion::new(self.xi, self.distortion)
    }

    /// The rectifying rotation.
    pub fn extrinsic(&self) -> CameraExtrinsic {
        CameraExtrinsic {
            rotation: self.rotation,
        }
    }

    fn validate(&self, name: &str) -> Result<(), StereoError> {
        self.intrinsic().validate()?;

        let finite = self.xi.is_finite()
            && self.distortion.iter().all(|v| v.is_finite())
            && self.rotation.iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err(StereoError::InvalidConfig(format!(
                "{name} camera has non finite distortion or rotation"
            )));
        }
        Ok(())
    }
}

/// How the per-pixel passes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionConfig {
    /// On the calling thread.
    #[default]
    Serial,
    /// On the global thread pool.
    ParallelRows,
    /// On a local pool with the given number of threads.
    ///
    /// [`crate::pipeline::DenseStereo`] builds the pool once per rig.
    Fixed(usize),
}

impl From<ExecutionConfig> for ExecutionStrategy {
    fn from(config: ExecutionConfig) -> Self {
        match config {
            ExecutionConfig::Serial => ExecutionStrategy::Serial,
            ExecutionConfig::ParallelRows => ExecutionStrategy::ParallelRows,
            ExecutionConfig::Fixed(n) => ExecutionStrategy::Fixed(n),
        }
    }
}

/// The calibration of a mono or stereo fisheye rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Mono or stereo rig.
    pub model: CameraModel,
    /// The size of the raw frames.
    pub capture_size: FrameSize,
    /// The size of the rectified views, the capture size when omitted.
    #[serde(default)]
    pub output_size: Option<FrameSize>,
    /// The vertical field of view of the rectified views in degrees.
    #[serde(default = "default_vfov")]
    pub vfov_deg: f64,
    /// The left (or only) camera.
    pub left: CameraConfig,
    /// The right camera, required for a stereo rig.
    #[serde(default)]
    pub right: Option<CameraConfig>,
    /// The position of the right camera in the left camera frame.
    #[serde(default)]
    pub translation: Option<[f64; 3]>,
    /// The stereo matcher parameters.
    #[serde(default)]
    pub matcher: MatcherParams,
    /// The depth reconstruction settings.
    #[serde(default)]
    pub depth: DepthConfig,
    /// How the per-pixel passes are executed.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

fn default_vfov() -> f64 {
    DEFAULT_VFOV_DEG
}

impl CalibrationConfig {
    /// Read and validate a calibration file.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the JSON document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StereoError> {
        let path = path.as_ref();
        log::debug!("Loading calibration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a calibration document.
    pub fn from_json_str(s: &str) -> Result<Self, StereoError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant of the calibration.
    pub fn validate(&self) -> Result<(), StereoError> {
        if ImageSize::from(self.capture_size).is_empty() {
            return Err(StereoError::InvalidConfig(format!(
                "capture size {}x{} has no pixels",
                self.capture_size.width, self.capture_size.height
            )));
        }
        let output_size = self.output_size();
        if output_size.is_empty() {
            return Err(CalibrationError::EmptySize(output_size).into());
        }
        if !(self.vfov_deg > 0.0 && self.vfov_deg < 180.0) {
            return Err(CalibrationError::InvalidFieldOfView(self.vfov_deg).into());
        }

        self.left.validate("left")?;

        if self.model == CameraModel::Stereo {
            let right = self.right.as_ref().ok_or_else(|| {
                StereoError::InvalidConfig("a stereo rig needs a right camera".to_string())
            })?;
            right.validate("right")?;

            match self.baseline() {
                Some(b) if b.is_finite() && b != 0.0 => {}
                Some(b) => {
                    return Err(StereoError::InvalidConfig(format!(
                        "the baseline must be finite and non zero, got {b}"
                    )))
                }
                None => {
                    return Err(StereoError::InvalidConfig(
                        "a stereo rig needs a translation".to_string(),
                    ))
                }
            }
        }

        self.matcher.validate()?;
        self.depth.validate()?;

        if self.execution == ExecutionConfig::Fixed(0) {
            return Err(StereoError::InvalidConfig(
                "the fixed execution strategy needs at least one thread".to_string(),
            ));
        }

        Ok(())
    }

    /// The size of the rectified views.
    pub fn output_size(&self) -> ImageSize {
        self.output_size.unwrap_or(self.capture_size).into()
    }

    /// The rotation applied to the left camera, identity for a mono rig.
    pub fn left_extrinsic(&self) -> CameraExtrinsic {
        match self.model {
            CameraModel::Mono => CameraExtrinsic::identity(),
            CameraModel::Stereo => self.left.extrinsic(),
        }
    }

    /// The signed baseline `-tx`, `None` for a mono rig.
    pub fn baseline(&self) -> Option<f64> {
        match self.model {
            CameraModel::Mono => None,
            CameraModel::Stereo => self.translation.map(|t| -t[0]),
        }
    }

    /// The execution strategy of the per-pixel passes.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.execution.into()
    }
}
