use fisheye_3d::DepthError;
use fisheye_image::ImageError;
use fisheye_imgproc::{
    calibration::CalibrationError, interpolation::grid::GridError, parallel::ParallelError,
};

/// An error type for the stereo pipeline.
#[derive(thiserror::Error, Debug)]
pub enum StereoError {
    /// The calibration file could not be read.
    #[error("Failed to read the calibration file")]
    Io(#[from] std::io::Error),

    /// The calibration file is not valid JSON or misses a field.
    #[error("Failed to parse the calibration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The operation needs a second camera but the rig is monocular.
    #[error("The operation requires a stereo rig but the calibration is monocular")]
    MissingStereoCamera,

    /// The calibration values violate an invariant.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error deriving the camera geometry or the rectification maps.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Error converting disparity to depth or to a point cloud.
    #[error(transparent)]
    Depth(#[from] DepthError),

    /// Error resampling a frame through a rectification map.
    #[error(transparent)]
    Resample(#[from] GridError),

    /// The thread pool of the rig could not be created.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// Invalid image or image pair.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The stereo matcher failed.
    #[error("Stereo matcher failed: {0}")]
    Matcher(String),
}
