use fisheye_image::ImageError;
use fisheye_imgproc::{
    calibration::CalibrationError, normalize::NormalizeError, parallel::ParallelError,
};

/// An error type for the depth and point cloud operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DepthError {
    /// The sub-pixel scale of the disparity field must be finite and > 0.
    #[error("Invalid disparity scale {0}, expected a finite value > 0")]
    InvalidDisparityScale(f64),

    /// The focal length must be finite and > 0.
    #[error("Invalid focal length {0}, expected a finite value > 0")]
    InvalidFocal(f64),

    /// The baseline must be finite and non zero.
    #[error("Invalid baseline {0}, expected a finite non zero value")]
    InvalidBaseline(f64),

    /// The validity ceiling of the point cloud must be finite and > 0.
    #[error("Invalid maximum depth {0}, expected a finite value > 0")]
    InvalidMaxDepth(f64),

    /// The fixed disparity display range is empty or not finite.
    #[error("Invalid disparity display range [{0}, {1}]")]
    InvalidDisparityRange(f64, f64),

    /// Invalid image or image pair.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Invalid camera intrinsic.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Error rescaling the disparity for display.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Error running the per-row pass.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
