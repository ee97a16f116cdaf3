use fisheye_image::ImageSize;
use fisheye_imgproc::calibration::{virtual_pinhole_intrinsic, CalibrationError, CameraIntrinsic};

use crate::config::CalibrationConfig;

/// The virtual pinhole camera shared by the rectified views of a rig.
///
/// Computed once per rig. The same intrinsic defines the rectification maps
/// and inverts them when depth is back-projected, so the two stages stay
/// consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoGeometry {
    size: ImageSize,
    vfov_deg: f64,
    intrinsic: CameraIntrinsic,
    baseline: Option<f64>,
}

impl StereoGeometry {
    /// Derive the geometry of the rectified views.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the rectified views.
    /// * `vfov_deg` - The vertical field of view in degrees.
    /// * `baseline` - The signed distance between the optical centres, `None` for a single camera.
    pub fn new(
        size: ImageSize,
        vfov_deg: f64,
        baseline: Option<f64>,
    ) -> Result<Self, CalibrationError> {
        let intrinsic = virtual_pinhole_intrinsic(size, vfov_deg)?;

        log::info!(
            "Rectified views: width {} height {} vfov {} K {}",
            size.width,
            size.height,
            vfov_deg,
            intrinsic
        );
        if let Some(baseline) = baseline {
            log::info!("Stereo baseline: {}", baseline);
        }

        Ok(Self {
            size,
            vfov_deg,
            intrinsic,
            baseline,
        })
    }

    /// Derive the geometry described by a calibration.
    pub fn from_config(config: &CalibrationConfig) -> Result<Self, CalibrationError> {
        Self::new(config.output_size(), config.vfov_deg, config.baseline())
    }

    /// The size of the rectified views.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The vertical field of view in degrees.
    pub fn vfov_deg(&self) -> f64 {
        self.vfov_deg
    }

    /// The virtual pinhole intrinsic `Knew`.
    pub fn intrinsic(&self) -> &CameraIntrinsic {
        &self.intrinsic
    }

    /// The signed baseline of a stereo rig.
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Whether the rig has two cameras.
    pub fn is_stereo(&self) -> bool {
        self.baseline.is_some()
    }
}
