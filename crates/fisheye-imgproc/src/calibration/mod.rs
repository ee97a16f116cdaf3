/// unified camera model and rectification maps.
pub mod distortion;

use fisheye_image::{ImageError, ImageSize};
use glam::DMat3;

use crate::interpolation::grid::GridError;

/// An error type for the calibration module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibrationError {
    /// The intrinsic parameters are not usable.
    #[error("Invalid camera intrinsic: fx={0}, fy={1}; focal lengths must be finite and > 0")]
    InvalidIntrinsic(f64, f64),

    /// The vertical field of view is outside of (0, 180) degrees.
    #[error("Invalid vertical field of view {0} degrees, expected a value in (0, 180)")]
    InvalidFieldOfView(f64),

    /// The requested output size has no pixels.
    #[error("Invalid output size {0}")]
    EmptySize(ImageSize),

    /// The product of the new intrinsic and the rectifying rotation cannot be inverted.
    #[error("The rectifying transform is singular (det={0})")]
    SingularTransform(f64),

    /// Error allocating or validating the map images.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error generating the coordinate grid.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Represents the instrinsic parameters of a camera
///
/// The matrix form is
///
/// ```text
/// | fx  s  cx |
/// |  0 fy  cy |
/// |  0  0   1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
    /// The skew between the x and y axis
    pub skew: f64,
}

impl CameraIntrinsic {
    /// Create an intrinsic without skew.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            skew: 0.0,
        }
    }

    /// Read the intrinsic from a row-major 3x3 camera matrix.
    ///
    /// The last row is assumed to be `[0, 0, 1]` and is not read.
    pub fn from_matrix(k: &[[f64; 3]; 3]) -> Self {
        Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
            skew: k[0][1],
        }
    }

    /// The row-major 3x3 camera matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, self.skew, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Check that both focal lengths are positive and every entry is finite.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let finite = [self.fx, self.fy, self.cx, self.cy, self.skew]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(CalibrationError::InvalidIntrinsic(self.fx, self.fy));
        }
        Ok(())
    }

    pub(crate) fn as_dmat3(&self) -> DMat3 {
        row_major_to_dmat3(&self.to_matrix())
    }
}

impl std::fmt::Display for CameraIntrinsic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}; 0, {}, {}; 0, 0, 1]",
            self.fx, self.skew, self.cx, self.fy, self.cy
        )
    }
}

/// Represents the rotation of a physical camera relative to the rectified frame
///
/// # Fields
///
/// * `rotation` - The row-major rotation matrix of the camera 3x3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraExtrinsic {
    /// The rotation matrix of the camera 3x3
    pub rotation: [[f64; 3]; 3],
}

impl CameraExtrinsic {
    /// The identity rotation, used for the reference camera.
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub(crate) fn as_dmat3(&self) -> DMat3 {
        row_major_to_dmat3(&self.rotation)
    }
}

impl Default for CameraExtrinsic {
    fn default() -> Self {
        Self::identity()
    }
}

// glam stores matrices column-major
fn row_major_to_dmat3(m: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(m).transpose()
}

/// Compute the virtual pinhole intrinsic shared by the rectified views.
///
/// The focal length is `height / (2 * tan(vfov / 2))` for both axes and the
/// principal point sits at `(width / 2 - 0.5, height / 2 - 0.5)`, i.e. at the
/// centre of the pixel grid.
///
/// # Arguments
///
/// * `size` - The size of the rectified image.
/// * `vfov_deg` - The vertical field of view in degrees, in (0, 180).
///
/// # Example
///
/// ```
/// use fisheye_image::ImageSize;
/// use fisheye_imgproc::calibration::virtual_pinhole_intrinsic;
///
/// let k = virtual_pinhole_intrinsic(ImageSize { width: 640, height: 480 }, 90.0).unwrap();
/// assert!((k.fy - 240.0).abs() < 1e-9);
/// assert_eq!(k.cx, 319.5);
/// assert_eq!(k.cy, 239.5);
/// ```
pub fn virtual_pinhole_intrinsic(
    size: ImageSize,
    vfov_deg: f64,
) -> Result<CameraIntrinsic, CalibrationError> {
    if size.is_empty() {
        return Err(CalibrationError::EmptySize(size));
    }
    if !(vfov_deg > 0.0 && vfov_deg < 180.0) {
        return Err(CalibrationError::InvalidFieldOfView(vfov_deg));
    }

    let vfov_rad = vfov_deg.to_radians();
    let focal = size.height as f64 / 2.0 / (vfov_rad / 2.0).tan();

    Ok(CameraIntrinsic::new(
        focal,
        focal,
        size.width as f64 / 2.0 - 0.5,
        size.height as f64 / 2.0 - 0.5,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_matrix_roundtrip() {
        let k = [[400.0, 0.5, 320.0], [0.0, 410.0, 240.0], [0.0, 0.0, 1.0]];
        let intrinsic = CameraIntrinsic::from_matrix(&k);
        assert_eq!(intrinsic.skew, 0.5);
        assert_eq!(intrinsic.to_matrix(), k);

        let m = intrinsic.as_dmat3();
        assert_eq!(m.row(0).x, 400.0);
        assert_eq!(m.row(0).y, 0.5);
        assert_eq!(m.row(1).z, 240.0);
    }

    #[test]
    fn test_intrinsic_validate() {
        assert!(CameraIntrinsic::new(1.0, 1.0, 0.0, 0.0).validate().is_ok());
        assert_eq!(
            CameraIntrinsic::new(0.0, 1.0, 0.0, 0.0).validate(),
            Err(CalibrationError::InvalidIntrinsic(0.0, 1.0))
        );
        assert!(CameraIntrinsic::new(1.0, -2.0, 0.0, 0.0).validate().is_err());
        assert!(CameraIntrinsic::new(1.0, 1.0, f64::NAN, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_virtual_pinhole_intrinsic() -> Result<(), CalibrationError> {
        let size = ImageSize {
            width: 800,
            height: 600,
        };
        let k = virtual_pinhole_intrinsic(size, 60.0)?;
        let expected = 300.0 / (30f64).to_radians().tan();
        assert!((k.fx - expected).abs() < 1e-9);
        assert_eq!(k.fx, k.fy);
        assert_eq!(k.skew, 0.0);
        assert_eq!((k.cx, k.cy), (399.5, 299.5));
        Ok(())
    }

    #[test]
    fn test_virtual_pinhole_intrinsic_invalid() {
        let size = ImageSize {
            width: 8,
            height: 6,
        };
        assert_eq!(
            virtual_pinhole_intrinsic(size, 0.0),
            Err(CalibrationError::InvalidFieldOfView(0.0))
        );
        assert!(virtual_pinhole_intrinsic(size, 180.0).is_err());
        assert!(virtual_pinhole_intrinsic(size, f64::NAN).is_err());
        assert!(matches!(
            virtual_pinhole_intrinsic(ImageSize::from([0, 6]), 60.0),
            Err(CalibrationError::EmptySize(_))
        ));
    }
}
