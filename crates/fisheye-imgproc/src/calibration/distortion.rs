use super::{CalibrationError, CameraExtrinsic, CameraIntrinsic};
use crate::interpolation::grid::meshgrid_from_fn;
use crate::parallel::ExecutionStrategy;
use fisheye_image::{Image, ImageError, ImageSize};
use glam::{DMat3, DVec3};

/// Represents the unified camera model parameters of a fisheye camera
///
/// # Fields
///
/// * `xi` - The mirror parameter, shift of the projection centre along the optical axis
/// * `k1` - The first radial distortion coefficient
/// * `k2` - The second radial distortion coefficient
/// * `p1` - The first tangential distortion coefficient
/// * `p2` - The second tangential distortion coefficient
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnifiedDistortion {
    /// The mirror parameter of the unified model
    pub xi: f64,
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

impl UnifiedDistortion {
    /// Build the parameters from `xi` and the `[k1, k2, p1, p2]` coefficients.
    pub fn new(xi: f64, coeffs: [f64; 4]) -> Self {
        let [k1, k2, p1, p2] = coeffs;
        Self {
            xi,
            k1,
            k2,
            p1,
            p2,
        }
    }
}

/// Apply radial and tangential distortion to a point on the normalized plane.
///
/// # Arguments
///
/// * `xu` - The x coordinate of the undistorted point
/// * `yu` - The y coordinate of the undistorted point
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// The distorted point `(xd, yd)` on the normalized plane.
pub fn distort_point_unified(xu: f64, yu: f64, distortion: &UnifiedDistortion) -> (f64, f64) {
    let (k1, k2, p1, p2) = (distortion.k1, distortion.k2, distortion.p1, distortion.p2);

    let r2 = xu * xu + yu * yu;
    let r4 = r2 * r2;
    let kr = 1.0 + k1 * r2 + k2 * r4;

    let xd = kr * xu + 2.0 * p1 * xu * yu + p2 * (r2 + 2.0 * xu * xu);
    let yd = kr * yu + 2.0 * p2 * xu * yu + p1 * (r2 + 2.0 * yu * yu);

    (xd, yd)
}

/// Project a ray through the unified camera model into the fisheye image.
///
/// The ray is lifted to the unit sphere, projected from the point shifted by
/// `xi` along the optical axis, distorted and finally mapped to pixels.
///
/// # Returns
///
/// The pixel `(u, v)`, or `None` when the projection is undefined: zero length
/// ray, a ray at or behind the projection centre (`zs + xi <= 0`) or a
/// non-finite result.
pub fn project_point_unified(
    ray: DVec3,
    intrinsic: &CameraIntrinsic,
    distortion: &UnifiedDistortion,
) -> Option<(f64, f64)> {
    let norm = ray.length();
    if !(norm > 0.0) {
        return None;
    }
    let s = ray / norm;

    let denom = s.z + distortion.xi;
    if !(denom > 0.0) {
        return None;
    }
    let xu = s.x / denom;
    let yu = s.y / denom;

    let (xd, yd) = distort_point_unified(xu, yu, distortion);

    let u = intrinsic.fx * xd + intrinsic.skew * yd + intrinsic.cx;
    let v = intrinsic.fy * yd + intrinsic.cy;

    (u.is_finite() && v.is_finite()).then_some((u, v))
}

/// Compute `(new_intrinsic * rotation)^-1`, the transform from rectified
/// pixels to rays in the camera frame.
pub fn rectify_inverse_transform(
    new_intrinsic: &CameraIntrinsic,
    extrinsic: &CameraExtrinsic,
) -> Result<DMat3, CalibrationError> {
    let kr = new_intrinsic.as_dmat3() * extrinsic.as_dmat3();
    let det = kr.determinant();
    if !det.is_finite() || det.abs() < f64::EPSILON {
        return Err(CalibrationError::SingularTransform(det));
    }
    Ok(kr.inverse())
}

/// Map a pixel of the rectified image to the fisheye source image.
///
/// # Arguments
///
/// * `col` - The column of the rectified pixel.
/// * `row` - The row of the rectified pixel.
/// * `kr_inv` - The inverse rectifying transform, see [`rectify_inverse_transform`].
/// * `intrinsic` - The intrinsic parameters of the fisheye camera.
/// * `distortion` - The unified model parameters of the fisheye camera.
pub fn rectified_to_source(
    col: f64,
    row: f64,
    kr_inv: &DMat3,
    intrinsic: &CameraIntrinsic,
    distortion: &UnifiedDistortion,
) -> Option<(f64, f64)> {
    let ray = *kr_inv * DVec3::new(col, row, 1.0);
    project_point_unified(ray, intrinsic, distortion)
}

/// A dense pixel remapping table.
///
/// `map_x` and `map_y` hold, for every pixel of the rectified image, the
/// fractional coordinate to sample in the source image. Pixels without a
/// source hold `NaN` in both maps.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifyMap {
    map_x: Image<f32, 1>,
    map_y: Image<f32, 1>,
}

impl RectifyMap {
    /// Create a map from its two coordinate images.
    ///
    /// # Errors
    ///
    /// The two images must have the same size.
    pub fn new(map_x: Image<f32, 1>, map_y: Image<f32, 1>) -> Result<Self, ImageError> {
        if map_x.size() != map_y.size() {
            return Err(ImageError::InvalidImageSize(
                map_y.cols(),
                map_y.rows(),
                map_x.cols(),
                map_x.rows(),
            ));
        }
        Ok(Self { map_x, map_y })
    }

    /// The size of the rectified image.
    pub fn size(&self) -> ImageSize {
        self.map_x.size()
    }

    /// The x (column) source coordinates.
    pub fn map_x(&self) -> &Image<f32, 1> {
        &self.map_x
    }

    /// The y (row) source coordinates.
    pub fn map_y(&self) -> &Image<f32, 1> {
        &self.map_y
    }

    /// The source coordinate for the rectified pixel `(x, y)`.
    ///
    /// Returns `None` outside of the map and for undefined entries.
    pub fn get(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        let u = *self.map_x.get([y, x, 0])?;
        let v = *self.map_y.get([y, x, 0])?;
        (u.is_finite() && v.is_finite()).then_some((u, v))
    }

    /// The number of entries that have a source pixel.
    pub fn num_valid(&self) -> usize {
        self.map_x
            .as_slice()
            .iter()
            .zip(self.map_y.as_slice())
            .filter(|(u, v)| u.is_finite() && v.is_finite())
            .count()
    }
}

/// Generate the undistort and rectify map for the unified camera model
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the fisheye camera
/// * `extrinsic` - The rotation of the camera with respect to the rectified frame
/// * `new_intrinsic` - The intrinsic parameters of the virtual pinhole camera
/// * `distortion` - The unified model parameters of the camera
/// * `size` - The size of the rectified image
/// * `strategy` - How to distribute the rows over threads
///
/// # Returns
///
/// The [`RectifyMap`] with one entry per rectified pixel.
pub fn generate_correction_map_unified(
    intrinsic: &CameraIntrinsic,
    extrinsic: &CameraExtrinsic,
    new_intrinsic: &CameraIntrinsic,
    distortion: &UnifiedDistortion,
    size: ImageSize,
    strategy: ExecutionStrategy,
) -> Result<RectifyMap, CalibrationError> {
    if size.is_empty() {
        return Err(CalibrationError::EmptySize(size));
    }
    intrinsic.validate()?;
    new_intrinsic.validate()?;

    let kr_inv = rectify_inverse_transform(new_intrinsic, extrinsic)?;

    let (map_x, map_y) = meshgrid_from_fn(size, strategy, |x, y| {
        match rectified_to_source(x as f64, y as f64, &kr_inv, intrinsic, distortion) {
            Some((u, v)) => (u as f32, v as f32),
            None => (f32::NAN, f32::NAN),
        }
    })?;

    let map = RectifyMap::new(map_x, map_y)?;
    log::info!(
        "rectify map {}: {} / {} entries with a source pixel",
        size,
        map.num_valid(),
        size.area()
    );

    Ok(map)
}
