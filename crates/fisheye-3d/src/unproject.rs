use fisheye_image::Image;
use fisheye_imgproc::{
    calibration::CameraIntrinsic,
    parallel::{self, ExecutionStrategy},
};
use glam::DVec3;

use crate::{error::DepthError, pointcloud::PointCloud};

/// Back-project a pixel with depth `z` onto the viewing sphere.
///
/// The pixel ray `((c - cx) / fx, (r - cy) / fy, 1)` is normalized and
/// scaled by `z`, so the returned point lies at distance `z` from the
/// optical centre. The skew of the intrinsic is ignored.
///
/// # Arguments
///
/// * `col` - The pixel column.
/// * `row` - The pixel row.
/// * `z` - The depth of the pixel.
/// * `intrinsic` - The intrinsic of the rectified view.
///
/// # Returns
///
/// The 3d point in the camera frame.
#[inline]
pub fn unproject_pixel_spherical(
    col: usize,
    row: usize,
    z: f64,
    intrinsic: &CameraIntrinsic,
) -> [f64; 3] {
    let ray = DVec3::new(
        (col as f64 - intrinsic.cx) / intrinsic.fx,
        (row as f64 - intrinsic.cy) / intrinsic.fy,
        1.0,
    );
    let n = ray.length();
    [ray.x * z / n, ray.y * z / n, z / n]
}

/// Convert a depth field into a point cloud on the viewing sphere.
///
/// Pixels whose depth is not finite, not positive or above `max_depth` are
/// skipped. The points are emitted in raster order for every strategy.
///
/// # Arguments
///
/// * `depth` - The depth field of the rectified view.
/// * `intrinsic` - The intrinsic of the rectified view.
/// * `max_depth` - The validity ceiling.
/// * `strategy` - How to distribute the rows over threads.
///
/// # Returns
///
/// The point cloud, with at most one point per pixel.
pub fn depth_to_spherical_pointcloud(
    depth: &Image<f32, 1>,
    intrinsic: &CameraIntrinsic,
    max_depth: f64,
    strategy: ExecutionStrategy,
) -> Result<PointCloud, DepthError> {
    intrinsic.validate()?;
    if !(max_depth.is_finite() && max_depth > 0.0) {
        return Err(DepthError::InvalidMaxDepth(max_depth));
    }

    let cols = depth.cols();
    let data = depth.as_slice();

    let points: Vec<[f64; 3]> = parallel::flat_map_rows(depth.rows(), strategy, |r| {
        data[r * cols..(r + 1) * cols]
            .iter()
            .enumerate()
            .filter_map(|(c, &z)| {
                let z = z as f64;
                if !z.is_finite() || z <= 0.0 || z > max_depth {
                    return None;
                }
                Some(unproject_pixel_spherical(c, r, z, intrinsic))
            })
            .collect()
    })?;

    log::debug!(
        "Back-projected {} of {} pixels",
        points.len(),
        depth.size().area()
    );

    Ok(PointCloud::new(points))
}
