use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use fisheye_image::Image;

/// Interpolation mode for the remap operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel, or `None` when `(u, v)` is not finite or lies
/// outside of the pixel footprints `[-0.5, width - 0.5] x [-0.5, height - 0.5]`.
/// Coordinates inside the footprint of a border pixel are clamped to it.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> Option<[f32; C]> {
    if image.size().is_empty() || !u.is_finite() || !v.is_finite() {
        return None;
    }
    let (max_u, max_v) = ((image.cols() - 1) as f32, (image.rows() - 1) as f32);
    if u < -0.5 || v < -0.5 || u > max_u + 0.5 || v > max_v + 0.5 {
        return None;
    }
    let (u, v) = (u.clamp(0.0, max_u), v.clamp(0.0, max_v));

    Some(match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    })
}
