use crate::calibration::distortion::RectifyMap;
use crate::parallel::{self, ExecutionStrategy};

use super::grid::GridError;
use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use fisheye_image::{Image, ImageError};

/// Apply generic geometric transformation to an image.
///
/// Destination pixels whose source coordinate is undefined (`NaN`) or falls
/// outside of the source image (beyond half a pixel from the border pixels)
/// are set to `border_value` on every channel.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border_value` - The value for pixels without a source.
/// * `strategy` - How to distribute the rows over threads.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
pub fn remap<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    interpolation: InterpolationMode,
    border_value: f32,
    strategy: ExecutionStrategy,
) -> Result<(), GridError> {
    if map_x.size() != map_y.size() {
        return Err(ImageError::InvalidImageSize(
            map_y.cols(),
            map_y.rows(),
            map_x.cols(),
            map_x.rows(),
        )
        .into());
    }

    if dst.size() != map_x.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            map_x.cols(),
            map_x.rows(),
        )
        .into());
    }

    parallel::iter_rows_resample(dst, map_x, map_y, strategy, |x, y, dst_pixel| {
        match interpolate_pixel(src, x, y, interpolation) {
            Some(pixel) => dst_pixel.copy_from_slice(&pixel),
            None => dst_pixel.fill(border_value),
        }
    })?;

    Ok(())
}

/// Resample `src` through a [`RectifyMap`], see [`remap`].
pub fn remap_with_map<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map: &RectifyMap,
    interpolation: InterpolationMode,
    border_value: f32,
    strategy: ExecutionStrategy,
) -> Result<(), GridError> {
    remap(
        src,
        dst,
        map.map_x(),
        map.map_y(),
        interpolation,
        border_value,
        strategy,
    )
}
