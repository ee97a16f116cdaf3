//! Range normalization of single and multi channel images.
//!
//! * [`find_min_max`] - observed value range of an image
//! * [`rescale_to_u8`] - linear rescale of any numeric image to a displayable `u8` image

use num_traits::ToPrimitive;

use fisheye_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy, ParallelError};

/// Errors produced by the normalization operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NormalizeError {
    /// Invalid image or image pair.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error running the per-row pass.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// Find the minimum and maximum values in an image.
///
/// # Errors
///
/// If the image has no pixels, an error is returned.
///
/// # Example
///
/// ```
/// use fisheye_image::{Image, ImageSize};
/// use fisheye_imgproc::normalize::find_min_max;
///
/// let image = Image::<i16, 1>::new(
///     ImageSize { width: 2, height: 2 },
///     vec![-16, 32, 0, 800],
/// )
/// .unwrap();
///
/// let (min, max) = find_min_max(&image).unwrap();
/// assert_eq!(min, -16);
/// assert_eq!(max, 800);
/// ```
pub fn find_min_max<T, const C: usize>(image: &Image<T, C>) -> Result<(T, T), ImageError>
where
    T: Copy + PartialOrd,
{
    let mut values = image.as_slice().iter();
    let first = *values.next().ok_or(ImageError::ImageDataNotInitialized)?;

    let (min, max) = values.fold((first, first), |(min, max), &x| {
        (
            if x < min { x } else { min },
            if x > max { x } else { max },
        )
    });

    Ok((min, max))
}

/// Linearly rescale `src` so that `[min, max]` maps onto `[0, 255]`.
///
/// Values are rounded and saturated to the `u8` range. A degenerate range
/// (`max <= min`) produces an all zero image.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image, same size as `src`.
/// * `min` - The input value mapped to 0.
/// * `max` - The input value mapped to 255.
/// * `strategy` - How to distribute the rows over threads.
pub fn rescale_to_u8<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<u8, C>,
    min: f64,
    max: f64,
    strategy: ExecutionStrategy,
) -> Result<(), NormalizeError>
where
    T: ToPrimitive + Copy + Send + Sync,
{
    check_same_size(src, dst)?;

    if src.size().is_empty() {
        return Ok(());
    }

    if !(max > min) {
        dst.as_slice_mut().fill(0);
        return Ok(());
    }

    let scale = 255.0 / (max - min);
    let stride = src.cols() * C;

    parallel::for_each_row_mut(dst.as_slice_mut(), stride, strategy, |r, row| {
        let src_row = &src.as_slice()[r * stride..(r + 1) * stride];
        row.iter_mut().zip(src_row).for_each(|(dst_val, src_val)| {
            let x = src_val.to_f64().unwrap_or(min);
            *dst_val = ((x - min) * scale).round().clamp(0.0, 255.0) as u8;
        });
    })?;

    Ok(())
}

fn check_same_size<T, U, const C: usize>(
    src: &Image<T, C>,
    dst: &Image<U, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::NormalizeError;
    use crate::parallel::ExecutionStrategy;
    use fisheye_image::{Image, ImageError, ImageSize};

    #[test]
    fn find_min_max() -> Result<(), ImageError> {
        let image_data = vec![0u8, 1, 0, 1, 2, 3, 0, 1, 0, 1, 2, 3];
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            image_data,
        )?;

        let (min, max) = super::find_min_max(&image)?;

        assert_eq!(min, 0);
        assert_eq!(max, 3);

        Ok(())
    }

    #[test]
    fn find_min_max_empty() {
        let image = Image::<f32, 1>::new(ImageSize::from([0, 0]), vec![]).unwrap();
        assert_eq!(
            super::find_min_max(&image),
            Err(ImageError::ImageDataNotInitialized)
        );
    }

    #[test]
    fn rescale_to_u8_full_range() -> Result<(), NormalizeError> {
        let image = Image::<i16, 1>::new(
            ImageSize {
                width: 4,
                height: 1,
            },
            vec![-16, 0, 392, 800],
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 9)?;

        super::rescale_to_u8(&image, &mut dst, -16.0, 800.0, ExecutionStrategy::Serial)?;

        assert_eq!(dst.as_slice(), &[0, 5, 128, 255]);

        Ok(())
    }

    #[test]
    fn rescale_to_u8_saturates() -> Result<(), NormalizeError> {
        let image = Image::<f32, 1>::new(ImageSize::from([3, 1]), vec![-5.0, 5.0, 50.0])?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 0)?;

        super::rescale_to_u8(&image, &mut dst, 0.0, 10.0, ExecutionStrategy::ParallelRows)?;

        assert_eq!(dst.as_slice(), &[0, 128, 255]);

        Ok(())
    }

    #[test]
    fn rescale_to_u8_degenerate_range() -> Result<(), NormalizeError> {
        let image = Image::<i16, 1>::from_size_val(ImageSize::from([2, 2]), 48)?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 3)?;

        super::rescale_to_u8(&image, &mut dst, 48.0, 48.0, ExecutionStrategy::Serial)?;

        assert_eq!(dst.as_slice(), &[0, 0, 0, 0]);

        Ok(())
    }
}
