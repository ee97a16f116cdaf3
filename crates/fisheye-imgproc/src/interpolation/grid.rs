use fisheye_image::{Image, ImageError, ImageSize};

use crate::parallel::{self, ExecutionStrategy, ParallelError};

/// Errors produced while generating a coordinate grid or resampling through one.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GridError {
    /// Error allocating the grid images or mismatching sizes.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error running the per-row pass.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// Create a pair of coordinate maps by evaluating `f(x, y)` on every pixel.
///
/// # Arguments
///
/// * `size` - The size of the grid.
/// * `strategy` - How to distribute the rows over threads.
/// * `f` - Maps the pixel `(x, y)` to the pair of map values.
///
/// # Returns
///
/// A tuple of single channel images with the first and second value of `f`.
pub fn meshgrid_from_fn<F>(
    size: ImageSize,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<(Image<f32, 1>, Image<f32, 1>), GridError>
where
    F: Fn(usize, usize) -> (f32, f32) + Send + Sync,
{
    let mut grid = vec![(0f32, 0f32); size.area()];

    if !size.is_empty() {
        parallel::for_each_row_mut(&mut grid, size.width, strategy, |y, row| {
            row.iter_mut()
                .enumerate()
                .for_each(|(x, value)| *value = f(x, y));
        })?;
    }

    let (map_x, map_y): (Vec<f32>, Vec<f32>) = grid.into_iter().unzip();

    Ok((Image::new(size, map_x)?, Image::new(size, map_y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshgrid_identity() -> Result<(), GridError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let (map_x, map_y) =
            meshgrid_from_fn(size, ExecutionStrategy::Serial, |x, y| (x as f32, y as f32))?;
        assert_eq!(map_x.as_slice(), &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(map_y.as_slice(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_meshgrid_from_fn_parallel() -> Result<(), GridError> {
        let size = ImageSize {
            width: 5,
            height: 4,
        };
        let (map_x, map_y) =
            meshgrid_from_fn(size, ExecutionStrategy::ParallelRows, |x, y| {
                (x as f32 * 0.5, (x + y) as f32)
            })?;
        assert_eq!(map_x.get([3, 4, 0]), Some(&2.0));
        assert_eq!(map_y.get([3, 4, 0]), Some(&7.0));
        Ok(())
    }

    #[test]
    fn test_meshgrid_empty() -> Result<(), GridError> {
        let (map_x, map_y) =
            meshgrid_from_fn(ImageSize::from([0, 0]), ExecutionStrategy::Serial, |_, _| {
                (1.0, 1.0)
            })?;
        assert!(map_x.as_slice().is_empty());
        assert!(map_y.as_slice().is_empty());
        Ok(())
    }
}
