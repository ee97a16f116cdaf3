use rayon::prelude::*;
use thiserror::Error;

use fisheye_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The row stride must be valid.
    #[error("row stride must be > 0, got {0}")]
    InvalidRowStride(usize),

    /// Input and output sizes do not match.
    #[error("map size {0}x{1} does not match destination size {2}x{3}")]
    SizeMismatch(usize, usize, usize, usize),
}

/// Controls how the per-pixel passes are executed.
///
/// Every pass in this workspace is a pure function of the pixel index, so all
/// strategies produce bit-identical results; rows are always merged back in
/// raster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    #[default]
    Serial,

    /// Use the global Rayon thread pool and process rows in parallel.
    ParallelRows,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    Fixed(usize),
}

impl ExecutionStrategy {
    fn run<R: Send>(self, op: impl FnOnce(bool) -> R + Send) -> Result<R, ParallelError> {
        match self {
            ExecutionStrategy::Serial => Ok(op(false)),
            ExecutionStrategy::ParallelRows => Ok(op(true)),
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(|| op(true)))
            }
        }
    }
}

/// Apply `f(row_index, row)` to every row of a row-major buffer.
///
/// # Arguments
///
/// * `data` - The buffer, `stride` elements per row.
/// * `stride` - The number of elements per row.
/// * `strategy` - The execution strategy.
/// * `f` - The operation to perform on each row.
pub fn for_each_row_mut<T, F>(
    data: &mut [T],
    stride: usize,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if stride == 0 {
        return Err(ParallelError::InvalidRowStride(stride));
    }

    strategy.run(|parallel| {
        if parallel {
            data.par_chunks_mut(stride)
                .enumerate()
                .for_each(|(r, row)| f(r, row));
        } else {
            data.chunks_mut(stride)
                .enumerate()
                .for_each(|(r, row)| f(r, row));
        }
    })
}

/// Evaluate `f(row_index)` for every row and concatenate the results in row order.
///
/// # Arguments
///
/// * `rows` - The number of rows.
/// * `strategy` - The execution strategy.
/// * `f` - Produces the items contributed by one row.
pub fn flat_map_rows<U, F>(
    rows: usize,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<Vec<U>, ParallelError>
where
    U: Send,
    F: Fn(usize) -> Vec<U> + Send + Sync,
{
    strategy.run(|parallel| {
        if parallel {
            (0..rows).into_par_iter().map(&f).flatten().collect()
        } else {
            (0..rows).flat_map(&f).collect()
        }
    })
}

/// Apply a function to each destination pixel of a resampling pass.
///
/// `f` receives the source coordinate read from the maps and the destination
/// pixel.
///
/// # Errors
///
/// Returns [`ParallelError::SizeMismatch`] if either map differs in size from `dst`.
pub fn iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    strategy: ExecutionStrategy,
    f: impl Fn(f32, f32, &mut [f32]) + Send + Sync,
) -> Result<(), ParallelError> {
    for map in [map_x, map_y] {
        if map.size() != dst.size() {
            return Err(ParallelError::SizeMismatch(
                map.cols(),
                map.rows(),
                dst.cols(),
                dst.rows(),
            ));
        }
    }

    let cols = dst.cols();
    if cols == 0 || dst.rows() == 0 {
        return Ok(());
    }

    let (xs, ys) = (map_x.as_slice(), map_y.as_slice());

    for_each_row_mut(dst.as_slice_mut(), C * cols, strategy, |r, dst_row| {
        let map_x_row = &xs[r * cols..(r + 1) * cols];
        let map_y_row = &ys[r * cols..(r + 1) * cols];
        dst_row
            .chunks_exact_mut(C)
            .zip(map_x_row.iter().zip(map_y_row))
            .for_each(|(dst_pixel, (&x, &y))| f(x, y, dst_pixel));
    })
}
