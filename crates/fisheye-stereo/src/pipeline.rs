use std::{path::Path, sync::Arc};

use fisheye_3d::{
    depth::DepthReconstructor, pointcloud::PointCloud, unproject::depth_to_spherical_pointcloud,
};
use fisheye_image::{Image, ImageError, ImageSize};
use fisheye_imgproc::{
    calibration::distortion::{generate_correction_map_unified, RectifyMap},
    interpolation::{remap_with_map, InterpolationMode},
    parallel::{ExecutionStrategy, ParallelError},
};

use crate::{
    config::{CalibrationConfig, CameraConfig},
    error::StereoError,
    geometry::StereoGeometry,
    matcher::StereoMatcher,
};

/// One of the physical cameras of the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSide {
    /// The left (or only) camera, the reference of the rectified frame.
    Left,
    /// The right camera of a stereo rig.
    Right,
}

/// The outputs of one stereo frame.
#[derive(Debug, Clone)]
pub struct StereoFrame<const C: usize> {
    /// The rectified left view.
    pub left: Image<f32, C>,
    /// The rectified right view.
    pub right: Image<f32, C>,
    /// The 8-bit disparity image for display.
    pub disparity: Image<u8, 1>,
    /// The metric depth of every left pixel, 0 without a measurement.
    pub depth: Image<f32, 1>,
    /// The back-projected depth.
    pub pointcloud: PointCloud,
}

/// Rectification and depth reconstruction for a calibrated fisheye rig.
///
/// The rectification maps are built once on construction and reused for
/// every frame. Frames are processed independently. With
/// [`crate::config::ExecutionConfig::Fixed`] a single thread pool is created
/// with the rig and every pass runs on it.
///
/// # Example
///
/// ```no_run
/// use fisheye_stereo::pipeline::{CameraSide, DenseStereo};
/// use fisheye_stereo::image::Image;
/// use fisheye_stereo::imgproc::interpolation::InterpolationMode;
///
/// let stereo = DenseStereo::from_file("calibration.json").unwrap();
///
/// let raw = Image::<f32, 1>::from_size_val([1280, 1024].into(), 0.0).unwrap();
/// let mut rectified = Image::<f32, 1>::from_size_val(stereo.geometry().size(), 0.0).unwrap();
/// stereo
///     .rectify(CameraSide::Left, &raw, &mut rectified, InterpolationMode::Bilinear)
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DenseStereo {
    config: CalibrationConfig,
    geometry: StereoGeometry,
    left_map: RectifyMap,
    right_map: Option<RectifyMap>,
    reconstructor: Option<DepthReconstructor>,
    strategy: ExecutionStrategy,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl DenseStereo {
    /// Set up the pipeline for a calibrated rig.
    ///
    /// Validates the calibration, derives the shared virtual camera and builds
    /// the rectification map of every camera.
    pub fn new(config: CalibrationConfig) -> Result<Self, StereoError> {
        config.validate()?;

        let (strategy, pool) = match config.strategy() {
            ExecutionStrategy::Fixed(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                (ExecutionStrategy::ParallelRows, Some(Arc::new(pool)))
            }
            strategy => (strategy, None),
        };
        let geometry = StereoGeometry::from_config(&config)?;

        let build_map = |camera: &CameraConfig, extrinsic| {
            generate_correction_map_unified(
                &camera.intrinsic(),
                &extrinsic,
                geometry.intrinsic(),
                &camera.distortion(),
                geometry.size(),
                strategy,
            )
        };

        let left_map = install(pool.as_deref(), || {
            build_map(&config.left, config.left_extrinsic())
        })?;

        let (right_map, reconstructor) = match (&config.right, geometry.baseline()) {
            (Some(right), Some(baseline)) => {
                let map = install(pool.as_deref(), || build_map(right, right.extrinsic()))?;
                let reconstructor = DepthReconstructor::new(
                    geometry.intrinsic().fx,
                    baseline,
                    config.depth,
                    strategy,
                )?;
                (Some(map), Some(reconstructor))
            }
            _ => (None, None),
        };

        log::info!(
            "Matcher: {:?} num_disparities {} window_size {}",
            config.matcher.mode,
            config.matcher.num_disparities,
            config.matcher.window_size
        );

        Ok(Self {
            config,
            geometry,
            left_map,
            right_map,
            reconstructor,
            strategy,
            pool,
        })
    }

    /// Set up the pipeline from a calibration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StereoError> {
        Self::new(CalibrationConfig::from_file(path)?)
    }

    /// The calibration of the rig.
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// The geometry shared by the rectified views.
    pub fn geometry(&self) -> &StereoGeometry {
        &self.geometry
    }

    /// Whether the rig has two cameras.
    pub fn is_stereo(&self) -> bool {
        self.right_map.is_some()
    }

    /// The rectification map of a camera.
    ///
    /// # Errors
    ///
    /// [`StereoError::MissingStereoCamera`] for the right camera of a mono rig.
    pub fn map(&self, side: CameraSide) -> Result<&RectifyMap, StereoError> {
        match side {
            CameraSide::Left => Ok(&self.left_map),
            CameraSide::Right => self
                .right_map
                .as_ref()
                .ok_or(StereoError::MissingStereoCamera),
        }
    }

    /// Resample a raw frame of a camera into the rectified view.
    ///
    /// Rectified pixels without a source pixel are set to zero.
    ///
    /// # Arguments
    ///
    /// * `side` - The camera the frame was captured with.
    /// * `src` - The raw frame.
    /// * `dst` - The rectified view, of the output size.
    /// * `interpolation` - The sampling method.
    pub fn rectify<const C: usize>(
        &self,
        side: CameraSide,
        src: &Image<f32, C>,
        dst: &mut Image<f32, C>,
        interpolation: InterpolationMode,
    ) -> Result<(), StereoError> {
        let map = self.map(side)?;
        install(self.pool.as_deref(), || {
            remap_with_map(src, dst, map, interpolation, 0.0, self.strategy)
        })?;
        Ok(())
    }

    /// Run the matcher on a rectified pair and reconstruct the depth.
    ///
    /// # Returns
    ///
    /// The 8-bit disparity image for display and the metric depth field.
    pub fn disparity_image<M, const C: usize>(
        &self,
        left: &Image<f32, C>,
        right: &Image<f32, C>,
        matcher: &M,
    ) -> Result<(Image<u8, 1>, Image<f32, 1>), StereoError>
    where
        M: StereoMatcher<C> + ?Sized,
    {
        let reconstructor = self
            .reconstructor
            .as_ref()
            .ok_or(StereoError::MissingStereoCamera)?;

        check_size(left.size(), self.geometry.size())?;
        check_size(right.size(), self.geometry.size())?;

        let disparity = matcher.compute(left, right, &self.config.matcher)?;
        check_size(disparity.size(), self.geometry.size())?;

        Ok(install(self.pool.as_deref(), || {
            reconstructor.process(&disparity)
        })?)
    }

    /// Back-project a depth field of the rectified left view.
    ///
    /// Depths above the configured ceiling are dropped.
    pub fn pointcloud_from_depth(&self, depth: &Image<f32, 1>) -> Result<PointCloud, StereoError> {
        check_size(depth.size(), self.geometry.size())?;

        Ok(install(self.pool.as_deref(), || {
            depth_to_spherical_pointcloud(
                depth,
                self.geometry.intrinsic(),
                self.config.depth.max_depth,
                self.strategy,
            )
        })?)
    }

    /// Rectify a raw stereo pair and compute its depth and point cloud.
    pub fn process<M, const C: usize>(
        &self,
        raw_left: &Image<f32, C>,
        raw_right: &Image<f32, C>,
        matcher: &M,
        interpolation: InterpolationMode,
    ) -> Result<StereoFrame<C>, StereoError>
    where
        M: StereoMatcher<C> + ?Sized,
    {
        if !self.is_stereo() {
            return Err(StereoError::MissingStereoCamera);
        }

        let size = self.geometry.size();
        let mut left = Image::from_size_val(size, 0.0)?;
        let mut right = Image::from_size_val(size, 0.0)?;

        self.rectify(CameraSide::Left, raw_left, &mut left, interpolation)?;
        self.rectify(CameraSide::Right, raw_right, &mut right, interpolation)?;

        let (disparity, depth) = self.disparity_image(&left, &right, matcher)?;
        let pointcloud = self.pointcloud_from_depth(&depth)?;

        log::debug!("Frame processed: {} points", pointcloud.len());

        Ok(StereoFrame {
            left,
            right,
            disparity,
            depth,
            pointcloud,
        })
    }
}

// Runs `op` on the rig's pool, or on the calling thread without one.
fn install<R: Send>(pool: Option<&rayon::ThreadPool>, op: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

fn check_size(actual: ImageSize, expected: ImageSize) -> Result<(), ImageError> {
    if actual != expected {
        return Err(ImageError::InvalidImageSize(
            actual.width,
            actual.height,
            expected.width,
            expected.height,
        ));
    }
    Ok(())
}
