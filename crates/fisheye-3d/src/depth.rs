use fisheye_image::{Image, ImageError};
use fisheye_imgproc::{
    normalize::{find_min_max, rescale_to_u8},
    parallel::{self, ExecutionStrategy},
};
use serde::{Deserialize, Serialize};

use crate::error::DepthError;

/// Default sub-pixel scale of the matcher output (4 fractional bits).
pub const DEFAULT_DISPARITY_SCALE: f64 = 16.0;

/// Default validity ceiling of the point cloud, in baseline units.
pub const DEFAULT_MAX_DEPTH: f64 = 10.0;

/// The disparity range mapped onto `[0, 255]` for display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisparityRange {
    /// Use the minimum and maximum of each frame.
    #[default]
    Observed,

    /// Use a fixed range so that frames are comparable.
    Fixed {
        /// The raw disparity mapped to 0.
        min: f64,
        /// The raw disparity mapped to 255.
        max: f64,
    },
}

/// Depth reconstruction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// The fixed point scale of the raw disparity.
    pub disparity_scale: f64,
    /// Points farther than this are not emitted.
    pub max_depth: f64,
    /// The display range of the 8-bit disparity image.
    pub disparity_range: DisparityRange,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            disparity_scale: DEFAULT_DISPARITY_SCALE,
            max_depth: DEFAULT_MAX_DEPTH,
            disparity_range: DisparityRange::Observed,
        }
    }
}

impl DepthConfig {
    /// Check that the scale and the ceiling are finite and positive and the fixed range is not empty.
    pub fn validate(&self) -> Result<(), DepthError> {
        if !(self.disparity_scale.is_finite() && self.disparity_scale > 0.0) {
            return Err(DepthError::InvalidDisparityScale(self.disparity_scale));
        }
        if !(self.max_depth.is_finite() && self.max_depth > 0.0) {
            return Err(DepthError::InvalidMaxDepth(self.max_depth));
        }
        if let DisparityRange::Fixed { min, max } = self.disparity_range {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(DepthError::InvalidDisparityRange(min, max));
            }
        }
        Ok(())
    }
}

/// Compute the depth of a single raw disparity value.
///
/// Returns 0 when the disparity is not positive (no measurement).
#[inline]
pub fn depth_from_disparity(raw: i16, focal: f64, baseline: f64, disparity_scale: f64) -> f32 {
    let disparity = raw as f64 / disparity_scale;
    if disparity <= 0.0 {
        return 0.0;
    }
    (focal * baseline.abs() / disparity) as f32
}

/// Convert a fixed point disparity field into a metric depth field.
///
/// # Arguments
///
/// * `disparity` - The raw matcher output.
/// * `depth` - The output depth field, same size as `disparity`.
/// * `focal` - The horizontal focal length of the rectified views.
/// * `baseline` - The distance between the optical centres; the sign is ignored.
/// * `disparity_scale` - The fixed point scale of `disparity`.
/// * `strategy` - How to distribute the rows over threads.
pub fn disparity_to_depth(
    disparity: &Image<i16, 1>,
    depth: &mut Image<f32, 1>,
    focal: f64,
    baseline: f64,
    disparity_scale: f64,
    strategy: ExecutionStrategy,
) -> Result<(), DepthError> {
    if disparity.size() != depth.size() {
        return Err(ImageError::InvalidImageSize(
            disparity.cols(),
            disparity.rows(),
            depth.cols(),
            depth.rows(),
        )
        .into());
    }
    if !(disparity_scale.is_finite() && disparity_scale > 0.0) {
        return Err(DepthError::InvalidDisparityScale(disparity_scale));
    }
    if disparity.size().is_empty() {
        return Ok(());
    }

    let stride = disparity.cols();
    let src = disparity.as_slice();

    parallel::for_each_row_mut(depth.as_slice_mut(), stride, strategy, |r, row| {
        let src_row = &src[r * stride..(r + 1) * stride];
        row.iter_mut().zip(src_row).for_each(|(z, &d)| {
            *z = depth_from_disparity(d, focal, baseline, disparity_scale);
        });
    })?;

    Ok(())
}

/// Render the raw disparity as an 8-bit image for display.
///
/// A degenerate range produces an all zero image.
pub fn disparity_to_u8(
    disparity: &Image<i16, 1>,
    dst: &mut Image<u8, 1>,
    range: DisparityRange,
    strategy: ExecutionStrategy,
) -> Result<(), DepthError> {
    if disparity.size().is_empty() {
        rescale_to_u8(disparity, dst, 0.0, 0.0, strategy)?;
        return Ok(());
    }

    let (min, max) = match range {
        DisparityRange::Observed => {
            let (min, max) = find_min_max(disparity)?;
            (min as f64, max as f64)
        }
        DisparityRange::Fixed { min, max } => (min, max),
    };

    if !(max > min) {
        log::warn!("Degenerate disparity range [{min}, {max}], the display image is blank");
    }

    rescale_to_u8(disparity, dst, min, max, strategy)?;

    Ok(())
}

/// Turns matcher output into depth and a displayable disparity image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthReconstructor {
    focal: f64,
    baseline: f64,
    config: DepthConfig,
    strategy: ExecutionStrategy,
}

impl DepthReconstructor {
    /// Create a new reconstructor for a rectified stereo pair.
    ///
    /// # Arguments
    ///
    /// * `focal` - The horizontal focal length of the rectified views.
    /// * `baseline` - The signed baseline; only the magnitude is used.
    /// * `config` - The depth settings.
    /// * `strategy` - How to distribute the rows over threads.
    pub fn new(
        focal: f64,
        baseline: f64,
        config: DepthConfig,
        strategy: ExecutionStrategy,
    ) -> Result<Self, DepthError> {
        if !(focal.is_finite() && focal > 0.0) {
            return Err(DepthError::InvalidFocal(focal));
        }
        if !baseline.is_finite() || baseline == 0.0 {
            return Err(DepthError::InvalidBaseline(baseline));
        }
        config.validate()?;

        Ok(Self {
            focal,
            baseline,
            config,
            strategy,
        })
    }

    /// The horizontal focal length.
    pub fn focal(&self) -> f64 {
        self.focal
    }

    /// The signed baseline.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// The depth settings.
    pub fn config(&self) -> &DepthConfig {
        &self.config
    }

    /// Compute the metric depth field of a raw disparity field.
    pub fn depth(&self, disparity: &Image<i16, 1>) -> Result<Image<f32, 1>, DepthError> {
        let mut depth = Image::from_size_val(disparity.size(), 0.0)?;
        disparity_to_depth(
            disparity,
            &mut depth,
            self.focal,
            self.baseline,
            self.config.disparity_scale,
            self.strategy,
        )?;
        Ok(depth)
    }

    /// Render the raw disparity field as an 8-bit image.
    pub fn visualize(&self, disparity: &Image<i16, 1>) -> Result<Image<u8, 1>, DepthError> {
        let mut viz = Image::from_size_val(disparity.size(), 0)?;
        disparity_to_u8(
            disparity,
            &mut viz,
            self.config.disparity_range,
            self.strategy,
        )?;
        Ok(viz)
    }

    /// Compute both the 8-bit visualisation and the depth field.
    pub fn process(
        &self,
        disparity: &Image<i16, 1>,
    ) -> Result<(Image<u8, 1>, Image<f32, 1>), DepthError> {
        let viz = self.visualize(disparity)?;
        let depth = self.depth(disparity)?;

        if log::log_enabled!(log::Level::Debug) {
            let valid = depth.as_slice().iter().filter(|z| **z > 0.0).count();
            log::debug!(
                "Depth computed for {} of {} pixels",
                valid,
                depth.size().area()
            );
        }

        Ok((viz, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisheye_image::ImageSize;

    #[test]
    fn test_depth_from_disparity() {
        assert_eq!(depth_from_disparity(800, 500.0, 0.1, 16.0), 1.0);
        assert_eq!(depth_from_disparity(0, 500.0, 0.1, 16.0), 0.0);
        assert_eq!(depth_from_disparity(-3, 500.0, 0.1, 16.0), 0.0);
        // the sign of the baseline carries the camera order only
        assert_eq!(depth_from_disparity(800, 500.0, -0.1, 16.0), 1.0);
    }

    #[test]
    fn test_disparity_to_depth() -> Result<(), DepthError> {
        let disparity = Image::<i16, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![800, 0, -3, 1600, 400, i16::MIN],
        )?;
        let mut depth = Image::<f32, 1>::from_size_val(disparity.size(), -1.0)?;

        disparity_to_depth(
            &disparity,
            &mut depth,
            500.0,
            0.1,
            16.0,
            ExecutionStrategy::ParallelRows,
        )?;

        assert_eq!(depth.as_slice(), &[1.0, 0.0, 0.0, 0.5, 2.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_disparity_to_depth_errors() -> Result<(), DepthError> {
        let disparity = Image::<i16, 1>::from_size_val(ImageSize::from([3, 2]), 16)?;
        let mut depth = Image::<f32, 1>::from_size_val(ImageSize::from([2, 3]), 0.0)?;
        assert_eq!(
            disparity_to_depth(&disparity, &mut depth, 1.0, 1.0, 16.0, Default::default()),
            Err(DepthError::Image(ImageError::InvalidImageSize(3, 2, 2, 3)))
        );

        let mut depth = Image::<f32, 1>::from_size_val(disparity.size(), 0.0)?;
        assert_eq!(
            disparity_to_depth(&disparity, &mut depth, 1.0, 1.0, 0.0, Default::default()),
            Err(DepthError::InvalidDisparityScale(0.0))
        );
        Ok(())
    }

    #[test]
    fn test_disparity_to_u8_observed() -> Result<(), DepthError> {
        let disparity = Image::<i16, 1>::new(ImageSize::from([2, 2]), vec![-16, 0, 392, 800])?;
        let mut viz = Image::<u8, 1>::from_size_val(disparity.size(), 0)?;

        disparity_to_u8(
            &disparity,
            &mut viz,
            DisparityRange::Observed,
            ExecutionStrategy::Serial,
        )?;

        assert_eq!(viz.as_slice(), &[0, 5, 128, 255]);
        Ok(())
    }

    #[test]
    fn test_disparity_to_u8_fixed() -> Result<(), DepthError> {
        let disparity = Image::<i16, 1>::new(ImageSize::from([3, 1]), vec![-32, 512, 2048])?;
        let mut viz = Image::<u8, 1>::from_size_val(disparity.size(), 0)?;

        disparity_to_u8(
            &disparity,
            &mut viz,
            DisparityRange::Fixed {
                min: 0.0,
                max: 1024.0,
            },
            ExecutionStrategy::Serial,
        )?;

        assert_eq!(viz.as_slice(), &[0, 128, 255]);
        Ok(())
    }

    #[test]
    fn test_disparity_to_u8_constant() -> Result<(), DepthError> {
        let disparity = Image::<i16, 1>::from_size_val(ImageSize::from([4, 3]), 77)?;
        let mut viz = Image::<u8, 1>::from_size_val(disparity.size(), 9)?;

        disparity_to_u8(&disparity, &mut viz, Default::default(), Default::default())?;

        assert!(viz.as_slice().iter().all(|v| *v == 0));
        Ok(())
    }

    #[test]
    fn test_depth_config() {
        let config = DepthConfig::default();
        assert_eq!(config.disparity_scale, 16.0);
        assert_eq!(config.max_depth, 10.0);
        assert!(config.validate().is_ok());

        let config = DepthConfig {
            max_depth: -1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(DepthError::InvalidMaxDepth(-1.0)));

        let config = DepthConfig {
            disparity_range: DisparityRange::Fixed { min: 5.0, max: 5.0 },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(DepthError::InvalidDisparityRange(5.0, 5.0))
        );
    }

    #[test]
    fn test_reconstructor() -> Result<(), DepthError> {
        assert_eq!(
            DepthReconstructor::new(500.0, 0.0, Default::default(), Default::default()),
            Err(DepthError::InvalidBaseline(0.0))
        );
        assert!(matches!(
            DepthReconstructor::new(f64::NAN, 0.1, Default::default(), Default::default()),
            Err(DepthError::InvalidFocal(_))
        ));

        let reconstructor =
            DepthReconstructor::new(500.0, -0.1, Default::default(), Default::default())?;
        let disparity = Image::<i16, 1>::new(ImageSize::from([2, 1]), vec![800, 0])?;
        let (viz, depth) = reconstructor.process(&disparity)?;

        assert_eq!(viz.as_slice(), &[255, 0]);
        assert_eq!(depth.as_slice(), &[1.0, 0.0]);
        Ok(())
    }
}
