use fisheye_image::Image;
use serde::{Deserialize, Serialize};

use crate::error::StereoError;

/// The correspondence search family requested from the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherMode {
    /// Local block matching.
    Block,

    /// Semi-global matching with smoothness penalties.
    #[default]
    SemiGlobal,
}

/// Parameters handed to the stereo matcher on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// The correspondence search family.
    pub mode: MatcherMode,
    /// The disparity search range in pixels, a positive multiple of 16.
    pub num_disparities: usize,
    /// The side of the matching window, odd.
    pub window_size: usize,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            mode: MatcherMode::SemiGlobal,
            num_disparities: 64,
            window_size: 7,
        }
    }
}

impl MatcherParams {
    /// Check the search range and the window size.
    pub fn validate(&self) -> Result<(), StereoError> {
        if self.num_disparities == 0 || self.num_disparities % 16 != 0 {
            return Err(StereoError::InvalidConfig(format!(
                "num_disparities must be a positive multiple of 16, got {}",
                self.num_disparities
            )));
        }
        if self.window_size % 2 == 0 {
            return Err(StereoError::InvalidConfig(format!(
                "window_size must be odd, got {}",
                self.window_size
            )));
        }
        Ok(())
    }

    /// The semi-global smoothness penalties `(P1, P2)` for images with `channels` channels.
    ///
    /// `P1` penalizes disparity changes of one pixel between neighbours and
    /// `P2` larger jumps.
    ///
    /// # Example
    ///
    /// ```
    /// use fisheye_stereo::matcher::MatcherParams;
    ///
    /// let params = MatcherParams::default();
    /// assert_eq!(params.smoothness_penalties(3), (1176, 4704));
    /// ```
    pub fn smoothness_penalties(&self, channels: usize) -> (usize, usize) {
        let area = channels * self.window_size * self.window_size;
        (8 * area, 32 * area)
    }
}

/// A dense correspondence search between two rectified views.
///
/// Implementors return the disparity of every left pixel as a fixed point
/// value, scaled by the configured disparity scale. Pixels without a match
/// hold a value `<= 0`.
pub trait StereoMatcher<const C: usize> {
    /// Compute the disparity field of a rectified image pair.
    ///
    /// # Arguments
    ///
    /// * `left` - The rectified left view.
    /// * `right` - The rectified right view, same size as `left`.
    /// * `params` - The matching parameters.
    fn compute(
        &self,
        left: &Image<f32, C>,
        right: &Image<f32, C>,
        params: &MatcherParams,
    ) -> Result<Image<i16, 1>, StereoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_json() -> Result<(), StereoError> {
        let params: MatcherParams =
            serde_json::from_str(r#"{ "mode": "block", "num_disparities": 128 }"#)?;
        assert_eq!(params.mode, MatcherMode::Block);
        assert_eq!(params.num_disparities, 128);
        assert_eq!(params.window_size, 7);
        params.validate()?;
        Ok(())
    }

    #[test]
    fn test_params_validate() {
        let params = MatcherParams {
            num_disparities: 40,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(StereoError::InvalidConfig(_))
        ));

        let params = MatcherParams {
            num_disparities: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = MatcherParams {
            window_size: 4,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_smoothness_penalties() {
        let params = MatcherParams {
            window_size: 5,
            ..Default::default()
        };
        assert_eq!(params.smoothness_penalties(1), (200, 800));
    }
}
