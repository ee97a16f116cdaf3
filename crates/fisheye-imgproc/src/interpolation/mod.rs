//! Pixel interpolation methods for image transformations.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//!
//! The main consumer is [`remap`], which resamples a raw fisheye frame
//! through a [`crate::calibration::distortion::RectifyMap`].

mod bilinear;

/// Grid generation and coordinate mapping utilities.
pub mod grid;

mod interpolate;
mod nearest;
mod remap;

pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use remap::{remap, remap_with_map};
