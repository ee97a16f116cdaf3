#![deny(missing_docs)]
//! Fisheye stereo rectification and depth back-projection.
//!
//! A calibrated rig is described by a [`config::CalibrationConfig`]. From it
//! [`pipeline::DenseStereo`] derives the shared virtual pinhole camera, builds
//! one rectification map per physical camera and turns the output of a
//! [`matcher::StereoMatcher`] into depth and a point cloud.

/// Calibration file loading and validation.
pub mod config;

/// Error types for the stereo pipeline.
pub mod error;

/// The geometry shared by the rectified views.
pub mod geometry;

/// The stereo correspondence seam.
pub mod matcher;

/// The end to end rectification and depth pipeline.
pub mod pipeline;

pub use crate::error::StereoError;

#[doc(inline)]
pub use fisheye_image as image;

#[doc(inline)]
pub use fisheye_imgproc as imgproc;

#[doc(inline)]
pub use fisheye_3d as k3d;
