#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Disparity to depth conversion.
pub mod depth;

/// Error types for the 3d module.
pub mod error;

/// Point cloud container.
pub mod pointcloud;

/// Back-projection of depth fields onto the viewing sphere.
pub mod unproject;

pub use crate::error::DepthError;
