//! Depth capture and depth-displaced grid generation.
//!
//! A [`DepthBuffer`] is captured once per depth source change and sampled
//! twice: at full resolution for the shaded surface, and capped for the
//! pointer hit-test proxy.

/// Scalar depth field captured from raw values or an image.
pub mod depth_buffer;

/// Resolution-capped, nearest-neighbour displacement grid builder.
pub mod depth_sampler;

pub use depth_buffer::{DepthBuffer, DepthChannel};
pub use depth_sampler::{SampleOptions, SurfaceGeometry, build_geometry, sample_dimensions};
