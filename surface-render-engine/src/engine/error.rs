use bevy::render::render_resource::TextureFormat;
use thiserror::Error;

use crate::engine::math::Axis;

/// Failures raised while turning host-supplied data into surface geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("depth image has no pixel data")]
    MissingPixelData,

    #[error("unsupported depth texture format: {0:?}")]
    UnsupportedFormat(TextureFormat),

    #[error("depth buffer {width}x{height} needs {expected} values, got {actual}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("depth buffer {width}x{height} is smaller than the 2x2 minimum")]
    TooSmall { width: usize, height: usize },

    #[error("{axis:?} domain [{lo}, {hi}] must be finite with lo < hi")]
    InvalidDomain { axis: Axis, lo: f64, hi: f64 },
}
