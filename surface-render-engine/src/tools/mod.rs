//! Interactive tools layered on top of the plot scene.

/// Hover and pinned markers on surfaces.
pub mod markers;
