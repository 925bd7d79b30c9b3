//! Numeric helpers shared by every part of the plot.
//!
//! Intervals, affine domain-to-range mappings and the per-axis [`Domain`]
//! used by the tick engine and the multi-surface compositor.

/// Per-axis data domain of a plot.
pub mod domain;

/// Closed intervals with union, length, interpolation and affine mapping.
pub mod interval;

pub use domain::{Axis, Domain};
pub use interval::{Interval, Mapping};
