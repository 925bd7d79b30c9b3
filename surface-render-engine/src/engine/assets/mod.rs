//! JSON configuration describing which surfaces to plot and how.

/// Surface manifest asset: domain, scale, tick density, marker flags and
/// per-surface texture sources.
pub mod surface_manifest;
