//! Manifest-driven plot setup.
//!
//! Loads the surface manifest, resolves texture sources (falling back to
//! procedural textures) and spawns the plot once everything is known.

/// Manifest loading and plot spawning.
///
/// Moves the app from `Loading` to `Running` once the plot is in the scene.
pub mod manifest_loader;

/// Procedural sinc colour and depth textures for manifests without paths.
pub mod procedural;
