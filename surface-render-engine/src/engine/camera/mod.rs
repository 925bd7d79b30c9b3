//! Orbit camera for inspecting a plot.
//!
//! Right drag orbits, the wheel dollies toward the focus and WASD/QE pan the
//! focus. The left button stays free for marker interaction.

/// Viewport camera resource and controller system.
pub mod viewport_camera;
