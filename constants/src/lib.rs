//! Shared constants for surface rendering, grid layout and marker interaction.

pub mod coordinate_system;
pub mod path;
pub mod render_settings;
pub mod surface;
pub mod texture;
