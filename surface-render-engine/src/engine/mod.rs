/// JSON surface manifest asset.
pub mod assets;
/// Orbit viewport camera.
pub mod camera;
/// Demo app construction and state.
pub mod core;
/// Errors raised while turning host data into geometry.
pub mod error;
/// Manifest loading and procedural textures.
pub mod loading;
/// Intervals, mappings and domains.
pub mod math;
/// Depth capture and displacement grids.
pub mod mesh;
/// Plot frame, surfaces, grid, ticks and labels.
pub mod scene;
