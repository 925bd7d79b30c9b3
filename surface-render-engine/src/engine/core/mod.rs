//! Demo application setup and state management.

/// App construction: plugins, lighting, camera and system scheduling.
pub mod app_setup;

/// Loading -> Running state machine and the FPS overlay.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
pub mod window_config;
