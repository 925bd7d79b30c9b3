//! Interactive 3D height-field plots on Bevy.
//!
//! A plot is a [`PlotFrame`](engine::scene::plot_frame::PlotFrame) root with
//! one or more depth-displaced surfaces, three back-wall grid planes, nice
//! axis ticks with screen-space labels, and optional hover / pinned markers.
//!
//! ```text
//! SurfacePlotPlugin
//!   ├─> PlotScenePlugin   layout, geometry, grid and label systems
//!   └─> MarkerToolPlugin  pointer picking, markers and their labels
//! ```
//!
//! Hosts spawn a plot with [`spawn_plot`](engine::scene::spawn_plot), attach
//! surfaces with `spawn_depth_surface` (or `spawn_domain_surface` under a
//! `MultiSurface`), and listen for `MarkerPositionChanged` /
//! `MarkerDismissed` events.

pub mod engine;
pub mod tools;

use bevy::prelude::*;

use crate::engine::scene::PlotScenePlugin;
use crate::tools::markers::MarkerToolPlugin;

pub struct SurfacePlotPlugin;

impl Plugin for SurfacePlotPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((PlotScenePlugin, MarkerToolPlugin));
    }
}
