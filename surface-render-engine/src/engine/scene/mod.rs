//! Plot scene: surfaces, grid planes, tick labels and their shared frame.
//!
//! ## Hierarchy
//!
//! ```text
//! PlotFrame (root, Z-up plot space rotated into the engine's Y-up world)
//!   ├─> DepthSurface      visible mesh, one or many (MultiSurface)
//!   ├─> GridPlane x3      xy / yz / zx, each with minor + border line sets
//!   └─> TickLabelGroup x3 anchors for UI tick text
//! ```
//!
//! ## Update Flow
//!
//! Event driven (gated behind change detection):
//! - depth source changed or image modified -> `CapturedDepth` -> render mesh
//! - domain / scale / tick density changed -> `PlotTicks` -> grid lines, tick labels
//! - member domains or policy changed -> composite layout
//!
//! Per frame (constant-time vector math):
//! - grid plane facing, label group placement and text alignment
//! - fade ramps and screen label projection

/// Multi-surface layout over a union domain.
pub mod compositor;

/// Opacity ramp restarted whenever a grid plane or label group moves.
pub mod fade;

/// Back-wall grid planes with near/far facing resolution.
pub mod grid;

/// Tick label groups and screen-space label projection.
pub mod labels;

/// Plot root component carrying domain, scale and tick density.
pub mod plot_frame;

/// Depth-displaced surface meshes and placement.
pub mod surface;

/// Nice tick generation per axis.
pub mod ticks;

use bevy::prelude::*;
use bevy::transform::TransformSystem;

use self::plot_frame::PlotFrame;

/// Ordering of plot systems within `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlotSet {
    /// Composite layout and tick recomputation.
    Layout,
    /// Depth capture and mesh rebuilds.
    Geometry,
    /// Camera-dependent placement, fades and label projection.
    View,
}

pub struct PlotScenePlugin;

impl Plugin for PlotScenePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (PlotSet::Layout, PlotSet::Geometry, PlotSet::View).chain(),
        )
        .add_systems(
            Update,
            (
                compositor::layout_multi_surfaces,
                plot_frame::update_plot_ticks,
                surface::follow_frame_scale,
                surface::sync_surface_transforms,
            )
                .chain()
                .in_set(PlotSet::Layout),
        )
        .add_systems(
            Update,
            (
                (surface::capture_surface_depth, surface::rebuild_surface_meshes).chain(),
                surface::apply_surface_materials,
                grid::build_grid_lines,
                labels::rebuild_tick_labels,
            )
                .in_set(PlotSet::Geometry),
        )
        .add_systems(
            Update,
            (
                grid::update_plane_sides,
                grid::sync_grid_planes,
                labels::place_tick_label_groups,
                fade::advance_fades,
                grid::apply_grid_opacity,
                labels::refresh_tick_labels,
            )
                .chain()
                .in_set(PlotSet::View),
        )
        .add_systems(
            PostUpdate,
            labels::position_screen_labels.after(TransformSystem::TransformPropagate),
        );
    }
}

/// Spawn a plot root with its grid planes and tick label groups.
pub fn spawn_plot(commands: &mut Commands, frame: PlotFrame, translation: Vec3) -> Entity {
    let root = commands
        .spawn((
            frame,
            PlotFrame::root_transform(translation),
            Name::new("Plot"),
        ))
        .id();
    grid::spawn_grid_planes(commands, root);
    labels::spawn_tick_label_groups(commands, root);
    root
}
