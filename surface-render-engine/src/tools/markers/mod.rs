//! Surface markers: a hover marker following the pointer and a pinned marker
//! placed by double click, each with a stick and a floating value label.
//!
//! ## Flow
//!
//! ```text
//! CapturedDepth changed
//!   └─> build_marker_proxies()     capped proxy + hitbox wireframe
//! Pointer moved / pressed
//!   ├─> update_pointer_ray()       cursor ray into PointerRay
//!   └─> track_pointer()            nearest proxy hit across surfaces
//!       ├─> SurfaceMarkers         hover / double-click state
//!       └─> MarkerPositionChanged  host notification
//! SurfaceMarkers changed
//!   └─> sync_marker_visuals()      position, visibility, label text
//! Marker moved / camera moved
//!   └─> update_marker_label_heights()
//! ```
//!
//! Marker positions are reported in the plot frame's space (Z up, scaled).

/// Double-click window tracking.
pub mod double_click;

/// Stick height solve so labels sit near a fixed screen height.
pub mod label_placement;

/// Cursor ray casting and marker state updates.
pub mod pointer;

/// Low-poly hit-test proxy with ray intersection.
pub mod proxy;

/// Marker entities and UI labels.
pub mod render;

/// Per-surface marker state, flags and host events.
pub mod state;

use bevy::prelude::*;

use self::state::{MarkerDismissed, MarkerPositionChanged};
use crate::engine::scene::PlotSet;

pub struct MarkerToolPlugin;

impl Plugin for MarkerToolPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MarkerPositionChanged>()
            .add_event::<MarkerDismissed>()
            .init_resource::<pointer::PointerRay>()
            .add_systems(
                Update,
                (
                    pointer::apply_marker_flags,
                    render::build_marker_proxies,
                    render::sync_hitbox_visibility,
                    render::spawn_marker_visuals,
                    render::close_pinned_markers,
                    pointer::update_pointer_ray,
                    pointer::track_pointer,
                    render::sync_marker_visuals,
                    render::update_marker_label_heights,
                )
                    .chain()
                    .after(PlotSet::Geometry)
                    .before(PlotSet::View),
            );
    }
}
