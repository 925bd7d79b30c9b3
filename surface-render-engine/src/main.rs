use bevy::prelude::*;
use surface_render_engine::engine::core::app_setup::create_app;
use surface_render_engine::engine::core::app_state::AppState;
use surface_render_engine::engine::scene::compositor::MultiSurface;
use surface_render_engine::engine::scene::plot_frame::PlotFrame;
use surface_render_engine::engine::scene::surface::DepthSurface;
use surface_render_engine::tools::markers::state::{
    MarkerDismissed, MarkerFlags, MarkerPositionChanged,
};

/// Fraction of the current z scale added or removed per second while held.
const Z_SCALE_RATE: f32 = 1.0;

fn main() {
    let mut app = create_app();
    app.add_systems(
        Update,
        (adjust_z_scale, toggle_markers, log_marker_events).run_if(in_state(AppState::Running)),
    );

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

/// Up / Down stretch the plot vertically.
fn adjust_z_scale(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut frames: Query<(&mut PlotFrame, Option<&mut MultiSurface>)>,
) {
    let direction = match (
        keyboard.pressed(KeyCode::ArrowUp),
        keyboard.pressed(KeyCode::ArrowDown),
    ) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => return,
    };
    let factor = 1.0 + direction * Z_SCALE_RATE * time.delta_secs();
    let stretch = |z: f32| (z * factor).clamp(0.01, 10.0);
    for (mut frame, multi) in frames.iter_mut() {
        // Composite frames derive their scale from the base scale.
        match multi {
            Some(mut multi) => multi.base_scale.z = stretch(multi.base_scale.z),
            None => frame.scale.z = stretch(frame.scale.z),
        }
    }
}

/// C toggles the hover marker, V the double-click marker, H the hitbox.
fn toggle_markers(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut surfaces: Query<&mut MarkerFlags, With<DepthSurface>>,
) {
    let toggle: fn(&mut MarkerFlags) = if keyboard.just_pressed(KeyCode::KeyC) {
        |flags| flags.continuous = !flags.continuous
    } else if keyboard.just_pressed(KeyCode::KeyV) {
        |flags| flags.double_click = !flags.double_click
    } else if keyboard.just_pressed(KeyCode::KeyH) {
        |flags| flags.show_hitbox = !flags.show_hitbox
    } else {
        return;
    };
    for mut flags in surfaces.iter_mut() {
        toggle(&mut flags);
        info!("Marker flags: {:?}", *flags);
    }
}

fn log_marker_events(
    mut moved: EventReader<MarkerPositionChanged>,
    mut dismissed: EventReader<MarkerDismissed>,
) {
    for event in moved.read() {
        debug!(
            "Surface {}: {:?} marker at {}",
            event.surface, event.kind, event.position
        );
    }
    for event in dismissed.read() {
        info!("Surface {}: pinned marker closed", event.surface);
    }
}
