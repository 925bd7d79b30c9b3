//! Pointer picking against surface proxies and the marker state it drives.
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::proxy::ProxyGeometry;
use super::render::MarkerCloseButton;
use super::state::{MarkerFlags, MarkerKind, MarkerPositionChanged, SurfaceMarkers};
use crate::engine::scene::plot_frame::{PlotFrame, to_plot_space};

/// Closest surface under a world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerHit {
    pub surface: Entity,
    /// Distance along the ray in world units.
    pub distance: f32,
    /// Hit point in the surface's plot-frame space.
    pub position: Vec3,
}

/// Cast a world ray into one surface's proxy. Returns world distance and the
/// world-space hit point.
pub fn cast_into_surface(
    proxy: &ProxyGeometry,
    surface_transform: &GlobalTransform,
    origin: Vec3,
    direction: Vec3,
) -> Option<(f32, Vec3)> {
    let to_local = surface_transform.affine().inverse();
    let local_origin = to_local.transform_point3(origin);
    let local_direction = to_local.transform_vector3(direction);
    let (_, local_hit) = proxy.raycast(local_origin, local_direction)?;
    let world_hit = surface_transform.transform_point(local_hit);
    Some(((world_hit - origin).length(), world_hit))
}

/// World-space ray under the cursor; `None` when the cursor is outside the
/// window or no camera is active.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerRay(pub Option<Ray3d>);

pub fn update_pointer_ray(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut pointer: ResMut<PointerRay>,
) {
    let ray = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .zip(cameras.single().ok())
        .and_then(|(cursor, (camera, camera_transform))| {
            camera.viewport_to_world(camera_transform, cursor).ok()
        });
    pointer.set_if_neq(PointerRay(ray));
}

/// Move the continuous marker under the pointer and detect double clicks.
pub fn track_pointer(
    time: Res<Time>,
    buttons: Res<ButtonInput<MouseButton>>,
    pointer: Res<PointerRay>,
    close_buttons: Query<&Interaction, With<MarkerCloseButton>>,
    frames: Query<&GlobalTransform, With<PlotFrame>>,
    mut surfaces: Query<(
        Entity,
        &MarkerFlags,
        &ProxyGeometry,
        &GlobalTransform,
        &ChildOf,
        &mut SurfaceMarkers,
    )>,
    mut moved: EventWriter<MarkerPositionChanged>,
) {
    let now = time.elapsed();

    let mut nearest: Option<PointerHit> = None;
    if let Some(ray) = pointer.0 {
        let direction = ray.direction.as_vec3();
        for (entity, flags, proxy, transform, child_of, _) in surfaces.iter() {
            if !flags.continuous && !flags.double_click {
                continue;
            }
            let Some((distance, world)) = cast_into_surface(proxy, transform, ray.origin, direction)
            else {
                continue;
            };
            let Ok(frame_transform) = frames.get(child_of.parent()) else {
                continue;
            };
            if nearest.is_none_or(|best| distance < best.distance) {
                nearest = Some(PointerHit {
                    surface: entity,
                    distance,
                    position: to_plot_space(frame_transform, world),
                });
            }
        }
    }

    let over_close_button = close_buttons
        .iter()
        .any(|interaction| *interaction != Interaction::None);
    let pressed = buttons.just_pressed(MouseButton::Left) && !over_close_button;

    for (entity, flags, _, _, _, mut markers) in surfaces.iter_mut() {
        let before = (markers.continuous, markers.click);
        let state = markers.bypass_change_detection();
        state.tick(now);

        let hit = nearest.filter(|hit| hit.surface == entity);

        if flags.continuous {
            match hit {
                Some(hit) => {
                    if let Some(position) = state.pointer_over(hit.position) {
                        moved.write(MarkerPositionChanged {
                            surface: entity,
                            kind: MarkerKind::Continuous,
                            position,
                        });
                    }
                }
                None if state.is_hovered() => state.pointer_left(),
                None => {}
            }
        }

        if flags.double_click && pressed {
            if let Some(hit) = hit {
                if let Some(position) = state.press(hit.position, now) {
                    debug!("Surface {entity}: marker pinned at {position}");
                    moved.write(MarkerPositionChanged {
                        surface: entity,
                        kind: MarkerKind::Click,
                        position,
                    });
                }
            }
        }

        if (markers.continuous, markers.click) != before {
            markers.set_changed();
        }
    }
}

/// Drop pointer state for behaviours switched off at runtime.
pub fn apply_marker_flags(
    mut surfaces: Query<(&MarkerFlags, &mut SurfaceMarkers), Changed<MarkerFlags>>,
) {
    for (flags, mut markers) in surfaces.iter_mut() {
        markers.disable(flags);
    }
}
