use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;
use constants::coordinate_system::transform_coordinates;

const ORBIT_SENSITIVITY: Vec2 = Vec2::new(0.0035, 0.0030);
const PITCH_LIMIT: f32 = 1.55;
const MIN_DISTANCE: f32 = 0.05;
const MAX_DISTANCE: f32 = 500.0;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportCamera {
    /// Orbit centre in world space.
    pub focus_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self::framing(Vec3::ONE)
    }
}

impl ViewportCamera {
    /// Look at the plot cube of size `scale` from its low-x, low-y corner.
    pub fn framing(scale: Vec3) -> Self {
        let centre = 0.5 * scale;
        let (x, y, z) = transform_coordinates(centre.x, centre.y, 0.0);
        let extent = scale.length().max(MIN_DISTANCE);
        Self {
            focus_point: Vec3::new(x, y, z),
            distance: 1.6 * extent,
            pitch: -0.6,
            // Camera sits toward -x, -y in plot space (world -x, +z).
            yaw: -0.5,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera transform orbiting the focus at the current distance.
    pub fn target_transform(&self) -> Transform {
        let rotation = self.rotation();
        Transform {
            translation: self.focus_point + rotation * Vec3::Z * self.distance,
            rotation,
            ..default()
        }
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ORBIT_SENSITIVITY.x;
        self.pitch = (self.pitch - delta.y * ORBIT_SENSITIVITY.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn dolly(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - 0.1 * amount)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

pub fn camera_controller(
    mut cameras: Query<&mut Transform, With<Camera3d>>,
    mut viewport: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        viewport.orbit(mouse_delta);
    }

    let scroll: f32 = scroll_events
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        })
        .sum();
    if scroll.abs() > f32::EPSILON {
        viewport.dolly(scroll);
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        move_input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        move_input.y -= 1.0;
    }
    if move_input != Vec3::ZERO {
        // Pan on the ground plane, relative to the view heading.
        let heading = Quat::from_rotation_y(viewport.yaw);
        let delta = heading * Vec3::new(move_input.x, 0.0, move_input.z) + Vec3::Y * move_input.y;
        let speed = 0.5 * viewport.distance;
        viewport.focus_point += delta.normalize_or_zero() * speed * time.delta_secs();
    }

    let target = viewport.target_transform();
    let t = (12.0 * time.delta_secs()).min(1.0);
    transform.translation = transform.translation.lerp(target.translation, t);
    transform.rotation = transform.rotation.slerp(target.rotation, t);
}
