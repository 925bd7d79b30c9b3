//! Plot frame root: the shared domain/scale every surface, grid plane and
//! label group underneath it is laid out against.
use bevy::prelude::*;
use constants::coordinate_system::DATA_TO_WORLD_ROTATION_X;
use constants::surface::{DEFAULT_TICKS_PER_UNIT, MIN_AXIS_SCALE};

use super::grid::PlaneSides;
use super::ticks::PlotTicks;
use crate::engine::math::Domain;

/// Root of one plot. Children live in plot space: Z up, the unit cube scaled
/// to `[0, sx] x [0, sy] x [0, sz]`.
///
/// Domain and scale are owned by the host; systems underneath only read them.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Transform, Visibility, PlotTicks, PlaneSides)]
pub struct PlotFrame {
    pub domain: Domain,
    pub scale: Vec3,
    pub ticks_per_unit: f32,
}

impl Default for PlotFrame {
    fn default() -> Self {
        Self::new(Domain::default(), Vec3::ONE)
    }
}

impl PlotFrame {
    pub fn new(domain: Domain, scale: Vec3) -> Self {
        Self {
            domain,
            scale,
            ticks_per_unit: DEFAULT_TICKS_PER_UNIT,
        }
    }

    pub fn with_ticks_per_unit(mut self, ticks_per_unit: f32) -> Self {
        self.ticks_per_unit = ticks_per_unit;
        self
    }

    /// Scale with every component forced positive and finite.
    ///
    /// Non-positive scale is a caller error; clamping keeps NaN and inverted
    /// geometry out of the renderer.
    pub fn effective_scale(&self) -> Vec3 {
        sanitize_scale(self.scale)
    }

    /// Centre of the plot cube in plot space.
    pub fn center(&self) -> Vec3 {
        self.effective_scale() * 0.5
    }

    /// Transform placing a plot root at `translation` with plot Z mapped to engine Y.
    pub fn root_transform(translation: Vec3) -> Transform {
        Transform::from_translation(translation)
            .with_rotation(Quat::from_rotation_x(DATA_TO_WORLD_ROTATION_X))
    }
}

pub fn sanitize_scale(scale: Vec3) -> Vec3 {
    let fix = |v: f32| {
        if v.is_finite() {
            v.max(MIN_AXIS_SCALE)
        } else {
            MIN_AXIS_SCALE
        }
    };
    Vec3::new(fix(scale.x), fix(scale.y), fix(scale.z))
}

/// World-space point expressed in the plot's local space.
pub fn to_plot_space(frame_transform: &GlobalTransform, world: Vec3) -> Vec3 {
    frame_transform.affine().inverse().transform_point3(world)
}

/// Camera-right projected into plot space and flattened onto the plot XY plane.
pub fn camera_right_in_plot(frame_transform: &GlobalTransform, camera: &GlobalTransform) -> Vec3 {
    let right = frame_transform
        .affine()
        .inverse()
        .transform_vector3(camera.right().as_vec3());
    Vec3::new(right.x, right.y, 0.0)
}

/// Recompute tick sets when domain, scale or tick density change.
pub fn update_plot_ticks(
    mut frames: Query<(Entity, &PlotFrame, &mut PlotTicks), Changed<PlotFrame>>,
) {
    for (entity, frame, mut ticks) in frames.iter_mut() {
        let scale = frame.effective_scale();
        if scale != frame.scale {
            warn!(
                "Plot {entity}: scale {:?} has non-positive components, clamped to {:?}",
                frame.scale, scale
            );
        }
        let next = PlotTicks::compute(&frame.domain, scale, frame.ticks_per_unit);
        debug!(
            "Plot {entity}: {} x / {} y / {} z ticks",
            next.x.len(),
            next.y.len(),
            next.z.len()
        );
        ticks.set_if_neq(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped_positive() {
        let s = sanitize_scale(Vec3::new(-1.0, 0.0, f32::NAN));
        assert!(s.cmpgt(Vec3::ZERO).all());
        assert_eq!(sanitize_scale(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn plot_up_is_engine_up() {
        let root = GlobalTransform::from(PlotFrame::root_transform(Vec3::ZERO));
        let up = root.transform_point(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-6);
        let back = to_plot_space(&root, Vec3::Y);
        assert!((back - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn ticks_follow_frame_changes() {
        let mut app = App::new();
        app.add_systems(Update, update_plot_ticks);
        let frame = app
            .world_mut()
            .spawn(PlotFrame::new(Domain::default(), Vec3::ONE))
            .id();
        app.update();
        let before = app.world().get::<PlotTicks>(frame).map(|t| t.z.len());

        if let Some(mut f) = app.world_mut().get_mut::<PlotFrame>(frame) {
            f.scale.z = 3.0;
        }
        app.update();
        let after = app.world().get::<PlotTicks>(frame).map(|t| t.z.len());
        assert!(after > before);
    }
}
