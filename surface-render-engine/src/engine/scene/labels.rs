//! Axis tick labels and the screen-space label overlay they are drawn with.
//!
//! Labels are UI text nodes pinned each frame to a 3D anchor, so they always
//! face the viewer. A label group per axis decides where along the cube edges
//! its ticks sit and which side of the tick point the text extends to.
use bevy::prelude::*;
use constants::render_settings::{TICK_LABEL_COLOUR, TICK_LABEL_FONT_SIZE};

use super::fade::FadeIn;
use super::grid::{GridPlaneKind, PlaneSide, PlaneSides};
use super::plot_frame::{PlotFrame, camera_right_in_plot, to_plot_space};
use super::ticks::{PlotTicks, format_tick};
use crate::engine::math::Axis;

/// Horizontal alignment of a screen label relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelAlign {
    /// Text starts at the anchor and extends right.
    #[default]
    Left,
    /// Text ends at the anchor.
    Right,
    Center,
}

/// Right-align when the tangent points to screen-left, so text grows away
/// from the grid line it annotates.
pub fn label_anchor(camera_right: Vec3, tangent: Vec3) -> LabelAlign {
    if camera_right.dot(tangent) < 0.0 {
        LabelAlign::Right
    } else {
        LabelAlign::Left
    }
}

/// Tick text with a dash on the side that touches the grid line.
pub fn tick_text(value: f64, align: LabelAlign) -> String {
    let text = format_tick(value);
    match align {
        LabelAlign::Right => format!("{text}-"),
        _ => format!("-{text}"),
    }
}

/// Edge and outward tangent of the x or y label group. `None` for z, which
/// depends on the camera.
pub fn edge_label_placement(axis: Axis, sides: &PlaneSides, scale: Vec3) -> Option<(Vec3, Vec3)> {
    let p_xy = sides.offset(GridPlaneKind::Xy, scale);
    let s_x = Vec3::X * scale.x;
    let s_y = Vec3::Y * scale.y;

    match axis {
        Axis::X => Some(match sides.zx {
            PlaneSide::Near => (p_xy + s_y, s_y),
            PlaneSide::Far => (p_xy, -s_y),
        }),
        Axis::Y => Some(match sides.yz {
            PlaneSide::Near => (p_xy + s_x, s_x),
            PlaneSide::Far => (p_xy, -s_x),
        }),
        Axis::Z => None,
    }
}

/// Vertical edge for z labels: the candidate corner closest to the camera.
pub fn z_label_placement(sides: &PlaneSides, scale: Vec3, camera: Vec3) -> (Vec3, Vec3) {
    let p_zx = sides.offset(GridPlaneKind::Zx, scale);
    let p_yz = sides.offset(GridPlaneKind::Yz, scale);
    let s_x = Vec3::X * scale.x;
    let s_y = Vec3::Y * scale.y;

    let candidates = [
        (p_zx, -s_x),
        (p_zx + s_x, s_x),
        (p_yz, -s_y),
        (p_yz + s_y, s_y),
    ];

    let mut best = candidates[0];
    let mut best_distance = camera.distance_squared(best.0);
    for candidate in &candidates[1..] {
        let distance = camera.distance_squared(candidate.0);
        if distance < best_distance {
            best = *candidate;
            best_distance = distance;
        }
    }
    best
}

/// Tick labels of one axis. Child of a plot root.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Transform, Visibility, FadeIn)]
pub struct TickLabelGroup {
    pub axis: Axis,
    pub tangent: Vec3,
    pub align: LabelAlign,
    labels: Vec<Entity>,
    z_layout: Option<(PlaneSides, Vec3)>,
}

impl TickLabelGroup {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            tangent: Vec3::ZERO,
            align: LabelAlign::Left,
            labels: Vec::new(),
            z_layout: None,
        }
    }

    pub fn labels(&self) -> &[Entity] {
        &self.labels
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct TickLabel {
    pub value: f64,
}

/// UI node pinned to a point in the local space of `target`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ScreenLabel {
    pub target: Entity,
    pub offset: Vec3,
    pub align: LabelAlign,
}

impl ScreenLabel {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            offset: Vec3::ZERO,
            align: LabelAlign::Center,
        }
    }
}

pub fn spawn_tick_label_groups(commands: &mut Commands, frame: Entity) {
    for axis in Axis::ALL {
        commands.spawn((
            TickLabelGroup::new(axis),
            ChildOf(frame),
            Name::new(format!("Tick labels {axis:?}")),
        ));
    }
}

/// Move label groups along with the grid planes and flip text alignment
/// against the view direction.
pub fn place_tick_label_groups(
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    frames: Query<(&PlotFrame, &PlaneSides, &GlobalTransform)>,
    mut groups: Query<(&mut TickLabelGroup, &ChildOf, &mut Transform, &mut FadeIn)>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };

    for (mut group, child_of, mut transform, mut fade) in groups.iter_mut() {
        let Ok((frame, sides, frame_transform)) = frames.get(child_of.parent()) else {
            continue;
        };
        let scale = frame.effective_scale();

        let (position, tangent) = match edge_label_placement(group.axis, sides, scale) {
            Some(placement) => placement,
            None => {
                let key = (*sides, scale);
                if group.z_layout == Some(key) {
                    (transform.translation, group.tangent)
                } else {
                    let camera_local = to_plot_space(frame_transform, camera.translation());
                    group.z_layout = Some(key);
                    z_label_placement(sides, scale, camera_local)
                }
            }
        };

        if transform.translation != position {
            transform.translation = position;
            fade.restart();
        }
        if group.tangent != tangent {
            group.tangent = tangent;
        }

        let align = label_anchor(camera_right_in_plot(frame_transform, camera), tangent);
        if group.align != align {
            group.align = align;
        }
    }
}

/// Respawn tick label nodes whenever a plot's tick sets change.
pub fn rebuild_tick_labels(
    mut commands: Commands,
    frames: Query<Ref<PlotTicks>>,
    mut groups: Query<(Entity, &mut TickLabelGroup, &ChildOf, &FadeIn)>,
) {
    for (entity, mut group, child_of, fade) in groups.iter_mut() {
        let Ok(ticks) = frames.get(child_of.parent()) else {
            continue;
        };
        if !ticks.is_changed() && !group.is_added() {
            continue;
        }

        for label in group.labels.drain(..) {
            if let Ok(mut label) = commands.get_entity(label) {
                label.despawn();
            }
        }

        let axis = group.axis;
        let align = group.align;
        let labels = ticks
            .axis(axis)
            .iter()
            .map(|(value, scaled)| {
                commands
                    .spawn((
                        TickLabel { value },
                        ScreenLabel {
                            target: entity,
                            offset: axis.unit() * scaled,
                            align,
                        },
                        Text::new(tick_text(value, align)),
                        TextFont {
                            font_size: TICK_LABEL_FONT_SIZE,
                            ..default()
                        },
                        TextColor(TICK_LABEL_COLOUR.with_alpha(fade.opacity())),
                        Node {
                            position_type: PositionType::Absolute,
                            ..default()
                        },
                        Visibility::Hidden,
                    ))
                    .id()
            })
            .collect();
        group.labels = labels;
    }
}

/// Push alignment and fade opacity into the label nodes.
pub fn refresh_tick_labels(
    groups: Query<
        (&TickLabelGroup, &FadeIn),
        Or<(Changed<TickLabelGroup>, Changed<FadeIn>)>,
    >,
    mut labels: Query<(&TickLabel, &mut ScreenLabel, &mut Text, &mut TextColor)>,
) {
    for (group, fade) in groups.iter() {
        let colour = TICK_LABEL_COLOUR.with_alpha(fade.opacity());
        for &entity in group.labels() {
            let Ok((tick, mut screen, mut text, mut text_colour)) = labels.get_mut(entity) else {
                continue;
            };
            if screen.align != group.align {
                screen.align = group.align;
                text.0 = tick_text(tick.value, group.align);
            }
            if text_colour.0 != colour {
                text_colour.0 = colour;
            }
        }
    }
}

/// Project every screen label onto the viewport. Labels whose target is gone
/// are despawned.
pub fn position_screen_labels(
    mut commands: Commands,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    targets: Query<(&GlobalTransform, &InheritedVisibility)>,
    mut labels: Query<(Entity, &ScreenLabel, &mut Node, &mut Visibility, &ComputedNode)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    for (entity, label, mut node, mut visibility, computed) in labels.iter_mut() {
        let Ok((target, target_visibility)) = targets.get(label.target) else {
            commands.entity(entity).despawn();
            continue;
        };

        let world = target.transform_point(label.offset);
        let projected = camera.world_to_viewport(camera_transform, world);
        let screen = match projected {
            Ok(screen) if target_visibility.get() => screen,
            _ => {
                visibility.set_if_neq(Visibility::Hidden);
                continue;
            }
        };

        let size = computed.size() * computed.inverse_scale_factor();
        let left = match label.align {
            LabelAlign::Left => screen.x,
            LabelAlign::Right => screen.x - size.x,
            LabelAlign::Center => screen.x - 0.5 * size.x,
        };
        let top = screen.y - 0.5 * size.y;

        if node.left != Val::Px(left) || node.top != Val::Px(top) {
            node.left = Val::Px(left);
            node.top = Val::Px(top);
        }
        visibility.set_if_neq(Visibility::Inherited);
    }
}
