//! Back-wall grid planes of the plot cube.
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{GRID_BORDER_COLOUR, GRID_LINE_COLOUR, GRID_MINOR_LINE_OPACITY};

use super::fade::FadeIn;
use super::plot_frame::{PlotFrame, to_plot_space};
use super::ticks::PlotTicks;
use crate::engine::math::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridPlaneKind {
    Xy,
    Yz,
    Zx,
}

impl GridPlaneKind {
    pub const ALL: [GridPlaneKind; 3] = [GridPlaneKind::Xy, GridPlaneKind::Yz, GridPlaneKind::Zx];

    /// In-plane axes `(v1, v2)`; the plane normal is `v1 x v2`.
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            GridPlaneKind::Xy => (Axis::X, Axis::Y),
            GridPlaneKind::Yz => (Axis::Y, Axis::Z),
            GridPlaneKind::Zx => (Axis::Z, Axis::X),
        }
    }

    pub fn normal(self) -> Vec3 {
        let (a, b) = self.axes();
        a.unit().cross(b.unit())
    }
}

/// Which of the two parallel cube faces a plane sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaneSide {
    /// Through the plot origin.
    #[default]
    Near,
    /// Offset by the full scale along the normal.
    Far,
}

impl PlaneSide {
    pub fn flipped(self) -> Self {
        match self {
            PlaneSide::Near => PlaneSide::Far,
            PlaneSide::Far => PlaneSide::Near,
        }
    }
}

/// Offset of a plane in plot space.
pub fn plane_offset(kind: GridPlaneKind, side: PlaneSide, scale: Vec3) -> Vec3 {
    match side {
        PlaneSide::Near => Vec3::ZERO,
        PlaneSide::Far => kind.normal() * scale,
    }
}

/// Side a plane should take for a camera at `camera` (plot space).
///
/// The plane flips only when the camera is strictly outside the face it
/// currently occupies, so a camera sitting exactly on a face never oscillates.
pub fn resolve_side(kind: GridPlaneKind, current: PlaneSide, camera: Vec3, scale: Vec3) -> PlaneSide {
    let position = plane_offset(kind, current, scale);
    let normal = match current {
        PlaneSide::Near => -kind.normal(),
        PlaneSide::Far => kind.normal(),
    };

    let mut facing = (camera - position).dot(normal);
    // Orient against the cube centre so `facing` is positive on the inner side.
    if (scale * 0.5 - position).dot(normal) < 0.0 {
        facing = -facing;
    }

    if facing < 0.0 { current.flipped() } else { current }
}

/// Current side of each plane pair of one plot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneSides {
    pub xy: PlaneSide,
    pub yz: PlaneSide,
    pub zx: PlaneSide,
}

impl PlaneSides {
    pub fn get(&self, kind: GridPlaneKind) -> PlaneSide {
        match kind {
            GridPlaneKind::Xy => self.xy,
            GridPlaneKind::Yz => self.yz,
            GridPlaneKind::Zx => self.zx,
        }
    }

    pub fn set(&mut self, kind: GridPlaneKind, side: PlaneSide) {
        match kind {
            GridPlaneKind::Xy => self.xy = side,
            GridPlaneKind::Yz => self.yz = side,
            GridPlaneKind::Zx => self.zx = side,
        }
    }

    /// Re-resolve every plane against the camera.
    pub fn resolved(&self, camera: Vec3, scale: Vec3) -> Self {
        let mut next = *self;
        for kind in GridPlaneKind::ALL {
            next.set(kind, resolve_side(kind, self.get(kind), camera, scale));
        }
        next
    }

    pub fn offset(&self, kind: GridPlaneKind, scale: Vec3) -> Vec3 {
        plane_offset(kind, self.get(kind), scale)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(Transform, Visibility, FadeIn)]
pub struct GridPlane {
    pub kind: GridPlaneKind,
}

/// Line mesh under a grid plane. Minor lines sit at tick positions and draw
/// at reduced opacity; border lines outline the face.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(Transform, Visibility)]
pub enum GridLineSet {
    Minor,
    Border,
}

impl GridLineSet {
    fn opacity_factor(self) -> f32 {
        match self {
            GridLineSet::Minor => GRID_MINOR_LINE_OPACITY,
            GridLineSet::Border => 1.0,
        }
    }

    fn colour(self) -> Color {
        match self {
            GridLineSet::Minor => GRID_LINE_COLOUR,
            GridLineSet::Border => GRID_BORDER_COLOUR,
        }
    }
}

/// Line segments of a plane in its own (unoffset) frame: `(minor, border)`.
pub fn grid_line_segments(
    kind: GridPlaneKind,
    scale: Vec3,
    ticks: &PlotTicks,
) -> (Vec<[Vec3; 2]>, Vec<[Vec3; 2]>) {
    let (a1, a2) = kind.axes();
    let v1 = a1.unit() * a1.component(scale);
    let v2 = a2.unit() * a2.component(scale);

    let mut minor = Vec::new();
    for &t in &ticks.axis(a1).scaled {
        let p = a1.unit() * t;
        minor.push([p, p + v2]);
    }
    for &t in &ticks.axis(a2).scaled {
        let p = a2.unit() * t;
        minor.push([p, p + v1]);
    }

    let border = vec![
        [Vec3::ZERO, v1],
        [v1, v1 + v2],
        [Vec3::ZERO, v2],
        [v2, v1 + v2],
    ];
    (minor, border)
}

pub(crate) fn line_list_mesh(segments: &[[Vec3; 2]]) -> Mesh {
    let positions: Vec<[f32; 3]> = segments
        .iter()
        .flat_map(|[a, b]| [a.to_array(), b.to_array()])
        .collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

/// Spawn the three grid planes under a plot root.
pub fn spawn_grid_planes(commands: &mut Commands, frame: Entity) {
    for kind in GridPlaneKind::ALL {
        commands
            .spawn((GridPlane { kind }, ChildOf(frame), Name::new(format!("Grid {kind:?}"))))
            .with_children(|plane| {
                plane.spawn(GridLineSet::Minor);
                plane.spawn(GridLineSet::Border);
            });
    }
}

/// Per-frame facing check: move planes to the faces away from the camera.
pub fn update_plane_sides(
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    mut frames: Query<(&PlotFrame, &GlobalTransform, &mut PlaneSides)>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };

    for (frame, frame_transform, mut sides) in frames.iter_mut() {
        let local_camera = to_plot_space(frame_transform, camera.translation());
        let next = sides.resolved(local_camera, frame.effective_scale());
        sides.set_if_neq(next);
    }
}

/// Move plane entities to their resolved face, restarting the fade on every move.
pub fn sync_grid_planes(
    frames: Query<(&PlotFrame, &PlaneSides)>,
    mut planes: Query<(&GridPlane, &ChildOf, &mut Transform, &mut FadeIn)>,
) {
    for (plane, child_of, mut transform, mut fade) in planes.iter_mut() {
        let Ok((frame, sides)) = frames.get(child_of.parent()) else {
            continue;
        };
        let offset = sides.offset(plane.kind, frame.effective_scale());
        if transform.translation != offset {
            transform.translation = offset;
            fade.restart();
        }
    }
}

/// Build line meshes and materials when ticks or scale change.
pub fn build_grid_lines(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    frames: Query<(Ref<PlotFrame>, Ref<PlotTicks>)>,
    planes: Query<(&GridPlane, &ChildOf, &Children)>,
    line_sets: Query<(&GridLineSet, Has<Mesh3d>, Has<MeshMaterial3d<StandardMaterial>>)>,
) {
    for (plane, child_of, children) in planes.iter() {
        let Ok((frame, ticks)) = frames.get(child_of.parent()) else {
            continue;
        };
        let frame_changed = frame.is_changed() || ticks.is_changed();

        let children: &[Entity] = children;
        let missing_mesh = children
            .iter()
            .filter_map(|&child| line_sets.get(child).ok())
            .any(|(_, has_mesh, _)| !has_mesh);
        if !frame_changed && !missing_mesh {
            continue;
        }

        let (minor, border) = grid_line_segments(plane.kind, frame.effective_scale(), &ticks);
        for &child in children {
            let Ok((set, _, has_material)) = line_sets.get(child) else {
                continue;
            };
            let segments = match set {
                GridLineSet::Minor => &minor,
                GridLineSet::Border => &border,
            };
            let mut entity = commands.entity(child);
            entity.insert((Mesh3d(meshes.add(line_list_mesh(segments))), NoFrustumCulling));
            if !has_material {
                entity.insert(MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: set.colour().with_alpha(0.0),
                    alpha_mode: AlphaMode::Blend,
                    unlit: true,
                    ..default()
                })));
            }
        }
    }
}

/// Push fade opacity into the line materials.
pub fn apply_grid_opacity(
    mut materials: ResMut<Assets<StandardMaterial>>,
    planes: Query<(&FadeIn, &Children), With<GridPlane>>,
    line_sets: Query<(&GridLineSet, &MeshMaterial3d<StandardMaterial>)>,
) {
    for (fade, children) in planes.iter() {
        let children: &[Entity] = children;
        for &child in children {
            let Ok((set, material)) = line_sets.get(child) else {
                continue;
            };
            let alpha = fade.opacity() * set.opacity_factor();
            let Some(current) = materials.get(&material.0).map(|m| m.base_color.alpha()) else {
                continue;
            };
            if current != alpha {
                if let Some(material) = materials.get_mut(&material.0) {
                    material.base_color.set_alpha(alpha);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::math::Domain;

    const SCALE: Vec3 = Vec3::new(1.0, 2.0, 0.5);

    #[test]
    fn plane_move_restarts_fade() {
        let mut app = App::new();
        app.add_systems(Update, sync_grid_planes);
        let frame = app.world_mut().spawn(PlotFrame::new(Domain::default(), SCALE)).id();
        let plane = app
            .world_mut()
            .spawn((
                GridPlane {
                    kind: GridPlaneKind::Xy,
                },
                FadeIn::visible(),
                ChildOf(frame),
            ))
            .id();
        app.update();
        assert_eq!(app.world().get::<FadeIn>(plane).unwrap().opacity(), 1.0);

        app.world_mut().get_mut::<PlaneSides>(frame).unwrap().xy = PlaneSide::Far;
        app.update();

        assert_eq!(
            app.world().get::<Transform>(plane).unwrap().translation,
            plane_offset(GridPlaneKind::Xy, PlaneSide::Far, SCALE)
        );
        let fade = app.world().get::<FadeIn>(plane).unwrap();
        assert_eq!(fade.opacity(), 0.0);
        assert!(fade.is_running());
    }
    #[test]
    fn normals_follow_axis_order() {
        assert_eq!(GridPlaneKind::Xy.normal(), Vec3::Z);
        assert_eq!(GridPlaneKind::Yz.normal(), Vec3::X);
        assert_eq!(GridPlaneKind::Zx.normal(), Vec3::Y);
        assert_eq!(plane_offset(GridPlaneKind::Zx, PlaneSide::Far, SCALE), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn camera_below_moves_floor_to_top() {
        let camera = Vec3::new(0.5, 0.5, -3.0);
        assert_eq!(
            resolve_side(GridPlaneKind::Xy, PlaneSide::Near, camera, SCALE),
            PlaneSide::Far
        );
        // Already far: stays put.
        assert_eq!(
            resolve_side(GridPlaneKind::Xy, PlaneSide::Far, camera, SCALE),
            PlaneSide::Far
        );
    }

    #[test]
    fn camera_inside_cube_keeps_either_side() {
        let camera = SCALE * 0.5;
        for kind in GridPlaneKind::ALL {
            for side in [PlaneSide::Near, PlaneSide::Far] {
                assert_eq!(resolve_side(kind, side, camera, SCALE), side);
            }
        }
    }

    #[test]
    fn camera_on_face_does_not_oscillate() {
        let camera = Vec3::new(0.3, 0.3, 0.0);
        let mut side = PlaneSide::Near;
        for _ in 0..10 {
            side = resolve_side(GridPlaneKind::Xy, side, camera, SCALE);
        }
        assert_eq!(side, PlaneSide::Near);

        let camera = Vec3::new(0.3, 0.3, SCALE.z);
        let mut side = PlaneSide::Far;
        for _ in 0..10 {
            side = resolve_side(GridPlaneKind::Xy, side, camera, SCALE);
        }
        assert_eq!(side, PlaneSide::Far);
    }

    #[test]
    fn crossing_toggles_once() {
        let mut side = PlaneSide::Near;
        let mut flips = 0;
        // Sweep from above the top face to below the floor.
        for step in 0..=100 {
            let z = 3.0 - step as f32 * 0.06;
            let next = resolve_side(GridPlaneKind::Xy, side, Vec3::new(0.5, 1.0, z), SCALE);
            if next != side {
                flips += 1;
                side = next;
            }
        }
        // Above the top face the plane already sits at the floor; it moves once when going below.
        assert_eq!(flips, 1);
        assert_eq!(side, PlaneSide::Far);
    }

    #[test]
    fn segments_cover_ticks_and_border() {
        let ticks = PlotTicks::compute(&Domain::default(), Vec3::ONE, 10.0);
        let (minor, border) = grid_line_segments(GridPlaneKind::Xy, Vec3::ONE, &ticks);
        assert_eq!(minor.len(), ticks.x.len() + ticks.y.len());
        assert_eq!(border.len(), 4);
        assert_eq!(border[1], [Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
        for [a, b] in &minor {
            assert!(a.z == 0.0 && b.z == 0.0);
        }
    }
}
