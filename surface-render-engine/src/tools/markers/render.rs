//! Marker visuals: hit-test wireframe, sphere, stick and the floating label.
use bevy::pbr::wireframe::{Wireframe, WireframeColor};
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{
    HITBOX_WIREFRAME_COLOUR, MARKER_CLICK_COLOUR, MARKER_HOVER_COLOUR, MARKER_LABEL_FONT_SIZE,
    MARKER_LABEL_HEIGHT, MARKER_LABEL_WIDTH, MARKER_SPHERE_SIZE, MARKER_STICK_COLOUR,
};
use constants::surface::LABEL_STICK_LENGTH;

use super::label_placement::marker_label_height;
use super::proxy::ProxyGeometry;
use super::state::{
    MarkerDismissed, MarkerFlags, MarkerKind, MarkerTextFormatter, SurfaceMarkers, marker_text,
};
use crate::engine::scene::grid::line_list_mesh;
use crate::engine::scene::labels::ScreenLabel;
use crate::engine::scene::plot_frame::PlotFrame;
use crate::engine::scene::surface::CapturedDepth;

/// Wireframe of the pointer proxy, child of its surface.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MarkerHitbox;

/// Root of one marker's 3D parts, child of the plot frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(Transform, Visibility)]
pub struct MarkerVisual {
    pub surface: Entity,
    pub kind: MarkerKind,
    stick: Entity,
    anchor: Entity,
    text: Entity,
}

/// Top of the stick; the UI label is pinned here.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MarkerLabelAnchor;

/// Stick height above the marker, in stick lengths.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerLabelHeight(pub f32);

#[derive(Component, Debug, Clone, Copy)]
pub struct MarkerLabelText;

/// Close button on the pinned marker's label.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerCloseButton {
    pub surface: Entity,
}

fn hitbox_visibility(flags: &MarkerFlags) -> Visibility {
    if flags.show_hitbox {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn stick_transform(height: f32) -> Transform {
    Transform::from_scale(Vec3::new(1.0, 1.0, (height * LABEL_STICK_LENGTH).max(f32::EPSILON)))
}

/// Rebuild the pointer proxy and its wireframe whenever a marked surface's
/// depth changes. A first click made on the old depth is dropped.
pub fn build_marker_proxies(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut surfaces: Query<
        (
            Entity,
            &CapturedDepth,
            &MarkerFlags,
            &mut SurfaceMarkers,
            Option<&Children>,
        ),
        Changed<CapturedDepth>,
    >,
    hitboxes: Query<(), With<MarkerHitbox>>,
) {
    for (entity, depth, flags, mut markers, children) in surfaces.iter_mut() {
        if markers.is_armed() {
            markers.cancel_pending_click();
        }

        let proxy = ProxyGeometry::from_depth(&depth.buffer, depth.flip_y);
        let mesh = meshes.add(proxy.geometry().to_mesh());
        debug!(
            "Surface {entity}: pointer proxy with {} vertices",
            proxy.geometry().vertex_count()
        );
        commands.entity(entity).insert(proxy);

        let existing = children.and_then(|children| {
            let children: &[Entity] = children;
            children.iter().copied().find(|&child| hitboxes.contains(child))
        });
        match existing {
            Some(hitbox) => {
                commands.entity(hitbox).insert(Mesh3d(mesh));
            }
            None => {
                let material = materials.add(StandardMaterial {
                    base_color: Color::NONE,
                    alpha_mode: AlphaMode::Blend,
                    unlit: true,
                    ..default()
                });
                commands.spawn((
                    MarkerHitbox,
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Wireframe,
                    WireframeColor {
                        color: HITBOX_WIREFRAME_COLOUR,
                    },
                    hitbox_visibility(flags),
                    ChildOf(entity),
                    Name::new("Marker hitbox"),
                ));
            }
        }
    }
}

pub fn sync_hitbox_visibility(
    surfaces: Query<(&MarkerFlags, &Children), Changed<MarkerFlags>>,
    mut hitboxes: Query<&mut Visibility, With<MarkerHitbox>>,
) {
    for (flags, children) in surfaces.iter() {
        let children: &[Entity] = children;
        for &child in children {
            if let Ok(mut visibility) = hitboxes.get_mut(child) {
                visibility.set_if_neq(hitbox_visibility(flags));
            }
        }
    }
}

/// Spawn both markers (hidden) for every newly marked surface.
pub fn spawn_marker_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    surfaces: Query<(Entity, &ChildOf), Added<SurfaceMarkers>>,
) {
    if surfaces.is_empty() {
        return;
    }
    let sphere = meshes.add(Sphere::new(MARKER_SPHERE_SIZE));
    let stick = meshes.add(line_list_mesh(&[[Vec3::ZERO, Vec3::Z]]));
    let stick_material = materials.add(StandardMaterial {
        base_color: MARKER_STICK_COLOUR,
        unlit: true,
        ..default()
    });

    for (surface, child_of) in surfaces.iter() {
        for kind in [MarkerKind::Continuous, MarkerKind::Click] {
            let colour = match kind {
                MarkerKind::Continuous => MARKER_HOVER_COLOUR,
                MarkerKind::Click => MARKER_CLICK_COLOUR,
            };
            let sphere_material = materials.add(StandardMaterial {
                base_color: colour,
                unlit: true,
                ..default()
            });

            let root = commands
                .spawn((
                    Transform::default(),
                    Visibility::Hidden,
                    ChildOf(child_of.parent()),
                    Name::new(format!("Marker {kind:?}")),
                ))
                .id();
            commands.spawn((
                Mesh3d(sphere.clone()),
                MeshMaterial3d(sphere_material),
                ChildOf(root),
            ));
            let stick_entity = commands
                .spawn((
                    Mesh3d(stick.clone()),
                    MeshMaterial3d(stick_material.clone()),
                    stick_transform(0.0),
                    NoFrustumCulling,
                    ChildOf(root),
                ))
                .id();
            let anchor = commands
                .spawn((
                    MarkerLabelAnchor,
                    Transform::default(),
                    Visibility::Inherited,
                    ChildOf(root),
                ))
                .id();

            let text = spawn_marker_label(&mut commands, surface, kind, anchor);
            commands.entity(root).insert((
                MarkerVisual {
                    surface,
                    kind,
                    stick: stick_entity,
                    anchor,
                    text,
                },
                MarkerLabelHeight::default(),
            ));
        }
    }
}

/// UI box pinned to `anchor`. Returns the text entity.
fn spawn_marker_label(
    commands: &mut Commands,
    surface: Entity,
    kind: MarkerKind,
    anchor: Entity,
) -> Entity {
    let label = commands
        .spawn((
            ScreenLabel::new(anchor),
            Node {
                position_type: PositionType::Absolute,
                width: Val::Px(MARKER_LABEL_WIDTH),
                height: Val::Px(MARKER_LABEL_HEIGHT),
                padding: UiRect::horizontal(Val::Px(8.0)),
                align_items: AlignItems::Center,
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            },
            BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
            BorderRadius::all(Val::Px(4.0)),
            Visibility::Hidden,
            Name::new("Marker label"),
        ))
        .id();

    let text = commands
        .spawn((
            MarkerLabelText,
            Text::new(""),
            TextFont {
                font_size: MARKER_LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::BLACK),
            ChildOf(label),
        ))
        .id();

    if kind == MarkerKind::Click {
        commands
            .spawn((
                MarkerCloseButton { surface },
                Button,
                Node {
                    padding: UiRect::horizontal(Val::Px(4.0)),
                    ..default()
                },
                ChildOf(label),
            ))
            .with_child((
                Text::new("x"),
                TextFont {
                    font_size: MARKER_LABEL_FONT_SIZE,
                    ..default()
                },
                TextColor(Color::BLACK),
            ));
    }
    text
}

/// Move markers to their state, refresh text, and drop visuals of removed
/// surfaces.
pub fn sync_marker_visuals(
    mut commands: Commands,
    surfaces: Query<(
        Ref<SurfaceMarkers>,
        Ref<MarkerFlags>,
        Option<Ref<MarkerTextFormatter>>,
    )>,
    mut visuals: Query<(Entity, &MarkerVisual, &mut Transform, &mut Visibility)>,
    mut texts: Query<&mut Text, With<MarkerLabelText>>,
) {
    for (entity, visual, mut transform, mut visibility) in visuals.iter_mut() {
        let Ok((markers, flags, formatter)) = surfaces.get(visual.surface) else {
            commands.entity(entity).despawn();
            continue;
        };
        let formatter_changed = formatter.as_ref().is_some_and(|f| f.is_changed());
        if !markers.is_changed() && !flags.is_changed() && !formatter_changed {
            continue;
        }

        let state = markers.get(visual.kind);
        let enabled = match visual.kind {
            MarkerKind::Continuous => flags.continuous,
            MarkerKind::Click => flags.double_click,
        };
        if transform.translation != state.position() {
            transform.translation = state.position();
        }
        visibility.set_if_neq(if state.is_visible() && enabled {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });

        if let Ok(mut text) = texts.get_mut(visual.text) {
            let next = marker_text(formatter.as_deref(), state.position());
            if text.0 != next {
                text.0 = next;
            }
        }
    }
}

/// Re-solve label heights when a marker moves or the view changes.
pub fn update_marker_label_heights(
    cameras: Query<(Ref<Camera>, Ref<GlobalTransform>), With<Camera3d>>,
    frames: Query<Ref<GlobalTransform>, With<PlotFrame>>,
    mut visuals: Query<(&MarkerVisual, Ref<Transform>, &ChildOf, &mut MarkerLabelHeight)>,
    mut parts: Query<&mut Transform, Without<MarkerVisual>>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let view_changed = camera.is_changed() || camera_transform.is_changed();

    for (visual, transform, child_of, mut height) in visuals.iter_mut() {
        let Ok(frame_transform) = frames.get(child_of.parent()) else {
            continue;
        };
        if !view_changed && !transform.is_changed() && !frame_transform.is_changed() {
            continue;
        }

        let base = frame_transform.transform_point(transform.translation);
        let up = frame_transform
            .affine()
            .transform_vector3(Vec3::Z * LABEL_STICK_LENGTH);
        let next = marker_label_height(&camera, &camera_transform, base, up);
        if height.0 == next {
            continue;
        }
        height.0 = next;

        if let Ok(mut stick) = parts.get_mut(visual.stick) {
            *stick = stick_transform(next);
        }
        if let Ok(mut anchor) = parts.get_mut(visual.anchor) {
            anchor.translation = Vec3::Z * next * LABEL_STICK_LENGTH;
        }
    }
}

/// Dismiss the pinned marker when its close button is pressed.
pub fn close_pinned_markers(
    buttons: Query<(&Interaction, &MarkerCloseButton), Changed<Interaction>>,
    mut surfaces: Query<&mut SurfaceMarkers>,
    mut dismissed: EventWriter<MarkerDismissed>,
) {
    for (interaction, button) in buttons.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Ok(mut markers) = surfaces.get_mut(button.surface) else {
            continue;
        };
        markers.dismiss();
        info!("Surface {}: pinned marker dismissed", button.surface);
        dismissed.write(MarkerDismissed {
            surface: button.surface,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn marker_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .add_event::<MarkerDismissed>()
            .add_systems(
                Update,
                (spawn_marker_visuals, sync_marker_visuals, close_pinned_markers).chain(),
            );
        app
    }

    fn spawn_marked_surface(app: &mut App, flags: MarkerFlags) -> Entity {
        let frame = app.world_mut().spawn(PlotFrame::default()).id();
        app.world_mut().spawn((flags, ChildOf(frame))).id()
    }

    fn visual(app: &mut App, kind: MarkerKind) -> (Entity, MarkerVisual) {
        let mut query = app.world_mut().query::<(Entity, &MarkerVisual)>();
        query
            .iter(app.world())
            .find(|(_, v)| v.kind == kind)
            .map(|(e, v)| (e, *v))
            .unwrap()
    }

    #[test]
    fn pinned_marker_follows_state_and_text() {
        let mut app = marker_app();
        let surface = spawn_marked_surface(
            &mut app,
            MarkerFlags {
                double_click: true,
                ..default()
            },
        );
        app.update();

        {
            let mut markers = app.world_mut().get_mut::<SurfaceMarkers>(surface).unwrap();
            markers.press(Vec3::new(0.2, 0.4, 0.25), Duration::ZERO);
            markers.press(Vec3::new(0.2, 0.4, 0.25), Duration::from_millis(100));
        }
        app.update();

        let (root, visual) = visual(&mut app, MarkerKind::Click);
        assert_eq!(
            app.world().get::<Transform>(root).unwrap().translation,
            Vec3::new(0.2, 0.4, 0.25)
        );
        assert_eq!(
            *app.world().get::<Visibility>(root).unwrap(),
            Visibility::Inherited
        );
        assert_eq!(app.world().get::<Text>(visual.text).unwrap().0, "0.25");
    }

    #[test]
    fn host_formatter_drives_label_text() {
        let mut app = marker_app();
        let surface = spawn_marked_surface(
            &mut app,
            MarkerFlags {
                continuous: true,
                ..default()
            },
        );
        app.world_mut()
            .entity_mut(surface)
            .insert(MarkerTextFormatter::new(|x, y| format!("({x}, {y})")));
        app.update();

        app.world_mut()
            .get_mut::<SurfaceMarkers>(surface)
            .unwrap()
            .pointer_over(Vec3::new(1.0, 2.0, 3.0));
        app.update();

        let (_, visual) = visual(&mut app, MarkerKind::Continuous);
        assert_eq!(app.world().get::<Text>(visual.text).unwrap().0, "(1, 2)");
    }

    #[test]
    fn disabling_double_click_hides_pinned_marker() {
        let mut app = marker_app();
        let surface = spawn_marked_surface(
            &mut app,
            MarkerFlags {
                double_click: true,
                ..default()
            },
        );
        app.update();
        {
            let mut markers = app.world_mut().get_mut::<SurfaceMarkers>(surface).unwrap();
            markers.press(Vec3::ONE, Duration::ZERO);
            markers.press(Vec3::ONE, Duration::from_millis(50));
        }
        app.update();
        let (root, _) = visual(&mut app, MarkerKind::Click);
        assert_eq!(
            *app.world().get::<Visibility>(root).unwrap(),
            Visibility::Inherited
        );

        app.world_mut()
            .get_mut::<MarkerFlags>(surface)
            .unwrap()
            .double_click = false;
        app.update();
        assert_eq!(*app.world().get::<Visibility>(root).unwrap(), Visibility::Hidden);
        // The pin itself survives, so re-enabling shows it again.
        assert!(app.world().get::<SurfaceMarkers>(surface).unwrap().click.is_visible());
    }

    #[test]
    fn close_button_dismisses_and_notifies() {
        let mut app = marker_app();
        let surface = spawn_marked_surface(
            &mut app,
            MarkerFlags {
                double_click: true,
                ..default()
            },
        );
        app.update();
        {
            let mut markers = app.world_mut().get_mut::<SurfaceMarkers>(surface).unwrap();
            markers.press(Vec3::ONE, Duration::ZERO);
            markers.press(Vec3::ONE, Duration::from_millis(50));
        }
        app.update();

        let mut buttons = app
            .world_mut()
            .query_filtered::<Entity, With<MarkerCloseButton>>();
        let button = buttons.single(app.world()).unwrap();
        app.world_mut().entity_mut(button).insert(Interaction::Pressed);
        app.update();

        let markers = app.world().get::<SurfaceMarkers>(surface).unwrap();
        assert!(!markers.click.is_visible());
        assert_eq!(markers.click.position(), Vec3::ONE);
        let events = app.world().resource::<Events<MarkerDismissed>>();
        assert_eq!(events.len(), 1);

        app.update();
        let (root, _) = visual(&mut app, MarkerKind::Click);
        assert_eq!(*app.world().get::<Visibility>(root).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn new_depth_drops_pending_first_click() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .add_systems(Update, build_marker_proxies);

        let depth = |h: f32| CapturedDepth {
            buffer: std::sync::Arc::new(
                crate::engine::mesh::DepthBuffer::from_fn(3, 3, move |_, _| h).unwrap(),
            ),
            flip_y: false,
        };
        let surface = app
            .world_mut()
            .spawn((
                MarkerFlags {
                    double_click: true,
                    ..default()
                },
                depth(0.0),
            ))
            .id();
        app.update();
        assert!(app.world().get::<ProxyGeometry>(surface).is_some());

        app.world_mut()
            .get_mut::<SurfaceMarkers>(surface)
            .unwrap()
            .press(Vec3::ZERO, Duration::ZERO);
        // Unrelated frames leave the arm alone.
        app.update();
        assert!(app.world().get::<SurfaceMarkers>(surface).unwrap().is_armed());

        app.world_mut().entity_mut(surface).insert(depth(0.5));
        app.update();
        assert!(!app.world().get::<SurfaceMarkers>(surface).unwrap().is_armed());
    }

    #[test]
    fn visuals_go_with_their_surface() {
        let mut app = marker_app();
        let surface = spawn_marked_surface(&mut app, MarkerFlags::default());
        app.update();
        app.world_mut().entity_mut(surface).despawn();
        app.update();
        app.update();

        let mut visuals = app.world_mut().query::<&MarkerVisual>();
        assert_eq!(visuals.iter(app.world()).count(), 0);
    }
}
