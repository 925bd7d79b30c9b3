//! Visible depth-displaced surfaces and their placement inside a plot frame.
use std::sync::Arc;

use bevy::prelude::*;
use constants::render_settings::{SURFACE_METALLIC, SURFACE_ROUGHNESS};

use super::plot_frame::{PlotFrame, sanitize_scale};
use crate::engine::error::SurfaceError;
use crate::engine::mesh::{DepthBuffer, DepthChannel, SampleOptions, build_geometry};

/// Where the displacement of a surface comes from.
#[derive(Component, Debug, Clone)]
pub enum DepthSource {
    /// Image asset; one channel carries the depth.
    Image {
        handle: Handle<Image>,
        channel: DepthChannel,
        flip_y: bool,
    },
    /// Scalar buffer supplied directly by the host.
    Buffer { buffer: Arc<DepthBuffer>, flip_y: bool },
}

impl DepthSource {
    pub fn image(handle: Handle<Image>) -> Self {
        Self::Image {
            handle,
            channel: DepthChannel::default(),
            flip_y: false,
        }
    }

    pub fn buffer(buffer: DepthBuffer) -> Self {
        Self::Buffer {
            buffer: Arc::new(buffer),
            flip_y: false,
        }
    }

    pub fn flip_y(&self) -> bool {
        match self {
            DepthSource::Image { flip_y, .. } | DepthSource::Buffer { flip_y, .. } => *flip_y,
        }
    }

    fn image_id(&self) -> Option<AssetId<Image>> {
        match self {
            DepthSource::Image { handle, .. } => Some(handle.id()),
            DepthSource::Buffer { .. } => None,
        }
    }

    /// Read the current depth values. `Ok(None)` while an image is still loading.
    pub fn capture(&self, images: &Assets<Image>) -> Result<Option<DepthBuffer>, SurfaceError> {
        match self {
            DepthSource::Image {
                handle, channel, ..
            } => match images.get(handle) {
                Some(image) => DepthBuffer::from_image(image, *channel).map(Some),
                None => Ok(None),
            },
            DepthSource::Buffer { buffer, .. } => Ok(Some(buffer.as_ref().clone())),
        }
    }
}

/// Last valid depth buffer read from a surface's [`DepthSource`].
///
/// Meshes derived from the surface (render mesh, hit-test proxy) rebuild when
/// this changes. A failed capture leaves it untouched.
#[derive(Component, Debug, Clone)]
pub struct CapturedDepth {
    pub buffer: Arc<DepthBuffer>,
    pub flip_y: bool,
}

/// Visible surface. The mesh is a unit plane centred on the origin with depth
/// along +z, so placement alone decides where it lands in the plot cube.
#[derive(Component, Debug, Clone)]
#[require(Transform, Visibility, SurfacePlacement)]
pub struct DepthSurface {
    pub color: Option<Handle<Image>>,
    pub base_color: Color,
}

impl Default for DepthSurface {
    fn default() -> Self {
        Self {
            color: None,
            base_color: Color::WHITE,
        }
    }
}

impl DepthSurface {
    pub fn textured(color: Handle<Image>) -> Self {
        Self {
            color: Some(color),
            ..default()
        }
    }
}

/// Offset and size of a surface in plot space.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SurfacePlacement {
    pub offset: Vec3,
    pub scale: Vec3,
}

impl Default for SurfacePlacement {
    fn default() -> Self {
        Self::standalone(Vec3::ONE)
    }
}

impl SurfacePlacement {
    /// A lone surface filling the plot cube `[0, sx] x [0, sy] x [0, sz]`.
    pub fn standalone(scale: Vec3) -> Self {
        Self {
            offset: Vec3::new(0.5 * scale.x, 0.5 * scale.y, 0.0),
            scale,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.offset).with_scale(sanitize_scale(self.scale))
    }
}

/// Surface that fills its parent plot frame.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FollowFrameScale;

/// Spawn a standalone surface under a plot root.
pub fn spawn_depth_surface(
    commands: &mut Commands,
    frame: Entity,
    surface: DepthSurface,
    source: DepthSource,
) -> Entity {
    commands
        .spawn((
            surface,
            source,
            FollowFrameScale,
            ChildOf(frame),
            Name::new("Depth surface"),
        ))
        .id()
}

/// Read depth from changed sources and from images that finished loading or
/// were modified in place.
pub fn capture_surface_depth(
    mut commands: Commands,
    mut image_events: EventReader<AssetEvent<Image>>,
    images: Res<Assets<Image>>,
    sources: Query<(Entity, Ref<DepthSource>)>,
) {
    let touched: Vec<AssetId<Image>> = image_events
        .read()
        .filter_map(|event| match event {
            AssetEvent::Added { id }
            | AssetEvent::Modified { id }
            | AssetEvent::LoadedWithDependencies { id } => Some(*id),
            _ => None,
        })
        .collect();

    for (entity, source) in sources.iter() {
        let image_touched = source.image_id().is_some_and(|id| touched.contains(&id));
        if !source.is_changed() && !image_touched {
            continue;
        }

        match source.capture(&images) {
            Ok(Some(buffer)) => {
                debug!(
                    "Surface {entity}: captured {}x{} depth buffer",
                    buffer.width(),
                    buffer.height()
                );
                commands.entity(entity).insert(CapturedDepth {
                    buffer: Arc::new(buffer),
                    flip_y: source.flip_y(),
                });
            }
            Ok(None) => {}
            Err(err) => {
                warn!("Surface {entity}: invalid depth source, keeping previous mesh: {err}");
            }
        }
    }
}

/// Full-resolution render mesh for every surface whose depth changed.
pub fn rebuild_surface_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    surfaces: Query<(Entity, &CapturedDepth), (With<DepthSurface>, Changed<CapturedDepth>)>,
) {
    for (entity, depth) in surfaces.iter() {
        let geometry = build_geometry(&depth.buffer, SampleOptions::full_resolution(depth.flip_y));
        info!(
            "Surface {entity}: rebuilt mesh with {} vertices",
            geometry.vertex_count()
        );
        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(geometry.to_mesh())));
    }
}

pub fn apply_surface_materials(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    surfaces: Query<(Entity, &DepthSurface), Changed<DepthSurface>>,
) {
    for (entity, surface) in surfaces.iter() {
        let material = StandardMaterial {
            base_color: surface.base_color,
            base_color_texture: surface.color.clone(),
            metallic: SURFACE_METALLIC,
            perceptual_roughness: SURFACE_ROUGHNESS,
            double_sided: true,
            cull_mode: None,
            ..default()
        };
        commands
            .entity(entity)
            .insert(MeshMaterial3d(materials.add(material)));
    }
}

/// Standalone surfaces track the scale of their plot frame.
pub fn follow_frame_scale(
    frames: Query<Ref<PlotFrame>>,
    mut surfaces: Query<(Ref<FollowFrameScale>, &ChildOf, &mut SurfacePlacement)>,
) {
    for (marker, child_of, mut placement) in surfaces.iter_mut() {
        let Ok(frame) = frames.get(child_of.parent()) else {
            continue;
        };
        if frame.is_changed() || marker.is_added() {
            placement.set_if_neq(SurfacePlacement::standalone(frame.effective_scale()));
        }
    }
}

pub fn sync_surface_transforms(
    mut surfaces: Query<(&SurfacePlacement, &mut Transform), Changed<SurfacePlacement>>,
) {
    for (placement, mut transform) in surfaces.iter_mut() {
        let next = placement.transform();
        transform.translation = next.translation;
        transform.scale = next.scale;
    }
}

#[cfg(test)]
mod tests {
    use bevy::asset::RenderAssetUsages;
    use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

    use super::*;
    use crate::engine::math::Domain;

    fn green_image(width: u32, height: u32, green: u8) -> Image {
        Image::new_fill(
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &[0, green, 0, 255],
            TextureFormat::Rgba8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        )
    }

    fn depth_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<Mesh>()
            .add_systems(Update, (capture_surface_depth, rebuild_surface_meshes).chain());
        app
    }

    #[test]
    fn standalone_surface_fills_cube() {
        let scale = Vec3::new(2.0, 1.0, 0.3);
        let transform = SurfacePlacement::standalone(scale).transform();
        // Mesh spans [-0.5, 0.5]^2 x [0, 1].
        let lo = transform.transform_point(Vec3::new(-0.5, -0.5, 0.0));
        let hi = transform.transform_point(Vec3::new(0.5, 0.5, 1.0));
        assert!((lo - Vec3::ZERO).length() < 1e-6);
        assert!((hi - scale).length() < 1e-6);
    }

    #[test]
    fn buffer_source_captures_and_builds_mesh() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<Mesh>()
            .add_systems(Update, (capture_surface_depth, rebuild_surface_meshes).chain());

        let frame = app.world_mut().spawn(PlotFrame::new(Domain::default(), Vec3::ONE)).id();
        let buffer = DepthBuffer::from_fn(4, 3, |i, j| (i + j) as f32 / 5.0).unwrap();
        let surface = app
            .world_mut()
            .spawn((
                DepthSurface::default(),
                DepthSource::buffer(buffer),
                ChildOf(frame),
            ))
            .id();

        app.update();
        assert!(app.world().get::<CapturedDepth>(surface).is_some());
        app.update();
        assert!(app.world().get::<Mesh3d>(surface).is_some());
    }

    #[test]
    fn invalid_source_keeps_previous_depth_and_mesh() {
        let mut app = depth_app();
        let buffer = DepthBuffer::from_fn(3, 3, |i, j| (i * j) as f32 / 4.0).unwrap();
        let surface = app
            .world_mut()
            .spawn((DepthSurface::default(), DepthSource::buffer(buffer)))
            .id();
        app.update();
        app.update();
        let depth = app.world().get::<CapturedDepth>(surface).unwrap().buffer.clone();
        let mesh = app.world().get::<Mesh3d>(surface).unwrap().0.clone();

        // A single pixel is too small to build a surface from.
        let handle = app
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .add(green_image(1, 1, 128));
        app.world_mut()
            .entity_mut(surface)
            .insert(DepthSource::image(handle));
        app.update();
        app.update();

        let captured = app.world().get::<CapturedDepth>(surface).unwrap();
        assert!(Arc::ptr_eq(&captured.buffer, &depth));
        assert_eq!(app.world().get::<Mesh3d>(surface).unwrap().0, mesh);
    }

    #[test]
    fn modified_image_recaptures_and_rebuilds() {
        let mut app = depth_app();
        let handle = app
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .add(green_image(2, 2, 0));
        let surface = app
            .world_mut()
            .spawn((DepthSurface::default(), DepthSource::image(handle.clone())))
            .id();
        // Let the load events settle.
        app.update();
        app.update();
        app.update();
        assert_eq!(
            app.world().get::<CapturedDepth>(surface).unwrap().buffer.get(0, 0),
            0.0
        );
        let mesh = app.world().get::<Mesh3d>(surface).unwrap().0.clone();

        {
            let mut images = app.world_mut().resource_mut::<Assets<Image>>();
            *images.get_mut(&handle).unwrap() = green_image(2, 2, 255);
        }
        app.update();
        app.update();
        app.update();

        let captured = app.world().get::<CapturedDepth>(surface).unwrap();
        assert_eq!(captured.buffer.get(0, 0), 1.0);
        assert_ne!(app.world().get::<Mesh3d>(surface).unwrap().0, mesh);
    }

    #[test]
    fn loading_image_keeps_waiting() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .add_systems(Update, capture_surface_depth);

        let handle: Handle<Image> = Handle::default();
        let surface = app
            .world_mut()
            .spawn((DepthSurface::default(), DepthSource::image(handle)))
            .id();
        app.update();
        assert!(app.world().get::<CapturedDepth>(surface).is_none());
    }
}
