use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::path::SURFACE_MANIFEST_PATH;
use constants::texture::DEMO_TEXTURE_SIZE;

use super::procedural::{sinc_colour_image, sinc_depth_image};
use crate::engine::assets::surface_manifest::{SurfaceEntry, SurfaceManifest};
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::core::app_state::AppState;
use crate::engine::scene::compositor::spawn_domain_surface;
use crate::engine::scene::spawn_plot;
use crate::engine::scene::surface::{DepthSource, DepthSurface, spawn_depth_surface};

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<SurfaceManifest>>,
}

/// Procedural textures shared by every surface without texture paths.
struct DemoTextures {
    colour: Handle<Image>,
    depth: Handle<Image>,
}

impl DemoTextures {
    fn create(images: &mut Assets<Image>) -> Self {
        Self {
            colour: images.add(sinc_colour_image(DEMO_TEXTURE_SIZE)),
            depth: images.add(sinc_depth_image(DEMO_TEXTURE_SIZE)),
        }
    }
}

pub fn start_loading(mut loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    info!("Loading surface manifest from {SURFACE_MANIFEST_PATH}");
    loader.handle = Some(asset_server.load(SURFACE_MANIFEST_PATH));
}

/// Spawn the plot once the manifest is available. A missing or invalid
/// manifest falls back to the default single-surface plot.
pub fn spawn_plot_when_ready(
    mut commands: Commands,
    mut next_state: ResMut<NextState<AppState>>,
    mut images: ResMut<Assets<Image>>,
    loader: Res<ManifestLoader>,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<SurfaceManifest>>,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    let manifest = match manifests.get(handle) {
        Some(manifest) => match manifest.validate() {
            Ok(()) => manifest.clone(),
            Err(err) => {
                warn!("Surface manifest rejected, using defaults: {err}");
                SurfaceManifest::default()
            }
        },
        None => match asset_server.get_load_state(handle) {
            Some(LoadState::Failed(err)) => {
                warn!("Surface manifest failed to load, using defaults: {err}");
                SurfaceManifest::default()
            }
            _ => return,
        },
    };

    let demo = manifest
        .surfaces
        .iter()
        .any(|entry| entry.color.is_none() || entry.depth.is_none())
        .then(|| DemoTextures::create(&mut images));

    let root = spawn_plot(&mut commands, manifest.plot_frame(), Vec3::ZERO);
    let composite = manifest.composite();
    if let Some(multi) = composite {
        commands.entity(root).insert(multi);
    }

    for (index, entry) in manifest.surfaces.iter().enumerate() {
        let (surface, source) = surface_sources(entry, &asset_server, demo.as_ref());
        let entity = match composite {
            Some(_) => spawn_domain_surface(
                &mut commands,
                root,
                surface,
                source,
                manifest.surface_domain(index),
            ),
            None => spawn_depth_surface(&mut commands, root, surface, source),
        };
        commands.entity(entity).insert(manifest.markers);
    }

    info!(
        "Spawned plot with {} surface(s), scale {:?}",
        manifest.surfaces.len(),
        manifest.scale()
    );
    commands.insert_resource(ViewportCamera::framing(manifest.scale()));
    next_state.set(AppState::Running);
}

fn surface_sources(
    entry: &SurfaceEntry,
    asset_server: &AssetServer,
    demo: Option<&DemoTextures>,
) -> (DepthSurface, DepthSource) {
    let colour = match (&entry.color, demo) {
        (Some(path), _) => Some(asset_server.load(path.clone())),
        (None, Some(demo)) => Some(demo.colour.clone()),
        (None, None) => None,
    };
    let surface = DepthSurface {
        color: colour,
        ..default()
    };

    let depth = match (&entry.depth, demo) {
        (Some(path), _) => asset_server.load(path.clone()),
        (None, Some(demo)) => demo.depth.clone(),
        (None, None) => Handle::default(),
    };
    let source = DepthSource::Image {
        handle: depth,
        channel: entry.depth_channel,
        flip_y: entry.flip_y,
    };
    (surface, source)
}
