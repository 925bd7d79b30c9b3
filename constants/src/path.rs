/// Surface manifest, relative to the asset root.
pub const SURFACE_MANIFEST_PATH: &str = "surface_manifest.json";
