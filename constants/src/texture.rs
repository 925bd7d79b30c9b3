/// Channel of an RGBA depth image that carries elevation (0 = r, 1 = g, 2 = b, 3 = a).
pub const DEPTH_IMAGE_CHANNEL: usize = 1;

/// Bytes per pixel of 8-bit RGBA depth images.
pub const RGBA8_PIXEL_BYTES: usize = 4;

/// Resolution of the procedural demo textures.
pub const DEMO_TEXTURE_SIZE: u32 = 256;
