use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use constants::texture::RGBA8_PIXEL_BYTES;

/// Radial sinc over the texture, rescaled to `[0, 1]`.
pub fn sinc_height(u: f32, v: f32) -> f32 {
    const RINGS: f32 = 4.0 * std::f32::consts::PI;
    // Global minimum of sin(r)/r, reached near r = 4.49.
    const SINC_MIN: f32 = -0.217_234;

    let r = Vec2::new(u - 0.5, v - 0.5).length() * 2.0 * RINGS;
    let sinc = if r < 1e-6 { 1.0 } else { r.sin() / r };
    ((sinc - SINC_MIN) / (1.0 - SINC_MIN)).clamp(0.0, 1.0)
}

fn colour_ramp(t: f32) -> [u8; 4] {
    const STOPS: [[f32; 3]; 3] = [[0.15, 0.1, 0.45], [0.1, 0.6, 0.55], [0.95, 0.9, 0.2]];
    let t = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
    let i = (t.floor() as usize).min(STOPS.len() - 2);
    let f = t - i as f32;
    let [a, b] = [STOPS[i], STOPS[i + 1]];
    let channel = |k: usize| ((a[k] + (b[k] - a[k]) * f) * 255.0).round() as u8;
    [channel(0), channel(1), channel(2), 255]
}

fn rgba_image(size: u32, format: TextureFormat, pixel: impl Fn(f32, f32) -> [u8; 4]) -> Image {
    let mut data = Vec::with_capacity((size * size) as usize * RGBA8_PIXEL_BYTES);
    let last = (size.max(2) - 1) as f32;
    for y in 0..size {
        for x in 0..size {
            data.extend_from_slice(&pixel(x as f32 / last, y as f32 / last));
        }
    }
    Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        format,
        RenderAssetUsages::default(),
    )
}

/// Grey depth image: every colour channel carries the height.
pub fn sinc_depth_image(size: u32) -> Image {
    rgba_image(size, TextureFormat::Rgba8Unorm, |u, v| {
        let h = (sinc_height(u, v) * 255.0).round() as u8;
        [h, h, h, 255]
    })
}

/// Colour map matching [`sinc_depth_image`].
pub fn sinc_colour_image(size: u32) -> Image {
    rgba_image(size, TextureFormat::Rgba8UnormSrgb, |u, v| {
        colour_ramp(sinc_height(u, v))
    })
}
