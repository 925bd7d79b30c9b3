use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use constants::texture::{DEPTH_IMAGE_CHANNEL, RGBA8_PIXEL_BYTES};
use serde::{Deserialize, Serialize};

use crate::engine::error::SurfaceError;

/// Image channel carrying elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "lowercase")]
pub enum DepthChannel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Default for DepthChannel {
    fn default() -> Self {
        Self::from_index(DEPTH_IMAGE_CHANNEL)
    }
}

impl DepthChannel {
    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Red,
            2 => Self::Blue,
            3 => Self::Alpha,
            _ => Self::Green,
        }
    }

    /// Byte/component offset within an RGBA-ordered pixel.
    pub fn rgba_offset(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
        }
    }

    /// Byte offset within a BGRA-ordered pixel.
    fn bgra_offset(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Green => 1,
            Self::Red => 2,
            Self::Alpha => 3,
        }
    }
}

/// Row-major `width x height` scalar field, nominally in `[0, 1]`.
///
/// Non-finite samples are stored as 0 so they never reach vertex buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize, mut data: Vec<f32>) -> Result<Self, SurfaceError> {
        if width < 2 || height < 2 {
            return Err(SurfaceError::TooSmall { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(SurfaceError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        for d in data.iter_mut() {
            if !d.is_finite() {
                *d = 0.0;
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from a `width x height` generator, called as `f(column, row)`.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Result<Self, SurfaceError> {
        let mut data = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                data.push(f(i, j));
            }
        }
        Self::new(width, height, data)
    }

    /// Read elevation from one channel of an image, normalised to `[0, 1]`
    /// for 8-bit formats. Float formats are taken as-is.
    pub fn from_image(image: &Image, channel: DepthChannel) -> Result<Self, SurfaceError> {
        let data = image.data.as_ref().ok_or(SurfaceError::MissingPixelData)?;
        let width = image.width() as usize;
        let height = image.height() as usize;
        let pixels = width * height;
        let format = image.texture_descriptor.format;

        let (stride, read): (usize, Box<dyn Fn(&[u8]) -> f32>) = match format {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => {
                let offset = channel.rgba_offset();
                (RGBA8_PIXEL_BYTES, Box::new(move |px| px[offset] as f32 / 255.0))
            }
            TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => {
                let offset = channel.bgra_offset();
                (RGBA8_PIXEL_BYTES, Box::new(move |px| px[offset] as f32 / 255.0))
            }
            // Single channel: the channel selection does not apply.
            TextureFormat::R8Unorm => (1, Box::new(|px| px[0] as f32 / 255.0)),
            TextureFormat::R32Float => (4, Box::new(|px| read_f32(px, 0))),
            TextureFormat::Rgba32Float => {
                let offset = channel.rgba_offset() * 4;
                (16, Box::new(move |px| read_f32(px, offset)))
            }
            other => return Err(SurfaceError::UnsupportedFormat(other)),
        };

        if data.len() < pixels * stride {
            return Err(SurfaceError::DimensionMismatch {
                width,
                height,
                expected: pixels * stride,
                actual: data.len(),
            });
        }

        let values = data
            .chunks_exact(stride)
            .take(pixels)
            .map(|px| read(px))
            .collect();
        Self::new(width, height, values)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at column `i`, row `j`. Out-of-range indices clamp to the edge.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        let i = i.min(self.width - 1);
        let j = j.min(self.height - 1);
        self.data[j * self.width + i]
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }
}

fn read_f32(px: &[u8], offset: usize) -> f32 {
    bytemuck::pod_read_unaligned::<f32>(&px[offset..offset + 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::RenderAssetUsages;
    use bevy::render::render_resource::{Extent3d, TextureDimension};

    fn rgba_image(width: u32, height: u32, pixels: Vec<u8>) -> Image {
        Image::new(
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            pixels,
            TextureFormat::Rgba8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        )
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert_eq!(
            DepthBuffer::new(1, 5, vec![0.0; 5]),
            Err(SurfaceError::TooSmall {
                width: 1,
                height: 5
            })
        );
        assert!(matches!(
            DepthBuffer::new(2, 2, vec![0.0; 3]),
            Err(SurfaceError::DimensionMismatch { expected: 4, .. })
        ));
    }

    #[test]
    fn non_finite_samples_become_zero() {
        let depth = DepthBuffer::new(2, 2, vec![f32::NAN, 0.5, f32::INFINITY, 1.0]).unwrap();
        assert_eq!(depth.values(), &[0.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn reads_green_channel_by_default() {
        let mut pixels = Vec::new();
        for g in [0u8, 51, 102, 255] {
            pixels.extend_from_slice(&[200, g, 10, 255]);
        }
        let image = rgba_image(2, 2, pixels);
        let depth = DepthBuffer::from_image(&image, DepthChannel::default()).unwrap();
        assert_eq!(depth.width(), 2);
        assert!((depth.get(1, 0) - 0.2).abs() < 1e-6);
        assert!((depth.get(1, 1) - 1.0).abs() < 1e-6);

        let red = DepthBuffer::from_image(&image, DepthChannel::Red).unwrap();
        assert!((red.get(0, 0) - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn image_without_data_is_an_error() {
        let mut image = rgba_image(2, 2, vec![0; 16]);
        image.data = None;
        assert_eq!(
            DepthBuffer::from_image(&image, DepthChannel::Green),
            Err(SurfaceError::MissingPixelData)
        );
    }

    #[test]
    fn reads_r32_float() {
        let values = [0.25f32, 0.5, 0.75, 1.0];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let image = Image::new(
            Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            bytes,
            TextureFormat::R32Float,
            RenderAssetUsages::MAIN_WORLD,
        );
        let depth = DepthBuffer::from_image(&image, DepthChannel::Green).unwrap();
        assert_eq!(depth.values(), &values);
    }
}
