use bevy::prelude::*;
use constants::surface::DEFAULT_TICKS_PER_UNIT;
use serde::{Deserialize, Serialize};

use crate::engine::error::SurfaceError;
use crate::engine::math::{Axis, Domain};
use crate::engine::mesh::DepthChannel;
use crate::engine::scene::compositor::{AxisPolicy, MultiSurface};
use crate::engine::scene::plot_frame::PlotFrame;
use crate::tools::markers::state::MarkerFlags;

/// One surface of a plot. Missing texture paths fall back to procedural
/// demo textures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<String>,
    #[serde(default)]
    pub depth_channel: DepthChannel,
    #[serde(default)]
    pub flip_y: bool,
    /// Data domain of this surface inside a composite plot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
}

/// Plot description as a Bevy asset. Mirrors the JSON structure.
///
/// With `policy` set the plot is a composite: the frame domain is the union
/// of the surfaces' domains and `scale` is the base scale fed to the policy.
#[derive(Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceManifest {
    #[serde(default)]
    pub domain: Domain,
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default = "default_ticks_per_unit")]
    pub ticks_per_unit: f32,
    #[serde(default)]
    pub markers: MarkerFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<AxisPolicy>,
    #[serde(default = "default_surfaces")]
    pub surfaces: Vec<SurfaceEntry>,
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_ticks_per_unit() -> f32 {
    DEFAULT_TICKS_PER_UNIT
}

fn default_surfaces() -> Vec<SurfaceEntry> {
    vec![SurfaceEntry::default()]
}

impl Default for SurfaceManifest {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            scale: default_scale(),
            ticks_per_unit: default_ticks_per_unit(),
            markers: MarkerFlags::default(),
            policy: None,
            surfaces: default_surfaces(),
        }
    }
}

impl SurfaceManifest {
    pub fn scale(&self) -> Vec3 {
        Vec3::from_array(self.scale)
    }

    pub fn composite(&self) -> Option<MultiSurface> {
        self.policy.map(|policy| MultiSurface {
            policy,
            base_scale: self.scale(),
        })
    }

    pub fn plot_frame(&self) -> PlotFrame {
        PlotFrame::new(self.domain, self.scale()).with_ticks_per_unit(self.ticks_per_unit)
    }

    /// Domain of surface `index` inside a composite; the plot domain otherwise.
    pub fn surface_domain(&self, index: usize) -> Domain {
        self.surfaces
            .get(index)
            .and_then(|entry| entry.domain)
            .unwrap_or(self.domain)
    }

    /// Every domain the manifest declares must be finite and increasing.
    pub fn validate(&self) -> Result<(), SurfaceError> {
        let domains = std::iter::once(&self.domain)
            .chain(self.surfaces.iter().filter_map(|entry| entry.domain.as_ref()));
        for domain in domains {
            for axis in Axis::ALL {
                let interval = domain.axis(axis);
                if !interval.is_valid() {
                    return Err(SurfaceError::InvalidDomain {
                        axis,
                        lo: interval.lo,
                        hi: interval.hi,
                    });
                }
            }
        }
        Ok(())
    }
}
