//! Low-poly proxy of a surface used only for pointer picking.
use bevy::prelude::*;
use constants::surface::PROXY_MAX_CELLS;

use crate::engine::mesh::{DepthBuffer, SampleOptions, SurfaceGeometry, build_geometry};

/// Resolution-capped copy of a surface's geometry in surface-local space.
#[derive(Component, Debug, Clone)]
pub struct ProxyGeometry {
    geometry: SurfaceGeometry,
    min: Vec3,
    max: Vec3,
}

impl ProxyGeometry {
    pub fn from_depth(depth: &DepthBuffer, flip_y: bool) -> Self {
        Self::from_geometry(build_geometry(
            depth,
            SampleOptions::capped(PROXY_MAX_CELLS, flip_y),
        ))
    }

    pub fn from_geometry(geometry: SurfaceGeometry) -> Self {
        let (min, max) = geometry.positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| {
                let p = Vec3::from(*p);
                (lo.min(p), hi.max(p))
            },
        );
        Self { geometry, min, max }
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    /// Nearest hit along `origin + t * direction`, `t >= 0`, as `(t, point)`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        ray_aabb_hit_t(origin, direction, self.min, self.max)?;

        self.geometry
            .triangles()
            .filter_map(|tri| ray_triangle_hit_t(origin, direction, tri))
            .min_by(|a, b| a.total_cmp(b))
            .map(|t| (t, origin + direction * t))
    }
}

/// Slab-method ray vs box, `Some(t)` of the entry (or exit when starting inside).
pub fn ray_aabb_hit_t(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        if d == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((min[axis] - o) * inv, (max[axis] - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Double-sided Moller-Trumbore ray vs triangle.
pub fn ray_triangle_hit_t(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
