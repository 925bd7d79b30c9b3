use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use constants::surface::MIN_SAMPLE_CELLS;

use super::depth_buffer::DepthBuffer;

/// How a depth buffer is turned into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleOptions {
    /// Upper bound on output vertices (columns * rows). `None` keeps full resolution.
    pub max_cells: Option<usize>,
    /// Read source rows bottom-up instead of top-down.
    pub flip_y: bool,
}

impl SampleOptions {
    pub fn full_resolution(flip_y: bool) -> Self {
        Self {
            max_cells: None,
            flip_y,
        }
    }

    pub fn capped(max_cells: usize, flip_y: bool) -> Self {
        Self {
            max_cells: Some(max_cells),
            flip_y,
        }
    }
}

/// Output grid size for an `n x m` source under an optional cap.
///
/// Preserves the source aspect ratio, never upsamples, and never yields
/// fewer than two vertices along an axis the source can supply.
pub fn sample_dimensions(n: usize, m: usize, max_cells: Option<usize>) -> (usize, usize) {
    let Some(cap) = max_cells else {
        return (n, m);
    };
    let cap = cap.max(MIN_SAMPLE_CELLS);
    if n * m <= cap {
        return (n, m);
    }

    let ratio = n as f64 / m as f64;
    let mut y = ((cap as f64 / ratio).sqrt().floor() as usize).clamp(1, cap);
    let mut x = ((ratio * y as f64).floor() as usize).clamp(1, cap / y);

    x = x.min(n);
    y = y.min(m);

    // Extreme aspect ratios can floor one side to a single row or column.
    if y < 2 {
        y = 2.min(m);
        x = x.min(cap / y);
    }
    if x < 2 {
        x = 2.min(n);
        y = y.min(cap / x);
    }
    (x, y)
}

/// Nearest-neighbour source index for output index `i` of `out` samples over `src` inputs.
pub fn source_index(i: usize, out: usize, src: usize) -> usize {
    if out <= 1 || src <= 1 {
        return 0;
    }
    (i * (src - 1) / (out - 1)).min(src - 1)
}

/// CPU-side displaced grid, centred on the origin in x/y with depth along z.
///
/// Vertex `(i, j)` lies at `(i/(columns-1) - 0.5, 0.5 - j/(rows-1), depth)`,
/// so image row 0 lands on the +y edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGeometry {
    pub columns: usize,
    pub rows: usize,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Build a displaced grid from `depth`, downsampling when the cap requires it.
pub fn build_geometry(depth: &DepthBuffer, options: SampleOptions) -> SurfaceGeometry {
    let n = depth.width();
    let m = depth.height();
    let (columns, rows) = sample_dimensions(n, m, options.max_cells);

    let mut positions = Vec::with_capacity(columns * rows);
    let mut uvs = Vec::with_capacity(columns * rows);

    let step_u = 1.0 / (columns.max(2) - 1) as f32;
    let step_v = 1.0 / (rows.max(2) - 1) as f32;

    for j in 0..rows {
        let dj = source_index(j, rows, m);
        let dj = if options.flip_y { m - 1 - dj } else { dj };
        for i in 0..columns {
            let di = source_index(i, columns, n);
            let u = i as f32 * step_u;
            let v = j as f32 * step_v;
            positions.push([u - 0.5, 0.5 - v, depth.get(di, dj)]);
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::with_capacity(columns.saturating_sub(1) * rows.saturating_sub(1) * 6);
    for j in 0..rows.saturating_sub(1) {
        for i in 0..columns.saturating_sub(1) {
            let a = (j * columns + i) as u32;
            let b = ((j + 1) * columns + i) as u32;
            let c = ((j + 1) * columns + i + 1) as u32;
            let d = (j * columns + i + 1) as u32;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let normals = vertex_normals(&positions, &indices);

    SurfaceGeometry {
        columns,
        rows,
        positions,
        normals,
        uvs,
        indices,
    }
}

/// Area-weighted smooth normals; isolated vertices face +z.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(positions[a]);
        let face = (Vec3::from(positions[b]) - pa).cross(Vec3::from(positions[c]) - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z).to_array())
        .collect()
}

impl SurfaceGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn quad_count(&self) -> usize {
        self.columns.saturating_sub(1) * self.rows.saturating_sub(1)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.positions[tri[0] as usize]),
                Vec3::from(self.positions[tri[1] as usize]),
                Vec3::from(self.positions[tri[2] as usize]),
            ]
        })
    }

    /// Upload-ready triangle mesh with positions, normals and uvs.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, m: usize) -> DepthBuffer {
        DepthBuffer::from_fn(n, m, |i, j| (i + j * n) as f32 / (n * m) as f32).unwrap()
    }

    #[test]
    fn full_resolution_keeps_every_sample() {
        let depth = ramp(4, 3);
        let geom = build_geometry(&depth, SampleOptions::full_resolution(false));
        assert_eq!(geom.vertex_count(), 12);
        assert_eq!(geom.quad_count(), 6);
        assert_eq!(geom.indices.len(), 36);
        for (k, p) in geom.positions.iter().enumerate() {
            assert_eq!(p[2], depth.values()[k]);
        }
    }

    #[test]
    fn small_sources_are_not_upsampled() {
        assert_eq!(sample_dimensions(10, 10, Some(2000)), (10, 10));
    }

    #[test]
    fn downsampling_respects_cap_and_aspect() {
        let (x, y) = sample_dimensions(400, 300, Some(2000));
        assert!(x * y <= 2000);
        assert_eq!((x, y), (50, 38));
        let ratio = x as f64 / y as f64;
        assert!((ratio - 4.0 / 3.0).abs() < 0.05);
    }

    #[test]
    fn extreme_aspect_stays_within_cap() {
        let (x, y) = sample_dimensions(10_000, 2, Some(2000));
        assert!(x * y <= 2000);
        assert!(x >= 2 && y >= 2);
        let (x, y) = sample_dimensions(2, 10_000, Some(2000));
        assert!(x * y <= 2000);
        assert!(x >= 2 && y >= 2);
    }

    #[test]
    fn source_index_covers_both_ends() {
        assert_eq!(source_index(0, 5, 100), 0);
        assert_eq!(source_index(4, 5, 100), 99);
        assert_eq!(source_index(0, 1, 100), 0);
        assert_eq!(source_index(3, 1, 100), 0);
    }

    #[test]
    fn flip_reverses_rows() {
        let depth = DepthBuffer::new(2, 2, vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        let straight = build_geometry(&depth, SampleOptions::full_resolution(false));
        let flipped = build_geometry(&depth, SampleOptions::full_resolution(true));
        assert_eq!(straight.positions[0][2], 0.0);
        assert_eq!(flipped.positions[0][2], 1.0);
        // Top row sits on the +y edge either way.
        assert_eq!(straight.positions[0][1], 0.5);
    }

    #[test]
    fn flat_surface_normals_face_up() {
        let depth = DepthBuffer::new(3, 3, vec![0.5; 9]).unwrap();
        let geom = build_geometry(&depth, SampleOptions::full_resolution(false));
        for n in &geom.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-5);
        }
    }
}
