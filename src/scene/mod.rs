//! Scene composition.
//!
//! A scene is the final product of one generation run: every glyph's solid
//! parts, moved to their staircase position, painted with the glyph color and
//! concatenated into one mesh.
//!
//! Design goals:
//! - Renderer- and format-agnostic. The exporter reads plain buffers.
//! - No welding across parts. Neighboring glyphs may overlap; that is fine.
//! - Colors are stored per vertex. Parts never share vertices, so every
//!   triangle is a single flat color.

use std::ops::Range;

/// 8-bit RGBA color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb3 {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    #[inline]
    pub fn include_point(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    #[inline]
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Owned CPU triangle mesh. Indices are a flat triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh3D {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh3D {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for &p in &self.positions {
            b.include_point(p);
        }
        b
    }

    /// Shift every vertex by `(dx, dy, dz)`.
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        for p in &mut self.positions {
            p[0] += dx;
            p[1] += dy;
            p[2] += dz;
        }
    }

    /// Enclosed volume by the divergence theorem.
    ///
    /// Positive when triangles wind counter-clockwise seen from outside.
    /// Only meaningful for closed meshes.
    pub fn signed_volume(&self) -> f64 {
        self.indices
            .chunks_exact(3)
            .map(|t| {
                let a = self.positions[t[0] as usize].map(f64::from);
                let b = self.positions[t[1] as usize].map(f64::from);
                let c = self.positions[t[2] as usize].map(f64::from);
                let cross = [
                    b[1] * c[2] - b[2] * c[1],
                    b[2] * c[0] - b[0] * c[2],
                    b[0] * c[1] - b[1] * c[0],
                ];
                (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
            })
            .sum()
    }
}

/// Append `src` into `dst`, offsetting indices.
///
/// Panics if the vertex count exceeds `u32::MAX`.
pub fn append_mesh(dst: &mut Mesh3D, src: &Mesh3D) {
    let base = dst.positions.len();
    assert!(
        base + src.positions.len() <= u32::MAX as usize,
        "append_mesh: vertex count overflow for u32 indices"
    );

    dst.positions.extend_from_slice(&src.positions);

    let base_u32 = base as u32;
    dst.indices
        .extend(src.indices.iter().copied().map(|i| base_u32 + i));
}

/// One solid part handed to the compositor.
#[derive(Debug, Clone)]
pub struct ScenePart {
    /// Index of the glyph in the input text.
    pub glyph_index: usize,
    /// Part mesh in glyph-local coordinates (bounding box at the origin).
    pub mesh: Mesh3D,
    /// Staircase offset in the XY plane.
    pub translation: [f64; 2],
    pub color: Rgba,
}

/// Where a part ended up inside the merged mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct PartSpan {
    pub glyph_index: usize,
    pub vertices: Range<usize>,
    pub indices: Range<usize>,
}

/// The merged, colored, positioned result of one run.
#[derive(Debug, Clone)]
pub struct Scene {
    pub mesh: Mesh3D,
    /// One color per vertex, parallel to `mesh.positions`.
    pub colors: Vec<Rgba>,
    pub parts: Vec<PartSpan>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene is empty: no glyph produced geometry")]
    Empty,
}

impl Scene {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    #[inline]
    pub fn bounds(&self) -> Aabb3 {
        self.mesh.bounds()
    }

    /// Color of triangle `t` (all three vertices share it).
    pub fn triangle_color(&self, t: usize) -> Option<Rgba> {
        let first = *self.mesh.indices.get(t * 3)?;
        self.colors.get(first as usize).copied()
    }

    /// Vertices belonging to glyph `glyph_index`, across all its parts.
    pub fn glyph_vertices(&self, glyph_index: usize) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.parts
            .iter()
            .filter(move |span| span.glyph_index == glyph_index)
            .flat_map(move |span| self.mesh.positions[span.vertices.clone()].iter().copied())
    }
}

/// Translate, color and concatenate parts into one scene.
///
/// Translation is a rigid XY shift; z is untouched. Parts are appended in
/// input order without deduplication.
pub fn compose<I>(parts: I) -> Result<Scene, SceneError>
where
    I: IntoIterator<Item = ScenePart>,
{
    let mut mesh = Mesh3D::default();
    let mut colors = Vec::new();
    let mut spans = Vec::new();

    for part in parts {
        if part.mesh.is_empty() {
            continue;
        }

        let mut placed = part.mesh;
        placed.translate(part.translation[0] as f32, part.translation[1] as f32, 0.0);

        let vertices = mesh.positions.len()..mesh.positions.len() + placed.positions.len();
        let indices = mesh.indices.len()..mesh.indices.len() + placed.indices.len();

        append_mesh(&mut mesh, &placed);
        colors.resize(mesh.positions.len(), part.color);
        spans.push(PartSpan {
            glyph_index: part.glyph_index,
            vertices,
            indices,
        });
    }

    if spans.is_empty() {
        return Err(SceneError::Empty);
    }

    log::debug!(
        "composed {} parts: {} vertices, {} triangles",
        spans.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(Scene {
        mesh,
        colors,
        parts: spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(z: f32) -> Mesh3D {
        Mesh3D {
            positions: vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn empty_input_is_an_empty_scene() {
        assert_eq!(compose(Vec::new()).unwrap_err(), SceneError::Empty);

        let hollow = ScenePart {
            glyph_index: 0,
            mesh: Mesh3D::default(),
            translation: [0.0, 0.0],
            color: Rgba::WHITE,
        };
        assert_eq!(compose(vec![hollow]).unwrap_err(), SceneError::Empty);
    }

    #[test]
    fn parts_are_translated_colored_and_offset() {
        let red = Rgba::opaque(255, 0, 0);
        let blue = Rgba::opaque(0, 0, 255);
        let scene = compose(vec![
            ScenePart {
                glyph_index: 0,
                mesh: tri(0.0),
                translation: [0.0, 0.0],
                color: red,
            },
            ScenePart {
                glyph_index: 2,
                mesh: tri(5.0),
                translation: [100.0, -160.0],
                color: blue,
            },
        ])
        .unwrap();

        assert_eq!(scene.vertex_count(), 6);
        assert_eq!(scene.mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(scene.mesh.positions[3], [100.0, -160.0, 5.0]);
        assert_eq!(scene.triangle_color(0), Some(red));
        assert_eq!(scene.triangle_color(1), Some(blue));
        assert_eq!(scene.colors.len(), scene.mesh.positions.len());

        let second: Vec<_> = scene.glyph_vertices(2).collect();
        assert_eq!(second.len(), 3);
        assert!(second.iter().all(|p| p[2] == 5.0));

        let b = scene.bounds();
        assert_eq!(b.min, [0.0, -160.0, 0.0]);
        assert_eq!(b.max, [101.0, 1.0, 5.0]);
    }

    #[test]
    fn unit_cube_volume() {
        // Two triangles per face, counter-clockwise from outside.
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            1, 2, 6, 1, 6, 5, // right
            2, 3, 7, 2, 7, 6, // back
            3, 0, 4, 3, 4, 7, // left
        ];
        let cube = Mesh3D { positions, indices };
        assert!((cube.signed_volume() - 1.0).abs() < 1e-9);
    }
}
