//! Linear extrusion of planar regions into closed solids.
//!
//! Each polygon becomes one watertight part:
//! - bottom cap at z = 0, facing -z
//! - top cap at z = height, facing +z
//! - one quad per ring edge for the walls
//!
//! Caps and walls index the same ring vertices, so every directed edge of a
//! part is matched by its reverse and the part is closed. Where a hole
//! touches the exterior the ring passes its pinch vertex twice; that vertex's
//! vertical edge is then shared by two wall quads.

use std::panic::{self, AssertUnwindSafe};

use geo::Polygon;

use super::region::PlanarRegion;
use super::tessellate::{RingSet, TessellateError, TessellateOptions, triangulate_cap};
use crate::scene::Mesh3D;

/// One extruded part of a glyph.
#[derive(Debug, Clone)]
pub struct Solid {
    pub mesh: Mesh3D,
    pub height: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum ExtrudeError {
    #[error("extrusion height must be positive and finite, got {0}")]
    InvalidHeight(f64),

    #[error(transparent)]
    Tessellate(#[from] TessellateError),

    #[error("extrusion panicked")]
    Panicked,
}

/// Extrude every polygon of `region` to `height`.
///
/// A `Single` region yields one part; a `Multi` region yields one part per
/// polygon, all with the same height. Parts that fail are dropped and logged.
pub fn extrude(region: &PlanarRegion, height: f64) -> Vec<Solid> {
    if !(height.is_finite() && height > 0.0) {
        log::warn!("{}", ExtrudeError::InvalidHeight(height));
        return Vec::new();
    }

    match region {
        PlanarRegion::Single(polygon) => extrude_guarded(polygon, height, 0).into_iter().collect(),
        PlanarRegion::Multi(polygons) => polygons
            .iter()
            .enumerate()
            .filter_map(|(i, polygon)| extrude_guarded(polygon, height, i))
            .collect(),
    }
}

fn extrude_guarded(polygon: &Polygon<f64>, height: f64, part: usize) -> Option<Solid> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| extrude_polygon(polygon, height)))
        .unwrap_or(Err(ExtrudeError::Panicked));

    match result {
        Ok(solid) => Some(solid),
        Err(e) => {
            log::warn!("dropping part {part}: {e}");
            None
        }
    }
}

/// Extrude a single polygon (holes allowed) into a closed mesh.
pub fn extrude_polygon(polygon: &Polygon<f64>, height: f64) -> Result<Solid, ExtrudeError> {
    if !(height.is_finite() && height > 0.0) {
        return Err(ExtrudeError::InvalidHeight(height));
    }
    let h = height as f32;

    let rings = RingSet::from_polygon(polygon)?;
    let cap = triangulate_cap(&rings, TessellateOptions::default())?;

    // Bottom layer [0, n), top layer [n, 2n).
    let n = cap.vertices.len() as u32;
    let mut positions = Vec::with_capacity(cap.vertices.len() * 2);
    positions.extend(cap.vertices.iter().map(|&[x, y]| [x, y, 0.0]));
    positions.extend(cap.vertices.iter().map(|&[x, y]| [x, y, h]));

    let wall_tris = rings.edges().count() * 2;
    let mut indices = Vec::with_capacity((cap.triangles.len() * 2 + wall_tris) * 3);

    for &[a, b, c] in &cap.triangles {
        indices.extend_from_slice(&[a, c, b]);
        indices.extend_from_slice(&[a + n, b + n, c + n]);
    }

    // Exterior is counter-clockwise and holes clockwise, so the right-hand
    // side of every edge faces out of the material.
    for (a, b) in rings.edges() {
        indices.extend_from_slice(&[a, b, b + n]);
        indices.extend_from_slice(&[a, b + n, a + n]);
    }

    Ok(Solid {
        mesh: Mesh3D { positions, indices },
        height: h,
    })
}
