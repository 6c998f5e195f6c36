//! Polygon cap triangulation.
//!
//! This module converts one repaired polygon (exterior + holes) into the
//! triangles of a flat cap using `lyon::tessellation::FillTessellator`.
//!
//! The extruder needs caps whose boundary vertices are *the same vertices* as
//! the side walls, so every output vertex is traced back to the ring point it
//! came from via `FillVertex::sources()`. Only vertices the tessellator
//! invents (edge intersections, which a repaired polygon should not have) are
//! appended as extras.
//!
//! Notes:
//! - Rings are oriented exterior counter-clockwise, holes clockwise.
//! - Even-odd is enough here: the repairer already resolved nesting.
//! - Output triangles are counter-clockwise seen from +z.

use std::collections::HashMap;

use geo::Polygon;
use geo::orient::{Direction, Orient};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    TessellationError, VertexBuffers, VertexSource,
};

/// Tessellation options for caps.
///
/// - `tolerance`: only matters for curved input; rings are already polylines.
/// - `fill_rule`: EvenOdd by default; holes are separate rings.
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::EvenOdd,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TessellateError {
    #[error("exterior ring has fewer than 3 distinct points")]
    DegenerateExterior,

    #[error("lyon tessellation failed: {0:?}")]
    Lyon(TessellationError),

    #[error("tessellation produced no triangles")]
    EmptyCap,
}

/// A polygon's rings over one shared vertex list.
///
/// `rings[0]` is the exterior. Consecutive entries of a ring are joined by an
/// edge, and the last joins back to the first. Coincident positions share
/// one vertex, so a ring that pinches (a hole touching the exterior) uses the
/// same index on both sides of the pinch, like the tessellator does.
#[derive(Debug, Clone, Default)]
pub struct RingSet {
    pub vertices: Vec<[f32; 2]>,
    pub rings: Vec<Vec<u32>>,
    lookup: HashMap<(u32, u32), u32>,
}

impl RingSet {
    pub fn from_polygon(polygon: &Polygon<f64>) -> Result<Self, TessellateError> {
        let oriented = polygon.orient(Direction::Default);
        let mut set = RingSet::default();

        let exterior = ring_points(oriented.exterior().0.iter().map(|c| [c.x, c.y]));
        if exterior.len() < 3 {
            return Err(TessellateError::DegenerateExterior);
        }
        set.push_ring(exterior);

        for interior in oriented.interiors() {
            let hole = ring_points(interior.0.iter().map(|c| [c.x, c.y]));
            if hole.len() < 3 {
                log::debug!("skipping collapsed hole ring ({} points)", hole.len());
                continue;
            }
            set.push_ring(hole);
        }

        Ok(set)
    }

    fn push_ring(&mut self, points: Vec<[f32; 2]>) {
        let ring = points.into_iter().map(|p| self.vertex(p)).collect();
        self.rings.push(ring);
    }

    fn vertex(&mut self, [x, y]: [f32; 2]) -> u32 {
        // `+ 0.0` folds -0.0 into 0.0 so both hash alike.
        let key = ((x + 0.0).to_bits(), (y + 0.0).to_bits());
        let next = self.vertices.len() as u32;
        *self.lookup.entry(key).or_insert_with(|| {
            self.vertices.push([x, y]);
            next
        })
    }

    /// Ring edges as `(from, to)` vertex indices.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rings.iter().flat_map(|ring| {
            let len = ring.len();
            (0..len).map(move |k| (ring[k], ring[(k + 1) % len]))
        })
    }
}

/// Drop the closing repeat and consecutive duplicates after narrowing to f32.
fn ring_points(coords: impl Iterator<Item = [f64; 2]>) -> Vec<[f32; 2]> {
    let mut out: Vec<[f32; 2]> = Vec::new();
    for [x, y] in coords {
        let p = [x as f32, y as f32];
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// A triangulated cap.
///
/// `vertices` starts with `RingSet::vertices` (same order, same indices);
/// tessellator-created vertices follow.
#[derive(Debug, Clone)]
pub struct Cap {
    pub vertices: Vec<[f32; 2]>,
    pub triangles: Vec<[u32; 3]>,
}

/// Maps lyon output vertices back to ring vertex indices.
struct CapVertexCtor<'a> {
    endpoints: &'a HashMap<u32, u32>,
    base: u32,
    extra: &'a mut Vec<[f32; 2]>,
}

impl FillVertexConstructor<u32> for CapVertexCtor<'_> {
    fn new_vertex(&mut self, v: FillVertex) -> u32 {
        let known = v.sources().find_map(|source| match source {
            VertexSource::Endpoint { id } => self.endpoints.get(&id.0).copied(),
            _ => None,
        });

        known.unwrap_or_else(|| {
            let p = v.position();
            self.extra.push([p.x, p.y]);
            self.base + (self.extra.len() - 1) as u32
        })
    }
}

/// Triangulate the area bounded by `rings`.
pub fn triangulate_cap(rings: &RingSet, opts: TessellateOptions) -> Result<Cap, TessellateError> {
    let mut builder = Path::builder();
    let mut endpoints: HashMap<u32, u32> = HashMap::new();

    for ring in &rings.rings {
        for (k, &vi) in ring.iter().enumerate() {
            let [x, y] = rings.vertices[vi as usize];
            let id = if k == 0 {
                builder.begin(point(x, y))
            } else {
                builder.line_to(point(x, y))
            };
            endpoints.insert(id.0, vi);
        }
        builder.close();
    }
    let path = builder.build();

    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<u32, u32> = VertexBuffers::new();
    let mut extra = Vec::new();
    let fill = FillOptions::tolerance(opts.tolerance).with_fill_rule(opts.fill_rule);

    let ctor = CapVertexCtor {
        endpoints: &endpoints,
        base: rings.vertices.len() as u32,
        extra: &mut extra,
    };
    // Walk by id so `VertexSource::Endpoint` ids are the builder's ids.
    tess.tessellate_with_ids(
        path.id_iter(),
        &path,
        None,
        &fill,
        &mut BuffersBuilder::new(&mut buffers, ctor),
    )
    .map_err(TessellateError::Lyon)?;

    let mut vertices = rings.vertices.clone();
    vertices.extend(extra);

    let triangles: Vec<[u32; 3]> = buffers
        .indices
        .chunks_exact(3)
        .map(|t| {
            [
                buffers.vertices[t[0] as usize],
                buffers.vertices[t[1] as usize],
                buffers.vertices[t[2] as usize],
            ]
        })
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .map(|t| counter_clockwise(&vertices, t))
        .collect();

    if triangles.is_empty() {
        return Err(TessellateError::EmptyCap);
    }

    Ok(Cap {
        vertices,
        triangles,
    })
}

fn counter_clockwise(vertices: &[[f32; 2]], [a, b, c]: [u32; 3]) -> [u32; 3] {
    let (pa, pb, pc) = (
        vertices[a as usize],
        vertices[b as usize],
        vertices[c as usize],
    );
    let cross = (pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0]);
    if cross < 0.0 { [a, c, b] } else { [a, b, c] }
}
