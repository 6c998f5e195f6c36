//! Planar region repair.
//!
//! Turns raw glyph contours into one valid planar region:
//! 1. drop degenerate contours,
//! 2. union them under nonzero winding (counters become holes),
//! 3. run the zero-width repair pass through the overlay engine,
//! 4. move the bounding-box minimum to the origin.
//!
//! Placement is applied later by the scene compositor, so every region starts
//! at (0, 0).

use std::panic::{self, AssertUnwindSafe};

use geo::{
    Area, BooleanOps, BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect, Translate,
};

use crate::font::outline::Contour;

/// Polygons with less area than this are overlay slivers, not glyph material.
const MIN_POLYGON_AREA: f64 = 1e-9;

/// A repaired, origin-normalized glyph shape.
///
/// The variant decides how the extruder splits the shape: a `Multi` region
/// is extruded one polygon at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanarRegion {
    Single(Polygon<f64>),
    Multi(Vec<Polygon<f64>>),
}

impl PlanarRegion {
    /// Component polygons, in overlay output order.
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            PlanarRegion::Single(p) => std::slice::from_ref(p),
            PlanarRegion::Multi(ps) => ps,
        }
    }

    #[inline]
    pub fn part_count(&self) -> usize {
        self.polygons().len()
    }

    /// Filled area (holes excluded).
    pub fn area(&self) -> f64 {
        self.polygons().iter().map(|p| p.unsigned_area()).sum()
    }

    /// Axis-aligned bounds. Always starts at the origin for repaired regions.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.to_multi_polygon().bounding_rect()
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons().to_vec())
    }

    /// Re-run union, repair and normalization on an already repaired region.
    ///
    /// Idempotent: bounds and area are unchanged up to float tolerance.
    pub fn renormalize(&self) -> Option<PlanarRegion> {
        let polygons = self.polygons().to_vec();
        guarded(|| {
            let unioned = polygons
                .into_iter()
                .fold(MultiPolygon::new(Vec::new()), |acc, p| {
                    acc.union(&MultiPolygon::new(vec![p]))
                });
            finish(unioned)
        })
    }
}

/// Build one repaired region from a glyph's contours.
///
/// Returns `None` when nothing drawable remains (no contours, only degenerate
/// contours, zero area) or when the overlay engine faults.
pub fn repair(contours: &[Contour]) -> Option<PlanarRegion> {
    let mut rings: Vec<(f64, Polygon<f64>)> = Vec::new();
    for contour in contours {
        if contour.is_degenerate() {
            continue;
        }
        if contour
            .points
            .iter()
            .any(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            log::warn!("dropping contour with non-finite coordinates");
            continue;
        }

        let ring: LineString<f64> = contour
            .points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        let polygon = Polygon::new(ring, Vec::new());
        rings.push((polygon.signed_area(), polygon));
    }

    if rings.is_empty() {
        return None;
    }

    guarded(|| finish(union_nonzero(rings)))
}

/// Union contours under the nonzero winding rule.
///
/// The plane is kept as disjoint cells, each tagged with its winding number.
/// Every contour splits the cells it overlaps and shifts the winding inside
/// by +1 (counter-clockwise) or -1 (clockwise). Material is every cell with a
/// nonzero winding, so outer-contour direction (TrueType or CFF) does not
/// matter and overlapping same-direction strokes survive inside counters.
fn union_nonzero(rings: Vec<(f64, Polygon<f64>)>) -> MultiPolygon<f64> {
    let mut cells: Vec<(i32, MultiPolygon<f64>)> = Vec::new();

    for (signed_area, polygon) in rings {
        let delta = if signed_area < 0.0 { -1 } else { 1 };
        // Self-union resolves a self-intersecting contour before it is used
        // as an overlay operand.
        let piece = MultiPolygon::new(vec![polygon]).union(&MultiPolygon::new(Vec::new()));

        let mut next = Vec::with_capacity(cells.len() + 1);
        let mut uncovered = piece.clone();
        for (winding, cell) in cells {
            uncovered = uncovered.difference(&cell);
            push_cell(&mut next, winding + delta, cell.intersection(&piece));
            push_cell(&mut next, winding, cell.difference(&piece));
        }
        push_cell(&mut next, delta, uncovered);
        cells = next;
    }

    cells
        .into_iter()
        .filter(|(winding, _)| *winding != 0)
        .fold(MultiPolygon::new(Vec::new()), |acc, (_, cell)| acc.union(&cell))
}

/// Add `area` to the cell with `winding`, merging cells that share a winding.
fn push_cell(cells: &mut Vec<(i32, MultiPolygon<f64>)>, winding: i32, area: MultiPolygon<f64>) {
    if area.unsigned_area() <= MIN_POLYGON_AREA {
        return;
    }
    match cells.iter_mut().find(|(w, _)| *w == winding) {
        Some((_, cell)) => *cell = cell.union(&area),
        None => cells.push((winding, area)),
    }
}

/// Zero-width repair pass, emptiness check and origin normalization.
fn finish(unioned: MultiPolygon<f64>) -> Option<PlanarRegion> {
    // Self-union through the overlay engine: the zero-distance buffer. It
    // re-nodes crossing edges and drops collapsed rings.
    let repaired = unioned.union(&MultiPolygon::new(Vec::new()));

    let polygons: Vec<Polygon<f64>> = repaired
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > MIN_POLYGON_AREA)
        .collect();
    if polygons.is_empty() {
        return None;
    }

    let region = MultiPolygon::new(polygons);
    let bounds = region.bounding_rect()?;
    let min = bounds.min();
    if !(min.x.is_finite() && min.y.is_finite()) {
        return None;
    }

    let mut normalized = region.translate(-min.x, -min.y).0;
    if normalized.len() == 1 {
        normalized.pop().map(PlanarRegion::Single)
    } else {
        Some(PlanarRegion::Multi(normalized))
    }
}

/// Run a geometry step, converting an overlay-engine panic into `None`.
fn guarded<F>(f: F) -> Option<PlanarRegion>
where
    F: FnOnce() -> Option<PlanarRegion>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(region) => region,
        Err(_) => {
            log::warn!("polygon overlay faulted; dropping region");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Line;
    use geo::line_intersection::line_intersection;

    pub(crate) fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        // Counter-clockwise.
        Contour::new(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
    }

    pub(crate) fn rect_cw(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        Contour::new(vec![[x0, y0], [x0, y1], [x1, y1], [x1, y0]])
    }

    fn segments(polygon: &Polygon<f64>) -> Vec<Line<f64>> {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.lines().collect::<Vec<_>>())
            .collect()
    }

    /// No two edges cross except where they share an endpoint.
    pub(crate) fn assert_simple(region: &PlanarRegion) {
        for polygon in region.polygons() {
            let segs = segments(polygon);
            for (i, a) in segs.iter().enumerate() {
                for b in &segs[i + 1..] {
                    let shared = [a.start, a.end].iter().any(|p| *p == b.start || *p == b.end);
                    if shared {
                        continue;
                    }
                    assert!(
                        line_intersection(*a, *b).is_none(),
                        "edges {a:?} and {b:?} intersect"
                    );
                }
            }
        }
    }

    fn assert_at_origin(region: &PlanarRegion) {
        let b = region.bounds().expect("bounds");
        assert_eq!(b.min().x, 0.0);
        assert_eq!(b.min().y, 0.0);
    }

    #[test]
    fn single_contour_is_normalized_to_origin() {
        let region = repair(&[rect(10.0, 20.0, 30.0, 50.0)]).expect("region");
        assert!(matches!(region, PlanarRegion::Single(_)));
        assert_at_origin(&region);
        let b = region.bounds().unwrap();
        assert_relative_eq!(b.max().x, 20.0, max_relative = 1e-6);
        assert_relative_eq!(b.max().y, 30.0, max_relative = 1e-6);
        assert_relative_eq!(region.area(), 600.0, max_relative = 1e-6);
    }

    #[test]
    fn counter_with_opposite_winding_becomes_a_hole() {
        // TrueType convention: clockwise outer, counter-clockwise counter.
        let region = repair(&[rect_cw(0.0, 0.0, 10.0, 10.0), rect(3.0, 3.0, 7.0, 7.0)])
            .expect("region");
        let PlanarRegion::Single(polygon) = &region else {
            panic!("expected a single polygon, got {region:?}");
        };
        assert_eq!(polygon.interiors().len(), 1);
        assert_relative_eq!(region.area(), 100.0 - 16.0, max_relative = 1e-6);
        assert_simple(&region);
    }

    #[test]
    fn island_inside_counter_survives() {
        let region = repair(&[
            rect(0.0, 0.0, 20.0, 20.0),
            rect_cw(2.0, 2.0, 18.0, 18.0),
            rect(8.0, 8.0, 12.0, 12.0),
        ])
        .expect("region");
        assert_eq!(region.part_count(), 2);
        assert_relative_eq!(region.area(), 400.0 - 256.0 + 16.0, max_relative = 1e-6);
    }

    #[test]
    fn bar_across_a_counter_keeps_nonzero_winding() {
        // Outer and bar clockwise, counter counter-clockwise. Inside the
        // counter the bar winds -1 + 1 - 1 = -1, so it stays filled.
        let region = repair(&[
            rect_cw(0.0, 0.0, 100.0, 100.0),
            rect(30.0, 30.0, 70.0, 70.0),
            rect_cw(0.0, 40.0, 100.0, 60.0),
        ])
        .expect("region");
        assert_relative_eq!(region.area(), 10_000.0 - 1_600.0 + 800.0, max_relative = 1e-6);
        assert_eq!(region.part_count(), 1);
        assert_simple(&region);
    }

    #[test]
    fn doubled_winding_is_still_filled_once() {
        let region = repair(&[rect(0.0, 0.0, 10.0, 10.0), rect(0.0, 0.0, 10.0, 10.0)])
            .expect("region");
        assert_relative_eq!(region.area(), 100.0, max_relative = 1e-6);
    }

    #[test]
    fn overlapping_strokes_merge() {
        let region =
            repair(&[rect(0.0, 0.0, 10.0, 2.0), rect(4.0, -5.0, 6.0, 7.0)]).expect("region");
        assert!(matches!(region, PlanarRegion::Single(_)));
        assert_relative_eq!(region.area(), 20.0 + 24.0 - 4.0, max_relative = 1e-6);
        assert_at_origin(&region);
        assert_simple(&region);
    }

    #[test]
    fn disjoint_contours_form_a_multi_region() {
        let region =
            repair(&[rect(0.0, 0.0, 2.0, 10.0), rect(0.0, 12.0, 2.0, 14.0)]).expect("region");
        assert!(matches!(region, PlanarRegion::Multi(ref ps) if ps.len() == 2));
        assert_at_origin(&region);
    }

    #[test]
    fn self_intersecting_contour_is_repaired() {
        // Bow tie: the two lobes cross at (5, 5).
        let bowtie = Contour::new(vec![[0.0, 0.0], [10.0, 10.0], [10.0, 0.0], [0.0, 10.0]]);
        let region = repair(&[bowtie]).expect("region");
        assert_simple(&region);
        assert_at_origin(&region);
        assert_relative_eq!(region.area(), 50.0, max_relative = 1e-6);
    }

    #[test]
    fn degenerate_input_yields_none() {
        assert!(repair(&[]).is_none());
        assert!(repair(&[Contour::new(vec![[0.0, 0.0], [1.0, 1.0]])]).is_none());
        // Collinear: three points, zero area.
        assert!(repair(&[Contour::new(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]])]).is_none());
    }

    #[test]
    fn non_finite_contours_are_dropped() {
        let bad = Contour::new(vec![[0.0, 0.0], [f64::NAN, 1.0], [2.0, 2.0]]);
        assert!(repair(&[bad.clone()]).is_none());
        let region = repair(&[bad, rect(5.0, 5.0, 6.0, 6.0)]).expect("region");
        assert_relative_eq!(region.area(), 1.0, max_relative = 1e-6);
    }

    #[test]
    fn renormalize_is_idempotent() {
        let region = repair(&[
            rect_cw(3.0, 4.0, 13.0, 14.0),
            rect(6.0, 7.0, 9.0, 10.0),
            rect(20.0, 4.0, 22.0, 6.0),
        ])
        .expect("region");
        let again = region.renormalize().expect("renormalized");

        let (a, b) = (region.bounds().unwrap(), again.bounds().unwrap());
        assert_eq!(a.min(), b.min());
        assert_relative_eq!(a.max().x, b.max().x, max_relative = 1e-6);
        assert_relative_eq!(a.max().y, b.max().y, max_relative = 1e-6);
        assert_relative_eq!(region.area(), again.area(), max_relative = 1e-6);
        assert_eq!(region.part_count(), again.part_count());
    }
}
