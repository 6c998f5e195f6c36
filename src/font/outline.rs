//! Glyph outline extraction.
//!
//! - Walk a glyph outline through `ttf_parser::OutlineBuilder` callbacks.
//! - Collect the callbacks into a `lyon::path::Path` (curves kept exact).
//! - Flatten the path into closed polylines, one [`Contour`] per `move_to`.
//!
//! Output coordinates are font units scaled by `size / units_per_em`, so one em
//! spans `size` units. Y is up, as authored in the font.
//!
//! Extraction never fails: a missing glyph, an empty outline (space) or a
//! font fault all yield an empty contour list.

use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};

use super::{FontError, GlyphOutlines};

/// Maximum distance between a curve and its flattened polyline, in output units.
pub const DEFAULT_FLATTEN_TOLERANCE: f64 = 0.05;

/// One closed loop of a glyph outline. The closing edge is implicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Fewer than 3 points cannot bound any area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }
}

/// Extract the contours of `ch` at `size` with the default flattening tolerance.
pub fn extract<G>(glyphs: &G, ch: char, size: f64) -> Vec<Contour>
where
    G: GlyphOutlines + ?Sized,
{
    extract_with_tolerance(glyphs, ch, size, DEFAULT_FLATTEN_TOLERANCE)
}

/// Extract the contours of `ch` at `size`, flattening curves to `tolerance`.
pub fn extract_with_tolerance<G>(glyphs: &G, ch: char, size: f64, tolerance: f64) -> Vec<Contour>
where
    G: GlyphOutlines + ?Sized,
{
    let upm = glyphs.units_per_em() as f64;
    if !(upm > 0.0 && size > 0.0 && size.is_finite()) {
        log::warn!("cannot extract {ch:?}: size={size}, units_per_em={upm}");
        return Vec::new();
    }
    let scale = size / upm;

    let path = match outline_path(glyphs, ch) {
        Ok(path) => path,
        Err(FontError::MissingGlyph { .. }) => {
            log::debug!("{ch:?} has no outline");
            return Vec::new();
        }
        Err(e) => {
            log::warn!("outline extraction failed for {ch:?}: {e}");
            return Vec::new();
        }
    };

    // Tolerance is given in output units; the path is still in font units.
    let tolerance_fu = (tolerance.max(1e-4) / scale) as f32;
    flatten_contours(&path, scale, tolerance_fu)
}

/// Walk the outline of `ch` into a lyon path in font units.
pub fn outline_path<G>(glyphs: &G, ch: char) -> Result<Path, FontError>
where
    G: GlyphOutlines + ?Sized,
{
    let mut builder = LyonOutlineBuilder::new();
    glyphs.outline_char(ch, &mut builder)?;
    Ok(builder.build())
}

fn flatten_contours(path: &Path, scale: f64, tolerance: f32) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();

    let push = |points: &mut Vec<[f64; 2]>, x: f32, y: f32| {
        let p = [x as f64 * scale, y as f64 * scale];
        if !(p[0].is_finite() && p[1].is_finite()) {
            return;
        }
        if points.last() != Some(&p) {
            points.push(p);
        }
    };

    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current.clear();
                push(&mut current, at.x, at.y);
            }
            PathEvent::Line { to, .. } => push(&mut current, to.x, to.y),
            PathEvent::End { .. } => {
                // The closing edge is implicit; drop an explicit repeat of the start.
                if current.len() > 1 && current.first() == current.last() {
                    current.pop();
                }
                contours.push(Contour::new(std::mem::take(&mut current)));
            }
            _ => {}
        }
    }

    contours
}

/// Convert `ttf-parser` outline callbacks into a `lyon::path::Path`.
///
/// A glyph may contain multiple contours. `move_to` starts a new contour and
/// `close` ends the current one.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(point(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.line_to(point(x, y));
        }
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        if self.contour_open {
            self.builder.quadratic_bezier_to(point(x1, y1), point(x, y));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        if self.contour_open {
            self.builder
                .cubic_bezier_to(point(x1, y1), point(x2, y2), point(x, y));
        }
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}
