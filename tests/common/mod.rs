//! Synthetic block-letter font shared by the integration tests.
//!
//! Outlines are in font units (1000 per em, y up) with TrueType winding:
//! outer contours clockwise, counters counter-clockwise.

#![allow(dead_code)]

use glyphstair::font::{FontError, GlyphOutlines};
use ttf_parser::OutlineBuilder;

pub const UNITS_PER_EM: f32 = 1000.0;

/// - `A`: block with a square counter
/// - `B`: two overlapping bars that must merge into one part
/// - `i`, `:`: two disjoint pieces each
/// - `O`: curved ring (quadratic segments)
/// - `-`: a two-point contour that cannot form a region
/// - `?`: fails like a corrupt glyph table
/// - anything else: no glyph
pub struct BlockFont;

fn rect_cw(b: &mut dyn OutlineBuilder, x0: f32, y0: f32, x1: f32, y1: f32) {
    b.move_to(x0, y0);
    b.line_to(x0, y1);
    b.line_to(x1, y1);
    b.line_to(x1, y0);
    b.close();
}

fn rect_ccw(b: &mut dyn OutlineBuilder, x0: f32, y0: f32, x1: f32, y1: f32) {
    b.move_to(x0, y0);
    b.line_to(x1, y0);
    b.line_to(x1, y1);
    b.line_to(x0, y1);
    b.close();
}

/// Circle of radius `r` around `(cx, cy)` from four quadratic arcs.
fn ring(b: &mut dyn OutlineBuilder, cx: f32, cy: f32, r: f32, clockwise: bool) {
    b.move_to(cx - r, cy);
    // Control points sit on the corners of the circumscribed square.
    if clockwise {
        b.quad_to(cx - r, cy + r, cx, cy + r);
        b.quad_to(cx + r, cy + r, cx + r, cy);
        b.quad_to(cx + r, cy - r, cx, cy - r);
        b.quad_to(cx - r, cy - r, cx - r, cy);
    } else {
        b.quad_to(cx - r, cy - r, cx, cy - r);
        b.quad_to(cx + r, cy - r, cx + r, cy);
        b.quad_to(cx + r, cy + r, cx, cy + r);
        b.quad_to(cx - r, cy + r, cx - r, cy);
    }
    b.close();
}

impl GlyphOutlines for BlockFont {
    fn units_per_em(&self) -> f32 {
        UNITS_PER_EM
    }

    fn outline_char(&self, ch: char, b: &mut dyn OutlineBuilder) -> Result<(), FontError> {
        match ch {
            'A' => {
                rect_cw(b, 0.0, 0.0, 600.0, 700.0);
                rect_ccw(b, 200.0, 300.0, 400.0, 500.0);
            }
            'B' => {
                rect_cw(b, 0.0, 0.0, 400.0, 700.0);
                rect_cw(b, 200.0, 200.0, 600.0, 500.0);
            }
            'i' => {
                rect_cw(b, 0.0, 0.0, 200.0, 500.0);
                rect_cw(b, 0.0, 600.0, 200.0, 800.0);
            }
            ':' => {
                rect_cw(b, 0.0, 0.0, 200.0, 200.0);
                rect_cw(b, 0.0, 400.0, 200.0, 600.0);
            }
            'O' => {
                ring(b, 400.0, 400.0, 400.0, true);
                ring(b, 400.0, 400.0, 200.0, false);
            }
            '-' => {
                b.move_to(0.0, 300.0);
                b.line_to(500.0, 300.0);
                b.close();
            }
            '?' => return Err(FontError::Other("corrupt glyph table".into())),
            _ => return Err(FontError::MissingGlyph { ch }),
        }
        Ok(())
    }
}
