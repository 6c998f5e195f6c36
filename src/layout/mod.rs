//! Staircase layout.
//!
//! Glyph `i` sits at `(i * step_x, -i * step_y)`: each character moves right
//! and drops down, giving the diagonal staircase. Colors cycle through a fixed
//! palette by index. Depth is a uniform random draw per glyph.
//!
//! Whitespace occupies an index slot (so it shifts everything after it and
//! advances the color cycle) but gets no depth and no geometry.
//!
//! The random source is injected. Depths are drawn in index order before any
//! geometry is built, so a seeded generator gives the same depths no matter
//! which glyphs later fail.

use rand::Rng;

use crate::config::GenerationRequest;
use crate::scene::Rgba;

/// Deep orange through indigo; cycled by glyph index.
pub const DEFAULT_PALETTE: [Rgba; 8] = [
    Rgba::opaque(255, 87, 34),
    Rgba::opaque(255, 152, 0),
    Rgba::opaque(255, 193, 7),
    Rgba::opaque(139, 195, 74),
    Rgba::opaque(76, 175, 80),
    Rgba::opaque(0, 150, 136),
    Rgba::opaque(33, 150, 243),
    Rgba::opaque(63, 81, 181),
];

/// Placement parameters for one glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphPlacement {
    pub index: usize,
    pub translation: [f64; 2],
    pub depth: f64,
    pub color: Rgba,
}

/// One character of the input with its placement, if it gets one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlannedGlyph {
    pub index: usize,
    pub ch: char,
    /// `None` for whitespace.
    pub placement: Option<GlyphPlacement>,
}

#[derive(Debug, Clone)]
pub struct StaircaseLayout {
    pub step_x: f64,
    pub step_y: f64,
    pub min_depth: f64,
    pub max_depth: f64,
    pub palette: Vec<Rgba>,
}

impl Default for StaircaseLayout {
    fn default() -> Self {
        Self::from_request(&GenerationRequest::default())
    }
}

impl StaircaseLayout {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            step_x: request.step_x as f64,
            step_y: request.step_y as f64,
            min_depth: request.min_depth,
            max_depth: request.max_depth,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }

    #[inline]
    pub fn translation(&self, index: usize) -> [f64; 2] {
        let i = index as f64;
        [i * self.step_x, -i * self.step_y]
    }

    /// Palette entry for `index`. An empty palette paints white.
    #[inline]
    pub fn color(&self, index: usize) -> Rgba {
        if self.palette.is_empty() {
            return Rgba::WHITE;
        }
        self.palette[index % self.palette.len()]
    }

    /// Uniform draw from `[min_depth, max_depth]`.
    ///
    /// The bounds are not clamped or reordered.
    pub fn draw_depth<R>(&self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        let t: f64 = rng.random();
        self.min_depth + (self.max_depth - self.min_depth) * t
    }

    pub fn place<R>(&self, index: usize, rng: &mut R) -> GlyphPlacement
    where
        R: Rng + ?Sized,
    {
        GlyphPlacement {
            index,
            translation: self.translation(index),
            depth: self.draw_depth(rng),
            color: self.color(index),
        }
    }

    /// Lay out every character of `text`, drawing depths in index order.
    pub fn plan<R>(&self, text: &str, rng: &mut R) -> Vec<PlannedGlyph>
    where
        R: Rng + ?Sized,
    {
        text.chars()
            .enumerate()
            .map(|(index, ch)| PlannedGlyph {
                index,
                ch,
                placement: (!is_blank(ch)).then(|| self.place(index, rng)),
            })
            .collect()
    }
}

/// Characters that trim to nothing.
///
/// Unicode `White_Space` plus the information separators U+001C..=U+001F,
/// which text front ends also strip as blanks.
#[inline]
pub fn is_blank(ch: char) -> bool {
    ch.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&ch)
}
