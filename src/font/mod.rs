//! Font module root.
//!
//! The pipeline reads glyph shapes as **vector outlines**:
//! - Load a face once per run, either from a caller-supplied file/bytes or by
//!   resolving a family name against the installed system fonts (`fontdb`).
//! - Walk glyph outlines (move_to/line_to/quad_to/curve_to) via `ttf-parser`.
//! - Flatten outlines into closed contours (`outline`).
//!
//! Anything that can walk a glyph outline implements [`GlyphOutlines`], so the
//! rest of the pipeline never touches `ttf-parser` directly.

pub mod outline;

use std::{fs, path::Path, sync::Arc};

use fontdb::{Database, Family, Query, Style, Weight};
use ttf_parser::OutlineBuilder;

/// Simplified font style selection used when resolving installed fonts.
#[derive(Debug, Clone)]
pub struct FontQuery {
    /// Preferred font family names, in priority order.
    /// Example: `["Noto Sans CJK SC", "SimHei", "sans-serif"]`
    pub families: Vec<String>,

    /// Weight in CSS-ish terms (100..900). 400 = regular, 700 = bold.
    pub weight: u16,

    /// Italic / oblique.
    pub italic: bool,
}

impl Default for FontQuery {
    fn default() -> Self {
        Self::family("sans-serif")
    }
}

impl FontQuery {
    /// Query a single family at regular weight.
    pub fn family(name: impl Into<String>) -> Self {
        Self {
            families: vec![name.into()],
            weight: 400,
            italic: false,
        }
    }
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("failed to read font file {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse font face: {0}")]
    ParseFailed(#[from] ttf_parser::FaceParsingError),

    #[error("font reports an invalid units-per-em value ({0})")]
    InvalidUnitsPerEm(u16),

    #[error("no outline for character {ch:?}")]
    MissingGlyph { ch: char },

    #[error("other: {0}")]
    Other(String),
}

/// A source of glyph outlines in font units.
///
/// `FontFace` is the production implementation. Tests and alternative front
/// ends can supply their own (e.g. procedurally drawn glyphs).
pub trait GlyphOutlines {
    /// Font units per em. Outlines are scaled by `size / units_per_em`.
    fn units_per_em(&self) -> f32;

    /// Feed the outline of `ch` into `builder`.
    ///
    /// Characters that exist but draw nothing (space) and characters missing
    /// from the face both return `FontError::MissingGlyph`.
    fn outline_char(&self, ch: char, builder: &mut dyn OutlineBuilder) -> Result<(), FontError>;
}

/// A loaded font face: the full file bytes plus the face index within it.
///
/// The face is parsed once on load to validate it; glyph lookups re-parse the
/// table directory, which is cheap with `ttf-parser`.
#[derive(Debug, Clone)]
pub struct FontFace {
    bytes: Arc<[u8]>,
    index: u32,
    units_per_em: f32,
}

impl FontFace {
    /// Load a face from in-memory font data (TTF/OTF/TTC).
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, index: u32) -> Result<Self, FontError> {
        let bytes = bytes.into();
        let parsed = ttf_parser::Face::parse(&bytes, index)?;

        let upm = parsed.units_per_em();
        if upm == 0 {
            return Err(FontError::InvalidUnitsPerEm(upm));
        }

        Ok(Self {
            units_per_em: upm as f32,
            bytes,
            index,
        })
    }

    /// Load a face from a font file on disk.
    pub fn from_path(path: impl AsRef<Path>, index: u32) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FontError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data, index)
    }

    /// Face index within a collection (0 for plain TTF/OTF).
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    fn parse(&self) -> Result<ttf_parser::Face<'_>, FontError> {
        Ok(ttf_parser::Face::parse(&self.bytes, self.index)?)
    }
}

impl GlyphOutlines for FontFace {
    fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    fn outline_char(&self, ch: char, builder: &mut dyn OutlineBuilder) -> Result<(), FontError> {
        let face = self.parse()?;
        let gid = face
            .glyph_index(ch)
            .ok_or(FontError::MissingGlyph { ch })?;

        // `outline_glyph` returns None when the glyph has no outline (e.g. space).
        face.outline_glyph(gid, builder)
            .map(|_| ())
            .ok_or(FontError::MissingGlyph { ch })
    }
}

/// Installed-font lookup backed by `fontdb`.
///
/// Only needed when the caller names a family instead of supplying a file.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Create a new font system and load system fonts.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();

        // `faces()` is an iterator; check emptiness by `next()`.
        if db.faces().next().is_none() {
            return Err(FontError::NoFontsAvailable);
        }

        Ok(Self { db })
    }

    /// Number of discovered faces.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve a `FontQuery` to a loaded face.
    ///
    /// Resolution strategy:
    /// - Try the named families in order with the requested weight/style.
    /// - Fall back to generic `serif`, then to the first face in the database.
    pub fn resolve(&self, query: &FontQuery) -> Result<FontFace, FontError> {
        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));

        let mut families: Vec<Family<'_>> = Vec::new();
        for f in &query.families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("serif") {
                families.push(Family::Serif);
            } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                families.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
                families.push(Family::Monospace);
            } else if !s.is_empty() {
                families.push(Family::Name(s));
            }
        }

        let id = self
            .db
            .query(&Query {
                families: &families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
            .or_else(|| {
                self.db.query(&Query {
                    families: &[Family::Serif],
                    weight,
                    style,
                    stretch: fontdb::Stretch::Normal,
                })
            })
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;

        if let Some(info) = self.db.face(id) {
            log::debug!(
                "resolved {:?} to {:?} (face {})",
                query.families,
                info.families.first().map(|(name, _)| name.as_str()),
                info.index
            );
        }

        self.db
            .with_face_data(id, |data, index| FontFace::from_bytes(data.to_vec(), index))
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?
    }
}
