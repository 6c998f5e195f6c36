//! `glyphstair` library crate root.
//!
//! Turns a short string into a staircase of extruded, colored glyph solids and
//! writes them out as binary glTF.
//!
//! This crate is intended to be used primarily as a **library**. The binary
//! target stays thin and calls into these exported entrypoints.
//!
//! Pipeline, one module per stage:
//! - `font`: load a face, walk and flatten glyph outlines
//! - `geometry`: repair contours into a planar region, extrude it
//! - `layout`: staircase translation, palette color, random depth
//! - `scene`: merge every part into one colored mesh
//! - `export`: `.glb` writer
//!
//! `pipeline::generate` drives the stages for one request. Modules stay public
//! so callers can assemble their own variations.

pub mod config;
pub mod export;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod pipeline;
pub mod scene;

use std::path::Path;

use anyhow::Context;
use rand::Rng;

pub use config::GenerationRequest;
pub use font::{FontFace, GlyphOutlines};
pub use pipeline::{BatchReport, Generation, generate};

/// Generate a scene for `request` and write it to `out` as `.glb`.
///
/// Convenience wrapper over [`generate`] + [`export::export_glb`] for callers
/// that only want a file. Returns the per-glyph report.
///
/// Note: This function does **not** initialize logging.
pub fn generate_to_file<G, R>(
    glyphs: &G,
    request: &GenerationRequest,
    rng: &mut R,
    out: impl AsRef<Path>,
) -> anyhow::Result<BatchReport>
where
    G: GlyphOutlines + ?Sized,
    R: Rng + ?Sized,
{
    let out = out.as_ref();
    let Generation { scene, report } = generate(glyphs, request, rng)?;
    export::export_glb(&scene, out).with_context(|| format!("writing {}", out.display()))?;
    Ok(report)
}
