//! Text → scene pipeline.
//!
//! For each character of the request:
//! - layout assigns translation, color and depth (whitespace: skipped)
//! - extract the glyph contours at `font_size`
//! - repair them into one planar region
//! - extrude every polygon of the region to the glyph depth
//!
//! All parts then go to the compositor in index order. A bad glyph only
//! costs its own slot; the run fails only if nothing at all was built.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use rand::Rng;

use crate::config::GenerationRequest;
use crate::font::GlyphOutlines;
use crate::font::outline::extract;
use crate::geometry::{extrude, repair};
use crate::layout::{GlyphPlacement, StaircaseLayout};
use crate::scene::{self, Scene, ScenePart};

/// Why a glyph contributed nothing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GlyphFailure {
    #[error("font has no outline for this character")]
    NoOutline,

    #[error("outline did not repair into a usable region")]
    NoRegion,

    #[error("every part failed to extrude")]
    NoSolids,

    #[error("geometry code panicked")]
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphOutcome {
    /// Geometry produced; `parts` solids were added to the scene.
    Built { parts: usize },
    /// Whitespace: no geometry expected.
    Skipped,
    Failed(GlyphFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphReport {
    pub index: usize,
    pub ch: char,
    pub placement: Option<GlyphPlacement>,
    pub outcome: GlyphOutcome,
}

/// Per-character outcome of one run, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub glyphs: Vec<GlyphReport>,
}

impl BatchReport {
    pub fn built(&self) -> usize {
        self.count(|o| matches!(o, GlyphOutcome::Built { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, GlyphOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, GlyphOutcome::Failed(_)))
    }

    /// Total solid parts across all glyphs.
    pub fn parts(&self) -> usize {
        self.glyphs
            .iter()
            .map(|g| match g.outcome {
                GlyphOutcome::Built { parts } => parts,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, f: impl Fn(&GlyphOutcome) -> bool) -> usize {
        self.glyphs.iter().filter(|g| f(&g.outcome)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} glyphs: {} built ({} parts), {} skipped, {} failed",
            self.glyphs.len(),
            self.built(),
            self.parts(),
            self.skipped(),
            self.failed()
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("generation failed: no glyph produced geometry ({report})")]
    EmptyScene { report: BatchReport },
}

/// A successful run: the merged scene plus what happened to each character.
#[derive(Debug, Clone)]
pub struct Generation {
    pub scene: Scene,
    pub report: BatchReport,
}

/// Run the whole pipeline for one request.
///
/// `rng` supplies the per-glyph depths. Pass a seeded generator for
/// reproducible output.
pub fn generate<G, R>(
    glyphs: &G,
    request: &GenerationRequest,
    rng: &mut R,
) -> Result<Generation, PipelineError>
where
    G: GlyphOutlines + ?Sized,
    R: Rng + ?Sized,
{
    let layout = StaircaseLayout::from_request(request);
    let plan = layout.plan(&request.text, rng);

    let mut parts = Vec::new();
    let mut report = BatchReport::default();

    for planned in plan {
        let outcome = match planned.placement {
            None => GlyphOutcome::Skipped,
            Some(placement) => {
                let built = panic::catch_unwind(AssertUnwindSafe(|| {
                    build_glyph(glyphs, planned.ch, request.font_size, &placement)
                }))
                .unwrap_or(Err(GlyphFailure::Panicked));
                match built {
                    Ok(mut built) => {
                        let n = built.len();
                        parts.append(&mut built);
                        GlyphOutcome::Built { parts: n }
                    }
                    Err(reason) => {
                        log::warn!(
                            "skipping {:?} at index {}: {reason}",
                            planned.ch,
                            planned.index
                        );
                        GlyphOutcome::Failed(reason)
                    }
                }
            }
        };

        log::debug!("glyph {} {:?}: {:?}", planned.index, planned.ch, outcome);
        report.glyphs.push(GlyphReport {
            index: planned.index,
            ch: planned.ch,
            placement: planned.placement,
            outcome,
        });
    }

    match scene::compose(parts) {
        Ok(scene) => {
            log::info!("{report}; scene has {} triangles", scene.triangle_count());
            Ok(Generation { scene, report })
        }
        Err(scene::SceneError::Empty) => Err(PipelineError::EmptyScene { report }),
    }
}

/// Extract, repair and extrude one glyph.
fn build_glyph<G>(
    glyphs: &G,
    ch: char,
    size: f64,
    placement: &GlyphPlacement,
) -> Result<Vec<ScenePart>, GlyphFailure>
where
    G: GlyphOutlines + ?Sized,
{
    let contours = extract(glyphs, ch, size);
    if contours.is_empty() {
        return Err(GlyphFailure::NoOutline);
    }

    let region = repair(&contours).ok_or(GlyphFailure::NoRegion)?;

    let solids = extrude(&region, placement.depth);
    if solids.is_empty() {
        return Err(GlyphFailure::NoSolids);
    }

    Ok(solids
        .into_iter()
        .map(|solid| ScenePart {
            glyph_index: placement.index,
            mesh: solid.mesh,
            translation: placement.translation,
            color: placement.color,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ttf_parser::OutlineBuilder;

    /// Every non-space character is a unit square, except 'x' which is broken
    /// and 'p' which panics.
    struct Squares;

    impl GlyphOutlines for Squares {
        fn units_per_em(&self) -> f32 {
            1.0
        }

        fn outline_char(&self, ch: char, b: &mut dyn OutlineBuilder) -> Result<(), FontError> {
            match ch {
                ' ' => Err(FontError::MissingGlyph { ch }),
                'x' => Err(FontError::Other("bad glyph".into())),
                'p' => panic!("outline walker blew up"),
                _ => {
                    b.move_to(0.0, 0.0);
                    b.line_to(1.0, 0.0);
                    b.line_to(1.0, 1.0);
                    b.line_to(0.0, 1.0);
                    b.close();
                    Ok(())
                }
            }
        }
    }

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let generation =
            generate(&Squares, &request("axb c"), &mut StdRng::seed_from_u64(3)).unwrap();
        let outcomes: Vec<_> = generation.report.glyphs.iter().map(|g| &g.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                &GlyphOutcome::Built { parts: 1 },
                &GlyphOutcome::Failed(GlyphFailure::NoOutline),
                &GlyphOutcome::Built { parts: 1 },
                &GlyphOutcome::Skipped,
                &GlyphOutcome::Built { parts: 1 },
            ]
        );
        assert_eq!(generation.scene.parts.len(), 3);
        assert_eq!(
            generation.report.to_string(),
            "5 glyphs: 3 built (3 parts), 1 skipped, 1 failed"
        );
    }

    #[test]
    fn all_failures_are_an_empty_scene() {
        let err = generate(&Squares, &request("x x"), &mut StdRng::seed_from_u64(0)).unwrap_err();
        let PipelineError::EmptyScene { report } = err;
        assert_eq!(report.failed(), 2);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn panicking_glyph_is_contained() {
        let generation =
            generate(&Squares, &request("apa"), &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(
            generation.report.glyphs[1].outcome,
            GlyphOutcome::Failed(GlyphFailure::Panicked)
        );
        assert_eq!(generation.report.built(), 2);
    }

    #[test]
    fn failed_glyph_keeps_its_drawn_depth() {
        // Depths are drawn before geometry, so a failure does not shift later depths.
        let a = generate(&Squares, &request("axa"), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate(&Squares, &request("aaa"), &mut StdRng::seed_from_u64(9)).unwrap();
        let depth = |g: &Generation, i: usize| g.report.glyphs[i].placement.unwrap().depth;
        assert_eq!(depth(&a, 2), depth(&b, 2));
    }
}
