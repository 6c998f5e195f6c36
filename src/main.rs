//! Thin binary wrapper.
//!
//! Project direction: `glyphstair` is primarily a **library**.
//! This binary maps CLI flags (and an optional TOML file) onto a
//! `GenerationRequest`, picks a font and writes one `.glb`.
//!
//! Run:
//! - `cargo run -- --text HELLO --family "DejaVu Sans" --seed 7`
//! - `RUST_LOG=debug cargo run -- --font ./MyFont.ttf -o hello.glb`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glyphstair::GenerationRequest;
use glyphstair::font::{FontFace, FontQuery, FontSystem};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser, Debug)]
#[command(
    name = "glyphstair",
    version,
    about = "Extrude a short string into a staircase of colored 3D glyphs (.glb)"
)]
struct Cli {
    /// TOML file with request defaults; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Font file (TTF/OTF)
    #[arg(long, value_name = "PATH", conflicts_with = "family")]
    font: Option<PathBuf>,

    /// Face index inside a font collection
    #[arg(long, value_name = "N", default_value_t = 0, requires = "font")]
    face_index: u32,

    /// Installed font family to resolve (serif, sans-serif, monospace or a name)
    #[arg(long, value_name = "NAME")]
    family: Option<String>,

    #[arg(long)]
    text: Option<String>,

    #[arg(long, value_name = "N")]
    font_size: Option<f64>,

    #[arg(long, value_name = "N")]
    step_x: Option<u32>,

    #[arg(long, value_name = "N")]
    step_y: Option<u32>,

    #[arg(long, value_name = "N")]
    min_depth: Option<f64>,

    #[arg(long, value_name = "N")]
    max_depth: Option<f64>,

    /// Seed for the depth draws; random when omitted
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Output file [default: Design_<text>.glb]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    fn request(&self) -> Result<GenerationRequest> {
        let mut request = match &self.config {
            Some(path) => GenerationRequest::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GenerationRequest::default(),
        };

        if let Some(text) = &self.text {
            request.text = text.clone();
        }
        if let Some(v) = self.font_size {
            request.font_size = v;
        }
        if let Some(v) = self.step_x {
            request.step_x = v;
        }
        if let Some(v) = self.step_y {
            request.step_y = v;
        }
        if let Some(v) = self.min_depth {
            request.min_depth = v;
        }
        if let Some(v) = self.max_depth {
            request.max_depth = v;
        }

        request.validate().context("invalid request")?;
        Ok(request)
    }

    fn face(&self) -> Result<FontFace> {
        if let Some(path) = &self.font {
            return FontFace::from_path(path, self.face_index)
                .with_context(|| format!("loading font {}", path.display()));
        }

        let system = FontSystem::new().context("looking up installed fonts")?;
        log::info!("found {} installed font faces", system.face_count());
        let query = self
            .family
            .as_deref()
            .map(FontQuery::family)
            .unwrap_or_default();
        system.resolve(&query).context("resolving font family")
    }
}

/// `Design_<text>.glb`, with characters that cannot appear in a file name replaced.
fn default_output(text: &str) -> PathBuf {
    let name: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    PathBuf::from(format!("Design_{name}.glb"))
}

fn main() -> Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let cli = Cli::parse();
    let request = cli.request()?;
    let face = cli.face()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&request.text));

    let report = glyphstair::generate_to_file(&face, &request, &mut rng, &output)?;
    for glyph in &report.glyphs {
        if let glyphstair::pipeline::GlyphOutcome::Failed(reason) = &glyph.outcome {
            eprintln!("warning: {:?} (#{}) skipped: {reason}", glyph.ch, glyph.index);
        }
    }
    println!("{report}");
    println!("wrote {}", output.display());
    Ok(())
}
