//! Planar and solid geometry for glyph shapes.
//!
//! - `region`: contour union, zero-width repair, origin normalization.
//! - `tessellate`: cap triangulation with `lyon`, tracing vertices back to rings.
//! - `extrude`: planar region -> closed solid parts.

pub mod extrude;
pub mod region;
pub mod tessellate;

pub use extrude::{Solid, extrude};
pub use region::{PlanarRegion, repair};
