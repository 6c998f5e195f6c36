//! Scene exporters.
//!
//! Only binary glTF for now; it carries per-vertex colors and opens in every
//! common viewer.

pub mod glb;

pub use glb::{ExportError, export_glb, to_glb_bytes, write_glb};
