//! Binary glTF 2.0 (`.glb`) writer.
//!
//! The document is a typed `gltf::json::Root`: one scene, one node, one mesh
//! with a single triangle primitive. Vertex colors go in `COLOR_0` so viewers
//! show each glyph in its palette color without textures. The BIN chunk holds
//! three tightly packed views: positions (f32 x3), colors (u8 x4) and
//! indices (u32). `gltf::binary::Glb` does the container framing.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use gltf::binary::{Glb, Header};
use gltf::json::{
    self, Accessor, Index, Root,
    validation::USize64,
    accessor::{ComponentType, GenericComponentType, Type},
    buffer::{Target, View},
    material::StrengthFactor,
    mesh::{Mode, Primitive, Semantic},
    validation::Checked::Valid,
};

use crate::scene::Scene;

const GLB_VERSION: u32 = 2;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write GLB container: {0}")]
    Container(#[from] gltf::Error),

    #[error("scene does not fit in a GLB container ({0} bytes)")]
    TooLarge(usize),
}

/// Encode `scene` as a complete `.glb` byte buffer.
pub fn to_glb_bytes(scene: &Scene) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    write_glb(scene, &mut out)?;
    Ok(out)
}

/// Write `scene` as `.glb` into `writer`.
pub fn write_glb<W: Write>(scene: &Scene, mut writer: W) -> Result<(), ExportError> {
    let bin = encode_buffer(scene);
    let root = build_document(scene, &bin);
    let json = serde_json::to_vec(&root)?;

    let length = padded(12 + 8 + json.len()) + padded(8 + bin.bytes.len());
    let length = u32::try_from(length).map_err(|_| ExportError::TooLarge(length))?;

    let glb = Glb {
        header: Header {
            magic: *b"glTF",
            version: GLB_VERSION,
            length,
        },
        json: Cow::Owned(json),
        bin: Some(Cow::Owned(bin.bytes)),
    };
    glb.to_writer(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write `scene` as a `.glb` file at `path`. Returns the file size.
pub fn export_glb<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<usize, ExportError> {
    let bytes = to_glb_bytes(scene)?;
    std::fs::write(path.as_ref(), &bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(bytes.len())
}

/// Packed binary payload and where each view starts.
struct Buffer {
    bytes: Vec<u8>,
    colors_offset: usize,
    indices_offset: usize,
}

fn encode_buffer(scene: &Scene) -> Buffer {
    let mesh = &scene.mesh;
    let mut bytes = Vec::with_capacity(mesh.positions.len() * 16 + mesh.indices.len() * 4);

    for p in &mesh.positions {
        for c in p {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
    }
    let colors_offset = bytes.len();
    for c in &scene.colors {
        bytes.extend_from_slice(&c.to_array());
    }
    let indices_offset = bytes.len();
    for i in &mesh.indices {
        bytes.extend_from_slice(&i.to_le_bytes());
    }

    Buffer {
        bytes,
        colors_offset,
        indices_offset,
    }
}

fn build_document(scene: &Scene, bin: &Buffer) -> Root {
    let vertex_count = scene.mesh.positions.len();
    let mut root = Root::default();
    root.asset.generator = Some(concat!("glyphstair ", env!("CARGO_PKG_VERSION")).to_string());

    let buffer = root.push(json::Buffer {
        byte_length: USize64::from(bin.bytes.len()),
        name: None,
        uri: None,
        extensions: Default::default(),
        extras: Default::default(),
    });

    let view = |offset: usize, end: usize, target: Target| View {
        buffer,
        byte_length: USize64::from(end - offset),
        byte_offset: Some(USize64::from(offset)),
        byte_stride: None,
        name: None,
        target: Some(Valid(target)),
        extensions: Default::default(),
        extras: Default::default(),
    };
    let position_view = view(0, bin.colors_offset, Target::ArrayBuffer);
    let color_view = view(bin.colors_offset, bin.indices_offset, Target::ArrayBuffer);
    let index_view = view(bin.indices_offset, bin.bytes.len(), Target::ElementArrayBuffer);
    let position_view = root.push(position_view);
    let color_view = root.push(color_view);
    let index_view = root.push(index_view);

    let bounds = scene.bounds();
    let positions = root.push(accessor(
        position_view,
        vertex_count,
        ComponentType::F32,
        Type::Vec3,
        Some((bounds.min, bounds.max)),
        false,
    ));
    let colors = root.push(accessor(
        color_view,
        vertex_count,
        ComponentType::U8,
        Type::Vec4,
        None,
        true,
    ));
    let indices = root.push(accessor(
        index_view,
        scene.mesh.indices.len(),
        ComponentType::U32,
        Type::Scalar,
        None,
        false,
    ));

    let mut material = json::Material {
        name: Some("vertex_color".to_string()),
        ..Default::default()
    };
    material.pbr_metallic_roughness.metallic_factor = StrengthFactor(0.0);
    material.pbr_metallic_roughness.roughness_factor = StrengthFactor(0.8);
    let material = root.push(material);

    let attributes = BTreeMap::from([
        (Valid(Semantic::Positions), positions),
        (Valid(Semantic::Colors(0)), colors),
    ]);
    let mesh = root.push(json::Mesh {
        name: Some("glyphs".to_string()),
        primitives: vec![Primitive {
            attributes,
            indices: Some(indices),
            material: Some(material),
            mode: Valid(Mode::Triangles),
            targets: None,
            extensions: Default::default(),
            extras: Default::default(),
        }],
        weights: None,
        extensions: Default::default(),
        extras: Default::default(),
    });

    let node = root.push(json::Node {
        mesh: Some(mesh),
        name: Some("glyphs".to_string()),
        ..Default::default()
    });
    let scene_index = root.push(json::Scene {
        name: None,
        nodes: vec![node],
        extensions: Default::default(),
        extras: Default::default(),
    });
    root.scene = Some(scene_index);

    root
}

fn accessor(
    view: Index<View>,
    count: usize,
    component: ComponentType,
    kind: Type,
    bounds: Option<([f32; 3], [f32; 3])>,
    normalized: bool,
) -> Accessor {
    let (min, max) = match bounds {
        Some((min, max)) => (
            Some(json::Value::from(min.to_vec())),
            Some(json::Value::from(max.to_vec())),
        ),
        None => (None, None),
    };
    Accessor {
        buffer_view: Some(view),
        byte_offset: None,
        count: USize64::from(count),
        component_type: Valid(GenericComponentType(component)),
        type_: Valid(kind),
        min,
        max,
        name: None,
        normalized,
        sparse: None,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn padded(len: usize) -> usize {
    len.next_multiple_of(4)
}
