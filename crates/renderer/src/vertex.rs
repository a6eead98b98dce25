//! GPU-ready vertex/index data built from imported models.

use std::{ops::Range, path::PathBuf};

use asset::{ImportedModel, MeshVertex};
use bytemuck::{Pod, Zeroable};
use corelib::transform::{CoordinateSystem, ModelBounds};
use glam::Vec3;
use wgpu::{FrontFace, IndexFormat, VertexBufferLayout, VertexStepMode};

/// Vertex: position + normal + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl GpuVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

impl From<&MeshVertex> for GpuVertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
        }
    }
}

/// One indexed draw per model part.
#[derive(Clone, Debug, PartialEq)]
pub struct PartDraw {
    pub indices: Range<u32>,
    pub texture_path: Option<PathBuf>,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

/// Buffers ready for upload plus per-part draw ranges.
#[derive(Clone, Debug, Default)]
pub struct ModelBuffers {
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<PartDraw>,
    pub bounds: ModelBounds,
}

impl ModelBuffers {
    pub const INDEX_FORMAT: IndexFormat = IndexFormat::Uint32;

    pub fn from_model(model: &ImportedModel) -> Self {
        let draws = model
            .parts
            .iter()
            .map(|part| PartDraw {
                indices: part.index_offset..part.index_offset + part.index_count,
                texture_path: part.texture_path.clone(),
                base_color: part.base_color,
                metallic: part.metallic,
                roughness: part.roughness,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Model buffers: {} vertices, {} indices, {} draws",
            model.vertices.len(),
            model.indices.len(),
            draws.len()
        );
        Self {
            vertices: model.vertices.iter().map(GpuVertex::from).collect(),
            indices: model.indices.clone(),
            draws,
            bounds: model_bounds(model),
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

pub fn model_bounds(model: &ImportedModel) -> ModelBounds {
    ModelBounds {
        center: Vec3::from_array(model.center),
        scale: model.scale,
    }
}

/// Front-face winding for geometry authored in `cs`; mirrored conventions
/// reverse the source's counter-clockwise order.
pub fn front_face(cs: CoordinateSystem) -> FrontFace {
    if cs.is_left_handed() {
        FrontFace::Cw
    } else {
        FrontFace::Ccw
    }
}
