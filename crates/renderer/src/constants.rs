//! Per-frame shading constants. The field order and sizes below are read by
//! the shaders at fixed offsets; do not reorder.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use wgpu::{BindGroupLayoutEntry, BindingType, BufferBindingType, ShaderStages};

/// Shading UBO (16-byte aligned, column-major matrices).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadingConstants {
    pub world: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub base_color: [f32; 4],
    pub camera_position: [f32; 4],
    /// 1.0 or 0.0.
    pub light_enabled: f32,
    pub diffuse_intensity: f32,
    pub specular_intensity: f32,
    pub shininess: f32,
    pub grid_color: [f32; 4],
    pub axis_x_color: [f32; 4],
    pub axis_y_color: [f32; 4],
    pub axis_z_color: [f32; 4],
}

impl ShadingConstants {
    pub const SIZE: u64 = std::mem::size_of::<ShadingConstants>() as u64;

    /// Same frame data with a part's material color.
    #[inline]
    pub fn with_base_color(mut self, base_color: [f32; 4]) -> Self {
        self.base_color = base_color;
        self
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Uniform binding visible to both stages, sized to this struct.
    pub fn layout_entry(binding: u32) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(Self::SIZE),
            },
            count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use super::*;

    #[test]
    fn layout_matches_shader_offsets() {
        assert_eq!(ShadingConstants::SIZE, 288);
        assert_eq!(offset_of!(ShadingConstants, world), 0);
        assert_eq!(offset_of!(ShadingConstants, world_view_proj), 64);
        assert_eq!(offset_of!(ShadingConstants, light_position), 128);
        assert_eq!(offset_of!(ShadingConstants, light_color), 144);
        assert_eq!(offset_of!(ShadingConstants, ambient_color), 160);
        assert_eq!(offset_of!(ShadingConstants, base_color), 176);
        assert_eq!(offset_of!(ShadingConstants, camera_position), 192);
        assert_eq!(offset_of!(ShadingConstants, light_enabled), 208);
        assert_eq!(offset_of!(ShadingConstants, diffuse_intensity), 212);
        assert_eq!(offset_of!(ShadingConstants, specular_intensity), 216);
        assert_eq!(offset_of!(ShadingConstants, shininess), 220);
        assert_eq!(offset_of!(ShadingConstants, grid_color), 224);
        assert_eq!(offset_of!(ShadingConstants, axis_z_color), 272);
    }

    #[test]
    fn layout_entry_requires_full_struct() {
        let entry = ShadingConstants::layout_entry(0);
        match entry.ty {
            BindingType::Buffer {
                min_binding_size, ..
            } => assert_eq!(min_binding_size.map(NonZeroU64::get), Some(288)),
            other => panic!("unexpected binding type {other:?}"),
        }
    }
}
