//! CPU-side model representation produced by mesh importers.

use std::{ops::Range, path::PathBuf};

/// Largest bounding-box dimension after normalization.
pub const CANONICAL_SIZE: f32 = 2.0;

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Contiguous slice of the index buffer drawn with one material.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPart {
    pub texture_path: Option<PathBuf>,
    pub index_offset: u32,
    pub index_count: u32,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl ModelPart {
    #[inline]
    pub fn index_range(&self) -> Range<usize> {
        let start = self.index_offset as usize;
        start..start + self.index_count as usize
    }
}

/// Indexed triangle model with per-material parts and normalization data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedModel {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub parts: Vec<ModelPart>,
    /// Bounding-box midpoint.
    pub center: [f32; 3],
    /// Factor mapping the largest bounding-box dimension to [`CANONICAL_SIZE`].
    pub scale: f32,
}

impl ImportedModel {
    /// Builds the model and computes its normalization from the vertices.
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>, parts: Vec<ModelPart>) -> Self {
        let (center, scale) = normalization(&vertices);
        Self {
            vertices,
            indices,
            parts,
            center,
            scale,
        }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the parts tile `[0, indices.len())` in order with no gaps or overlaps.
    pub fn parts_partition_indices(&self) -> bool {
        let mut next = 0usize;
        for part in &self.parts {
            let range = part.index_range();
            if range.start != next || range.is_empty() {
                return false;
            }
            next = range.end;
        }
        next == self.indices.len()
    }
}

/// Axis-aligned bounds `(min, max)` of the vertex positions.
pub fn bounding_box(vertices: &[MeshVertex]) -> Option<([f32; 3], [f32; 3])> {
    let first = vertices.first()?.position;
    Some(vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(v.position[axis]);
            hi[axis] = hi[axis].max(v.position[axis]);
        }
        (lo, hi)
    }))
}

fn normalization(vertices: &[MeshVertex]) -> ([f32; 3], f32) {
    let Some((lo, hi)) = bounding_box(vertices) else {
        return ([0.0; 3], 1.0);
    };
    let center = [
        (lo[0] + hi[0]) * 0.5,
        (lo[1] + hi[1]) * 0.5,
        (lo[2] + hi[2]) * 0.5,
    ];
    let extent = (0..3).map(|a| hi[a] - lo[a]).fold(0.0f32, f32::max);
    let scale = if extent > f32::EPSILON {
        CANONICAL_SIZE / extent
    } else {
        1.0
    };
    (center, scale)
}
