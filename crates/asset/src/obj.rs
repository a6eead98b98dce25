//! OBJ importer: positions, normals, texture coordinates, materials.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{AssetError, AssetResult},
    import::MeshImporter,
    mesh::{ImportedModel, MeshVertex, ModelPart},
    mtl::{Material, MaterialLibrary, load_mtl_from_path, parse_f32},
};

/// Load an OBJ mesh from a file path, resolving `mtllib` next to it.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> AssetResult<ImportedModel> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    log::info!("Importing OBJ {:?}", path);
    parse_obj(BufReader::new(file), path.parent())
}

/// Load an OBJ mesh from a [`BufRead`] implementation. `mtllib` is ignored.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> AssetResult<ImportedModel> {
    parse_obj(reader, None)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> AssetResult<ImportedModel> {
    parse_obj(io::Cursor::new(contents), None)
}

/// Mesh importer backend for `.obj` files.
#[derive(Debug, Default)]
pub struct ObjImporter;

impl MeshImporter for ObjImporter {
    fn name(&self) -> &str {
        "obj"
    }

    fn can_parse(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("obj")
    }

    fn parse(&self, path: &Path) -> AssetResult<ImportedModel> {
        load_obj_from_path(path)
    }
}

/// Attribute indices of one face-vertex reference, 0-based.
///
/// Ordered by position, then texcoord, then normal; equal keys collapse into
/// a single emitted vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceVertexKey {
    pub position: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

/// Running index range for one `usemtl` block.
struct PartSpan {
    material: Option<String>,
    start: usize,
    end: usize,
}

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,

    /// Value is the output index, which is also the key's first-seen ordinal.
    unique: BTreeMap<SourceVertexKey, u32>,
    vertices: Vec<MeshVertex>,
    /// Accumulated face normals for vertices referenced without one.
    generated_normals: Vec<Option<[f32; 3]>>,
    indices: Vec<u32>,
    face_refs: usize,

    spans: Vec<PartSpan>,
    active_material: Option<String>,
    span_start: usize,
    materials: MaterialLibrary,
}

impl ObjBuilder {
    fn vertex_index(&mut self, key: SourceVertexKey, line_no: usize) -> AssetResult<u32> {
        if let Some(&idx) = self.unique.get(&key) {
            return Ok(idx);
        }
        let position = self.positions[key.position];
        let uv = key.texcoord.map_or([0.0, 0.0], |i| self.texcoords[i]);
        let normal = key.normal.map(|i| self.normals[i]);

        let idx = u32::try_from(self.vertices.len())
            .map_err(|_| AssetError::parse(line_no, format!("too many vertices (>{})", u32::MAX)))?;
        self.vertices
            .push(MeshVertex::new(position, normal.unwrap_or([0.0; 3]), uv));
        self.generated_normals
            .push(if normal.is_none() { Some([0.0; 3]) } else { None });
        self.unique.insert(key, idx);
        Ok(idx)
    }

    fn push_triangle(&mut self, tri: [u32; 3]) {
        let [a, b, c] = tri.map(|i| self.vertices[i as usize].position);
        let face = cross(sub(b, a), sub(c, a));
        for i in tri {
            if let Some(sum) = self.generated_normals[i as usize].as_mut() {
                for axis in 0..3 {
                    sum[axis] += face[axis];
                }
            }
        }
        self.indices.extend_from_slice(&tri);
    }

    fn use_material(&mut self, name: String) {
        if self.active_material.as_deref() == Some(name.as_str()) {
            return;
        }
        self.close_span();
        self.active_material = Some(name);
    }

    fn close_span(&mut self) {
        let end = self.indices.len();
        if end > self.span_start {
            self.spans.push(PartSpan {
                material: self.active_material.clone(),
                start: self.span_start,
                end,
            });
        }
        self.span_start = end;
    }

    fn finish(mut self) -> AssetResult<ImportedModel> {
        self.close_span();
        if self.indices.is_empty() {
            return Err(AssetError::Parse {
                line: 0,
                message: "OBJ contained no triangles".into(),
            });
        }

        for (vertex, generated) in self.vertices.iter_mut().zip(&self.generated_normals) {
            if let Some(sum) = generated {
                vertex.normal = normalize_or_zero(*sum);
            }
        }

        let default_material = Material::default();
        let parts = self
            .spans
            .iter()
            .map(|span| {
                let material = match span.material.as_deref() {
                    Some(name) => self.materials.get(name).unwrap_or_else(|| {
                        log::warn!("Material '{}' not found in any mtllib, using defaults", name);
                        &default_material
                    }),
                    None => &default_material,
                };
                let (index_offset, index_count) = part_range(span.start, span.end)?;
                Ok(ModelPart {
                    texture_path: material.texture.clone(),
                    index_offset,
                    index_count,
                    base_color: material.base_color,
                    metallic: material.metallic,
                    roughness: material.roughness,
                })
            })
            .collect::<AssetResult<Vec<_>>>()?;

        log::debug!(
            "OBJ: {} face-vertex refs -> {} unique vertices, {} triangles, {} parts",
            self.face_refs,
            self.vertices.len(),
            self.indices.len() / 3,
            parts.len()
        );
        Ok(ImportedModel::new(self.vertices, self.indices, parts))
    }
}

/// Index span as `(offset, count)`; 32-bit index buffers cap both.
fn part_range(start: usize, end: usize) -> AssetResult<(u32, u32)> {
    let too_large = || AssetError::Parse {
        line: 0,
        message: format!("part index range {start}..{end} exceeds 32-bit index buffer"),
    };
    let offset = u32::try_from(start).map_err(|_| too_large())?;
    let count = u32::try_from(end - start).map_err(|_| too_large())?;
    offset.checked_add(count).ok_or_else(too_large)?;
    Ok((offset, count))
}

fn parse_obj<R: BufRead>(reader: R, base_dir: Option<&Path>) -> AssetResult<ImportedModel> {
    let mut obj = ObjBuilder::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::parse(line_no, format!("read failed: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else { continue };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                obj.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                obj.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                obj.normals.push([nx, ny, nz]);
            }
            "f" => {
                let mut face_indices: Vec<u32> = Vec::new();
                for part in parts {
                    let key = parse_face_vertex(
                        part,
                        obj.positions.len(),
                        obj.texcoords.len(),
                        obj.normals.len(),
                        line_no,
                    )?;
                    face_indices.push(obj.vertex_index(key, line_no)?);
                }
                if face_indices.len() < 3 {
                    return Err(AssetError::parse(
                        line_no,
                        format!("face needs at least 3 vertices, got {}", face_indices.len()),
                    ));
                }
                obj.face_refs += face_indices.len();

                // Triangulate fan
                for tri in 1..(face_indices.len() - 1) {
                    obj.push_triangle([face_indices[0], face_indices[tri], face_indices[tri + 1]]);
                }
            }
            "usemtl" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                obj.use_material(name);
            }
            "mtllib" => match base_dir {
                Some(dir) => {
                    for lib in parts {
                        let lib_path = dir.join(lib.replace('\\', "/"));
                        match load_mtl_from_path(&lib_path) {
                            Ok(materials) => obj.materials.extend(materials),
                            Err(err) => log::warn!("Skipping material library: {}", err),
                        }
                    }
                }
                None => log::debug!("Ignoring mtllib on line {} (no base directory)", line_no + 1),
            },
            _ => {
                // Ignore other directives (o/g/s/etc.)
            }
        }
    }

    obj.finish()
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> AssetResult<SourceVertexKey> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .ok_or_else(|| AssetError::parse(line_no, format!("malformed face element '{token}'")))?;
    let position = resolve_index(pos, pos_count, line_no)?;

    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    Ok(SourceVertexKey {
        position,
        texcoord,
        normal,
    })
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> AssetResult<usize> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| AssetError::parse(line_no, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Err(AssetError::parse(line_no, "OBJ indices are 1-based; found 0"));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(AssetError::parse(
            line_no,
            format!("index {raw} resolved out of bounds (len={len})"),
        ));
    }

    Ok(idx as usize)
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize_or_zero(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0; 3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_TWO_MATERIALS: &str = r#"
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 1.0 1.0 0.0
        v 0.0 1.0 0.0
        vt 0.0 0.0
        vt 1.0 0.0
        vt 1.0 1.0
        vt 0.0 1.0
        vn 0.0 0.0 1.0
        usemtl red
        f 1/1/1 2/2/1 3/3/1
        usemtl blue
        f 1/1/1 3/3/1 4/4/1
        usemtl red
        f 4/4/1 3/3/1 2/2/1
    "#;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(mesh.parts.len(), 1);
        assert!(mesh.is_valid());
    }

    #[test]
    fn shared_references_collapse_to_one_vertex() {
        let mesh = load_obj_from_str(QUAD_TWO_MATERIALS).unwrap();
        // 9 face-vertex refs, 4 distinct triples
        assert_eq!(mesh.indices.len(), 9);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 3, 2, 1]);
        assert_eq!(mesh.vertices[3].uv, [0.0, 1.0]);
    }

    #[test]
    fn same_position_with_different_uv_stays_distinct() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            vt 0 0
            vt 1 1
            f 1/1 2/1 3/1
            f 1/2 3/1 2/1
        ";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 2, 1]);
    }

    #[test]
    fn material_switches_partition_indices() {
        let mesh = load_obj_from_str(QUAD_TWO_MATERIALS).unwrap();
        let ranges: Vec<_> = mesh.parts.iter().map(|p| p.index_range()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9]);
        assert!(mesh.parts_partition_indices());
    }

    #[test]
    fn repeated_usemtl_does_not_split_part() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f 1 2 3
            usemtl a
            usemtl a
            f 1 2 3
            f 3 2 1
            usemtl b
            usemtl c
            f 1 3 2
        ";
        let mesh = load_obj_from_str(src).unwrap();
        let ranges: Vec<_> = mesh.parts.iter().map(|p| p.index_range()).collect();
        assert_eq!(ranges, vec![0..3, 3..9, 9..12]);
        assert!(mesh.parts_partition_indices());
    }

    #[test]
    fn polygons_are_fan_triangulated() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            v -1 1 0
            f 1 2 3 4 5
        ";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
        assert_eq!(mesh.vertices.len(), 5);
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f -3 -2 -1
        ";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_normals_are_generated_from_faces() {
        let src = "
            v 0 0 0
            v 2 0 0
            v 0 2 0
            f 1 2 3
        ";
        let mesh = load_obj_from_str(src).unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.uv, [0.0, 0.0]);
        }
    }

    #[test]
    fn normalization_is_computed() {
        let mesh = load_obj_from_str(QUAD_TWO_MATERIALS).unwrap();
        assert_eq!(mesh.center, [0.5, 0.5, 0.0]);
        assert_eq!(mesh.scale, 2.0);
    }

    #[test]
    fn malformed_faces_fail() {
        let base = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\n";
        for face in ["f 1 2 x", "f 1 2 4", "f 0 1 2", "f 1/2 2/1 3/1", "f 1 2", "f 1/1/1 2 3"] {
            let err = load_obj_from_str(&format!("{base}{face}\n")).unwrap_err();
            assert!(
                matches!(err, AssetError::Parse { line: 5, .. }),
                "'{face}' gave {err:?}"
            );
        }
    }

    #[test]
    fn malformed_vertex_fails() {
        let err = load_obj_from_str("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 1, .. }));
    }

    #[test]
    fn empty_mesh_fails() {
        assert!(matches!(
            load_obj_from_str("v 0 0 0\n"),
            Err(AssetError::Parse { .. })
        ));
    }

    #[test]
    fn keys_order_by_position_then_texcoord_then_normal() {
        let a = SourceVertexKey {
            position: 1,
            texcoord: Some(5),
            normal: None,
        };
        let b = SourceVertexKey {
            position: 1,
            texcoord: Some(5),
            normal: Some(0),
        };
        let c = SourceVertexKey {
            position: 2,
            texcoord: None,
            normal: None,
        };
        assert!(a < b && b < c);
    }

    #[test]
    fn part_ranges_beyond_u32_are_rejected() {
        assert_eq!(part_range(6, 42).ok(), Some((6, 36)));
        let max = u32::MAX as usize;
        assert!(part_range(max - 3, max).is_ok());
        assert!(matches!(
            part_range(max + 1, max + 4),
            Err(AssetError::Parse { line: 0, .. })
        ));
        assert!(matches!(
            part_range(0, max + 1),
            Err(AssetError::Parse { line: 0, .. })
        ));
        assert!(matches!(
            part_range(max - 1, max + 1),
            Err(AssetError::Parse { line: 0, .. })
        ));
    }
}
