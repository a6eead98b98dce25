//! Wavefront MTL material libraries.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::error::{AssetError, AssetResult};

/// Material properties the renderer consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    /// Diffuse map, resolved against the library's directory.
    pub texture: Option<std::path::PathBuf>,
    pub metallic: f32,
    pub roughness: f32,
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            texture: None,
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

pub type MaterialLibrary = HashMap<String, Material>;

pub fn load_mtl_from_path(path: &Path) -> AssetResult<MaterialLibrary> {
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    parse_mtl(BufReader::new(file), path.parent())
}

/// Parse an MTL library; texture paths are joined onto `base_dir` when given.
pub fn parse_mtl<R: BufRead>(reader: R, base_dir: Option<&Path>) -> AssetResult<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    let mut current: Option<Material> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::parse(line_no, format!("read failed: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else { continue };

        if tag == "newmtl" {
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err(AssetError::parse(line_no, "newmtl without a name"));
            }
            if let Some(done) = current.replace(Material::named(name)) {
                library.insert(done.name.clone(), done);
            }
            continue;
        }

        let Some(material) = current.as_mut() else {
            // Statements before the first newmtl have nothing to apply to.
            continue;
        };
        match tag {
            "Kd" => {
                let r = parse_f32(parts.next(), line_no, "Kd red")?;
                let g = parse_f32(parts.next(), line_no, "Kd green")?;
                let b = parse_f32(parts.next(), line_no, "Kd blue")?;
                material.base_color[..3].copy_from_slice(&[r, g, b]);
            }
            "d" => material.base_color[3] = parse_f32(parts.next(), line_no, "dissolve")?,
            "Tr" => material.base_color[3] = 1.0 - parse_f32(parts.next(), line_no, "transparency")?,
            "Pm" => material.metallic = parse_f32(parts.next(), line_no, "metallic")?,
            "Pr" => material.roughness = parse_f32(parts.next(), line_no, "roughness")?,
            "map_Kd" => {
                // Options (-bm, -o ...) precede the file name.
                let file = parts
                    .last()
                    .ok_or_else(|| AssetError::parse(line_no, "map_Kd without a file name"))?;
                let file = file.replace('\\', "/");
                material.texture = Some(match base_dir {
                    Some(dir) => dir.join(file),
                    None => file.into(),
                });
            }
            _ => {}
        }
    }

    if let Some(done) = current {
        library.insert(done.name.clone(), done);
    }
    Ok(library)
}

pub(crate) fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| AssetError::parse(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|_| AssetError::parse(line_no, format!("invalid {what} '{token}'")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn parses_pbr_fields_and_textures() {
        let src = "
            # two materials
            newmtl wood
            Kd 0.5 0.25 0.0
            d 0.5
            Pm 0.1
            Pr 0.9
            map_Kd -bm 1.0 textures\\wood.tga

            newmtl steel
            Kd 0.8 0.8 0.8
            Tr 0.25
            Pm 1.0
        ";
        let lib = parse_mtl(Cursor::new(src), Some(Path::new("assets"))).unwrap();
        assert_eq!(lib.len(), 2);

        let wood = &lib["wood"];
        assert_eq!(wood.base_color, [0.5, 0.25, 0.0, 0.5]);
        assert_eq!(wood.metallic, 0.1);
        assert_eq!(wood.roughness, 0.9);
        assert_eq!(
            wood.texture.as_deref(),
            Some(Path::new("assets/textures/wood.tga"))
        );

        let steel = &lib["steel"];
        assert_eq!(steel.base_color[3], 0.75);
        assert_eq!(steel.roughness, 0.5);
        assert!(steel.texture.is_none());
    }

    #[test]
    fn malformed_value_reports_line() {
        let err = parse_mtl(Cursor::new("newmtl a\nKd 1 x 0\n"), None).unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 2, .. }));
    }
}
