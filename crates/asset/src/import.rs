//! Mesh importer backends and extension-based selection.

use std::path::{Path, PathBuf};

use crate::{
    error::{AssetError, AssetResult},
    mesh::ImportedModel,
    obj::ObjImporter,
};

/// A mesh format backend.
pub trait MeshImporter: Send + Sync {
    fn name(&self) -> &str;

    /// `extension` has no leading dot.
    fn can_parse(&self, extension: &str) -> bool;

    /// Parse a whole file; on failure no partial model is produced.
    fn parse(&self, path: &Path) -> AssetResult<ImportedModel>;
}

/// Importers in registration order; the first one claiming an extension wins.
#[derive(Default)]
pub struct ImporterRegistry {
    importers: Vec<Box<dyn MeshImporter>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_importers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ObjImporter));
        registry
    }

    pub fn register(&mut self, importer: Box<dyn MeshImporter>) {
        self.importers.push(importer);
    }

    pub fn importer_for(&self, path: &Path) -> AssetResult<&dyn MeshImporter> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.importers
            .iter()
            .find(|imp| !extension.is_empty() && imp.can_parse(extension))
            .map(|imp| &**imp)
            .ok_or_else(|| AssetError::UnsupportedFormat(PathBuf::from(path)))
    }

    pub fn parse(&self, path: impl AsRef<Path>) -> AssetResult<ImportedModel> {
        let path = path.as_ref();
        let importer = self.importer_for(path)?;
        let model = importer.parse(path)?;
        log::info!(
            "Imported {:?} with '{}': {} vertices, {} triangles, {} parts",
            path,
            importer.name(),
            model.vertices.len(),
            model.triangle_count(),
            model.parts.len()
        );
        Ok(model)
    }
}
