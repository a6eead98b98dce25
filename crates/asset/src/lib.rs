//! Asset loading/parsers (meshes, textures).
//! Meshes: OBJ + MTL importer producing deduplicated, partitioned model data.
//! Textures: pluggable loaders producing BGRA8 pixel buffers, TGA decoded in-house.

pub mod error;
pub mod import;
pub mod loader;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod pixels;
pub mod tga;

pub use error::{AssetError, AssetResult};
pub use import::{ImporterRegistry, MeshImporter};
pub use loader::{ImageLoader, TextureLoadRegistry, TextureLoader, TgaLoader};
pub use mesh::{ImportedModel, MeshVertex, ModelPart};
pub use obj::ObjImporter;
pub use pixels::{PixelPool, RawPixelBuffer};
