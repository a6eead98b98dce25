//! Texture loader plugins and the priority-ordered registry that picks one.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    error::{AssetError, AssetResult},
    pixels::{PixelPool, RawPixelBuffer},
    tga::decode_tga,
};

/// A texture format backend.
///
/// Any backend that implements this participates in registry selection.
pub trait TextureLoader: Send + Sync {
    fn name(&self) -> &str;

    /// Higher wins when several loaders accept a path.
    fn priority(&self) -> i32;

    fn can_load(&self, path: &Path) -> bool;

    /// Decode `path` into a top-down BGRA8 buffer, preferably rented from `pool`.
    fn load(&self, path: &Path, pool: &Arc<PixelPool>) -> AssetResult<RawPixelBuffer>;

    /// Release loader-owned resources.
    fn dispose(&self) -> AssetResult<()> {
        Ok(())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Legacy TGA images through the built-in decoder.
#[derive(Debug, Default)]
pub struct TgaLoader;

impl TgaLoader {
    pub const PRIORITY: i32 = 100;
}

impl TextureLoader for TgaLoader {
    fn name(&self) -> &str {
        "tga"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_load(&self, path: &Path) -> bool {
        has_extension(path, "tga")
    }

    fn load(&self, path: &Path, pool: &Arc<PixelPool>) -> AssetResult<RawPixelBuffer> {
        let bytes = fs::read(path).map_err(|e| AssetError::io(path, e))?;
        decode_tga(&bytes, pool)
    }
}

/// Fallback for every other format, via the `image` crate.
#[derive(Debug, Default)]
pub struct ImageLoader;

impl ImageLoader {
    pub const PRIORITY: i32 = i32::MIN;
}

impl TextureLoader for ImageLoader {
    fn name(&self) -> &str {
        "image"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_load(&self, _path: &Path) -> bool {
        true
    }

    fn load(&self, path: &Path, pool: &Arc<PixelPool>) -> AssetResult<RawPixelBuffer> {
        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut buffer = RawPixelBuffer::pooled(pool, width, height);
        for (dst, src) in buffer
            .pixels_mut()?
            .chunks_exact_mut(4)
            .zip(rgba.as_raw().chunks_exact(4))
        {
            dst.copy_from_slice(&[src[2], src[1], src[0], src[3]]);
        }
        Ok(buffer)
    }
}

struct RegistryState {
    loaders: Vec<Arc<dyn TextureLoader>>,
    closed: bool,
}

/// Ordered set of texture loaders.
///
/// Registration and loading may be called from several threads. The selected
/// loader runs outside the lock, so loads proceed concurrently.
pub struct TextureLoadRegistry {
    state: Mutex<RegistryState>,
    pool: Arc<PixelPool>,
}

impl TextureLoadRegistry {
    pub fn new(pool: Arc<PixelPool>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                loaders: Vec::new(),
                closed: false,
            }),
            pool,
        }
    }

    /// Registry with the TGA decoder and the generic fallback.
    pub fn with_default_loaders(pool: Arc<PixelPool>) -> Self {
        let mut registry = Self::new(pool);
        let state = registry.state.get_mut();
        state.loaders.push(Arc::new(TgaLoader));
        state.loaders.push(Arc::new(ImageLoader));
        registry
    }

    pub fn pool(&self) -> &Arc<PixelPool> {
        &self.pool
    }

    pub fn register_loader(&self, loader: Arc<dyn TextureLoader>) -> AssetResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(AssetError::Closed);
        }
        log::debug!(
            "Registered texture loader '{}' (priority {})",
            loader.name(),
            loader.priority()
        );
        state.loaders.push(loader);
        Ok(())
    }

    /// Highest-priority loader accepting `path`; the first registered wins ties.
    pub fn select(&self, path: &Path) -> AssetResult<Arc<dyn TextureLoader>> {
        let state = self.state.lock();
        if state.closed {
            return Err(AssetError::Closed);
        }
        let mut best: Option<&Arc<dyn TextureLoader>> = None;
        for loader in state.loaders.iter().filter(|l| l.can_load(path)) {
            if best.is_none_or(|b| loader.priority() > b.priority()) {
                best = Some(loader);
            }
        }
        best.cloned()
            .ok_or_else(|| AssetError::UnsupportedFormat(PathBuf::from(path)))
    }

    pub fn load(&self, path: impl AsRef<Path>) -> AssetResult<RawPixelBuffer> {
        let path = path.as_ref();
        let loader = self.select(path)?;
        log::info!("Loading texture {:?} with '{}' loader", path, loader.name());
        let buffer = loader.load(path, &self.pool)?;
        log::info!(
            "Loaded texture {}x{} ({} bytes)",
            buffer.width(),
            buffer.height(),
            buffer.stride() * buffer.height() as usize
        );
        Ok(buffer)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Closes the registry and disposes every loader. Failures are logged
    /// and do not stop the remaining loaders from being disposed.
    pub fn dispose(&self) {
        let loaders = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.loaders)
        };
        for loader in loaders {
            if let Err(err) = loader.dispose() {
                log::warn!("Failed to dispose texture loader '{}': {}", loader.name(), err);
            }
        }
    }
}

impl Drop for TextureLoadRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}
