//! Raw BGRA8 pixel storage handed from texture loaders to the uploader.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};

use crate::error::{AssetError, AssetResult};

/// Bytes per BGRA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Shared free-list of pixel allocations.
///
/// Retains at most `max_retained` buffers totalling at most
/// `max_retained_bytes` of capacity; anything returned beyond that is
/// released to the allocator.
pub struct PixelPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
    max_retained_bytes: usize,
}

impl PixelPool {
    pub const DEFAULT_MAX_RETAINED: usize = 16;
    pub const DEFAULT_MAX_RETAINED_BYTES: usize = 64 << 20;

    pub fn new(max_retained: usize) -> Self {
        Self::with_limits(max_retained, Self::DEFAULT_MAX_RETAINED_BYTES)
    }

    pub fn with_limits(max_retained: usize, max_retained_bytes: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            max_retained_bytes,
        }
    }

    /// Zeroed buffer of exactly `len` bytes, reusing the smallest retained
    /// allocation that fits.
    pub fn rent(&self, len: usize) -> Vec<u8> {
        let reused = {
            let mut free = self.free.lock();
            let best = free
                .iter()
                .enumerate()
                .filter(|(_, buf)| buf.capacity() >= len)
                .min_by_key(|(_, buf)| buf.capacity())
                .map(|(i, _)| i);
            best.map(|i| free.swap_remove(i))
        };

        match reused {
            Some(mut buf) => {
                buf.clear();
                buf.resize(len, 0);
                buf
            }
            None => vec![0; len],
        }
    }

    pub fn give_back(&self, buf: Vec<u8>) {
        if buf.capacity() == 0 {
            return;
        }
        let mut free = self.free.lock();
        let retained: usize = free.iter().map(Vec::capacity).sum();
        if free.len() < self.max_retained && retained + buf.capacity() <= self.max_retained_bytes {
            free.push(buf);
        } else {
            log::trace!(
                "Pixel pool full ({} buffers, {} bytes), releasing {} bytes",
                free.len(),
                retained,
                buf.capacity()
            );
        }
    }

    /// Number of buffers currently waiting to be rented.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Capacity held by buffers waiting to be rented.
    pub fn retained_bytes(&self) -> usize {
        self.free.lock().iter().map(Vec::capacity).sum()
    }
}

impl Default for PixelPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETAINED)
    }
}

/// Top-down BGRA8 image, `stride = width * 4`.
///
/// Storage is released exactly once, either by [`RawPixelBuffer::dispose`]
/// or on drop. Pixel access after that fails with [`AssetError::Disposed`].
pub struct RawPixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    storage: RwLock<Option<Vec<u8>>>,
    pool: Option<Arc<PixelPool>>,
    disposed: AtomicBool,
}

impl RawPixelBuffer {
    /// Zeroed buffer whose storage is rented from (and returned to) `pool`.
    pub fn pooled(pool: &Arc<PixelPool>, width: u32, height: u32) -> Self {
        let stride = width as usize * BYTES_PER_PIXEL;
        let data = pool.rent(stride * height as usize);
        Self::with_storage(width, height, data, Some(Arc::clone(pool)))
    }

    /// Wraps caller-supplied BGRA8 bytes; never returned to a pool.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> AssetResult<Self> {
        let expected = width as usize * BYTES_PER_PIXEL * height as usize;
        if data.len() != expected {
            return Err(AssetError::Format(format!(
                "{}x{} BGRA8 image needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self::with_storage(width, height, data, None))
    }

    fn with_storage(width: u32, height: u32, data: Vec<u8>, pool: Option<Arc<PixelPool>>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            storage: RwLock::new(Some(data)),
            pool,
            disposed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Read access to the pixel bytes.
    pub fn pixels(&self) -> AssetResult<MappedRwLockReadGuard<'_, [u8]>> {
        let guard = self.storage.read();
        if self.is_disposed() {
            return Err(AssetError::Disposed);
        }
        RwLockReadGuard::try_map(guard, |s| s.as_deref()).map_err(|_| AssetError::Disposed)
    }

    pub fn pixels_mut(&mut self) -> AssetResult<&mut [u8]> {
        if self.is_disposed() {
            return Err(AssetError::Disposed);
        }
        self.storage
            .get_mut()
            .as_deref_mut()
            .ok_or(AssetError::Disposed)
    }

    /// Copies the pixels out, e.g. for an upload queue that outlives the buffer.
    pub fn to_vec(&self) -> AssetResult<Vec<u8>> {
        Ok(self.pixels()?.to_vec())
    }

    /// Releases the storage. Calls after the first one are no-ops.
    ///
    /// Pixel access fails from here on. While a guard from [`Self::pixels`]
    /// is still alive the storage itself is released on drop instead.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(mut storage) = self.storage.try_write() else {
            log::debug!("Pixel buffer disposed while being read, releasing on drop");
            return;
        };
        self.release(storage.take());
    }

    fn release(&self, storage: Option<Vec<u8>>) {
        if let (Some(pool), Some(buf)) = (&self.pool, storage) {
            pool.give_back(buf);
        }
    }

    /// Moves the storage into a buffer detached from the pool.
    pub fn into_non_pooled(self) -> AssetResult<RawPixelBuffer> {
        let mut this = self;
        if this.disposed.swap(true, Ordering::AcqRel) {
            return Err(AssetError::Disposed);
        }
        let data = this.storage.get_mut().take().ok_or(AssetError::Disposed)?;
        Ok(Self::with_storage(this.width, this.height, data, None))
    }
}

impl Drop for RawPixelBuffer {
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::Release);
        let storage = self.storage.get_mut().take();
        self.release(storage);
    }
}

impl fmt::Debug for RawPixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("pooled", &self.is_pooled())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
