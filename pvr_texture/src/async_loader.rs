/// AsyncLoader - worker pool running load and decompression jobs
///
/// `submit` hands a closure to the pool and returns a `TextureFuture` that the
/// caller can poll with `is_ready` or block on with `get`. Uploads are not run
/// here: they stay on the thread that owns the backend context.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use crate::config::Config;
use crate::decompress::{decompress_texture, is_decompressible};
use crate::error::Result;
use crate::formats::{load_texture, AssetProvider, ContainerFormat};
use crate::texture::TextureDescriptor;
use crate::{pvr_debug, pvr_err, pvr_error, pvr_warn};

const SOURCE: &str = "pvr::async_loader";

// ===== FUTURE =====

struct Slot<T> {
    value: Mutex<Option<Result<T>>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn lock(&self) -> MutexGuard<'_, Option<Result<T>>> {
        // jobs never run while holding the lock
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn complete(&self, result: Result<T>) {
        *self.lock() = Some(result);
        self.ready.notify_all();
    }
}

/// Result of a job running on the pool
pub struct TextureFuture<T> {
    slot: Arc<Slot<T>>,
}

impl<T> TextureFuture<T> {
    /// True once the job has finished (successfully or not)
    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Block until the job has finished and take its result
    pub fn get(self) -> Result<T> {
        let mut guard = self.slot.lock();
        loop {
            if let Some(result) = guard.take() {
                return result;
            }
            guard = self
                .slot
                .ready
                .wait(guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

/// Completes the future with an error if the job unwinds before reporting
struct CompletionGuard<T> {
    slot: Arc<Slot<T>>,
    done: bool,
}

impl<T> CompletionGuard<T> {
    fn finish(mut self, result: Result<T>) {
        self.slot.complete(result);
        self.done = true;
    }
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        if !self.done {
            self.slot.complete(Err(pvr_err!(DecodeFailure, SOURCE, "Worker job panicked")));
        }
    }
}

// ===== LOADER =====

/// Worker pool for texture jobs
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pvr_texture::pvr::Config;
/// use pvr_texture::pvr::async_loader::AsyncLoader;
/// use pvr_texture::pvr::formats::FileAssetProvider;
///
/// let loader = AsyncLoader::new(&Config::default()).unwrap();
/// let provider = Arc::new(FileAssetProvider::new("assets"));
/// let future = loader.load(provider, "brick.pvr", None);
/// let texture = future.get().unwrap();
/// ```
pub struct AsyncLoader {
    pool: rayon::ThreadPool,
    config: Config,
}

impl AsyncLoader {
    /// Build a pool with `config.resolved_worker_threads()` workers
    pub fn new(config: &Config) -> Result<Self> {
        let threads = config.resolved_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pvr-loader-{}", i))
            .panic_handler(|_| pvr_error!(SOURCE, "Worker job panicked"))
            .build()
            .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to build worker pool: {}", e))?;
        pvr_debug!(SOURCE, "Async loader started with {} workers", threads);
        Ok(Self { pool, config: config.clone() })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on the pool
    pub fn submit<T, F>(&self, job: F) -> TextureFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let slot = Arc::new(Slot { value: Mutex::new(None), ready: Condvar::new() });
        let guard = CompletionGuard { slot: Arc::clone(&slot), done: false };
        self.pool.spawn(move || {
            let result = job();
            guard.finish(result);
        });
        TextureFuture { slot }
    }

    /// Open and decode an asset on the pool
    pub fn load(
        &self,
        provider: Arc<dyn AssetProvider>,
        name: &str,
        hint: Option<ContainerFormat>,
    ) -> TextureFuture<TextureDescriptor> {
        let name = name.to_string();
        self.submit(move || {
            let mut stream = provider.open(&name)?;
            let hint = hint.or_else(|| ContainerFormat::from_path(&name));
            load_texture(&mut stream, hint)
        })
    }

    /// Open and decode an asset, then decompress it to RGBA8888 when a decoder exists
    ///
    /// Textures in formats without a decoder come back unchanged. With
    /// `allow_decompress` off in the loader's config nothing is decompressed.
    pub fn load_decompressed(
        &self,
        provider: Arc<dyn AssetProvider>,
        name: &str,
        hint: Option<ContainerFormat>,
    ) -> TextureFuture<TextureDescriptor> {
        let name = name.to_string();
        let config = self.config.clone();
        self.submit(move || {
            let mut stream = provider.open(&name)?;
            let hint = hint.or_else(|| ContainerFormat::from_path(&name));
            let texture = load_texture(&mut stream, hint)?;
            if !config.allow_decompress {
                return Ok(texture);
            }
            if !is_decompressible(texture.pixel_format()) {
                if texture.pixel_format().is_compressed() {
                    pvr_warn!(SOURCE, "'{}' is {} and has no decoder; returned compressed", name, texture.pixel_format());
                }
                return Ok(texture);
            }
            decompress_texture(&texture, config.parallel_decompress)
        })
    }
}

#[cfg(test)]
#[path = "async_loader_tests.rs"]
mod tests;
