/// Pipeline configuration

/// Runtime options for loading, decompression and upload
///
/// # Example
///
/// ```no_run
/// use pvr_texture::pvr::Config;
///
/// let config = Config {
///     allow_decompress: false,
///     ..Config::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Permit CPU decompression when the backend lacks a compressed format
    pub allow_decompress: bool,
    /// Worker threads for the async loader (0 = available parallelism)
    pub worker_threads: usize,
    /// Decompress independent mip/layer/face units in parallel
    pub parallel_decompress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_decompress: true,
            worker_threads: 0,
            parallel_decompress: true,
        }
    }
}

impl Config {
    /// Worker thread count with 0 resolved to the machine's parallelism
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
