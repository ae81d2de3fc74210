/// Stream helpers and asset providers
///
/// Parsers consume any `Read + Seek`. Detection peeks and restores the stream
/// position; data reads are bounded by the bytes actually left in the stream.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

/// Byte stream consumed by the container parsers
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Run `f` and restore the stream position afterwards, whatever `f` returned
pub(crate) fn peek<S, T, F>(stream: &mut S, f: F) -> Result<T>
where
    S: Read + Seek + ?Sized,
    F: FnOnce(&mut S) -> io::Result<T>,
{
    let start = stream.stream_position()?;
    let result = f(stream);
    stream.seek(SeekFrom::Start(start))?;
    Ok(result?)
}

/// Up to `len` bytes from the current position, position restored. Shorter streams yield fewer bytes.
pub(crate) fn peek_prefix<S: Read + Seek + ?Sized>(stream: &mut S, len: usize) -> Result<Vec<u8>> {
    peek(stream, |s| {
        let mut bytes = Vec::with_capacity(len);
        Read::take(&mut *s, len as u64).read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

/// Bytes between the current position and the end of the stream
pub(crate) fn remaining_len<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let position = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

/// Read exactly `len` bytes, failing with `CorruptData` before allocating if the stream is shorter
pub(crate) fn read_exact_vec<S: Read + Seek + ?Sized>(stream: &mut S, len: usize, what: &str) -> Result<Vec<u8>> {
    let remaining = remaining_len(stream)?;
    if (len as u64) > remaining {
        return Err(Error::CorruptData(format!(
            "{} needs {} bytes but only {} remain",
            what, len, remaining
        )));
    }
    let mut data = vec![0u8; len];
    stream.read_exact(&mut data)?;
    Ok(data)
}

/// Skip `len` bytes, failing with `CorruptData` if that runs past the end
pub(crate) fn skip<S: Read + Seek + ?Sized>(stream: &mut S, len: u64, what: &str) -> Result<()> {
    let remaining = remaining_len(stream)?;
    if len > remaining {
        return Err(Error::CorruptData(format!(
            "{} skips {} bytes but only {} remain",
            what, len, remaining
        )));
    }
    stream.seek(SeekFrom::Current(len as i64))?;
    Ok(())
}

// ===== ASSET PROVIDERS =====

/// Resolves an asset name to a readable stream
pub trait AssetProvider: Send + Sync {
    /// Open the named asset
    fn open(&self, name: &str) -> Result<Box<dyn ReadSeek + Send>>;
}

/// Reads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FileAssetProvider {
    root: PathBuf,
}

impl FileAssetProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetProvider for FileAssetProvider {
    fn open(&self, name: &str) -> Result<Box<dyn ReadSeek + Send>> {
        let path = self.root.join(name);
        let file = File::open(&path)
            .map_err(|e| Error::Io(format!("Cannot open '{}': {}", path.display(), e)))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Explicit in-memory asset map, populated by its owner (tests, embedded data)
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetProvider {
    assets: FxHashMap<String, Arc<[u8]>>,
}

impl MemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an asset
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(name.into(), bytes.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }
}

impl AssetProvider for MemoryAssetProvider {
    fn open(&self, name: &str) -> Result<Box<dyn ReadSeek + Send>> {
        let bytes = self
            .assets
            .get(name)
            .ok_or_else(|| Error::Io(format!("Asset '{}' not found", name)))?;
        Ok(Box::new(Cursor::new(Arc::clone(bytes))))
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
