/// Formats module - container readers, the PVR writer and asset providers
///
/// Every reader exposes `is_supported_file` (peeks, restores the position) and
/// `read`. `load_texture` picks a reader from a hint or by trying the detectors
/// in a fixed order.

pub mod stream;
pub mod pvr;
pub mod ktx;
pub mod dds;
pub mod bmp;
pub mod tga;
pub mod xnb;

pub use stream::{AssetProvider, FileAssetProvider, MemoryAssetProvider, ReadSeek};
pub use pvr::write_pvr;

use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;
use crate::error::Result;
use crate::texture::TextureDescriptor;
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::formats";

// ===== CONTAINER FORMAT =====

/// Supported texture container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Pvr,
    Ktx,
    Dds,
    Bmp,
    Tga,
    Xnb,
}

impl ContainerFormat {
    /// Map a file extension (with or without the dot, any case)
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match extension.as_str() {
            "pvr" => Some(Self::Pvr),
            "ktx" => Some(Self::Ktx),
            "dds" => Some(Self::Dds),
            "bmp" | "dib" => Some(Self::Bmp),
            "tga" | "targa" => Some(Self::Tga),
            "xnb" => Some(Self::Xnb),
            _ => None,
        }
    }

    /// Map the extension of an asset name or path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    fn entry(self) -> &'static ReaderEntry {
        // READERS holds one entry per variant, in declaration order
        &READERS[self as usize]
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pvr => "PVR",
            Self::Ktx => "KTX",
            Self::Dds => "DDS",
            Self::Bmp => "BMP",
            Self::Tga => "TGA",
            Self::Xnb => "XNB",
        };
        f.write_str(name)
    }
}

// ===== DISPATCH TABLE =====

type DetectFn = fn(&mut dyn ReadSeek) -> Result<bool>;
type ReadFn = fn(&mut dyn ReadSeek) -> Result<TextureDescriptor>;

struct ReaderEntry {
    format: ContainerFormat,
    detect: DetectFn,
    read: ReadFn,
}

/// One entry per `ContainerFormat`, indexed by discriminant
static READERS: [ReaderEntry; 6] = [
    ReaderEntry { format: ContainerFormat::Pvr, detect: |s| pvr::is_supported_file(s), read: |s| pvr::read(s) },
    ReaderEntry { format: ContainerFormat::Ktx, detect: |s| ktx::is_supported_file(s), read: |s| ktx::read(s) },
    ReaderEntry { format: ContainerFormat::Dds, detect: |s| dds::is_supported_file(s), read: |s| dds::read(s) },
    ReaderEntry { format: ContainerFormat::Bmp, detect: |s| bmp::is_supported_file(s), read: |s| bmp::read(s) },
    ReaderEntry { format: ContainerFormat::Tga, detect: |s| tga::is_supported_file(s), read: |s| tga::read(s) },
    ReaderEntry { format: ContainerFormat::Xnb, detect: |s| xnb::is_supported_file(s), read: |s| xnb::read(s) },
];

/// TGA has no magic, so it is tried last
const DETECTION_ORDER: [ContainerFormat; 6] = [
    ContainerFormat::Pvr,
    ContainerFormat::Ktx,
    ContainerFormat::Dds,
    ContainerFormat::Bmp,
    ContainerFormat::Xnb,
    ContainerFormat::Tga,
];

// ===== PUBLIC API =====

/// Identify the container format of a stream without consuming it
pub fn detect<S: Read + Seek>(stream: &mut S) -> Result<Option<ContainerFormat>> {
    let stream: &mut dyn ReadSeek = stream;
    for format in DETECTION_ORDER {
        if (format.entry().detect)(stream)? {
            return Ok(Some(format));
        }
    }
    Ok(None)
}

/// Decode a texture container into a canonical descriptor
///
/// With a hint, only that reader is used. Without one, the detectors are tried
/// in sequence and the first match decodes the stream.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use pvr_texture::pvr::formats::{load_texture, ContainerFormat};
///
/// let mut file = BufReader::new(File::open("brick.pvr").unwrap());
/// let texture = load_texture(&mut file, Some(ContainerFormat::Pvr)).unwrap();
/// println!("{}x{}", texture.width(0), texture.height(0));
/// ```
pub fn load_texture<S: Read + Seek>(stream: &mut S, hint: Option<ContainerFormat>) -> Result<TextureDescriptor> {
    let format = match hint {
        Some(format) => format,
        None => match detect(stream)? {
            Some(format) => format,
            None => pvr_bail!(Format, SOURCE, "Stream does not match any supported texture container"),
        },
    };
    let entry = format.entry();
    debug_assert_eq!(entry.format, format);
    pvr_debug!(SOURCE, "Decoding {} container", format);
    let stream: &mut dyn ReadSeek = stream;
    (entry.read)(stream)
}

/// Open an asset through a provider and decode it, using the name's extension as the hint
pub fn load_asset(provider: &dyn AssetProvider, name: &str) -> Result<TextureDescriptor> {
    let mut stream = provider.open(name)?;
    load_texture(&mut stream, ContainerFormat::from_path(name))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
