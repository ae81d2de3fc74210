/// Capability - backend native format sets and upload negotiation
///
/// A backend reports the texture formats it consumes without CPU transcoding,
/// queried once per context and kept in a `CapabilityCache`. `negotiate` is a pure
/// function of the format, those capabilities and the caller's decompression policy.

use std::sync::OnceLock;
use rustc_hash::FxHashSet;
use crate::decompress::{decompressed_format, is_decompressible};
use crate::error::Result;
use crate::pvr_bail;
use crate::texture::TextureFormat;

const SOURCE: &str = "pvr::capability";

// ===== BACKEND CAPABILITIES =====

/// Formats and limits of one backend context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub(crate) native_formats: FxHashSet<TextureFormat>,
    /// Largest width or height of a 2D texture
    pub max_dimension: u32,
    /// Largest depth of a volume texture (0 = volumes unsupported)
    pub max_volume_dimension: u32,
    /// Largest array layer count
    pub max_array_layers: u32,
    /// Whether cube maps may also be arrays
    pub cube_map_arrays: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            native_formats: FxHashSet::default(),
            max_dimension: 4096,
            max_volume_dimension: 256,
            max_array_layers: 256,
            cube_map_arrays: false,
        }
    }
}

impl BackendCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a native format list with default limits
    pub fn with_formats(formats: impl IntoIterator<Item = TextureFormat>) -> Self {
        let mut capabilities = Self::default();
        capabilities.extend(formats);
        capabilities
    }

    /// Add a native format (compressed keys are normalised)
    pub fn insert(&mut self, format: TextureFormat) {
        self.native_formats.insert(format.normalized());
    }

    pub fn extend(&mut self, formats: impl IntoIterator<Item = TextureFormat>) {
        for format in formats {
            self.insert(format);
        }
    }

    /// Exact match against the native set
    pub fn supports(&self, format: TextureFormat) -> bool {
        self.native_formats.contains(&format.normalized())
    }

    pub fn native_formats(&self) -> impl Iterator<Item = &TextureFormat> {
        self.native_formats.iter()
    }

    pub fn format_count(&self) -> usize {
        self.native_formats.len()
    }

    /// Reject dimensions or layouts the backend cannot allocate
    pub fn check_limits(&self, width: u32, height: u32, depth: u32, array_layers: u32, faces: u32) -> Result<()> {
        if width > self.max_dimension || height > self.max_dimension {
            pvr_bail!(
                AllocationFailure,
                SOURCE,
                "Texture {}x{} exceeds the backend limit of {}",
                width, height, self.max_dimension
            );
        }
        if depth > 1 && depth > self.max_volume_dimension {
            pvr_bail!(
                AllocationFailure,
                SOURCE,
                "Volume depth {} exceeds the backend limit of {}",
                depth, self.max_volume_dimension
            );
        }
        if array_layers > self.max_array_layers {
            pvr_bail!(
                AllocationFailure,
                SOURCE,
                "{} array layers exceed the backend limit of {}",
                array_layers, self.max_array_layers
            );
        }
        if faces == 6 && array_layers > 1 && !self.cube_map_arrays {
            pvr_bail!(AllocationFailure, SOURCE, "Backend does not support cube map arrays");
        }
        Ok(())
    }
}

// ===== NEGOTIATION =====

/// How a texture of a given format reaches the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityDecision {
    /// Upload the stored bytes as they are
    UploadNative,
    /// Decompress on the CPU first, then upload `target`
    UploadDecompressedFallback {
        target: TextureFormat,
        /// Caller policy that permitted the fallback
        allow_decompress: bool,
    },
    /// Neither native nor decompressible under the caller's policy
    Unsupported,
}

impl CapabilityDecision {
    /// Format the backend allocates, if any
    pub fn upload_format(&self, source: TextureFormat) -> Option<TextureFormat> {
        match self {
            Self::UploadNative => Some(source),
            Self::UploadDecompressedFallback { target, .. } => Some(*target),
            Self::Unsupported => None,
        }
    }

    pub fn requires_decompression(&self) -> bool {
        matches!(self, Self::UploadDecompressedFallback { .. })
    }
}

/// Decide how `format` is uploaded to a backend with `capabilities`
///
/// Native support wins; otherwise PVRTC and ETC fall back to RGBA8888 when the
/// caller allows decompression.
///
/// # Example
///
/// ```
/// use pvr_texture::pvr::capability::{negotiate, BackendCapabilities, CapabilityDecision};
/// use pvr_texture::pvr::texture::{ColorSpace, CompressedPixelFormat, TextureFormat};
///
/// let etc2 = TextureFormat::compressed(CompressedPixelFormat::ETC2_RGB, ColorSpace::Linear);
/// let caps = BackendCapabilities::with_formats([etc2]);
/// assert_eq!(negotiate(etc2, &caps, false), CapabilityDecision::UploadNative);
/// ```
pub fn negotiate(format: TextureFormat, capabilities: &BackendCapabilities, allow_decompress: bool) -> CapabilityDecision {
    if capabilities.supports(format) {
        return CapabilityDecision::UploadNative;
    }
    if allow_decompress && is_decompressible(format.pixel_format) {
        return CapabilityDecision::UploadDecompressedFallback {
            target: decompressed_format(format),
            allow_decompress,
        };
    }
    CapabilityDecision::Unsupported
}

// ===== CACHE =====

/// Capabilities queried at most once per backend context
#[derive(Debug, Default)]
pub struct CapabilityCache {
    cell: OnceLock<BackendCapabilities>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached capabilities, running `query` only on first use
    pub fn get_or_query(&self, query: impl FnOnce() -> BackendCapabilities) -> &BackendCapabilities {
        self.cell.get_or_init(query)
    }

    /// Cached capabilities, if already queried
    pub fn get(&self) -> Option<&BackendCapabilities> {
        self.cell.get()
    }

    pub fn is_populated(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
