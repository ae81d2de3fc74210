/// GLES context features: version, extension string parsing and native format support

use pvr_texture::pvr::capability::BackendCapabilities;
use pvr_texture::{pvr_debug, pvr_warn};
use rustc_hash::FxHashSet;

use crate::gles_api::GlApi;
use crate::gles_format::{gl, FORMAT_TABLE};

const SOURCE: &str = "pvr::gles";

/// OpenGL ES version of the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlesVersion {
    Es2,
    Es3,
    Es31,
    Es32,
}

impl GlesVersion {
    /// Parse a GL_VERSION string ("OpenGL ES 3.2 build 1.13@5776728")
    pub fn parse(version: &str) -> Option<Self> {
        let rest = version.trim().strip_prefix("OpenGL ES")?;
        // "OpenGL ES-CM 1.1" and similar profiles are not ES 2+
        let numbers = rest.strip_prefix(' ')?;
        let mut parts = numbers
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().ok());
        let major = parts.next()??;
        let minor = parts.next().flatten().unwrap_or(0);
        match (major, minor) {
            (2, _) => Some(GlesVersion::Es2),
            (3, 0) => Some(GlesVersion::Es3),
            (3, 1) => Some(GlesVersion::Es31),
            (3, _) => Some(GlesVersion::Es32),
            (major, _) if major > 3 => Some(GlesVersion::Es32),
            _ => None,
        }
    }
}

/// Version and extensions of a GL context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlFeatures {
    pub version: GlesVersion,
    extensions: FxHashSet<String>,
}

impl GlFeatures {
    /// Features from a version and a space-separated GL_EXTENSIONS string
    pub fn new(version: GlesVersion, extensions: &str) -> Self {
        Self {
            version,
            extensions: extensions.split_ascii_whitespace().map(str::to_string).collect(),
        }
    }

    /// Query GL_EXTENSIONS from the context
    pub fn query<G: GlApi + ?Sized>(gl_api: &G, version: GlesVersion) -> Self {
        let extensions = gl_api.get_string(gl::EXTENSIONS).unwrap_or_default();
        if let Some(reported) = gl_api.get_string(gl::VERSION).as_deref().and_then(GlesVersion::parse) {
            if reported < version {
                pvr_warn!(SOURCE, "Context reports {:?} but {:?} was configured", reported, version);
            }
        }
        Self::new(version, &extensions)
    }

    pub fn has(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Texture arrays and 3D textures (ES 3.0)
    pub fn has_texture_arrays(&self) -> bool {
        self.version >= GlesVersion::Es3
    }

    /// glTexStorage* (ES 3.0, or GL_EXT_texture_storage)
    pub fn has_tex_storage(&self) -> bool {
        self.version >= GlesVersion::Es3 || self.has("GL_EXT_texture_storage")
    }

    pub fn has_cube_map_arrays(&self) -> bool {
        self.version >= GlesVersion::Es32
            || self.has("GL_EXT_texture_cube_map_array")
            || self.has("GL_OES_texture_cube_map_array")
    }
}

/// Size limits reported by the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlLimits {
    pub max_texture_size: u32,
    pub max_cube_map_size: u32,
    pub max_3d_texture_size: u32,
    pub max_array_layers: u32,
}

impl GlLimits {
    pub fn query<G: GlApi + ?Sized>(gl_api: &G, features: &GlFeatures) -> Self {
        let get = |name| gl_api.get_integer(name).max(0) as u32;
        let arrays = features.has_texture_arrays();
        Self {
            max_texture_size: get(gl::MAX_TEXTURE_SIZE),
            max_cube_map_size: get(gl::MAX_CUBE_MAP_TEXTURE_SIZE),
            max_3d_texture_size: if arrays { get(gl::MAX_3D_TEXTURE_SIZE) } else { 1 },
            max_array_layers: if arrays { get(gl::MAX_ARRAY_TEXTURE_LAYERS) } else { 1 },
        }
    }
}

/// Native formats and limits of a context
pub fn query_capabilities(features: &GlFeatures, limits: &GlLimits) -> BackendCapabilities {
    let mut capabilities = BackendCapabilities::new();
    for (format, _, requirement) in FORMAT_TABLE {
        if requirement.is_met(features) {
            capabilities.insert(*format);
        }
    }
    capabilities.max_dimension = limits.max_texture_size.min(limits.max_cube_map_size);
    capabilities.max_volume_dimension = limits.max_3d_texture_size;
    capabilities.max_array_layers = limits.max_array_layers;
    capabilities.cube_map_arrays = features.has_cube_map_arrays();

    pvr_debug!(
        SOURCE,
        "{:?} context: {} extensions, {} native formats, max {}px",
        features.version, features.extension_count(), capabilities.format_count(), capabilities.max_dimension
    );
    capabilities
}

#[cfg(test)]
#[path = "gles_capabilities_tests.rs"]
mod tests;
