/// GlesBackend - TextureBackend implementation over a caller-supplied GlApi
///
/// On ES 3.0+ storage is allocated up front with glTexStorage* and filled
/// with glTexSubImage*. On ES 2.0 (or with `use_tex_storage` off) each 2D
/// level is defined by glTexImage2D when it is written. Arrays, cube map
/// arrays and volumes always use immutable storage.

use pvr_texture::pvr::capability::{BackendCapabilities, CapabilityCache};
use pvr_texture::pvr::upload::{NativeTexture, SubresourceRegion, TextureBackend, TextureInfo};
use pvr_texture::pvr::Result;
use pvr_texture::{pvr_bail, pvr_debug, pvr_trace, pvr_warn};

use crate::gles_api::GlApi;
use crate::gles_capabilities::{query_capabilities, GlFeatures, GlLimits, GlesVersion};
use crate::gles_format::{gl, gl_error_name, to_gl_format, GlFormat};

const SOURCE: &str = "pvr::gles";

/// glGetError is drained at most this many times per check
const MAX_ERROR_DRAIN: usize = 16;

// ===== CONFIG =====

/// GLES backend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlesConfig {
    /// Version of the current context
    pub es_version: GlesVersion,
    /// Allocate 2D textures with glTexStorage when available
    pub use_tex_storage: bool,
}

impl Default for GlesConfig {
    fn default() -> Self {
        Self { es_version: GlesVersion::Es3, use_tex_storage: true }
    }
}

// ===== TEXTURE =====

/// GL texture object created by the backend
///
/// The name is deleted through `TextureBackend::release`; GL objects cannot
/// be freed from `Drop` without the context.
#[derive(Debug)]
pub struct GlesTexture {
    name: u32,
    target: u32,
    gl_format: GlFormat,
    immutable: bool,
    ready: bool,
    info: TextureInfo,
}

impl GlesTexture {
    /// GL texture name
    pub fn name(&self) -> u32 {
        self.name
    }

    /// Bind target (GL_TEXTURE_2D, GL_TEXTURE_CUBE_MAP, ...)
    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn gl_format(&self) -> GlFormat {
        self.gl_format
    }

    /// True when storage came from glTexStorage*
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn layer_face(&self, layer: u32, face: u32) -> i32 {
        (layer * self.info.faces + face) as i32
    }
}

impl NativeTexture for GlesTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ===== BACKEND =====

/// Texture upload backend for OpenGL ES
pub struct GlesBackend<G: GlApi> {
    gl: G,
    config: GlesConfig,
    features: GlFeatures,
    capabilities: CapabilityCache,
}

impl<G: GlApi> GlesBackend<G> {
    /// Backend on the context `gl` talks to; the context must be current
    pub fn new(gl: G, config: GlesConfig) -> Self {
        let features = GlFeatures::query(&gl, config.es_version);
        pvr_debug!(
            SOURCE,
            "GLES backend on {:?} ({} extensions, tex_storage: {})",
            features.version,
            features.extension_count(),
            config.use_tex_storage && features.has_tex_storage()
        );
        Self { gl, config, features, capabilities: CapabilityCache::new() }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    pub fn into_inner(self) -> G {
        self.gl
    }

    pub fn features(&self) -> &GlFeatures {
        &self.features
    }

    pub fn config(&self) -> &GlesConfig {
        &self.config
    }

    /// First pending GL error, draining the error flags
    fn take_error(&mut self) -> Option<u32> {
        let mut first = None;
        for _ in 0..MAX_ERROR_DRAIN {
            match self.gl.get_error() {
                gl::NO_ERROR => break,
                code => {
                    first.get_or_insert(code);
                }
            }
        }
        first
    }

    fn target_for(&self, info: &TextureInfo) -> Result<u32> {
        let layered = info.is_array() || info.is_volume();
        if layered && !self.features.has_texture_arrays() {
            pvr_bail!(
                AllocationFailure,
                SOURCE,
                "{:?} has no array or 3D textures ({} layers, depth {})",
                self.features.version, info.array_layers, info.depth
            );
        }
        if info.is_volume() {
            if info.is_array() || info.is_cube_map() {
                pvr_bail!(AllocationFailure, SOURCE, "3D textures cannot be arrays or cube maps");
            }
            return Ok(gl::TEXTURE_3D);
        }
        if info.is_cube_map() {
            if info.width != info.height {
                pvr_bail!(AllocationFailure, SOURCE, "Cube map faces must be square ({}x{})", info.width, info.height);
            }
            if info.is_array() {
                if !self.features.has_cube_map_arrays() {
                    pvr_bail!(AllocationFailure, SOURCE, "Context has no cube map arrays");
                }
                return Ok(gl::TEXTURE_CUBE_MAP_ARRAY);
            }
            return Ok(gl::TEXTURE_CUBE_MAP);
        }
        if info.is_array() {
            return Ok(gl::TEXTURE_2D_ARRAY);
        }
        Ok(gl::TEXTURE_2D)
    }

    /// Minification filter that keeps the texture complete
    fn min_filter(&self, info: &TextureInfo) -> u32 {
        if info.mip_levels <= 1 {
            return gl::LINEAR;
        }
        if self.features.version < GlesVersion::Es3 {
            // ES 2.0 has no GL_TEXTURE_MAX_LEVEL, so a partial chain is incomplete
            let full_chain = 32 - info.width.max(info.height).max(1).leading_zeros();
            if info.mip_levels != full_chain {
                pvr_warn!(
                    SOURCE,
                    "{} of {} mip levels on ES 2.0; sampling without mipmaps",
                    info.mip_levels, full_chain
                );
                return gl::LINEAR;
            }
        }
        gl::LINEAR_MIPMAP_LINEAR
    }
}

impl<G: GlApi> TextureBackend for GlesBackend<G> {
    type Texture = GlesTexture;

    fn name(&self) -> &str {
        "gles"
    }

    fn capabilities(&self) -> &BackendCapabilities {
        self.capabilities.get_or_query(|| {
            let limits = GlLimits::query(&self.gl, &self.features);
            query_capabilities(&self.features, &limits)
        })
    }

    fn allocate(&mut self, info: &TextureInfo) -> Result<GlesTexture> {
        let gl_format = match to_gl_format(info.format, &self.features) {
            Some(format) => format,
            None => pvr_bail!(
                AllocationFailure,
                SOURCE,
                "{} ({:?}) is not available on this context",
                info.format.pixel_format, info.format.color_space
            ),
        };
        let target = self.target_for(info)?;
        let layered = target != gl::TEXTURE_2D && target != gl::TEXTURE_CUBE_MAP;
        let immutable = layered || (self.config.use_tex_storage && self.features.has_tex_storage());

        // Errors left by the application are not ours
        if let Some(code) = self.take_error() {
            pvr_warn!(SOURCE, "Discarding pending {} before allocation", gl_error_name(code));
        }

        let name = self.gl.gen_texture();
        if name == 0 {
            pvr_bail!(AllocationFailure, SOURCE, "glGenTextures returned no name");
        }
        self.gl.bind_texture(target, name);
        self.gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);

        if immutable {
            let levels = info.mip_levels as i32;
            let (width, height) = (info.width as i32, info.height as i32);
            match target {
                gl::TEXTURE_2D | gl::TEXTURE_CUBE_MAP => {
                    self.gl.tex_storage_2d(target, levels, gl_format.internal_format, width, height)
                }
                gl::TEXTURE_3D => self.gl.tex_storage_3d(
                    target,
                    levels,
                    gl_format.internal_format,
                    width,
                    height,
                    info.depth as i32,
                ),
                _ => self.gl.tex_storage_3d(
                    target,
                    levels,
                    gl_format.internal_format,
                    width,
                    height,
                    (info.array_layers * info.faces) as i32,
                ),
            }
        }

        let error = self.take_error();
        self.gl.bind_texture(target, 0);
        if let Some(code) = error {
            self.gl.delete_texture(name);
            pvr_bail!(
                AllocationFailure,
                SOURCE,
                "{} while allocating {}x{} texture (format 0x{:04X})",
                gl_error_name(code), info.width, info.height, gl_format.internal_format
            );
        }

        pvr_trace!(SOURCE, "Texture {} created on target 0x{:04X} (immutable: {})", name, target, immutable);
        Ok(GlesTexture { name, target, gl_format, immutable, ready: false, info: info.clone() })
    }

    fn write_subresource(&mut self, texture: &mut GlesTexture, region: &SubresourceRegion, data: &[u8]) -> Result<()> {
        if !texture.info.contains(region.index) {
            pvr_bail!(UploadFailure, SOURCE, "Sub-resource {:?} is outside texture {}", region.index, texture.name);
        }
        let expected = texture.info.subresource_size(region.index.mip);
        if data.len() != expected {
            pvr_bail!(
                UploadFailure,
                SOURCE,
                "Sub-resource {:?} got {} bytes, expected {}",
                region.index, data.len(), expected
            );
        }

        let format = texture.gl_format;
        let level = region.index.mip as i32;
        let (width, height) = (region.width as i32, region.height as i32);
        let version = self.features.version;

        self.gl.bind_texture(texture.target, texture.name);
        match texture.target {
            gl::TEXTURE_2D | gl::TEXTURE_CUBE_MAP => {
                let image_target = if texture.target == gl::TEXTURE_CUBE_MAP {
                    gl::TEXTURE_CUBE_MAP_POSITIVE_X + region.index.face
                } else {
                    gl::TEXTURE_2D
                };
                match (format.is_compressed(), texture.immutable) {
                    (true, true) => self.gl.compressed_tex_sub_image_2d(
                        image_target, level, 0, 0, width, height, format.internal_format, data,
                    ),
                    (true, false) => self.gl.compressed_tex_image_2d(
                        image_target, level, format.internal_format, width, height, data,
                    ),
                    (false, true) => self.gl.tex_sub_image_2d(
                        image_target, level, 0, 0, width, height, format.format, format.data_type, data,
                    ),
                    (false, false) => self.gl.tex_image_2d(
                        image_target,
                        level,
                        format.image_internal_format(version),
                        width,
                        height,
                        format.format,
                        format.data_type,
                        data,
                    ),
                }
            }
            target => {
                let (z_offset, depth) = if target == gl::TEXTURE_3D {
                    (0, region.depth as i32)
                } else {
                    (texture.layer_face(region.index.layer, region.index.face), 1)
                };
                if format.is_compressed() {
                    self.gl.compressed_tex_sub_image_3d(
                        target, level, 0, 0, z_offset, width, height, depth, format.internal_format, data,
                    );
                } else {
                    self.gl.tex_sub_image_3d(
                        target, level, 0, 0, z_offset, width, height, depth, format.format, format.data_type, data,
                    );
                }
            }
        }

        let error = self.take_error();
        self.gl.bind_texture(texture.target, 0);
        if let Some(code) = error {
            pvr_bail!(
                UploadFailure,
                SOURCE,
                "{} writing {:?} of texture {}",
                gl_error_name(code), region.index, texture.name
            );
        }
        Ok(())
    }

    fn finalize(&mut self, texture: &mut GlesTexture) -> Result<()> {
        let min_filter = self.min_filter(&texture.info);
        self.gl.bind_texture(texture.target, texture.name);
        self.gl.tex_parameter_i(texture.target, gl::TEXTURE_MIN_FILTER, min_filter as i32);
        self.gl.tex_parameter_i(texture.target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
        if self.features.version >= GlesVersion::Es3 {
            self.gl.tex_parameter_i(
                texture.target,
                gl::TEXTURE_MAX_LEVEL,
                texture.info.mip_levels.saturating_sub(1) as i32,
            );
        }

        let error = self.take_error();
        self.gl.bind_texture(texture.target, 0);
        if let Some(code) = error {
            pvr_bail!(UploadFailure, SOURCE, "{} finalizing texture {}", gl_error_name(code), texture.name);
        }
        texture.ready = true;
        Ok(())
    }

    fn release(&mut self, texture: GlesTexture) {
        pvr_trace!(SOURCE, "Deleting texture {}", texture.name);
        self.gl.delete_texture(texture.name);
    }
}

#[cfg(test)]
#[path = "gles_backend_tests.rs"]
mod tests;
