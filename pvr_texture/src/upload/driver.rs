/// Upload driver - turns a TextureDescriptor into a backend-native texture
///
/// Each upload walks `Created -> Allocated -> Populated -> Ready`. Any failure
/// moves it to `Failed` after the partially built texture has been released, so
/// callers only ever see complete textures.

use crate::capability::{negotiate, CapabilityDecision};
use crate::config::Config;
use crate::decompress::decompress_texture;
use crate::error::{Error, Result};
use crate::texture::TextureDescriptor;
use crate::upload::backend::{NativeTexture, TextureBackend, TextureInfo};
use crate::{pvr_bail, pvr_debug, pvr_error, pvr_trace};

const SOURCE: &str = "pvr::upload";

/// Progress of one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Created,
    Allocated,
    Populated,
    Ready,
    Failed,
}

/// Successfully uploaded texture; the caller owns the native handle
#[derive(Debug)]
pub struct UploadedTexture<T> {
    pub texture: T,
    /// Path the upload took
    pub decision: CapabilityDecision,
}

impl<T: NativeTexture> UploadedTexture<T> {
    pub fn info(&self) -> &TextureInfo {
        self.texture.info()
    }

    pub fn into_inner(self) -> T {
        self.texture
    }
}

/// Upload `texture` with the default configuration and the given decompression policy
///
/// # Example
///
/// ```
/// use pvr_texture::pvr::capability::BackendCapabilities;
/// use pvr_texture::pvr::texture::*;
/// use pvr_texture::pvr::upload::{upload_texture, MockBackend};
///
/// let header = TextureHeader::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear, 2, 2);
/// let texture = TextureDescriptor::new(header, vec![0; 16]).unwrap();
/// let mut backend = MockBackend::new(BackendCapabilities::with_formats([TextureFormat::rgba8888(ColorSpace::Linear)]));
/// let uploaded = upload_texture(&mut backend, &texture, false).unwrap();
/// assert_eq!(uploaded.info().width, 2);
/// ```
pub fn upload_texture<B: TextureBackend + ?Sized>(
    backend: &mut B,
    texture: &TextureDescriptor,
    allow_decompress: bool,
) -> Result<UploadedTexture<B::Texture>> {
    let config = Config { allow_decompress, ..Config::default() };
    upload_texture_with_config(backend, texture, &config)
}

/// Upload `texture`, taking the decompression policy and parallelism from `config`
pub fn upload_texture_with_config<B: TextureBackend + ?Sized>(
    backend: &mut B,
    texture: &TextureDescriptor,
    config: &Config,
) -> Result<UploadedTexture<B::Texture>> {
    let mut job = UploadJob::new(backend.name().to_string());
    let result = job.run(backend, texture, config);
    if result.is_err() {
        job.transition(UploadState::Failed);
    }
    result
}

// ===== UPLOAD JOB =====

struct UploadJob {
    backend: String,
    state: UploadState,
}

impl UploadJob {
    fn new(backend: String) -> Self {
        Self { backend, state: UploadState::Created }
    }

    fn transition(&mut self, state: UploadState) {
        pvr_trace!(SOURCE, "[{}] upload {:?} -> {:?}", self.backend, self.state, state);
        self.state = state;
    }

    fn run<B: TextureBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        texture: &TextureDescriptor,
        config: &Config,
    ) -> Result<UploadedTexture<B::Texture>> {
        let source_format = texture.texture_format();
        let decision = negotiate(source_format, backend.capabilities(), config.allow_decompress);
        let upload_format = match decision.upload_format(source_format) {
            Some(format) => format,
            None => pvr_bail!(
                UnsupportedVariant,
                SOURCE,
                "[{}] format {} is not native and cannot be decompressed (allow_decompress = {})",
                self.backend, texture.pixel_format(), config.allow_decompress
            ),
        };

        let decompressed;
        let source = if decision.requires_decompression() {
            decompressed = decompress_texture(texture, config.parallel_decompress).map_err(|e| match e {
                Error::DecodeFailure(_) => e,
                other => Error::DecodeFailure(other.to_string()),
            })?;
            &decompressed
        } else {
            texture
        };

        let info = TextureInfo::from_header(source.header(), upload_format);
        backend
            .capabilities()
            .check_limits(info.width, info.height, info.depth, info.array_layers, info.faces)?;

        let mut native = backend.allocate(&info)?;
        self.transition(UploadState::Allocated);

        if let Err(error) = Self::populate(backend, &mut native, source, &info) {
            pvr_error!(SOURCE, "[{}] upload failed, releasing partial texture: {}", self.backend, error);
            backend.release(native);
            return Err(error);
        }
        self.transition(UploadState::Populated);

        if let Err(error) = backend.finalize(&mut native) {
            pvr_error!(SOURCE, "[{}] finalize failed, releasing texture: {}", self.backend, error);
            backend.release(native);
            return Err(error);
        }
        self.transition(UploadState::Ready);

        pvr_debug!(
            SOURCE,
            "[{}] uploaded {}x{}x{} {} ({} mips, {} layers, {} faces, {:?})",
            self.backend, info.width, info.height, info.depth, info.format.pixel_format,
            info.mip_levels, info.array_layers, info.faces, decision
        );
        Ok(UploadedTexture { texture: native, decision })
    }

    fn populate<B: TextureBackend + ?Sized>(
        backend: &mut B,
        native: &mut B::Texture,
        source: &TextureDescriptor,
        info: &TextureInfo,
    ) -> Result<()> {
        for index in source.subresources() {
            let data = source.mip_data(index.mip, index.face, index.layer)?;
            backend.write_subresource(native, &info.region(index), data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
