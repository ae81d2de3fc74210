/// GL enum values and the pvr format -> GL format table

use pvr_texture::pvr::texture::{
    ColorSpace, CompressedPixelFormat, PixelFormat, TextureFormat, VariableType,
};
use ColorSpace::{Linear, Srgb};
use CompressedPixelFormat as C;

use crate::gles_capabilities::{GlFeatures, GlesVersion};

/// GL enumerants used by the backend
pub mod gl {
    // Targets
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_3D: u32 = 0x806F;
    pub const TEXTURE_2D_ARRAY: u32 = 0x8C1A;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE_CUBE_MAP_POSITIVE_X: u32 = 0x8515;
    pub const TEXTURE_CUBE_MAP_ARRAY: u32 = 0x9009;

    // Pixel formats
    pub const ALPHA: u32 = 0x1906;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const LUMINANCE: u32 = 0x1909;
    pub const LUMINANCE_ALPHA: u32 = 0x190A;
    pub const RED: u32 = 0x1903;
    pub const RG: u32 = 0x8227;
    pub const BGRA_EXT: u32 = 0x80E1;

    // Data types
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
    pub const UNSIGNED_INT_5_9_9_9_REV: u32 = 0x8C3E;

    // Sized internal formats
    pub const RGBA8: u32 = 0x8058;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;
    pub const RGB8: u32 = 0x8051;
    pub const SRGB8: u32 = 0x8C41;
    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const RGB565: u32 = 0x8D62;
    pub const RGBA4: u32 = 0x8056;
    pub const RGB5_A1: u32 = 0x8057;
    pub const RGBA16F: u32 = 0x881A;
    pub const RGBA32F: u32 = 0x8814;
    pub const RGB9_E5: u32 = 0x8C3D;
    pub const BGRA8_EXT: u32 = 0x93A1;

    // PVRTC
    pub const COMPRESSED_RGB_PVRTC_4BPPV1_IMG: u32 = 0x8C00;
    pub const COMPRESSED_RGB_PVRTC_2BPPV1_IMG: u32 = 0x8C01;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV1_IMG: u32 = 0x8C02;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV1_IMG: u32 = 0x8C03;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV2_IMG: u32 = 0x9137;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV2_IMG: u32 = 0x9138;
    pub const COMPRESSED_SRGB_PVRTC_2BPPV1_EXT: u32 = 0x8A54;
    pub const COMPRESSED_SRGB_PVRTC_4BPPV1_EXT: u32 = 0x8A55;
    pub const COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1_EXT: u32 = 0x8A56;
    pub const COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1_EXT: u32 = 0x8A57;

    // ETC / EAC
    pub const ETC1_RGB8_OES: u32 = 0x8D64;
    pub const COMPRESSED_R11_EAC: u32 = 0x9270;
    pub const COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
    pub const COMPRESSED_RG11_EAC: u32 = 0x9272;
    pub const COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;
    pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
    pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
    pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
    pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
    pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
    pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

    // S3TC / RGTC / BPTC
    pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
    pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
    pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT: u32 = 0x8C4D;
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT: u32 = 0x8C4E;
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT: u32 = 0x8C4F;
    pub const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
    pub const COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
    pub const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
    pub const COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;
    pub const COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
    pub const COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;
    pub const COMPRESSED_RGB_BPTC_SIGNED_FLOAT: u32 = 0x8E8E;
    pub const COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: u32 = 0x8E8F;

    // Parameters
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_MAX_LEVEL: u32 = 0x813D;
    pub const LINEAR: u32 = 0x2601;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;
    pub const UNPACK_ALIGNMENT: u32 = 0x0CF5;

    // Queries
    pub const VERSION: u32 = 0x1F02;
    pub const EXTENSIONS: u32 = 0x1F03;
    pub const MAX_TEXTURE_SIZE: u32 = 0x0D33;
    pub const MAX_3D_TEXTURE_SIZE: u32 = 0x8073;
    pub const MAX_CUBE_MAP_TEXTURE_SIZE: u32 = 0x851C;
    pub const MAX_ARRAY_TEXTURE_LAYERS: u32 = 0x88FF;

    // Errors
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
}

/// Enumerants passed to glTexImage* / glCompressedTexImage*
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    /// Sized internal format (the compressed format for block formats)
    pub internal_format: u32,
    /// Client pixel format (0 for compressed formats)
    pub format: u32,
    /// Client data type (0 for compressed formats)
    pub data_type: u32,
}

impl GlFormat {
    const fn pixels(internal_format: u32, format: u32, data_type: u32) -> Self {
        Self { internal_format, format, data_type }
    }

    const fn compressed(internal_format: u32) -> Self {
        Self { internal_format, format: 0, data_type: 0 }
    }

    pub fn is_compressed(&self) -> bool {
        self.format == 0
    }

    /// Internal format argument for glTexImage2D/3D
    ///
    /// ES 2.0 only accepts unsized formats, where internal format == format.
    pub fn image_internal_format(&self, version: GlesVersion) -> u32 {
        if self.is_compressed() || version >= GlesVersion::Es3 {
            self.internal_format
        } else {
            self.format
        }
    }
}

/// What a context needs for a table entry to be usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Core(GlesVersion),
    Extension(&'static str),
    /// Core from the version on, or any of the extensions before it
    CoreOrExtension(GlesVersion, &'static [&'static str]),
}

impl Requirement {
    pub fn is_met(&self, features: &GlFeatures) -> bool {
        match *self {
            Requirement::Core(version) => features.version >= version,
            Requirement::Extension(name) => features.has(name),
            Requirement::CoreOrExtension(version, names) => {
                features.version >= version || names.iter().any(|name| features.has(name))
            }
        }
    }
}

const fn unorm(pixel_format: PixelFormat, color_space: ColorSpace) -> TextureFormat {
    TextureFormat::new(pixel_format, VariableType::UnsignedByteNorm, color_space)
}

const fn block(format: CompressedPixelFormat, color_space: ColorSpace) -> TextureFormat {
    TextureFormat::compressed(format, color_space)
}

const fn typed_block(format: CompressedPixelFormat, channel_type: VariableType) -> TextureFormat {
    TextureFormat::new(PixelFormat::compressed(format), channel_type, Linear)
}

use GlesVersion::{Es2, Es3};
use Requirement::{Core, CoreOrExtension, Extension};

const PVRTC: &str = "GL_IMG_texture_compression_pvrtc";
const PVRTC2: &str = "GL_IMG_texture_compression_pvrtc2";
const PVRTC_SRGB: &str = "GL_EXT_pvrtc_sRGB";
const ETC1: &str = "GL_OES_compressed_ETC1_RGB8_texture";
const S3TC: &str = "GL_EXT_texture_compression_s3tc";
const S3TC_SRGB: &str = "GL_EXT_texture_compression_s3tc_srgb";
const RGTC: &str = "GL_EXT_texture_compression_rgtc";
const BPTC: &str = "GL_EXT_texture_compression_bptc";

/// Every format the GLES backend can upload; the first usable entry per key wins
///
/// Keys are in `TextureFormat::normalized` form.
pub const FORMAT_TABLE: &[(TextureFormat, GlFormat, Requirement)] = &[
    // 8-bit per channel
    (unorm(PixelFormat::RGBA8888, Linear), GlFormat::pixels(gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE), Core(Es2)),
    (unorm(PixelFormat::RGBA8888, Srgb), GlFormat::pixels(gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE), CoreOrExtension(Es3, &["GL_EXT_sRGB"])),
    (unorm(PixelFormat::RGB888, Linear), GlFormat::pixels(gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE), Core(Es2)),
    (unorm(PixelFormat::RGB888, Srgb), GlFormat::pixels(gl::SRGB8, gl::RGB, gl::UNSIGNED_BYTE), Core(Es3)),
    (unorm(PixelFormat::BGRA8888, Linear), GlFormat::pixels(gl::BGRA8_EXT, gl::BGRA_EXT, gl::UNSIGNED_BYTE), Extension("GL_EXT_texture_format_BGRA8888")),
    (unorm(PixelFormat::BGRA8888, Linear), GlFormat::pixels(gl::BGRA8_EXT, gl::BGRA_EXT, gl::UNSIGNED_BYTE), Extension("GL_APPLE_texture_format_BGRA8888")),
    (unorm(PixelFormat::L8, Linear), GlFormat::pixels(gl::LUMINANCE, gl::LUMINANCE, gl::UNSIGNED_BYTE), Core(Es2)),
    (unorm(PixelFormat::LA88, Linear), GlFormat::pixels(gl::LUMINANCE_ALPHA, gl::LUMINANCE_ALPHA, gl::UNSIGNED_BYTE), Core(Es2)),
    (unorm(PixelFormat::A8, Linear), GlFormat::pixels(gl::ALPHA, gl::ALPHA, gl::UNSIGNED_BYTE), Core(Es2)),
    (unorm(PixelFormat::R8, Linear), GlFormat::pixels(gl::R8, gl::RED, gl::UNSIGNED_BYTE), CoreOrExtension(Es3, &["GL_EXT_texture_rg"])),
    (unorm(PixelFormat::RG88, Linear), GlFormat::pixels(gl::RG8, gl::RG, gl::UNSIGNED_BYTE), CoreOrExtension(Es3, &["GL_EXT_texture_rg"])),
    // Packed 16-bit
    (unorm(PixelFormat::RGB565, Linear), GlFormat::pixels(gl::RGB565, gl::RGB, gl::UNSIGNED_SHORT_5_6_5), Core(Es2)),
    (unorm(PixelFormat::RGBA4444, Linear), GlFormat::pixels(gl::RGBA4, gl::RGBA, gl::UNSIGNED_SHORT_4_4_4_4), Core(Es2)),
    (unorm(PixelFormat::RGBA5551, Linear), GlFormat::pixels(gl::RGB5_A1, gl::RGBA, gl::UNSIGNED_SHORT_5_5_5_1), Core(Es2)),
    // Float
    (TextureFormat::new(PixelFormat::RGBA16161616, VariableType::SignedFloat, Linear), GlFormat::pixels(gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT), Core(Es3)),
    (TextureFormat::new(PixelFormat::RGBA32323232, VariableType::SignedFloat, Linear), GlFormat::pixels(gl::RGBA32F, gl::RGBA, gl::FLOAT), Core(Es3)),
    (block(C::SharedExponentR9G9B9E5, Linear), GlFormat::pixels(gl::RGB9_E5, gl::RGB, gl::UNSIGNED_INT_5_9_9_9_REV), Core(Es3)),
    // PVRTC
    (block(C::PVRTCI_2bpp_RGB, Linear), GlFormat::compressed(gl::COMPRESSED_RGB_PVRTC_2BPPV1_IMG), Extension(PVRTC)),
    (block(C::PVRTCI_2bpp_RGBA, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_PVRTC_2BPPV1_IMG), Extension(PVRTC)),
    (block(C::PVRTCI_4bpp_RGB, Linear), GlFormat::compressed(gl::COMPRESSED_RGB_PVRTC_4BPPV1_IMG), Extension(PVRTC)),
    (block(C::PVRTCI_4bpp_RGBA, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_PVRTC_4BPPV1_IMG), Extension(PVRTC)),
    (block(C::PVRTCI_2bpp_RGB, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_PVRTC_2BPPV1_EXT), Extension(PVRTC_SRGB)),
    (block(C::PVRTCI_2bpp_RGBA, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1_EXT), Extension(PVRTC_SRGB)),
    (block(C::PVRTCI_4bpp_RGB, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_PVRTC_4BPPV1_EXT), Extension(PVRTC_SRGB)),
    (block(C::PVRTCI_4bpp_RGBA, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1_EXT), Extension(PVRTC_SRGB)),
    (block(C::PVRTCII_2bpp, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_PVRTC_2BPPV2_IMG), Extension(PVRTC2)),
    (block(C::PVRTCII_4bpp, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_PVRTC_4BPPV2_IMG), Extension(PVRTC2)),
    // ETC1: the OES format where exposed, else ES 3.0 ETC2 (a superset)
    (block(C::ETC1, Linear), GlFormat::compressed(gl::ETC1_RGB8_OES), Extension(ETC1)),
    (block(C::ETC1, Linear), GlFormat::compressed(gl::COMPRESSED_RGB8_ETC2), Core(Es3)),
    // ETC2 / EAC
    (block(C::ETC2_RGB, Linear), GlFormat::compressed(gl::COMPRESSED_RGB8_ETC2), Core(Es3)),
    (block(C::ETC2_RGB, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB8_ETC2), Core(Es3)),
    (block(C::ETC2_RGBA, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA8_ETC2_EAC), Core(Es3)),
    (block(C::ETC2_RGBA, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC), Core(Es3)),
    (block(C::ETC2_RGB_A1, Linear), GlFormat::compressed(gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2), Core(Es3)),
    (block(C::ETC2_RGB_A1, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2), Core(Es3)),
    (block(C::EAC_R11, Linear), GlFormat::compressed(gl::COMPRESSED_R11_EAC), Core(Es3)),
    (typed_block(C::EAC_R11, VariableType::SignedByteNorm), GlFormat::compressed(gl::COMPRESSED_SIGNED_R11_EAC), Core(Es3)),
    (block(C::EAC_RG11, Linear), GlFormat::compressed(gl::COMPRESSED_RG11_EAC), Core(Es3)),
    (typed_block(C::EAC_RG11, VariableType::SignedByteNorm), GlFormat::compressed(gl::COMPRESSED_SIGNED_RG11_EAC), Core(Es3)),
    // S3TC
    (block(C::DXT1, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_S3TC_DXT1_EXT), Extension(S3TC)),
    (block(C::DXT1, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_S3TC_DXT1_EXT), Extension("GL_EXT_texture_compression_dxt1")),
    (block(C::DXT3, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_S3TC_DXT3_EXT), Extension(S3TC)),
    (block(C::DXT5, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_S3TC_DXT5_EXT), Extension(S3TC)),
    (block(C::DXT1, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT), Extension(S3TC_SRGB)),
    (block(C::DXT3, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT), Extension(S3TC_SRGB)),
    (block(C::DXT5, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT), Extension(S3TC_SRGB)),
    // RGTC / BPTC
    (block(C::BC4, Linear), GlFormat::compressed(gl::COMPRESSED_RED_RGTC1), Extension(RGTC)),
    (typed_block(C::BC4, VariableType::SignedByteNorm), GlFormat::compressed(gl::COMPRESSED_SIGNED_RED_RGTC1), Extension(RGTC)),
    (block(C::BC5, Linear), GlFormat::compressed(gl::COMPRESSED_RG_RGTC2), Extension(RGTC)),
    (typed_block(C::BC5, VariableType::SignedByteNorm), GlFormat::compressed(gl::COMPRESSED_SIGNED_RG_RGTC2), Extension(RGTC)),
    (typed_block(C::BC6, VariableType::UnsignedFloat), GlFormat::compressed(gl::COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT), Extension(BPTC)),
    (typed_block(C::BC6, VariableType::SignedFloat), GlFormat::compressed(gl::COMPRESSED_RGB_BPTC_SIGNED_FLOAT), Extension(BPTC)),
    (block(C::BC7, Linear), GlFormat::compressed(gl::COMPRESSED_RGBA_BPTC_UNORM), Extension(BPTC)),
    (block(C::BC7, Srgb), GlFormat::compressed(gl::COMPRESSED_SRGB_ALPHA_BPTC_UNORM), Extension(BPTC)),
];

/// GL enumerants for `format` on a context with `features`
pub fn to_gl_format(format: TextureFormat, features: &GlFeatures) -> Option<GlFormat> {
    let key = format.normalized();
    FORMAT_TABLE
        .iter()
        .find(|(candidate, _, requirement)| *candidate == key && requirement.is_met(features))
        .map(|&(_, gl_format, _)| gl_format)
}

/// Readable name of a glGetError code
pub fn gl_error_name(code: u32) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
#[path = "gles_format_tests.rs"]
mod tests;
