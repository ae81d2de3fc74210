//! Unit tests for the GL format table

use super::*;
use rustc_hash::FxHashSet;

fn es2(extensions: &str) -> GlFeatures {
    GlFeatures::new(GlesVersion::Es2, extensions)
}

fn es3(extensions: &str) -> GlFeatures {
    GlFeatures::new(GlesVersion::Es3, extensions)
}

// ============================================================================
// UNCOMPRESSED
// ============================================================================

#[test]
fn test_rgba8_is_core_everywhere() {
    let format = TextureFormat::rgba8888(Linear);
    let on_es2 = to_gl_format(format, &es2("")).unwrap();
    let on_es3 = to_gl_format(format, &es3("")).unwrap();

    assert_eq!(on_es2, on_es3);
    assert_eq!(on_es2.internal_format, gl::RGBA8);
    assert_eq!(on_es2.format, gl::RGBA);
    assert_eq!(on_es2.data_type, gl::UNSIGNED_BYTE);
    assert!(!on_es2.is_compressed());
}

#[test]
fn test_srgb_needs_es3_or_extension() {
    let format = TextureFormat::rgba8888(Srgb);
    assert!(to_gl_format(format, &es2("")).is_none());
    assert_eq!(to_gl_format(format, &es2("GL_EXT_sRGB")).unwrap().internal_format, gl::SRGB8_ALPHA8);
    assert_eq!(to_gl_format(format, &es3("")).unwrap().internal_format, gl::SRGB8_ALPHA8);
}

#[test]
fn test_bgra_needs_extension() {
    let format = unorm(PixelFormat::BGRA8888, Linear);
    assert!(to_gl_format(format, &es3("")).is_none());
    assert!(to_gl_format(format, &es2("GL_EXT_texture_format_BGRA8888")).is_some());
    assert!(to_gl_format(format, &es2("GL_APPLE_texture_format_BGRA8888")).is_some());
}

#[test]
fn test_packed_formats_use_packed_types() {
    let rgb565 = to_gl_format(unorm(PixelFormat::RGB565, Linear), &es2("")).unwrap();
    assert_eq!(rgb565.format, gl::RGB);
    assert_eq!(rgb565.data_type, gl::UNSIGNED_SHORT_5_6_5);

    let rgba4444 = to_gl_format(unorm(PixelFormat::RGBA4444, Linear), &es2("")).unwrap();
    assert_eq!(rgba4444.data_type, gl::UNSIGNED_SHORT_4_4_4_4);
}

#[test]
fn test_float_formats_need_es3() {
    let half = TextureFormat::new(PixelFormat::RGBA16161616, VariableType::SignedFloat, Linear);
    assert!(to_gl_format(half, &es2("")).is_none());
    assert_eq!(to_gl_format(half, &es3("")).unwrap().data_type, gl::HALF_FLOAT);
}

#[test]
fn test_channel_type_must_match_for_uncompressed() {
    let signed = TextureFormat::new(PixelFormat::RGBA8888, VariableType::SignedByteNorm, Linear);
    assert!(to_gl_format(signed, &es3("")).is_none());
}

// ============================================================================
// COMPRESSED
// ============================================================================

#[test]
fn test_pvrtc_needs_img_extension() {
    let format = block(C::PVRTCI_4bpp_RGBA, Linear);
    assert!(to_gl_format(format, &es3("")).is_none());

    let gl_format = to_gl_format(format, &es2("GL_IMG_texture_compression_pvrtc")).unwrap();
    assert_eq!(gl_format.internal_format, gl::COMPRESSED_RGBA_PVRTC_4BPPV1_IMG);
    assert!(gl_format.is_compressed());
}

#[test]
fn test_pvrtc_srgb_needs_its_own_extension() {
    let format = block(C::PVRTCI_2bpp_RGB, Srgb);
    assert!(to_gl_format(format, &es2("GL_IMG_texture_compression_pvrtc")).is_none());
    assert_eq!(
        to_gl_format(format, &es2("GL_EXT_pvrtc_sRGB")).unwrap().internal_format,
        gl::COMPRESSED_SRGB_PVRTC_2BPPV1_EXT
    );
}

#[test]
fn test_etc1_prefers_oes_format() {
    let format = block(C::ETC1, Linear);
    assert!(to_gl_format(format, &es2("")).is_none());
    assert_eq!(
        to_gl_format(format, &es2("GL_OES_compressed_ETC1_RGB8_texture")).unwrap().internal_format,
        gl::ETC1_RGB8_OES
    );
    assert_eq!(
        to_gl_format(format, &es3("GL_OES_compressed_ETC1_RGB8_texture")).unwrap().internal_format,
        gl::ETC1_RGB8_OES
    );
}

#[test]
fn test_etc1_falls_back_to_etc2_on_es3() {
    let format = block(C::ETC1, Linear);
    assert_eq!(to_gl_format(format, &es3("")).unwrap().internal_format, gl::COMPRESSED_RGB8_ETC2);
}

#[test]
fn test_etc2_is_core_es3_only() {
    let format = block(C::ETC2_RGBA, Srgb);
    assert!(to_gl_format(format, &es2("GL_OES_compressed_ETC1_RGB8_texture")).is_none());
    assert_eq!(
        to_gl_format(format, &es3("")).unwrap().internal_format,
        gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC
    );
}

#[test]
fn test_s3tc_extensions() {
    let dxt1 = block(C::DXT1, Linear);
    let dxt5 = block(C::DXT5, Linear);
    assert!(to_gl_format(dxt1, &es3("")).is_none());

    // The DXT1-only extension does not bring DXT5
    let dxt1_only = es2("GL_EXT_texture_compression_dxt1");
    assert!(to_gl_format(dxt1, &dxt1_only).is_some());
    assert!(to_gl_format(dxt5, &dxt1_only).is_none());

    let full = es2("GL_EXT_texture_compression_s3tc");
    assert_eq!(to_gl_format(dxt5, &full).unwrap().internal_format, gl::COMPRESSED_RGBA_S3TC_DXT5_EXT);
}

#[test]
fn test_compressed_lookup_ignores_channel_type() {
    let format = TextureFormat::new(
        PixelFormat::compressed(C::PVRTCI_4bpp_RGB),
        VariableType::UnsignedInteger,
        Linear,
    );
    assert!(to_gl_format(format, &es2("GL_IMG_texture_compression_pvrtc")).is_some());
}

#[test]
fn test_signed_block_formats_have_own_enums() {
    let key = |format, channel_type| TextureFormat::new(PixelFormat::compressed(format), channel_type, Linear);
    let features = es3("GL_EXT_texture_compression_rgtc GL_EXT_texture_compression_bptc");
    let internal = |format| to_gl_format(format, &features).unwrap().internal_format;

    assert_eq!(internal(key(C::EAC_R11, VariableType::SignedByteNorm)), gl::COMPRESSED_SIGNED_R11_EAC);
    assert_eq!(internal(key(C::EAC_RG11, VariableType::SignedByteNorm)), gl::COMPRESSED_SIGNED_RG11_EAC);
    assert_eq!(internal(key(C::BC4, VariableType::SignedByteNorm)), gl::COMPRESSED_SIGNED_RED_RGTC1);
    assert_eq!(internal(key(C::BC5, VariableType::SignedByteNorm)), gl::COMPRESSED_SIGNED_RG_RGTC2);
    assert_eq!(internal(key(C::BC6, VariableType::SignedFloat)), gl::COMPRESSED_RGB_BPTC_SIGNED_FLOAT);
    assert_eq!(internal(key(C::BC6, VariableType::UnsignedFloat)), gl::COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT);
    assert_eq!(internal(block(C::BC4, Linear)), gl::COMPRESSED_RED_RGTC1);

    // without the extension neither signedness is available
    assert!(to_gl_format(key(C::BC4, VariableType::SignedByteNorm), &es3("")).is_none());
}

// ============================================================================
// TABLE / HELPERS
// ============================================================================

#[test]
fn test_table_keys_are_normalized() {
    for &(format, _, _) in FORMAT_TABLE {
        assert_eq!(format.normalized(), format);
    }
}

#[test]
fn test_duplicate_keys_have_different_requirements() {
    let mut seen = FxHashSet::default();
    for (format, _, requirement) in FORMAT_TABLE {
        assert!(seen.insert((*format, format!("{:?}", requirement))), "duplicate entry for {:?}", format);
    }
}

#[test]
fn test_image_internal_format_is_unsized_on_es2() {
    let rgba = to_gl_format(TextureFormat::rgba8888(Linear), &es2("")).unwrap();
    assert_eq!(rgba.image_internal_format(GlesVersion::Es2), gl::RGBA);
    assert_eq!(rgba.image_internal_format(GlesVersion::Es3), gl::RGBA8);

    let pvrtc = GlFormat::compressed(gl::COMPRESSED_RGB_PVRTC_2BPPV1_IMG);
    assert_eq!(pvrtc.image_internal_format(GlesVersion::Es2), gl::COMPRESSED_RGB_PVRTC_2BPPV1_IMG);
}

#[test]
fn test_requirement_is_met() {
    let features = es2("GL_EXT_texture_rg");
    assert!(Requirement::Core(GlesVersion::Es2).is_met(&features));
    assert!(!Requirement::Core(GlesVersion::Es3).is_met(&features));
    assert!(Requirement::Extension("GL_EXT_texture_rg").is_met(&features));
    assert!(Requirement::CoreOrExtension(GlesVersion::Es3, &["GL_EXT_texture_rg"]).is_met(&features));
    assert!(!Requirement::CoreOrExtension(GlesVersion::Es3, &["GL_EXT_sRGB"]).is_met(&features));
}

#[test]
fn test_gl_error_name() {
    assert_eq!(gl_error_name(gl::NO_ERROR), "GL_NO_ERROR");
    assert_eq!(gl_error_name(gl::INVALID_OPERATION), "GL_INVALID_OPERATION");
    assert_eq!(gl_error_name(gl::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
    assert_eq!(gl_error_name(0xDEAD), "unknown GL error");
}
