//! Unit tests for GLES version parsing and capability querying

use super::*;
use crate::gles_recording::RecordingGl;
use pvr_texture::pvr::texture::{ColorSpace, CompressedPixelFormat, TextureFormat};

fn limits(size: u32) -> GlLimits {
    GlLimits { max_texture_size: size, max_cube_map_size: size, max_3d_texture_size: 256, max_array_layers: 256 }
}

// ============================================================================
// VERSION PARSING
// ============================================================================

#[test]
fn test_parse_versions() {
    assert_eq!(GlesVersion::parse("OpenGL ES 2.0"), Some(GlesVersion::Es2));
    assert_eq!(GlesVersion::parse("OpenGL ES 3.0 build 1.9@4850647"), Some(GlesVersion::Es3));
    assert_eq!(GlesVersion::parse("OpenGL ES 3.1 Mesa 23.0.4"), Some(GlesVersion::Es31));
    assert_eq!(GlesVersion::parse("OpenGL ES 3.2 V@0502.0"), Some(GlesVersion::Es32));
    assert_eq!(GlesVersion::parse("  OpenGL ES 3.2\n"), Some(GlesVersion::Es32));
}

#[test]
fn test_parse_rejects_non_es2_profiles() {
    assert_eq!(GlesVersion::parse("OpenGL ES-CM 1.1"), None);
    assert_eq!(GlesVersion::parse("OpenGL ES 1.1"), None);
    assert_eq!(GlesVersion::parse("4.6.0 NVIDIA 535.54"), None);
    assert_eq!(GlesVersion::parse(""), None);
}

#[test]
fn test_versions_are_ordered() {
    assert!(GlesVersion::Es2 < GlesVersion::Es3);
    assert!(GlesVersion::Es31 < GlesVersion::Es32);
}

// ============================================================================
// FEATURES
// ============================================================================

#[test]
fn test_extension_string_is_split_on_whitespace() {
    let features = GlFeatures::new(
        GlesVersion::Es2,
        "GL_IMG_texture_compression_pvrtc  GL_OES_compressed_ETC1_RGB8_texture\nGL_EXT_sRGB ",
    );
    assert_eq!(features.extension_count(), 3);
    assert!(features.has("GL_EXT_sRGB"));
    assert!(!features.has("GL_EXT_sRG"));
}

#[test]
fn test_feature_flags_by_version() {
    let es2 = GlFeatures::new(GlesVersion::Es2, "");
    assert!(!es2.has_texture_arrays());
    assert!(!es2.has_tex_storage());
    assert!(!es2.has_cube_map_arrays());

    let es2_storage = GlFeatures::new(GlesVersion::Es2, "GL_EXT_texture_storage");
    assert!(es2_storage.has_tex_storage());

    let es31 = GlFeatures::new(GlesVersion::Es31, "");
    assert!(es31.has_texture_arrays());
    assert!(!es31.has_cube_map_arrays());
    assert!(GlFeatures::new(GlesVersion::Es31, "GL_EXT_texture_cube_map_array").has_cube_map_arrays());
    assert!(GlFeatures::new(GlesVersion::Es32, "").has_cube_map_arrays());
}

#[test]
fn test_query_reads_extension_string() {
    let gl = RecordingGl::new("OpenGL ES 3.0", "GL_IMG_texture_compression_pvrtc");
    let features = GlFeatures::query(&gl, GlesVersion::Es3);
    assert_eq!(features.version, GlesVersion::Es3);
    assert!(features.has("GL_IMG_texture_compression_pvrtc"));
}

#[test]
fn test_limits_on_es2_have_no_layers() {
    let mut gl = RecordingGl::new("OpenGL ES 2.0", "");
    gl.max_texture_size = 2048;
    let features = GlFeatures::query(&gl, GlesVersion::Es2);
    let limits = GlLimits::query(&gl, &features);

    assert_eq!(limits.max_texture_size, 2048);
    assert_eq!(limits.max_3d_texture_size, 1);
    assert_eq!(limits.max_array_layers, 1);
}

#[test]
fn test_limits_on_es3() {
    let mut gl = RecordingGl::new("OpenGL ES 3.0", "");
    gl.max_array_layers = 512;
    let features = GlFeatures::query(&gl, GlesVersion::Es3);
    let limits = GlLimits::query(&gl, &features);

    assert_eq!(limits.max_array_layers, 512);
    assert_eq!(limits.max_3d_texture_size, 256);
}

// ============================================================================
// CAPABILITY QUERIES
// ============================================================================

#[test]
fn test_query_es2_without_extensions() {
    let caps = query_capabilities(&GlFeatures::new(GlesVersion::Es2, ""), &limits(2048));

    assert!(caps.supports(TextureFormat::rgba8888(ColorSpace::Linear)));
    assert!(!caps.supports(TextureFormat::rgba8888(ColorSpace::Srgb)));
    assert!(!caps.supports(TextureFormat::compressed(CompressedPixelFormat::ETC1, ColorSpace::Linear)));
    assert!(!caps.supports(TextureFormat::compressed(CompressedPixelFormat::PVRTCI_4bpp_RGBA, ColorSpace::Linear)));
    assert_eq!(caps.max_dimension, 2048);
    assert!(!caps.cube_map_arrays);
}

#[test]
fn test_query_pvrtc_extension() {
    let features = GlFeatures::new(GlesVersion::Es2, "GL_IMG_texture_compression_pvrtc");
    let caps = query_capabilities(&features, &limits(4096));

    for format in [
        CompressedPixelFormat::PVRTCI_2bpp_RGB,
        CompressedPixelFormat::PVRTCI_2bpp_RGBA,
        CompressedPixelFormat::PVRTCI_4bpp_RGB,
        CompressedPixelFormat::PVRTCI_4bpp_RGBA,
    ] {
        assert!(caps.supports(TextureFormat::compressed(format, ColorSpace::Linear)), "{:?}", format);
    }
    assert!(!caps.supports(TextureFormat::compressed(CompressedPixelFormat::PVRTCII_4bpp, ColorSpace::Linear)));
}

#[test]
fn test_query_es3_has_etc1_through_etc2() {
    let caps = query_capabilities(&GlFeatures::new(GlesVersion::Es3, ""), &limits(4096));

    assert!(caps.supports(TextureFormat::compressed(CompressedPixelFormat::ETC1, ColorSpace::Linear)));
    assert!(caps.supports(TextureFormat::compressed(CompressedPixelFormat::ETC2_RGBA, ColorSpace::Srgb)));
    assert!(caps.supports(TextureFormat::rgba8888(ColorSpace::Srgb)));
}

#[test]
fn test_query_uses_smallest_2d_limit() {
    let mut small_cubes = limits(8192);
    small_cubes.max_cube_map_size = 4096;
    let caps = query_capabilities(&GlFeatures::new(GlesVersion::Es32, ""), &small_cubes);

    assert_eq!(caps.max_dimension, 4096);
    assert_eq!(caps.max_array_layers, 256);
    assert!(caps.cube_map_arrays);
}
