//! Unit tests for capability.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use crate::capability::*;
use crate::error::Error;
use crate::texture::*;

fn etc2() -> TextureFormat {
    TextureFormat::compressed(CompressedPixelFormat::ETC2_RGB, ColorSpace::Linear)
}

fn rgba() -> TextureFormat {
    TextureFormat::rgba8888(ColorSpace::Linear)
}

#[test]
fn test_native_format_uploads_native() {
    let caps = BackendCapabilities::with_formats([etc2(), rgba()]);
    assert_eq!(negotiate(etc2(), &caps, true), CapabilityDecision::UploadNative);
    assert_eq!(negotiate(etc2(), &caps, false), CapabilityDecision::UploadNative);
}

#[test]
fn test_missing_etc2_falls_back_when_allowed() {
    let caps = BackendCapabilities::with_formats([rgba()]);
    let decision = negotiate(etc2(), &caps, true);
    assert_eq!(
        decision,
        CapabilityDecision::UploadDecompressedFallback { target: rgba(), allow_decompress: true }
    );
    assert!(decision.requires_decompression());
    assert_eq!(decision.upload_format(etc2()), Some(rgba()));
}

#[test]
fn test_missing_format_without_permission_is_unsupported() {
    let caps = BackendCapabilities::with_formats([rgba()]);
    assert_eq!(negotiate(etc2(), &caps, false), CapabilityDecision::Unsupported);
    assert_eq!(CapabilityDecision::Unsupported.upload_format(etc2()), None);
}

#[test]
fn test_no_decompressor_is_unsupported() {
    let caps = BackendCapabilities::new();
    let dxt = TextureFormat::compressed(CompressedPixelFormat::DXT5, ColorSpace::Linear);
    assert_eq!(negotiate(dxt, &caps, true), CapabilityDecision::Unsupported);
    let bgr = TextureFormat::new(PixelFormat::BGR888, VariableType::UnsignedByteNorm, ColorSpace::Linear);
    assert_eq!(negotiate(bgr, &caps, true), CapabilityDecision::Unsupported);
}

#[test]
fn test_fallback_keeps_colour_space() {
    let caps = BackendCapabilities::new();
    let pvrtc = TextureFormat::compressed(CompressedPixelFormat::PVRTCI_4bpp_RGBA, ColorSpace::Srgb);
    assert_eq!(
        negotiate(pvrtc, &caps, true).upload_format(pvrtc),
        Some(TextureFormat::rgba8888(ColorSpace::Srgb))
    );
}

#[test]
fn test_exact_match_includes_colour_space() {
    let caps = BackendCapabilities::with_formats([etc2()]);
    let srgb = TextureFormat::compressed(CompressedPixelFormat::ETC2_RGB, ColorSpace::Srgb);
    assert!(!caps.supports(srgb));
    assert!(negotiate(srgb, &caps, true).requires_decompression());
}

#[test]
fn test_compressed_channel_type_is_normalised() {
    let caps = BackendCapabilities::with_formats([etc2()]);
    let signed = TextureFormat { channel_type: VariableType::SignedByteNorm, ..etc2() };
    assert!(caps.supports(signed));
    assert_eq!(caps.format_count(), 1);
}

#[test]
fn test_signed_variant_is_not_native_when_only_unsigned_listed() {
    let with_type = |format, channel_type| {
        TextureFormat::new(PixelFormat::compressed(format), channel_type, ColorSpace::Linear)
    };
    let caps = BackendCapabilities::with_formats([
        TextureFormat::compressed(CompressedPixelFormat::EAC_R11, ColorSpace::Linear),
        TextureFormat::compressed(CompressedPixelFormat::BC4, ColorSpace::Linear),
        with_type(CompressedPixelFormat::BC6, VariableType::UnsignedFloat),
    ]);

    for signed in [
        with_type(CompressedPixelFormat::EAC_R11, VariableType::SignedByteNorm),
        with_type(CompressedPixelFormat::BC4, VariableType::SignedByteNorm),
        with_type(CompressedPixelFormat::BC6, VariableType::SignedFloat),
    ] {
        assert!(!caps.supports(signed), "{:?}", signed);
        assert_eq!(negotiate(signed, &caps, false), CapabilityDecision::Unsupported);
    }

    let unsigned = with_type(CompressedPixelFormat::EAC_R11, VariableType::UnsignedByteNorm);
    assert_eq!(negotiate(unsigned, &caps, false), CapabilityDecision::UploadNative);
    assert_eq!(caps.format_count(), 3);
}

#[test]
fn test_signed_variant_is_native_when_listed() {
    let signed = TextureFormat::new(
        PixelFormat::compressed(CompressedPixelFormat::BC5),
        VariableType::SignedByteNorm,
        ColorSpace::Linear,
    );
    let caps = BackendCapabilities::with_formats([signed]);
    assert_eq!(negotiate(signed, &caps, false), CapabilityDecision::UploadNative);
    assert!(!caps.supports(TextureFormat::compressed(CompressedPixelFormat::BC5, ColorSpace::Linear)));
}

#[test]
fn test_negotiate_is_pure() {
    let caps = BackendCapabilities::with_formats([rgba()]);
    let before = caps.clone();
    let first = negotiate(etc2(), &caps, true);
    let second = negotiate(etc2(), &caps, true);
    assert_eq!(first, second);
    assert_eq!(caps, before);
}

#[test]
fn test_check_limits() {
    let caps = BackendCapabilities { max_dimension: 64, ..BackendCapabilities::new() };
    assert!(caps.check_limits(64, 64, 1, 1, 1).is_ok());
    assert!(matches!(caps.check_limits(65, 1, 1, 1, 1), Err(Error::AllocationFailure(_))));
    assert!(matches!(caps.check_limits(8, 8, 1, 2, 6), Err(Error::AllocationFailure(_))));
    let no_volumes = BackendCapabilities { max_volume_dimension: 0, ..BackendCapabilities::new() };
    assert!(matches!(no_volumes.check_limits(8, 8, 4, 1, 1), Err(Error::AllocationFailure(_))));
}

#[test]
fn test_cache_queries_once() {
    let cache = Arc::new(CapabilityCache::new());
    let queries = Arc::new(AtomicUsize::new(0));
    assert!(!cache.is_populated());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let queries = Arc::clone(&queries);
            thread::spawn(move || {
                cache
                    .get_or_query(|| {
                        queries.fetch_add(1, Ordering::SeqCst);
                        BackendCapabilities::with_formats([TextureFormat::rgba8888(ColorSpace::Linear)])
                    })
                    .format_count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
    assert_eq!(queries.load(Ordering::SeqCst), 1);
    assert!(cache.get().is_some());
}
