//! Unit tests for the upload driver

use crate::capability::{BackendCapabilities, CapabilityDecision};
use crate::config::Config;
use crate::decompress::decompress_image;
use crate::error::Error;
use crate::texture::*;
use crate::upload::*;

fn rgba_caps() -> BackendCapabilities {
    BackendCapabilities::with_formats([TextureFormat::rgba8888(ColorSpace::Linear)])
}

fn rgba_texture(mips: u32, layers: u32, faces: u32) -> TextureDescriptor {
    let mut header = TextureHeader::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear, 4, 4);
    header.num_mip_levels = mips;
    header.num_array_members = layers;
    header.num_faces = faces;
    let data = (0..header.total_data_size()).map(|i| i as u8).collect();
    TextureDescriptor::new(header, data).unwrap()
}

fn etc1_texture() -> TextureDescriptor {
    let header = TextureHeader::new(
        PixelFormat::compressed(CompressedPixelFormat::ETC1),
        VariableType::UnsignedByteNorm,
        ColorSpace::Linear,
        4,
        4,
    );
    TextureDescriptor::new(header, vec![0x80, 0x00, 0x00, 0x02, 0, 0, 0, 0]).unwrap()
}

fn allocations(backend: &MockBackend) -> usize {
    backend.events().iter().filter(|e| matches!(e, MockEvent::Allocate(_))).count()
}

#[test]
fn test_native_upload_writes_every_subresource() {
    let texture = rgba_texture(2, 2, 1);
    let mut backend = MockBackend::new(rgba_caps());
    let uploaded = upload_texture(&mut backend, &texture, false).unwrap();

    assert_eq!(uploaded.decision, CapabilityDecision::UploadNative);
    assert_eq!(uploaded.info().mip_levels, 2);
    assert_eq!(uploaded.info().array_layers, 2);
    assert!(uploaded.texture.finalized);
    assert_eq!(uploaded.texture.subresources.len(), 4);
    for index in texture.subresources() {
        assert_eq!(
            uploaded.texture.subresources[&index],
            texture.mip_data(index.mip, index.face, index.layer).unwrap()
        );
    }
    assert_eq!(backend.live_textures(), 1);
}

#[test]
fn test_writes_follow_canonical_order() {
    let texture = rgba_texture(2, 1, 6);
    let mut backend = MockBackend::new(rgba_caps());
    upload_texture(&mut backend, &texture, false).unwrap();

    let written: Vec<SubresourceIndex> = backend
        .events()
        .iter()
        .filter_map(|e| match e {
            MockEvent::Write { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(written, texture.subresources().collect::<Vec<_>>());
    assert!(matches!(backend.events().last(), Some(MockEvent::Finalize(_))));
}

#[test]
fn test_fallback_uploads_decompressed_rgba() {
    let texture = etc1_texture();
    let mut backend = MockBackend::new(rgba_caps());
    let uploaded = upload_texture(&mut backend, &texture, true).unwrap();

    assert!(uploaded.decision.requires_decompression());
    assert_eq!(uploaded.info().format, TextureFormat::rgba8888(ColorSpace::Linear));
    let expected = decompress_image(CompressedPixelFormat::ETC1, texture.data(), 4, 4).unwrap();
    let index = SubresourceIndex { mip: 0, layer: 0, face: 0 };
    assert_eq!(uploaded.texture.subresources[&index], expected);
}

#[test]
fn test_sequential_decompression_config() {
    let texture = etc1_texture();
    let mut backend = MockBackend::new(rgba_caps());
    let config = Config { parallel_decompress: false, ..Config::default() };
    let uploaded = upload_texture_with_config(&mut backend, &texture, &config).unwrap();
    assert!(uploaded.decision.requires_decompression());
}

#[test]
fn test_unsupported_format_allocates_nothing() {
    let texture = etc1_texture();
    let mut backend = MockBackend::new(rgba_caps());
    let result = upload_texture(&mut backend, &texture, false);
    assert!(matches!(result, Err(Error::UnsupportedVariant(_))));
    assert!(backend.events().is_empty());
}

#[test]
fn test_decode_failure_allocates_nothing() {
    let header = TextureHeader::new(
        PixelFormat::compressed(CompressedPixelFormat::PVRTCI_4bpp_RGBA),
        VariableType::UnsignedByteNorm,
        ColorSpace::Linear,
        12,
        4,
    );
    let texture = TextureDescriptor::zeroed(header).unwrap();
    let mut backend = MockBackend::new(rgba_caps());
    let result = upload_texture(&mut backend, &texture, true);
    assert!(matches!(result, Err(Error::DecodeFailure(_))));
    assert_eq!(allocations(&backend), 0);
}

#[test]
fn test_allocation_failure() {
    let faults = MockFaults { fail_allocate: true, ..MockFaults::default() };
    let mut backend = MockBackend::with_faults(rgba_caps(), faults);
    let result = upload_texture(&mut backend, &rgba_texture(1, 1, 1), false);
    assert!(matches!(result, Err(Error::AllocationFailure(_))));
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn test_write_failure_releases_partial_texture() {
    let faults = MockFaults { fail_write_at: Some(1), ..MockFaults::default() };
    let mut backend = MockBackend::with_faults(rgba_caps(), faults);
    let result = upload_texture(&mut backend, &rgba_texture(3, 1, 1), false);

    assert!(matches!(result, Err(Error::UploadFailure(_))));
    assert_eq!(backend.live_textures(), 0);
    assert!(matches!(backend.events().last(), Some(MockEvent::Release(1))));
    assert!(!backend.events().iter().any(|e| matches!(e, MockEvent::Finalize(_))));
}

#[test]
fn test_finalize_failure_releases_texture() {
    let faults = MockFaults { fail_finalize: true, ..MockFaults::default() };
    let mut backend = MockBackend::with_faults(rgba_caps(), faults);
    let result = upload_texture(&mut backend, &rgba_texture(1, 1, 1), false);
    assert!(matches!(result, Err(Error::UploadFailure(_))));
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn test_oversized_texture_is_rejected_before_allocation() {
    let caps = BackendCapabilities { max_dimension: 2, ..rgba_caps() };
    let mut backend = MockBackend::new(caps);
    let result = upload_texture(&mut backend, &rgba_texture(1, 1, 1), false);
    assert!(matches!(result, Err(Error::AllocationFailure(_))));
    assert_eq!(allocations(&backend), 0);
}

#[test]
fn test_etc2_native_or_fallback() {
    let header = TextureHeader::new(
        PixelFormat::compressed(CompressedPixelFormat::ETC2_RGB),
        VariableType::UnsignedByteNorm,
        ColorSpace::Linear,
        4,
        4,
    );
    let texture = TextureDescriptor::new(header, vec![0x80, 0x00, 0x00, 0x02, 0, 0, 0, 0]).unwrap();

    let mut caps = rgba_caps();
    caps.insert(TextureFormat::compressed(CompressedPixelFormat::ETC2_RGB, ColorSpace::Linear));
    let mut native = MockBackend::new(caps);
    let uploaded = upload_texture(&mut native, &texture, true).unwrap();
    assert_eq!(uploaded.decision, CapabilityDecision::UploadNative);
    assert_eq!(uploaded.texture.subresources.values().next().unwrap().len(), 8);

    let mut fallback = MockBackend::new(rgba_caps());
    let uploaded = upload_texture(&mut fallback, &texture, true).unwrap();
    assert!(uploaded.decision.requires_decompression());
    assert_eq!(uploaded.texture.subresources.values().next().unwrap().len(), 64);
}
