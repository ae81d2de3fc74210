//! Unit tests for MockBackend

use crate::capability::BackendCapabilities;
use crate::error::Error;
use crate::texture::*;
use crate::upload::*;

fn info(mips: u32) -> TextureInfo {
    TextureInfo {
        format: TextureFormat::rgba8888(ColorSpace::Linear),
        width: 8,
        height: 4,
        depth: 1,
        mip_levels: mips,
        array_layers: 1,
        faces: 1,
    }
}

fn backend() -> MockBackend {
    MockBackend::new(BackendCapabilities::with_formats([TextureFormat::rgba8888(ColorSpace::Linear)]))
}

#[test]
fn test_texture_info_helpers() {
    let info = info(3);
    assert_eq!(info.extent(0), (8, 4, 1));
    assert_eq!(info.extent(2), (2, 1, 1));
    assert_eq!(info.subresource_size(0), 128);
    assert_eq!(info.subresource_size(2), 8);
    assert_eq!(info.subresource_count(), 3);
    assert!(!info.is_cube_map() && !info.is_array() && !info.is_volume());
    assert!(!info.contains(SubresourceIndex { mip: 3, layer: 0, face: 0 }));
}

#[test]
fn test_allocate_assigns_ids() {
    let mut backend = backend();
    let first = backend.allocate(&info(1)).unwrap();
    let second = backend.allocate(&info(1)).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(backend.live_textures(), 2);
    backend.release(first);
    assert_eq!(backend.live_textures(), 1);
}

#[test]
fn test_allocate_rejects_foreign_format() {
    let mut backend = backend();
    let mut request = info(1);
    request.format = TextureFormat::compressed(CompressedPixelFormat::ETC1, ColorSpace::Linear);
    assert!(matches!(backend.allocate(&request), Err(Error::AllocationFailure(_))));
}

#[test]
fn test_write_checks_size_and_range() {
    let mut backend = backend();
    let mut texture = backend.allocate(&info(2)).unwrap();
    let region = texture.info.region(SubresourceIndex { mip: 1, layer: 0, face: 0 });
    assert_eq!((region.width, region.height), (4, 2));
    assert!(backend.write_subresource(&mut texture, &region, &[0; 32]).is_ok());
    assert!(matches!(
        backend.write_subresource(&mut texture, &region, &[0; 31]),
        Err(Error::UploadFailure(_))
    ));

    let outside = SubresourceRegion { index: SubresourceIndex { mip: 0, layer: 1, face: 0 }, ..region };
    assert!(matches!(
        backend.write_subresource(&mut texture, &outside, &[0; 128]),
        Err(Error::UploadFailure(_))
    ));
}

#[test]
fn test_events_are_recorded() {
    let mut backend = backend();
    let mut texture = backend.allocate(&info(1)).unwrap();
    let region = texture.info.region(SubresourceIndex { mip: 0, layer: 0, face: 0 });
    backend.write_subresource(&mut texture, &region, &[1; 128]).unwrap();
    backend.finalize(&mut texture).unwrap();
    assert!(texture.finalized);
    assert_eq!(
        backend.events(),
        &[
            MockEvent::Allocate(1),
            MockEvent::Write { id: 1, index: region.index, len: 128 },
            MockEvent::Finalize(1),
        ]
    );
}
