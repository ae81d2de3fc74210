//! Unit tests for async_loader.rs

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use crate::async_loader::*;
use crate::config::Config;
use crate::error::Error;
use crate::formats::{write_pvr, AssetProvider, MemoryAssetProvider};
use crate::texture::*;

fn loader() -> AsyncLoader {
    AsyncLoader::new(&Config { worker_threads: 2, ..Config::default() }).unwrap()
}

fn pvr_bytes(header: TextureHeader, data: Vec<u8>) -> Vec<u8> {
    let texture = TextureDescriptor::new(header, data).unwrap();
    let mut bytes = Vec::new();
    write_pvr(&texture, &mut bytes).unwrap();
    bytes
}

fn provider() -> Arc<dyn AssetProvider> {
    let mut provider = MemoryAssetProvider::new();
    let rgba = TextureHeader::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear, 2, 2);
    provider.insert("plain.pvr", pvr_bytes(rgba, vec![9; 16]));
    let etc = TextureHeader::new(
        PixelFormat::compressed(CompressedPixelFormat::ETC1),
        VariableType::UnsignedByteNorm,
        ColorSpace::Srgb,
        4,
        4,
    );
    provider.insert("etc.pvr", pvr_bytes(etc, vec![0x80, 0x00, 0x00, 0x02, 0, 0, 0, 0]));
    Arc::new(provider)
}

#[test]
fn test_worker_count_from_config() {
    assert_eq!(loader().worker_count(), 2);
}

#[test]
fn test_submit_returns_value() {
    let future = loader().submit(|| Ok(21 * 2));
    assert_eq!(future.get().unwrap(), 42);
}

#[test]
fn test_submit_propagates_error() {
    let future = loader().submit(|| -> crate::error::Result<()> { Err(Error::CorruptData("bad".into())) });
    assert_eq!(future.get(), Err(Error::CorruptData("bad".into())));
}

#[test]
fn test_is_ready_before_and_after() {
    let loader = loader();
    let (release, gate) = mpsc::channel::<()>();
    let future = loader.submit(move || {
        gate.recv_timeout(Duration::from_secs(10)).ok();
        Ok(7u32)
    });
    assert!(!future.is_ready());
    release.send(()).unwrap();
    while !future.is_ready() {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(future.get().unwrap(), 7);
}

#[test]
fn test_load_from_provider() {
    let texture = loader().load(provider(), "plain.pvr", None).get().unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::RGBA8888);
    assert_eq!(texture.data(), &[9u8; 16][..]);
}

#[test]
fn test_load_missing_asset() {
    let result = loader().load(provider(), "missing.pvr", None).get();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_load_decompressed() {
    let texture = loader().load_decompressed(provider(), "etc.pvr", None).get().unwrap();
    assert_eq!(texture.texture_format(), TextureFormat::rgba8888(ColorSpace::Srgb));
    assert_eq!(&texture.data()[..4], &[134, 2, 2, 255]);

    let plain = loader().load_decompressed(provider(), "plain.pvr", None).get().unwrap();
    assert_eq!(plain.pixel_format(), PixelFormat::RGBA8888);
}

#[test]
fn test_load_decompressed_respects_policy() {
    let loader = AsyncLoader::new(&Config { worker_threads: 1, allow_decompress: false, ..Config::default() }).unwrap();
    let texture = loader.load_decompressed(provider(), "etc.pvr", None).get().unwrap();
    assert!(texture.pixel_format().is_etc());
}

#[test]
fn test_many_jobs() {
    let loader = loader();
    let futures: Vec<_> = (0..32u32).map(|i| loader.submit(move || Ok(i * i))).collect();
    let results: Vec<u32> = futures.into_iter().map(|f| f.get().unwrap()).collect();
    assert_eq!(results, (0..32u32).map(|i| i * i).collect::<Vec<_>>());
}
