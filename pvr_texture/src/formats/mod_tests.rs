//! Unit tests for the format dispatch

use std::io::Cursor;
use crate::error::Error;
use crate::formats::*;
use crate::texture::*;

fn pvr_file() -> Vec<u8> {
    let header = TextureHeader::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear, 2, 2);
    let texture = TextureDescriptor::new(header, (0..16).collect()).unwrap();
    let mut bytes = Vec::new();
    write_pvr(&texture, &mut bytes).unwrap();
    bytes
}

/// 4x4 32-bit BMP with a 14-byte file header and a 40-byte info header
fn bmp_file() -> Vec<u8> {
    let mut b = b"BM".to_vec();
    b.extend_from_slice(&(54u32 + 64).to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&54u32.to_le_bytes());
    b.extend_from_slice(&40u32.to_le_bytes());
    b.extend_from_slice(&4i32.to_le_bytes());
    b.extend_from_slice(&4i32.to_le_bytes());
    b.extend_from_slice(&1u16.to_le_bytes());
    b.extend_from_slice(&32u16.to_le_bytes());
    b.extend_from_slice(&[0u8; 24]);
    b.extend_from_slice(&[0x40; 64]);
    b
}

fn tga_file() -> Vec<u8> {
    let mut b = vec![0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 24, 0];
    b.extend_from_slice(&[1, 2, 3]);
    b
}

#[test]
fn test_from_extension() {
    assert_eq!(ContainerFormat::from_extension("pvr"), Some(ContainerFormat::Pvr));
    assert_eq!(ContainerFormat::from_extension(".KTX"), Some(ContainerFormat::Ktx));
    assert_eq!(ContainerFormat::from_extension("Dds"), Some(ContainerFormat::Dds));
    assert_eq!(ContainerFormat::from_extension("tga"), Some(ContainerFormat::Tga));
    assert_eq!(ContainerFormat::from_extension("xnb"), Some(ContainerFormat::Xnb));
    assert_eq!(ContainerFormat::from_extension("png"), None);
    assert_eq!(ContainerFormat::from_path("textures/wall.bmp"), Some(ContainerFormat::Bmp));
    assert_eq!(ContainerFormat::from_path("noextension"), None);
}

#[test]
fn test_detect_restores_position() {
    let mut cursor = Cursor::new(pvr_file());
    assert_eq!(detect(&mut cursor).unwrap(), Some(ContainerFormat::Pvr));
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_detect_each_container() {
    assert_eq!(detect(&mut Cursor::new(bmp_file())).unwrap(), Some(ContainerFormat::Bmp));
    assert_eq!(detect(&mut Cursor::new(tga_file())).unwrap(), Some(ContainerFormat::Tga));
    let mut dds = b"DDS ".to_vec();
    dds.extend_from_slice(&[0; 124]);
    assert_eq!(detect(&mut Cursor::new(dds)).unwrap(), Some(ContainerFormat::Dds));
    let mut ktx = ktx::KTX_IDENTIFIER.to_vec();
    ktx.extend_from_slice(&[0; 52]);
    assert_eq!(detect(&mut Cursor::new(ktx)).unwrap(), Some(ContainerFormat::Ktx));
    assert_eq!(detect(&mut Cursor::new(b"XNBw\x05".to_vec())).unwrap(), Some(ContainerFormat::Xnb));
}

#[test]
fn test_load_detected_bmp() {
    let texture = load_texture(&mut Cursor::new(bmp_file()), None).unwrap();
    assert_eq!((texture.width(0), texture.height(0)), (4, 4));
    assert_eq!(texture.num_mip_levels(), 1);
    assert_eq!(texture.pixel_format().channel_bits(), [8, 8, 8, 8]);
    assert_eq!(texture.total_data_size(), 64);
}

#[test]
fn test_load_with_hint() {
    let texture = load_texture(&mut Cursor::new(tga_file()), Some(ContainerFormat::Tga)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGR888);
    assert_eq!(texture.data(), &[1, 2, 3]);
}

#[test]
fn test_wrong_hint_is_format_error() {
    let result = load_texture(&mut Cursor::new(pvr_file()), Some(ContainerFormat::Dds));
    assert!(matches!(result, Err(Error::CorruptData(_)) | Err(Error::Format(_))));
    let result = load_texture(&mut Cursor::new(bmp_file()), Some(ContainerFormat::Pvr));
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_unknown_stream_is_format_error() {
    let result = load_texture(&mut Cursor::new(vec![0xEEu8; 64]), None);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_load_asset_from_memory_provider() {
    let mut provider = MemoryAssetProvider::new();
    provider.insert("brick.pvr", pvr_file());
    provider.insert("noext", bmp_file());
    let texture = load_asset(&provider, "brick.pvr").unwrap();
    assert_eq!(texture.data(), &(0..16).collect::<Vec<u8>>()[..]);
    let texture = load_asset(&provider, "noext").unwrap();
    assert_eq!(texture.total_data_size(), 64);
    assert!(matches!(load_asset(&provider, "missing.pvr"), Err(Error::Io(_))));
}
