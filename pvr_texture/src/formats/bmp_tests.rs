//! Unit tests for bmp.rs

use std::io::Cursor;
use byteorder::{LittleEndian, WriteBytesExt};
use crate::error::Error;
use crate::formats::bmp::*;
use crate::texture::*;

/// File header plus a 40-byte info header; `extra` sits between the header and the pixels
fn info_bmp(width: i32, height: i32, bpp: u16, compression: u32, colors_used: u32, extra: &[u8], pixels: &[u8]) -> Vec<u8> {
    let pixel_offset = 14 + 40 + extra.len() as u32;
    let mut b = b"BM".to_vec();
    b.write_u32::<LittleEndian>(pixel_offset + pixels.len() as u32).unwrap();
    b.write_u32::<LittleEndian>(0).unwrap();
    b.write_u32::<LittleEndian>(pixel_offset).unwrap();
    b.write_u32::<LittleEndian>(40).unwrap();
    b.write_i32::<LittleEndian>(width).unwrap();
    b.write_i32::<LittleEndian>(height).unwrap();
    b.write_u16::<LittleEndian>(1).unwrap();
    b.write_u16::<LittleEndian>(bpp).unwrap();
    b.write_u32::<LittleEndian>(compression).unwrap();
    for value in [pixels.len() as u32, 2835, 2835, colors_used, 0] {
        b.write_u32::<LittleEndian>(value).unwrap();
    }
    b.extend_from_slice(extra);
    b.extend_from_slice(pixels);
    b
}

#[test]
fn test_read_32bit_info_header() {
    let pixels: Vec<u8> = (0..64).collect();
    let bytes = info_bmp(4, 4, 32, 0, 0, &[], &pixels);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.width(0), 4);
    assert_eq!(texture.height(0), 4);
    assert_eq!(texture.num_mip_levels(), 1);
    assert_eq!(texture.pixel_format().channel_bits(), [8, 8, 8, 8]);
    assert_eq!(texture.pixel_format(), PixelFormat::BGRX8888);
    assert_eq!(texture.total_data_size(), 64);
    assert_eq!(texture.data(), &pixels[..]);
    assert_eq!(texture.header().orientation().y, AxisY::Up);
}

#[test]
fn test_detection() {
    let bytes = info_bmp(1, 1, 32, 0, 0, &[], &[0; 4]);
    let mut cursor = Cursor::new(bytes);
    assert!(is_supported_file(&mut cursor).unwrap());
    assert_eq!(cursor.position(), 0);
    assert!(!is_supported_file(&mut Cursor::new(b"DDS ".to_vec())).unwrap());
}

#[test]
fn test_24bit_row_padding_is_stripped() {
    // 2x2 BGR rows of 6 bytes padded to 8
    let pixels = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
    let bytes = info_bmp(2, 2, 24, 0, 0, &[], &pixels);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGR888);
    assert_eq!(texture.data(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
}

#[test]
fn test_negative_height_is_top_down() {
    let bytes = info_bmp(1, -1, 32, 0, 0, &[], &[0; 4]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.height(0), 1);
    assert_eq!(texture.header().orientation().y, AxisY::Down);
}

#[test]
fn test_16bit_defaults_to_xrgb1555() {
    let bytes = info_bmp(2, 1, 16, 0, 0, &[], &[0; 4]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::XRGB1555);
    assert_eq!(texture.header().channel_type, VariableType::UnsignedShortNorm);
}

#[test]
fn test_bitfields_565() {
    let mut masks = Vec::new();
    for mask in [0xF800u32, 0x07E0, 0x001F] {
        masks.write_u32::<LittleEndian>(mask).unwrap();
    }
    let bytes = info_bmp(2, 1, 16, 3, 0, &masks, &[0; 4]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::RGB565);
}

#[test]
fn test_8bit_palette_is_expanded() {
    // palette entries are stored as BGRX
    let palette = [0, 0, 255, 0, 0, 255, 0, 0];
    // 3x1 indices padded to 4 bytes
    let pixels = [0, 1, 0, 0];
    let bytes = info_bmp(3, 1, 8, 0, 2, &palette, &pixels);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::RGBA8888);
    assert_eq!(texture.data(), &[255, 0, 0, 255, 0, 255, 0, 255, 255, 0, 0, 255]);
}

#[test]
fn test_1bit_palette_reads_high_bits_first() {
    let palette = [0, 0, 0, 0, 255, 255, 255, 0];
    let pixels = [0b1010_0000, 0, 0, 0];
    let bytes = info_bmp(3, 1, 1, 0, 0, &palette, &pixels);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(
        texture.data(),
        &[255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255]
    );
}

#[test]
fn test_palette_index_out_of_range_is_corrupt() {
    let palette = [0, 0, 0, 0];
    let bytes = info_bmp(1, 1, 8, 0, 1, &palette, &[5, 0, 0, 0]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_core_header() {
    let mut b = b"BM".to_vec();
    b.write_u32::<LittleEndian>(0).unwrap();
    b.write_u32::<LittleEndian>(0).unwrap();
    b.write_u32::<LittleEndian>(26).unwrap();
    b.write_u32::<LittleEndian>(12).unwrap();
    for value in [1u16, 1, 1, 24] {
        b.write_u16::<LittleEndian>(value).unwrap();
    }
    b.extend_from_slice(&[10, 20, 30, 0]);
    let texture = read(&mut Cursor::new(b)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGR888);
    assert_eq!(texture.data(), &[10, 20, 30]);
}

#[test]
fn test_rle_is_unsupported() {
    let bytes = info_bmp(1, 1, 8, 1, 0, &[0; 1024], &[0; 4]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::UnsupportedVariant(_))));
}

#[test]
fn test_truncated_pixels_are_corrupt() {
    let bytes = info_bmp(4, 4, 32, 0, 0, &[], &[0; 32]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_unknown_header_size_is_corrupt() {
    let mut bytes = info_bmp(1, 1, 32, 0, 0, &[], &[0; 4]);
    bytes[14] = 41;
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_bad_magic_is_format_error() {
    let mut bytes = info_bmp(1, 1, 32, 0, 0, &[], &[0; 4]);
    bytes[0] = b'X';
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::Format(_))));
}
