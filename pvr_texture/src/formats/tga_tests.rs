//! Unit tests for tga.rs

use std::io::Cursor;
use crate::error::Error;
use crate::formats::tga::*;
use crate::texture::*;

#[allow(clippy::too_many_arguments)]
fn tga_header(
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    color_map_length: u16,
    color_map_bits: u8,
    width: u16,
    height: u16,
    bpp: u8,
    descriptor: u8,
) -> Vec<u8> {
    let mut b = vec![id_length, color_map_type, image_type];
    b.extend_from_slice(&0u16.to_le_bytes());
    b.extend_from_slice(&color_map_length.to_le_bytes());
    b.push(color_map_bits);
    b.extend_from_slice(&[0, 0, 0, 0]);
    b.extend_from_slice(&width.to_le_bytes());
    b.extend_from_slice(&height.to_le_bytes());
    b.push(bpp);
    b.push(descriptor);
    b
}

#[test]
fn test_read_uncompressed_32bit() {
    let mut bytes = tga_header(0, 0, 2, 0, 0, 2, 1, 32, 8);
    bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGRA8888);
    assert_eq!(texture.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(texture.header().orientation().y, AxisY::Up);
}

#[test]
fn test_32bit_without_alpha_bits_is_bgrx() {
    let mut bytes = tga_header(0, 0, 2, 0, 0, 1, 1, 32, 0);
    bytes.extend_from_slice(&[0; 4]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGRX8888);
}

#[test]
fn test_image_id_is_skipped() {
    let mut bytes = tga_header(3, 0, 3, 0, 0, 2, 1, 8, 0);
    bytes.extend_from_slice(b"abc");
    bytes.extend_from_slice(&[10, 20]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::L8);
    assert_eq!(texture.data(), &[10, 20]);
}

#[test]
fn test_descriptor_bits_set_orientation() {
    let mut bytes = tga_header(0, 0, 2, 0, 0, 1, 1, 24, 0x30);
    bytes.extend_from_slice(&[0; 3]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    let orientation = texture.header().orientation();
    assert_eq!(orientation.x, AxisX::Left);
    assert_eq!(orientation.y, AxisY::Down);
}

#[test]
fn test_rle_packets_are_decoded() {
    // 5 pixels: repeat packet of 3, raw packet of 2
    let mut bytes = tga_header(0, 0, 10, 0, 0, 5, 1, 24, 0);
    bytes.extend_from_slice(&[0x82, 1, 2, 3]);
    bytes.extend_from_slice(&[0x01, 4, 5, 6, 7, 8, 9]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::BGR888);
    assert_eq!(
        texture.data(),
        &[1, 2, 3, 1, 2, 3, 1, 2, 3, 4, 5, 6, 7, 8, 9]
    );
}

#[test]
fn test_rle_run_past_the_image_is_clipped() {
    let mut bytes = tga_header(0, 0, 11, 0, 0, 2, 1, 8, 0);
    bytes.extend_from_slice(&[0x84, 7]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.data(), &[7, 7]);
}

#[test]
fn test_truncated_rle_is_corrupt() {
    let mut bytes = tga_header(0, 0, 10, 0, 0, 4, 1, 24, 0);
    bytes.extend_from_slice(&[0x81, 1, 2, 3]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_color_map_is_expanded() {
    let mut bytes = tga_header(0, 1, 1, 2, 24, 3, 1, 8, 0);
    // BGR entries: red, blue
    bytes.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
    bytes.extend_from_slice(&[0, 1, 0]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.pixel_format(), PixelFormat::RGBA8888);
    assert_eq!(texture.data(), &[255, 0, 0, 255, 0, 0, 255, 255, 255, 0, 0, 255]);
}

#[test]
fn test_color_index_out_of_range_is_corrupt() {
    let mut bytes = tga_header(0, 1, 1, 1, 24, 1, 1, 8, 0);
    bytes.extend_from_slice(&[0, 0, 0]);
    bytes.push(4);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_wide_color_indices_use_every_byte() {
    let mut bytes = tga_header(0, 1, 1, 2, 24, 2, 1, 24, 0);
    bytes.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
    bytes.extend_from_slice(&[1, 0, 0, 0, 0, 0]);
    let texture = read(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(texture.data(), &[0, 0, 255, 255, 255, 0, 0, 255]);

    // 65536 is past the colour map, not index 0
    let mut bytes = tga_header(0, 1, 1, 2, 24, 1, 1, 32, 0);
    bytes.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 1, 0]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::CorruptData(_))));
}

#[test]
fn test_detection_by_header() {
    let mut bytes = tga_header(0, 0, 2, 0, 0, 1, 1, 32, 8);
    bytes.extend_from_slice(&[0; 4]);
    let mut cursor = Cursor::new(bytes);
    assert!(is_supported_file(&mut cursor).unwrap());
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_detection_by_footer() {
    // image type 7 fails the header check; the footer still identifies the file
    let mut bytes = tga_header(0, 0, 7, 0, 0, 1, 1, 32, 8);
    bytes.extend_from_slice(&[0; 4]);
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(&TGA_FOOTER_SIGNATURE);
    let mut cursor = Cursor::new(bytes);
    assert!(is_supported_file(&mut cursor).unwrap());
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_other_containers_are_not_detected() {
    let mut dds = b"DDS ".to_vec();
    dds.extend_from_slice(&[0; 124]);
    assert!(!is_supported_file(&mut Cursor::new(dds)).unwrap());
    assert!(!is_supported_file(&mut Cursor::new(vec![0u8; 4])).unwrap());
}

#[test]
fn test_implausible_header_is_format_error() {
    let mut bytes = tga_header(0, 0, 2, 0, 0, 1, 1, 12, 0);
    bytes.extend_from_slice(&[0; 4]);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::Format(_))));
}

#[test]
fn test_no_image_data_is_unsupported() {
    let bytes = tga_header(0, 0, 0, 0, 0, 1, 1, 32, 0);
    assert!(matches!(read(&mut Cursor::new(bytes)), Err(Error::UnsupportedVariant(_))));
}
