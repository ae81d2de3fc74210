//! Unit tests for pvrtc.rs

use crate::decompress::pvrtc::*;
use crate::error::Error;

/// Opaque red in colour A (554) and opaque blue in colour B (555)
const RED_BLUE: u32 = 0x801F_FC00;
/// Opaque red in both colours
const RED_RED: u32 = 0xFC00_FC00;

fn words(count: usize, modulation: u32, color: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(count * 8);
    for _ in 0..count {
        data.extend_from_slice(&modulation.to_le_bytes());
        data.extend_from_slice(&color.to_le_bytes());
    }
    data
}

fn assert_all(pixels: &[u8], expected: [u8; 4]) {
    for texel in pixels.chunks_exact(4) {
        assert_eq!(texel, expected);
    }
}

#[test]
fn test_solid_4bpp() {
    let pixels = decompress(&words(4, 0, RED_RED), 8, 8, false).unwrap();
    assert_eq!(pixels.len(), 8 * 8 * 4);
    assert_all(&pixels, [255, 0, 0, 255]);
}

#[test]
fn test_solid_2bpp() {
    let pixels = decompress(&words(4, 0, RED_RED), 16, 8, true).unwrap();
    assert_eq!(pixels.len(), 16 * 8 * 4);
    assert_all(&pixels, [255, 0, 0, 255]);
}

#[test]
fn test_modulation_selects_colour() {
    let pixels = decompress(&words(4, 0, RED_BLUE), 8, 8, false).unwrap();
    assert_all(&pixels, [255, 0, 0, 255]);
    let pixels = decompress(&words(4, 0xFFFF_FFFF, RED_BLUE), 8, 8, false).unwrap();
    assert_all(&pixels, [0, 0, 255, 255]);
}

#[test]
fn test_2bpp_direct_modulation_bits() {
    let pixels = decompress(&words(4, 0xFFFF_FFFF, RED_BLUE), 16, 8, true).unwrap();
    assert_all(&pixels, [0, 0, 255, 255]);
}

#[test]
fn test_punch_through_alpha() {
    let pixels = decompress(&words(4, 0xAAAA_AAAA, RED_RED | 1), 8, 8, false).unwrap();
    assert_all(&pixels, [255, 0, 0, 0]);
}

#[test]
fn test_small_image_is_cropped() {
    let pixels = decompress(&words(1, 0, RED_RED), 2, 2, false).unwrap();
    assert_eq!(pixels.len(), 16);
    assert_all(&pixels, [255, 0, 0, 255]);
}

#[test]
fn test_compressed_size() {
    assert_eq!(compressed_size(8, 8, false), 32);
    assert_eq!(compressed_size(16, 8, true), 32);
    assert_eq!(compressed_size(1, 1, false), 8);
    assert_eq!(compressed_size(1, 1, true), 8);
    assert_eq!(compressed_size(4, 4, false), 8);
    assert_eq!(compressed_size(8, 4, true), 8);
}

#[test]
fn test_small_mip_padded_to_four_words_decodes() {
    // 2x2 level stored the way 8x8-padding writers emit it
    let padded = words(4, 0, RED_RED);
    let pixels = decompress(&padded, 2, 2, false).unwrap();
    assert_eq!(pixels, decompress(&padded[..8], 2, 2, false).unwrap());
    assert_all(&pixels, [255, 0, 0, 255]);
}

#[test]
fn test_non_power_of_two_grid_is_unsupported() {
    let result = decompress(&words(3, 0, RED_RED), 12, 4, false);
    assert!(matches!(result, Err(Error::UnsupportedVariant(_))));
}

#[test]
fn test_short_input_is_decode_failure() {
    let result = decompress(&words(3, 0, RED_RED), 8, 8, false);
    assert!(matches!(result, Err(Error::DecodeFailure(_))));
}

#[test]
fn test_deterministic_output() {
    let data: Vec<u8> = (0..256u32).map(|i| (i.wrapping_mul(97) ^ 0x5A) as u8).collect();
    let first = decompress(&data, 32, 16, true).unwrap();
    let second = decompress(&data, 32, 16, true).unwrap();
    assert_eq!(first, second);
    let first = decompress(&data, 16, 16, false).unwrap();
    assert_eq!(first, decompress(&data, 16, 16, false).unwrap());
}
