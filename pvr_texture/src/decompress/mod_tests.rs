//! Unit tests for the decompression entry points

use crate::decompress::*;
use crate::error::Error;
use crate::texture::*;

fn compressed_header(format: CompressedPixelFormat, width: u32, height: u32) -> TextureHeader {
    TextureHeader::new(PixelFormat::compressed(format), VariableType::UnsignedByteNorm, ColorSpace::Srgb, width, height)
}

fn etc_chain() -> TextureDescriptor {
    let mut header = compressed_header(CompressedPixelFormat::ETC1, 8, 8);
    header.num_mip_levels = 2;
    header.num_array_members = 2;
    let data: Vec<u8> = (0..header.total_data_size()).map(|i| (i * 31 % 251) as u8).collect();
    TextureDescriptor::new(header, data).unwrap()
}

#[test]
fn test_is_decompressible() {
    assert!(is_decompressible(PixelFormat::compressed(CompressedPixelFormat::PVRTCI_4bpp_RGBA)));
    assert!(is_decompressible(PixelFormat::compressed(CompressedPixelFormat::PVRTCI_2bpp_RGB)));
    assert!(is_decompressible(PixelFormat::compressed(CompressedPixelFormat::ETC2_RGBA)));
    assert!(!is_decompressible(PixelFormat::compressed(CompressedPixelFormat::PVRTCII_4bpp)));
    assert!(!is_decompressible(PixelFormat::compressed(CompressedPixelFormat::DXT1)));
    assert!(!is_decompressible(PixelFormat::RGBA8888));
}

#[test]
fn test_decompressed_format_keeps_colour_space() {
    let format = TextureFormat::compressed(CompressedPixelFormat::ETC2_RGB, ColorSpace::Srgb);
    assert_eq!(decompressed_format(format), TextureFormat::rgba8888(ColorSpace::Srgb));
}

#[test]
fn test_single_pvrtc_block_texture() {
    let header = compressed_header(CompressedPixelFormat::PVRTCI_4bpp_RGBA, 4, 4);
    let mut data = 0u32.to_le_bytes().to_vec();
    data.extend_from_slice(&0xFC00_FC00u32.to_le_bytes());
    let texture = TextureDescriptor::new(header, data).unwrap();

    let output = decompress_texture(&texture, true).unwrap();
    assert_eq!(output.pixel_format(), PixelFormat::RGBA8888);
    assert_eq!(output.texture_format(), TextureFormat::rgba8888(ColorSpace::Srgb));
    assert_eq!(output.total_data_size(), 64);
    for texel in output.data().chunks_exact(4) {
        assert_eq!(texel, [255, 0, 0, 255]);
    }
}

#[test]
fn test_every_subresource_is_decoded() {
    let texture = etc_chain();
    let output = decompress_texture(&texture, true).unwrap();
    assert_eq!(output.num_mip_levels(), 2);
    assert_eq!(output.num_array_members(), 2);
    assert_eq!(output.mip_data(0, 0, 1).unwrap().len(), 8 * 8 * 4);
    assert_eq!(output.mip_data(1, 0, 1).unwrap().len(), 4 * 4 * 4);

    let direct = decompress_image(CompressedPixelFormat::ETC1, texture.mip_data(1, 0, 1).unwrap(), 4, 4).unwrap();
    assert_eq!(output.mip_data(1, 0, 1).unwrap(), &direct[..]);
}

#[test]
fn test_parallel_matches_sequential() {
    let texture = etc_chain();
    assert_eq!(decompress_texture(&texture, true).unwrap(), decompress_texture(&texture, false).unwrap());
}

#[test]
fn test_volume_slices() {
    let mut header = compressed_header(CompressedPixelFormat::ETC1, 4, 4);
    header.depth = 2;
    let mut data = vec![0x88, 0, 0, 0, 0, 0, 0, 0];
    data.extend_from_slice(&[0x80, 0, 0, 0x02, 0, 0, 0, 0]);
    let texture = TextureDescriptor::new(header, data).unwrap();
    let output = decompress_texture(&texture, false).unwrap();
    assert_eq!(output.total_data_size(), 2 * 64);
    assert_eq!(&output.data()[..4], &[138, 2, 2, 255]);
    assert_eq!(&output.data()[64..68], &[134, 2, 2, 255]);
}

#[test]
fn test_uncompressed_texture_is_unsupported() {
    let header = TextureHeader::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear, 1, 1);
    let texture = TextureDescriptor::new(header, vec![0; 4]).unwrap();
    assert!(matches!(decompress_texture(&texture, true), Err(Error::UnsupportedVariant(_))));
}

#[test]
fn test_decode_errors_propagate() {
    let header = compressed_header(CompressedPixelFormat::PVRTCI_4bpp_RGB, 12, 4);
    let texture = TextureDescriptor::zeroed(header).unwrap();
    assert!(matches!(decompress_texture(&texture, true), Err(Error::UnsupportedVariant(_))));
}
