/// TGA reader
///
/// TGA has no leading magic: detection accepts the TGA 2.0 footer or a header
/// whose fields all fall in their valid ranges. Colour-mapped images are expanded
/// to RGBA8888 and RLE packets are decoded.

use std::io::{Read, Seek, SeekFrom};
use byteorder::ReadBytesExt;
use crate::error::Result;
use crate::formats::stream::{peek, read_exact_vec, remaining_len, skip};
use crate::texture::{
    AxisX, AxisY, ColorSpace, Orientation, PixelFormat, TextureDescriptor, TextureHeader, VariableType,
};
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::formats::tga";

pub const TGA_HEADER_SIZE: u64 = 18;

/// Trailing signature of a TGA 2.0 file
pub const TGA_FOOTER_SIGNATURE: [u8; 18] = *b"TRUEVISION-XFILE.\0";

const TGA_FOOTER_SIZE: u64 = 26;

// image types
const IMAGE_NONE: u8 = 0;
const IMAGE_INDEXED: u8 = 1;
const IMAGE_RGB: u8 = 2;
const IMAGE_GREY: u8 = 3;
const IMAGE_RLE_INDEXED: u8 = 9;
const IMAGE_RLE_RGB: u8 = 10;
const IMAGE_RLE_GREY: u8 = 11;

// descriptor bits
const DESCRIPTOR_ALPHA_BITS: u8 = 0x0F;
const DESCRIPTOR_RIGHT_TO_LEFT: u8 = 0x10;
const DESCRIPTOR_TOP_TO_BOTTOM: u8 = 0x20;

#[derive(Debug, Clone, Copy)]
struct TgaHeader {
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    color_map_first: u16,
    color_map_length: u16,
    color_map_bits: u8,
    width: u16,
    height: u16,
    bits_per_pixel: u8,
    descriptor: u8,
}

impl TgaHeader {
    fn parse(bytes: &[u8; TGA_HEADER_SIZE as usize]) -> Self {
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        Self {
            id_length: bytes[0],
            color_map_type: bytes[1],
            image_type: bytes[2],
            color_map_first: u16_at(3),
            color_map_length: u16_at(5),
            color_map_bits: bytes[7],
            // x and y origin (offsets 8..12) are not used
            width: u16_at(12),
            height: u16_at(14),
            bits_per_pixel: bytes[16],
            descriptor: bytes[17],
        }
    }

    /// All fields within the ranges TGA allows
    fn is_plausible(&self) -> bool {
        let color_map_ok = match self.color_map_type {
            0 => true,
            1 => matches!(self.color_map_bits, 15 | 16 | 24 | 32),
            _ => false,
        };
        color_map_ok
            && matches!(
                self.image_type,
                IMAGE_INDEXED | IMAGE_RGB | IMAGE_GREY | IMAGE_RLE_INDEXED | IMAGE_RLE_RGB | IMAGE_RLE_GREY
            )
            && matches!(self.bits_per_pixel, 8 | 15 | 16 | 24 | 32)
            && self.width != 0
            && self.height != 0
    }

    fn is_indexed(&self) -> bool {
        matches!(self.image_type, IMAGE_INDEXED | IMAGE_RLE_INDEXED)
    }

    fn is_rle(&self) -> bool {
        matches!(self.image_type, IMAGE_RLE_INDEXED | IMAGE_RLE_RGB | IMAGE_RLE_GREY)
    }

    fn alpha_bits(&self) -> u8 {
        self.descriptor & DESCRIPTOR_ALPHA_BITS
    }
}

/// Bytes used by one stored pixel of `bits` (15-bit data occupies two bytes)
fn bytes_for_bits(bits: u8) -> usize {
    (bits as usize).div_ceil(8)
}

// ===== DETECTION =====

/// True if the stream carries a TGA 2.0 footer or a plausible TGA header
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    let remaining = remaining_len(stream)?;
    if remaining < TGA_HEADER_SIZE {
        return Ok(false);
    }
    if remaining >= TGA_HEADER_SIZE + TGA_FOOTER_SIZE {
        let signature = peek(stream, |s| {
            s.seek(SeekFrom::End(-(TGA_FOOTER_SIGNATURE.len() as i64)))?;
            let mut signature = [0u8; 18];
            s.read_exact(&mut signature)?;
            Ok(signature)
        })?;
        if signature == TGA_FOOTER_SIGNATURE {
            return Ok(true);
        }
    }
    let header = peek(stream, |s| {
        let mut bytes = [0u8; TGA_HEADER_SIZE as usize];
        s.read_exact(&mut bytes)?;
        Ok(TgaHeader::parse(&bytes))
    })?;
    Ok(header.is_plausible())
}

// ===== READING =====

/// Read a TGA image
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let mut bytes = [0u8; TGA_HEADER_SIZE as usize];
    stream.read_exact(&mut bytes)?;
    let tga = TgaHeader::parse(&bytes);

    if tga.image_type == IMAGE_NONE {
        pvr_bail!(UnsupportedVariant, SOURCE, "TGA file contains no image data");
    }
    if !tga.is_plausible() {
        pvr_bail!(
            Format,
            SOURCE,
            "Not a TGA image (type {}, colour map {}, {} bpp, {}x{})",
            tga.image_type, tga.color_map_type, tga.bits_per_pixel, tga.width, tga.height
        );
    }
    skip(stream, tga.id_length as u64, "TGA image id")?;

    let orientation = Orientation {
        x: if tga.descriptor & DESCRIPTOR_RIGHT_TO_LEFT != 0 { AxisX::Left } else { AxisX::Right },
        y: if tga.descriptor & DESCRIPTOR_TOP_TO_BOTTOM != 0 { AxisY::Down } else { AxisY::Up },
        ..Orientation::default()
    };
    let pixel_count = tga.width as usize * tga.height as usize;

    let palette = if tga.color_map_type == 1 {
        let entry_size = bytes_for_bits(tga.color_map_bits);
        let raw = read_exact_vec(stream, tga.color_map_length as usize * entry_size, "TGA colour map")?;
        Some(expand_color_map(&raw, &tga))
    } else {
        None
    };

    let texture = if tga.is_indexed() {
        let Some(palette) = palette else {
            pvr_bail!(CorruptData, SOURCE, "Colour-mapped TGA has no colour map");
        };
        let index_size = bytes_for_bits(tga.bits_per_pixel);
        let indices = read_pixels(stream, &tga, pixel_count, index_size)?;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for index in indices.chunks_exact(index_size) {
            // little-endian, 1 to 4 bytes wide
            let index = index.iter().rev().fold(0usize, |value, &byte| (value << 8) | byte as usize);
            let entry = index.checked_sub(tga.color_map_first as usize);
            match entry.and_then(|entry| palette.get(entry)) {
                Some(color) => data.extend_from_slice(color),
                None => pvr_bail!(
                    CorruptData,
                    SOURCE,
                    "TGA colour index {} is outside the colour map ({} entries from {})",
                    index, palette.len(), tga.color_map_first
                ),
            }
        }
        let mut header = TextureHeader::new(
            PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, ColorSpace::Linear,
            tga.width as u32, tga.height as u32,
        );
        header.set_orientation(orientation);
        TextureDescriptor::new(header, data)?
    } else {
        let (format, channel_type) = map_direct_format(&tga)?;
        let pixel_size = bytes_for_bits(tga.bits_per_pixel);
        let data = read_pixels(stream, &tga, pixel_count, pixel_size)?;
        let mut header = TextureHeader::new(
            format, channel_type, ColorSpace::Linear, tga.width as u32, tga.height as u32,
        );
        header.set_orientation(orientation);
        TextureDescriptor::new(header, data)?
    };

    pvr_debug!(
        SOURCE,
        "Loaded TGA {}x{} {} (type {}, {} bpp)",
        tga.width, tga.height, texture.pixel_format(), tga.image_type, tga.bits_per_pixel
    );
    Ok(texture)
}

fn map_direct_format(tga: &TgaHeader) -> Result<(PixelFormat, VariableType)> {
    use VariableType::{UnsignedByteNorm as Ubn, UnsignedShortNorm as Usn};

    let grey = matches!(tga.image_type, IMAGE_GREY | IMAGE_RLE_GREY);
    let has_alpha = tga.alpha_bits() != 0;
    Ok(match (grey, tga.bits_per_pixel, has_alpha) {
        (true, 8, _) => (PixelFormat::L8, Ubn),
        (true, 16, _) => (PixelFormat::LA88, Ubn),
        (false, 15, _) | (false, 16, false) => (PixelFormat::XRGB1555, Usn),
        (false, 16, true) => (PixelFormat::ARGB1555, Usn),
        (false, 24, _) => (PixelFormat::BGR888, Ubn),
        (false, 32, true) => (PixelFormat::BGRA8888, Ubn),
        (false, 32, false) => (PixelFormat::BGRX8888, Ubn),
        (_, bits, _) => pvr_bail!(
            UnsupportedVariant,
            SOURCE,
            "TGA image type {} at {} bpp is not supported",
            tga.image_type, bits
        ),
    })
}

/// Convert colour map entries to RGBA8888
fn expand_color_map(raw: &[u8], tga: &TgaHeader) -> Vec<[u8; 4]> {
    let entry_size = bytes_for_bits(tga.color_map_bits);
    let keep_alpha = tga.alpha_bits() != 0;
    raw.chunks_exact(entry_size)
        .map(|entry| match entry_size {
            2 => {
                let value = u16::from_le_bytes([entry[0], entry[1]]);
                let expand = |v: u16| ((v << 3) | (v >> 2)) as u8;
                let alpha = if tga.color_map_bits == 16 && keep_alpha && value & 0x8000 == 0 { 0 } else { 0xFF };
                [expand((value >> 10) & 0x1F), expand((value >> 5) & 0x1F), expand(value & 0x1F), alpha]
            }
            3 => [entry[2], entry[1], entry[0], 0xFF],
            _ => [entry[2], entry[1], entry[0], if keep_alpha { entry[3] } else { 0xFF }],
        })
        .collect()
}

/// Read `count` stored pixels of `pixel_size` bytes, raw or run-length encoded
fn read_pixels<S: Read + Seek + ?Sized>(stream: &mut S, tga: &TgaHeader, count: usize, pixel_size: usize) -> Result<Vec<u8>> {
    if !tga.is_rle() {
        return read_exact_vec(stream, count * pixel_size, "TGA pixel data");
    }

    let total = count * pixel_size;
    let mut data = Vec::with_capacity(total);
    let mut pixel = vec![0u8; pixel_size];
    while data.len() < total {
        let packet = stream.read_u8()?;
        let run = (packet & 0x7F) as usize + 1;
        let run_bytes = (run * pixel_size).min(total - data.len());
        if packet & 0x80 != 0 {
            stream.read_exact(&mut pixel)?;
            for _ in 0..run_bytes / pixel_size {
                data.extend_from_slice(&pixel);
            }
        } else {
            let raw = read_exact_vec(stream, run * pixel_size, "TGA raw packet")?;
            data.extend_from_slice(&raw[..run_bytes]);
        }
    }
    Ok(data)
}

#[cfg(test)]
#[path = "tga_tests.rs"]
mod tests;
