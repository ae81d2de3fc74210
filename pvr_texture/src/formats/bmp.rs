/// BMP reader
///
/// Supports the core (OS/2) header and the Windows info headers up to V5.
/// Palettised images are expanded to RGBA8888. Rows keep the file order; a
/// positive height means the rows run bottom-up, recorded as orientation y=Up.

use std::io::{Read, Seek, SeekFrom};
use byteorder::{LittleEndian, ReadBytesExt};
use crate::error::Result;
use crate::formats::stream::{peek_prefix, read_exact_vec};
use crate::texture::{
    AxisX, AxisY, ColorSpace, Orientation, PixelFormat, TextureDescriptor, TextureHeader, VariableType,
};
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::formats::bmp";

/// "BM"
pub const BMP_MAGIC: [u8; 2] = *b"BM";

const FILE_HEADER_SIZE: u64 = 14;

// info header sizes
const CORE_HEADER: u32 = 12;
const CORE2_HEADER: u32 = 64;
const INFO_HEADER: u32 = 40;
const INFO_V2_HEADER: u32 = 52;
const INFO_V3_HEADER: u32 = 56;
const INFO_V4_HEADER: u32 = 108;
const INFO_V5_HEADER: u32 = 124;

// compression
const BI_RGB: u32 = 0;
const BI_RLE8: u32 = 1;
const BI_RLE4: u32 = 2;
const BI_BITFIELDS: u32 = 3;
const BI_ALPHABITFIELDS: u32 = 6;

// colour space types (LOGCOLORSPACE)
const LCS_CALIBRATED_RGB: u32 = 0;
const LCS_SRGB: u32 = u32::from_be_bytes(*b"sRGB");
const LCS_WINDOWS_COLOR_SPACE: u32 = u32::from_be_bytes(*b"Win ");
const PROFILE_LINKED: u32 = u32::from_be_bytes(*b"LINK");
const PROFILE_EMBEDDED: u32 = u32::from_be_bytes(*b"MBED");

#[derive(Debug, Clone, Copy, Default)]
struct Masks {
    r: u32,
    g: u32,
    b: u32,
    a: u32,
}

#[derive(Debug, Clone, Copy)]
struct InfoHeader {
    header_size: u32,
    width: i32,
    height: i32,
    bits_per_pixel: u16,
    compression: u32,
    colors_used: u32,
    masks: Option<Masks>,
    color_space_type: u32,
}

// ===== DETECTION =====

/// True if the stream starts with "BM"
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    Ok(peek_prefix(stream, BMP_MAGIC.len())? == BMP_MAGIC)
}

// ===== READING =====

/// Read a BMP image
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let start = stream.stream_position()?;
    let mut magic = [0u8; 2];
    stream.read_exact(&mut magic)?;
    if magic != BMP_MAGIC {
        pvr_bail!(Format, SOURCE, "Stream does not start with the BMP magic");
    }
    let _file_size = stream.read_u32::<LittleEndian>()?;
    let _reserved = stream.read_u32::<LittleEndian>()?;
    let pixel_offset = stream.read_u32::<LittleEndian>()?;

    let header_size = stream.read_u32::<LittleEndian>()?;
    let info = match header_size {
        CORE_HEADER => read_core_header(stream)?,
        INFO_HEADER | INFO_V2_HEADER | INFO_V3_HEADER | INFO_V4_HEADER | INFO_V5_HEADER => {
            read_info_header(stream, header_size)?
        }
        CORE2_HEADER => pvr_bail!(UnsupportedVariant, SOURCE, "OS/2 version 2 BMP headers are not supported"),
        other => pvr_bail!(CorruptData, SOURCE, "Unknown BMP info header size {}", other),
    };

    match info.compression {
        BI_RGB | BI_BITFIELDS | BI_ALPHABITFIELDS => {}
        BI_RLE8 | BI_RLE4 => pvr_bail!(UnsupportedVariant, SOURCE, "Run-length encoded BMP data is not supported"),
        other => pvr_bail!(UnsupportedVariant, SOURCE, "BMP compression type {} is not supported", other),
    }
    if info.width == 0 || info.height == 0 {
        pvr_bail!(CorruptData, SOURCE, "BMP has a zero dimension ({}x{})", info.width, info.height);
    }

    let color_space = match info.color_space_type {
        LCS_SRGB | LCS_WINDOWS_COLOR_SPACE => ColorSpace::Srgb,
        LCS_CALIBRATED_RGB => ColorSpace::Linear,
        PROFILE_LINKED | PROFILE_EMBEDDED => {
            pvr_bail!(UnsupportedVariant, SOURCE, "BMP colour profiles are not supported")
        }
        other => pvr_bail!(CorruptData, SOURCE, "Unknown BMP colour space type 0x{:08x}", other),
    };

    let width = info.width.unsigned_abs();
    let height = info.height.unsigned_abs();
    let orientation = Orientation {
        x: if info.width < 0 { AxisX::Left } else { AxisX::Right },
        y: if info.height < 0 { AxisY::Down } else { AxisY::Up },
        ..Orientation::default()
    };

    let texture = match info.bits_per_pixel {
        1 | 2 | 4 | 8 => {
            let entry_size = if info.header_size == CORE_HEADER { 3 } else { 4 };
            let entries = match info.colors_used {
                0 => 1usize << info.bits_per_pixel,
                n => n as usize,
            };
            let palette = read_exact_vec(stream, entries * entry_size, "BMP palette")?;
            let palette: Vec<[u8; 4]> = palette
                .chunks_exact(entry_size)
                .map(|bgr| [bgr[2], bgr[1], bgr[0], 0xFF])
                .collect();

            let mut header = TextureHeader::new(
                PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, color_space, width, height,
            );
            header.set_orientation(orientation);
            header.validate()?;

            stream.seek(SeekFrom::Start(start + pixel_offset as u64))?;
            let rows = read_rows(stream, width, height, info.bits_per_pixel as u32)?;
            let data = expand_palette(&rows, width, info.bits_per_pixel as u32, &palette)?;
            TextureDescriptor::new(header, data)?
        }
        16 | 24 | 32 => {
            let (format, channel_type) = map_direct_format(&info)?;
            let mut header = TextureHeader::new(format, channel_type, color_space, width, height);
            header.set_orientation(orientation);
            header.validate()?;

            stream.seek(SeekFrom::Start(start + pixel_offset as u64))?;
            let data = read_rows(stream, width, height, info.bits_per_pixel as u32)?;
            TextureDescriptor::new(header, data)?
        }
        other => pvr_bail!(CorruptData, SOURCE, "BMP bit depth {} is invalid", other),
    };

    pvr_debug!(
        SOURCE,
        "Loaded BMP {}x{} {} ({} bpp, header {})",
        width, height, texture.pixel_format(), info.bits_per_pixel, info.header_size
    );
    Ok(texture)
}

fn read_core_header<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<InfoHeader> {
    let width = stream.read_u16::<LittleEndian>()?;
    let height = stream.read_u16::<LittleEndian>()?;
    let planes = stream.read_u16::<LittleEndian>()?;
    if planes != 1 {
        pvr_bail!(CorruptData, SOURCE, "BMP plane count is {}, expected 1", planes);
    }
    let bits_per_pixel = stream.read_u16::<LittleEndian>()?;
    if !matches!(bits_per_pixel, 1 | 4 | 8 | 24) {
        pvr_bail!(CorruptData, SOURCE, "Core BMP bit depth {} is invalid", bits_per_pixel);
    }
    Ok(InfoHeader {
        header_size: CORE_HEADER,
        width: width as i32,
        height: height as i32,
        bits_per_pixel,
        compression: BI_RGB,
        colors_used: 0,
        masks: None,
        color_space_type: LCS_CALIBRATED_RGB,
    })
}

fn read_info_header<S: Read + Seek + ?Sized>(stream: &mut S, header_size: u32) -> Result<InfoHeader> {
    let width = stream.read_i32::<LittleEndian>()?;
    let height = stream.read_i32::<LittleEndian>()?;
    let planes = stream.read_u16::<LittleEndian>()?;
    if planes != 1 {
        pvr_bail!(CorruptData, SOURCE, "BMP plane count is {}, expected 1", planes);
    }
    let bits_per_pixel = stream.read_u16::<LittleEndian>()?;
    let compression = stream.read_u32::<LittleEndian>()?;
    let _image_size = stream.read_u32::<LittleEndian>()?;
    let _x_pixels_per_meter = stream.read_i32::<LittleEndian>()?;
    let _y_pixels_per_meter = stream.read_i32::<LittleEndian>()?;
    let colors_used = stream.read_u32::<LittleEndian>()?;
    let _colors_important = stream.read_u32::<LittleEndian>()?;

    let mut masks = None;
    let mut color_space_type = LCS_CALIBRATED_RGB;
    if header_size >= INFO_V2_HEADER || compression == BI_BITFIELDS || compression == BI_ALPHABITFIELDS {
        // a plain info header keeps its masks directly after the header
        let mut m = Masks {
            r: stream.read_u32::<LittleEndian>()?,
            g: stream.read_u32::<LittleEndian>()?,
            b: stream.read_u32::<LittleEndian>()?,
            a: 0,
        };
        if header_size >= INFO_V3_HEADER || compression == BI_ALPHABITFIELDS {
            m.a = stream.read_u32::<LittleEndian>()?;
        }
        masks = Some(m);
    }
    if header_size >= INFO_V4_HEADER {
        color_space_type = stream.read_u32::<LittleEndian>()?;
        // endpoints (9 x u32) and gamma (3 x u32)
        for _ in 0..12 {
            stream.read_u32::<LittleEndian>()?;
        }
    }
    if header_size >= INFO_V5_HEADER {
        // intent, profile data, profile size, reserved
        for _ in 0..4 {
            stream.read_u32::<LittleEndian>()?;
        }
    }

    Ok(InfoHeader {
        header_size,
        width,
        height,
        bits_per_pixel,
        compression,
        colors_used,
        masks,
        color_space_type,
    })
}

// ===== FORMAT MAPPING =====

fn map_direct_format(info: &InfoHeader) -> Result<(PixelFormat, VariableType)> {
    use VariableType::{UnsignedByteNorm as Ubn, UnsignedShortNorm as Usn};

    let bitfields = info.compression == BI_BITFIELDS || info.compression == BI_ALPHABITFIELDS;
    let masks = info.masks.unwrap_or_default();
    let has_alpha = masks.a != 0;

    if !bitfields {
        return Ok(match (info.bits_per_pixel, has_alpha) {
            (16, true) => (PixelFormat::ARGB1555, Usn),
            (16, false) => (PixelFormat::XRGB1555, Usn),
            (24, _) => (PixelFormat::BGR888, Ubn),
            (32, true) => (PixelFormat::BGRA8888, Ubn),
            _ => (PixelFormat::BGRX8888, Ubn),
        });
    }

    let mapped = match (info.bits_per_pixel, masks.r, masks.g, masks.b, masks.a) {
        (16, 0xF800, 0x07E0, 0x001F, 0) => Some((PixelFormat::RGB565, Usn)),
        (16, 0x7C00, 0x03E0, 0x001F, 0) => Some((PixelFormat::XRGB1555, Usn)),
        (16, 0x7C00, 0x03E0, 0x001F, 0x8000) => Some((PixelFormat::ARGB1555, Usn)),
        (16, 0x0F00, 0x00F0, 0x000F, 0xF000) => Some((PixelFormat::ARGB4444, Usn)),
        (32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000) => Some((PixelFormat::BGRA8888, Ubn)),
        (32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0) => Some((PixelFormat::BGRX8888, Ubn)),
        (32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000) => Some((PixelFormat::RGBA8888, Ubn)),
        (32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0) => {
            Some((PixelFormat::channels(*b"rgbx", [8, 8, 8, 8]), Ubn))
        }
        _ => None,
    };
    match mapped {
        Some(format) => Ok(format),
        None => pvr_bail!(
            UnsupportedVariant,
            SOURCE,
            "BMP bitfields {:08x}/{:08x}/{:08x}/{:08x} at {} bpp are not supported",
            masks.r, masks.g, masks.b, masks.a, info.bits_per_pixel
        ),
    }
}

// ===== PIXEL DATA =====

/// Read `height` rows of `width` pixels, dropping the 4-byte row padding
fn read_rows<S: Read + Seek + ?Sized>(stream: &mut S, width: u32, height: u32, bits_per_pixel: u32) -> Result<Vec<u8>> {
    let row_bytes = (width as usize * bits_per_pixel as usize).div_ceil(8);
    let stride = (row_bytes + 3) & !3;
    let padded = read_exact_vec(stream, stride * height as usize, "BMP pixel data")?;
    if stride == row_bytes {
        return Ok(padded);
    }
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in padded.chunks_exact(stride) {
        data.extend_from_slice(&row[..row_bytes]);
    }
    Ok(data)
}

/// Expand packed palette indices (most significant bits first) to RGBA8888
fn expand_palette(rows: &[u8], width: u32, bits_per_pixel: u32, palette: &[[u8; 4]]) -> Result<Vec<u8>> {
    let row_bytes = (width as usize * bits_per_pixel as usize).div_ceil(8);
    let per_byte = 8 / bits_per_pixel as usize;
    let mask = (0xFFu16 >> (8 - bits_per_pixel)) as u8;

    let mut data = Vec::with_capacity(rows.len() / row_bytes.max(1) * width as usize * 4);
    for row in rows.chunks_exact(row_bytes) {
        for x in 0..width as usize {
            let byte = row[x / per_byte];
            let shift = 8 - bits_per_pixel as usize * (x % per_byte + 1);
            let index = ((byte >> shift) & mask) as usize;
            match palette.get(index) {
                Some(color) => data.extend_from_slice(color),
                None => pvr_bail!(
                    CorruptData,
                    SOURCE,
                    "BMP palette index {} is outside a {}-entry palette",
                    index, palette.len()
                ),
            }
        }
    }
    Ok(data)
}

#[cfg(test)]
#[path = "bmp_tests.rs"]
mod tests;
