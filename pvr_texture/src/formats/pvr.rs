/// PVR container: v3 reader and writer, legacy v1/v2 reader
///
/// v3 files store data in the canonical order and load with a single read.
/// Legacy files store surface → depth slice → face → mip and are re-laid.

use std::io::{Read, Seek, Write};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::error::Result;
use crate::formats::stream::{peek_prefix, read_exact_vec, remaining_len};
use crate::texture::{
    AxisY, ColorSpace, CompressedPixelFormat, HeaderFlags, MetaDataBlock, Orientation, PixelFormat,
    TextureDescriptor, TextureHeader, VariableType, PVR_V3_IDENTIFIER,
};
use crate::{pvr_bail, pvr_debug, pvr_err};

const SOURCE: &str = "pvr::formats::pvr";

/// Size of the v3 header in bytes
pub const PVR_V3_HEADER_SIZE: usize = 52;

/// v3 identifier as read from a file written on a big-endian machine
const PVR_V3_IDENTIFIER_SWAPPED: u32 = 0x5056_5203;

const LEGACY_HEADER_SIZE_V1: u32 = 44;
const LEGACY_HEADER_SIZE_V2: u32 = 52;
/// "PVR!"
const LEGACY_IDENTIFIER_V2: u32 = 0x2152_5650;

const LEGACY_FLAG_CUBE_MAP: u32 = 0x1000;
const LEGACY_FLAG_VOLUME: u32 = 0x4000;
const LEGACY_FLAG_ALPHA: u32 = 0x8000;
const LEGACY_FLAG_VERTICAL_FLIP: u32 = 0x1_0000;

// ===== DETECTION =====

/// True if the stream starts with a v3 identifier or a plausible legacy header
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    let prefix = peek_prefix(stream, LEGACY_HEADER_SIZE_V2 as usize)?;
    if prefix.len() < 4 {
        return Ok(false);
    }
    let word = |offset: usize| u32::from_le_bytes([prefix[offset], prefix[offset + 1], prefix[offset + 2], prefix[offset + 3]]);
    Ok(match word(0) {
        PVR_V3_IDENTIFIER | PVR_V3_IDENTIFIER_SWAPPED => true,
        LEGACY_HEADER_SIZE_V1 => prefix.len() >= LEGACY_HEADER_SIZE_V1 as usize,
        LEGACY_HEADER_SIZE_V2 => prefix.len() == LEGACY_HEADER_SIZE_V2 as usize && word(44) == LEGACY_IDENTIFIER_V2,
        _ => false,
    })
}

// ===== READING =====

/// Read a PVR v3 or legacy PVR texture
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let version = stream.read_u32::<LittleEndian>()?;
    match version {
        PVR_V3_IDENTIFIER => read_v3(stream),
        PVR_V3_IDENTIFIER_SWAPPED => {
            pvr_bail!(UnsupportedVariant, SOURCE, "PVR v3 file was written with big-endian byte order")
        }
        LEGACY_HEADER_SIZE_V1 | LEGACY_HEADER_SIZE_V2 => read_legacy(stream, version),
        other => pvr_bail!(Format, SOURCE, "Not a PVR file (identifier 0x{:08x})", other),
    }
}

fn read_v3<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let flags = stream.read_u32::<LittleEndian>()?;
    let pixel_format = stream.read_u64::<LittleEndian>()?;
    let color_space = stream.read_u32::<LittleEndian>()?;
    let channel_type = stream.read_u32::<LittleEndian>()?;
    let height = stream.read_u32::<LittleEndian>()?;
    let width = stream.read_u32::<LittleEndian>()?;
    let depth = stream.read_u32::<LittleEndian>()?;
    let num_surfaces = stream.read_u32::<LittleEndian>()?;
    let num_faces = stream.read_u32::<LittleEndian>()?;
    let num_mips = stream.read_u32::<LittleEndian>()?;
    let metadata_size = stream.read_u32::<LittleEndian>()?;

    let mut header = TextureHeader::new(
        PixelFormat::from_id(pixel_format)?,
        VariableType::from_u32(channel_type)?,
        ColorSpace::from_u32(color_space)?,
        width,
        height,
    );
    header.flags = HeaderFlags::from_bits_retain(flags);
    header.depth = depth;
    header.num_array_members = num_surfaces;
    header.num_faces = num_faces;
    header.num_mip_levels = num_mips;
    header.validate()?;

    header.metadata = read_metadata(stream, metadata_size)?;

    let data = read_exact_vec(stream, header.total_data_size(), "PVR texture data")?;
    pvr_debug!(
        SOURCE,
        "Loaded PVR v3 {}x{}x{} {} ({} mips, {} layers, {} faces)",
        header.width, header.height, header.depth, header.pixel_format,
        header.num_mip_levels, header.num_array_members, header.num_faces
    );
    TextureDescriptor::new(header, data)
}

fn read_metadata<S: Read + Seek + ?Sized>(stream: &mut S, metadata_size: u32) -> Result<Vec<MetaDataBlock>> {
    if metadata_size as u64 > remaining_len(stream)? {
        pvr_bail!(CorruptData, SOURCE, "Metadata size {} exceeds the file", metadata_size);
    }
    let mut blocks = Vec::new();
    let mut consumed: u64 = 0;
    while consumed < metadata_size as u64 {
        let fourcc = stream.read_u32::<LittleEndian>()?;
        let key = stream.read_u32::<LittleEndian>()?;
        let size = stream.read_u32::<LittleEndian>()?;
        consumed += 12 + size as u64;
        if consumed > metadata_size as u64 {
            pvr_bail!(CorruptData, SOURCE, "Metadata block (key {}) overruns the metadata section", key);
        }
        let data = read_exact_vec(stream, size as usize, "PVR metadata block")?;
        blocks.push(MetaDataBlock { fourcc, key, data });
    }
    Ok(blocks)
}

fn read_legacy<S: Read + Seek + ?Sized>(stream: &mut S, header_size: u32) -> Result<TextureDescriptor> {
    let height = stream.read_u32::<LittleEndian>()?;
    let width = stream.read_u32::<LittleEndian>()?;
    let mip_count = stream.read_u32::<LittleEndian>()?;
    let format_and_flags = stream.read_u32::<LittleEndian>()?;
    // data size, bit count and the four channel masks are implied by the format
    for _ in 0..6 {
        stream.read_u32::<LittleEndian>()?;
    }
    let num_surfaces = if header_size == LEGACY_HEADER_SIZE_V2 {
        let magic = stream.read_u32::<LittleEndian>()?;
        if magic != LEGACY_IDENTIFIER_V2 {
            pvr_bail!(Format, SOURCE, "Legacy PVR v2 header has bad magic 0x{:08x}", magic);
        }
        stream.read_u32::<LittleEndian>()?
    } else {
        1
    };

    let (pixel_format, channel_type, premultiplied) = map_legacy_format(format_and_flags)?;
    let is_cube = format_and_flags & LEGACY_FLAG_CUBE_MAP != 0;
    let faces = if is_cube { 6 } else { 1 };

    let mut header = TextureHeader::new(pixel_format, channel_type, ColorSpace::Linear, width, height);
    header.num_faces = faces;
    header.num_mip_levels = mip_count.saturating_add(1);
    if format_and_flags & LEGACY_FLAG_VOLUME != 0 {
        header.depth = num_surfaces / faces;
    } else {
        header.num_array_members = (num_surfaces / faces).max(1);
    }
    header.set_premultiplied(premultiplied);
    if format_and_flags & LEGACY_FLAG_VERTICAL_FLIP != 0 {
        header.set_orientation(Orientation { y: AxisY::Up, ..Orientation::default() });
    }
    header.validate()?;

    let mut texture = TextureDescriptor::zeroed(header)?;
    let (layers, top_depth, mips) = (texture.num_array_members(), texture.depth(0), texture.num_mip_levels());
    for layer in 0..layers {
        for slice in 0..top_depth {
            for face in 0..faces {
                for mip in 0..mips {
                    let depth = texture.depth(mip);
                    if slice >= depth {
                        continue;
                    }
                    let slice_size = texture.header().level_size(mip) / depth as usize;
                    let bytes = read_exact_vec(stream, slice_size, "Legacy PVR surface")?;
                    let start = slice as usize * slice_size;
                    texture.mip_data_mut(mip, face, layer)?[start..start + slice_size].copy_from_slice(&bytes);
                }
            }
        }
    }
    pvr_debug!(SOURCE, "Loaded legacy PVR ({} byte header) as {}", header_size, texture.pixel_format());
    Ok(texture)
}

/// Map the low byte of a legacy flags word to (format, channel type, premultiplied)
fn map_legacy_format(format_and_flags: u32) -> Result<(PixelFormat, VariableType, bool)> {
    use CompressedPixelFormat as C;
    use VariableType::{UnsignedByteNorm as Ubn, UnsignedIntegerNorm as Uin, UnsignedShortNorm as Usn};

    let has_alpha = format_and_flags & LEGACY_FLAG_ALPHA != 0;
    let pvrtc = |rgb: C, rgba: C| PixelFormat::compressed(if has_alpha { rgba } else { rgb });
    let legacy = format_and_flags & 0xff;
    let mapped = match legacy {
        0x00 => (PixelFormat::ARGB4444, Usn, false),
        0x01 => (PixelFormat::ARGB1555, Usn, false),
        0x02 => (PixelFormat::RGB565, Usn, false),
        0x03 => (PixelFormat::XRGB1555, Usn, false),
        0x04 => (PixelFormat::RGB888, Uin, false),
        0x05 => (PixelFormat::channels(*b"argb", [8, 8, 8, 8]), Uin, false),
        0x06 => (PixelFormat::channels(*b"argb", [8, 3, 3, 2]), Usn, false),
        0x07 => (PixelFormat::channels([b'i', 0, 0, 0], [8, 0, 0, 0]), Ubn, false),
        0x08 => (PixelFormat::channels([b'a', b'i', 0, 0], [8, 8, 0, 0]), Usn, false),
        0x09 => (PixelFormat::compressed(C::BW1bpp), Ubn, false),
        0x0A => (PixelFormat::compressed(C::YUY2), Ubn, false),
        0x0B => (PixelFormat::compressed(C::UYVY), Ubn, false),
        0x0C | 0x18 => (pvrtc(C::PVRTCI_2bpp_RGB, C::PVRTCI_2bpp_RGBA), Ubn, false),
        0x0D | 0x19 => (pvrtc(C::PVRTCI_4bpp_RGB, C::PVRTCI_4bpp_RGBA), Ubn, false),
        0x10 => (PixelFormat::RGBA4444, Usn, false),
        0x11 => (PixelFormat::RGBA5551, Usn, false),
        0x12 => (PixelFormat::RGBA8888, Ubn, false),
        0x13 => (PixelFormat::RGB565, Usn, false),
        0x14 => (PixelFormat::channels(*b"rgbx", [5, 5, 5, 1]), Usn, false),
        0x15 => (PixelFormat::RGB888, Ubn, false),
        0x16 => (PixelFormat::L8, Ubn, false),
        0x17 => (PixelFormat::LA88, Ubn, false),
        0x1A => (PixelFormat::BGRA8888, Ubn, false),
        0x1B => (PixelFormat::A8, Ubn, false),
        0x1C => (PixelFormat::compressed(C::PVRTCII_4bpp), Ubn, false),
        0x1D => (PixelFormat::compressed(C::PVRTCII_2bpp), Ubn, false),
        0x20 => (PixelFormat::compressed(C::DXT1), Ubn, false),
        0x21 => (PixelFormat::compressed(C::DXT2), Ubn, true),
        0x22 => (PixelFormat::compressed(C::DXT3), Ubn, false),
        0x23 => (PixelFormat::compressed(C::DXT4), Ubn, true),
        0x24 => (PixelFormat::compressed(C::DXT5), Ubn, false),
        0x36 => (PixelFormat::compressed(C::ETC1), Ubn, false),
        other => {
            return Err(pvr_err!(UnsupportedVariant, SOURCE, "Legacy PVR pixel type 0x{:02x} is not supported", other));
        }
    };
    Ok(mapped)
}

// ===== WRITING =====

/// Write `texture` as a PVR v3 file: header, metadata, then data in canonical order
pub fn write_pvr<W: Write + ?Sized>(texture: &TextureDescriptor, writer: &mut W) -> Result<()> {
    let header = texture.header();
    writer.write_u32::<LittleEndian>(PVR_V3_IDENTIFIER)?;
    writer.write_u32::<LittleEndian>(header.flags.bits())?;
    writer.write_u64::<LittleEndian>(header.pixel_format.id())?;
    writer.write_u32::<LittleEndian>(header.color_space as u32)?;
    writer.write_u32::<LittleEndian>(header.channel_type as u32)?;
    writer.write_u32::<LittleEndian>(header.height)?;
    writer.write_u32::<LittleEndian>(header.width)?;
    writer.write_u32::<LittleEndian>(header.depth)?;
    writer.write_u32::<LittleEndian>(header.num_array_members)?;
    writer.write_u32::<LittleEndian>(header.num_faces)?;
    writer.write_u32::<LittleEndian>(header.num_mip_levels)?;
    writer.write_u32::<LittleEndian>(header.metadata_size() as u32)?;
    for block in &header.metadata {
        writer.write_u32::<LittleEndian>(block.fourcc)?;
        writer.write_u32::<LittleEndian>(block.key)?;
        writer.write_u32::<LittleEndian>(block.data.len() as u32)?;
        writer.write_all(&block.data)?;
    }
    writer.write_all(texture.data())?;
    Ok(())
}

#[cfg(test)]
#[path = "pvr_tests.rs"]
mod tests;
