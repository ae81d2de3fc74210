/// XNB reader (XNA Game Studio 4 content files)
///
/// Only uncompressed files whose primary object is a 2D, 3D or cube texture
/// are read. Shared resources after the primary object are ignored.

use std::io::{Read, Seek};
use byteorder::{LittleEndian, ReadBytesExt};
use crate::error::Result;
use crate::formats::stream::{peek_prefix, read_exact_vec, remaining_len};
use crate::texture::{
    ColorSpace, CompressedPixelFormat, PixelFormat, TextureDescriptor, TextureHeader, VariableType,
};
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::formats::xnb";

/// "XNB"
pub const XNB_MAGIC: [u8; 3] = *b"XNB";

/// XNA 4.0
pub const XNB_VERSION: u8 = 5;

const FLAG_COMPRESSED_LZX: u8 = 0x80;
const FLAG_COMPRESSED_LZ4: u8 = 0x40;

// magic, platform, version, flags, file size
const XNB_HEADER_SIZE: u64 = 10;

/// Type readers the primary object may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextureReaderKind {
    Texture2D,
    Texture3D,
    TextureCube,
    Other,
}

impl TextureReaderKind {
    /// Classify an assembly-qualified reader name such as
    /// `Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework.Graphics, Version=4.0.0.0`
    fn from_type_name(name: &str) -> Self {
        let type_name = name.split(',').next().unwrap_or(name).trim();
        let short_name = type_name.rsplit('.').next().unwrap_or(type_name);
        match short_name {
            "Texture2DReader" => Self::Texture2D,
            "Texture3DReader" => Self::Texture3D,
            "TextureCubeReader" => Self::TextureCube,
            _ => Self::Other,
        }
    }
}

// ===== DETECTION =====

/// True if the stream starts with "XNB"
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    Ok(peek_prefix(stream, XNB_MAGIC.len())? == XNB_MAGIC)
}

// ===== READING =====

/// Read the texture stored as the primary object of an XNB file
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let available = remaining_len(stream)?;
    let mut magic = [0u8; 3];
    stream.read_exact(&mut magic)?;
    if magic != XNB_MAGIC {
        pvr_bail!(Format, SOURCE, "Stream does not start with the XNB magic");
    }
    let platform = stream.read_u8()?;
    let version = stream.read_u8()?;
    if version != XNB_VERSION {
        pvr_bail!(UnsupportedVariant, SOURCE, "XNB version {} is not supported (expected {})", version, XNB_VERSION);
    }
    let flags = stream.read_u8()?;
    if flags & (FLAG_COMPRESSED_LZX | FLAG_COMPRESSED_LZ4) != 0 {
        pvr_bail!(UnsupportedVariant, SOURCE, "Compressed XNB files are not supported");
    }
    let file_size = stream.read_u32::<LittleEndian>()? as u64;
    if file_size < XNB_HEADER_SIZE || file_size > available {
        pvr_bail!(
            CorruptData,
            SOURCE,
            "XNB file size field is {} but the stream holds {} bytes",
            file_size, available
        );
    }

    let reader_count = read_7bit_int(stream)?;
    let mut readers = Vec::new();
    for _ in 0..reader_count {
        let name = read_string(stream)?;
        let _reader_version = stream.read_i32::<LittleEndian>()?;
        readers.push(TextureReaderKind::from_type_name(&name));
    }
    let _shared_resource_count = read_7bit_int(stream)?;

    let type_index = read_7bit_int(stream)? as usize;
    let kind = match type_index.checked_sub(1).and_then(|index| readers.get(index)) {
        Some(kind) => *kind,
        None => pvr_bail!(
            CorruptData,
            SOURCE,
            "XNB primary object uses reader {} of {}",
            type_index, readers.len()
        ),
    };

    let texture = match kind {
        TextureReaderKind::Texture2D => {
            let format = stream.read_i32::<LittleEndian>()?;
            let width = stream.read_u32::<LittleEndian>()?;
            let height = stream.read_u32::<LittleEndian>()?;
            let mips = stream.read_u32::<LittleEndian>()?;
            let header = build_header(format, width, height, 1, 1, mips)?;
            read_surfaces(stream, header)?
        }
        TextureReaderKind::Texture3D => {
            let format = stream.read_i32::<LittleEndian>()?;
            let width = stream.read_u32::<LittleEndian>()?;
            let height = stream.read_u32::<LittleEndian>()?;
            let depth = stream.read_u32::<LittleEndian>()?;
            let mips = stream.read_u32::<LittleEndian>()?;
            let header = build_header(format, width, height, depth, 1, mips)?;
            read_surfaces(stream, header)?
        }
        TextureReaderKind::TextureCube => {
            let format = stream.read_i32::<LittleEndian>()?;
            let size = stream.read_u32::<LittleEndian>()?;
            let mips = stream.read_u32::<LittleEndian>()?;
            let header = build_header(format, size, size, 1, 6, mips)?;
            read_surfaces(stream, header)?
        }
        TextureReaderKind::Other => {
            pvr_bail!(UnsupportedVariant, SOURCE, "XNB primary object is not a texture")
        }
    };

    pvr_debug!(
        SOURCE,
        "Loaded XNB {:?} {}x{} {} (platform '{}', {} mips)",
        kind, texture.width(0), texture.height(0), texture.pixel_format(),
        platform as char, texture.num_mip_levels()
    );
    Ok(texture)
}

fn build_header(format: i32, width: u32, height: u32, depth: u32, faces: u32, mips: u32) -> Result<TextureHeader> {
    let (pixel_format, channel_type) = map_surface_format(format)?;
    let mut header = TextureHeader::new(pixel_format, channel_type, ColorSpace::Linear, width, height);
    header.depth = depth;
    header.num_faces = faces;
    header.num_mip_levels = mips;
    header.validate()?;
    Ok(header)
}

/// Size-prefixed surfaces; cube maps store every mip of one face before the next face
fn read_surfaces<S: Read + Seek + ?Sized>(stream: &mut S, header: TextureHeader) -> Result<TextureDescriptor> {
    let mut texture = TextureDescriptor::zeroed(header)?;
    let (faces, mips) = (texture.num_faces(), texture.num_mip_levels());
    for face in 0..faces {
        for mip in 0..mips {
            let expected = texture.header().level_size(mip);
            let size = stream.read_u32::<LittleEndian>()? as usize;
            if size != expected {
                pvr_bail!(
                    CorruptData,
                    SOURCE,
                    "XNB surface (mip {}, face {}) is {} bytes, expected {}",
                    mip, face, size, expected
                );
            }
            let bytes = read_exact_vec(stream, size, "XNB surface data")?;
            texture.mip_data_mut(mip, face, 0)?.copy_from_slice(&bytes);
        }
    }
    Ok(texture)
}

// ===== ENCODING HELPERS =====

/// .NET 7-bit encoded integer (at most five bytes)
fn read_7bit_int<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<u32> {
    let mut value = 0u32;
    for shift in (0..35).step_by(7) {
        let byte = stream.read_u8()?;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    pvr_bail!(CorruptData, SOURCE, "7-bit encoded integer is longer than five bytes")
}

/// .NET string: 7-bit encoded byte length, then UTF-8 bytes
fn read_string<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<String> {
    let length = read_7bit_int(stream)? as usize;
    let bytes = read_exact_vec(stream, length, "XNB type reader name")?;
    match String::from_utf8(bytes) {
        Ok(name) => Ok(name),
        Err(_) => pvr_bail!(CorruptData, SOURCE, "XNB type reader name is not valid UTF-8"),
    }
}

// ===== FORMAT MAPPING =====

/// XNA `SurfaceFormat` to canonical format
fn map_surface_format(format: i32) -> Result<(PixelFormat, VariableType)> {
    use VariableType::{
        SignedByteNorm as Sbn, SignedFloat as Sf, UnsignedByteNorm as Ubn, UnsignedIntegerNorm as Uin,
        UnsignedShortNorm as Usn,
    };
    let rg = |bits: u8| PixelFormat::channels([b'r', b'g', 0, 0], [bits, bits, 0, 0]);
    let r = |bits: u8| PixelFormat::channels([b'r', 0, 0, 0], [bits, 0, 0, 0]);

    Ok(match format {
        0 => (PixelFormat::RGBA8888, Ubn),
        1 => (PixelFormat::RGB565, Usn),
        2 => (PixelFormat::ARGB1555, Usn),
        3 => (PixelFormat::ARGB4444, Usn),
        4 => (PixelFormat::compressed(CompressedPixelFormat::DXT1), Ubn),
        5 => (PixelFormat::compressed(CompressedPixelFormat::DXT3), Ubn),
        6 => (PixelFormat::compressed(CompressedPixelFormat::DXT5), Ubn),
        7 => (PixelFormat::RG88, Sbn),
        8 => (PixelFormat::RGBA8888, Sbn),
        9 => (PixelFormat::channels(*b"rgba", [10, 10, 10, 2]), Uin),
        10 => (rg(16), Usn),
        11 => (PixelFormat::RGBA16161616, Usn),
        12 => (PixelFormat::A8, Ubn),
        13 => (r(32), Sf),
        14 => (rg(32), Sf),
        15 => (PixelFormat::RGBA32323232, Sf),
        16 => (r(16), Sf),
        17 => (rg(16), Sf),
        18 => (PixelFormat::RGBA16161616, Sf),
        19 => (PixelFormat::RGBA32323232, Sf),
        other => pvr_bail!(UnsupportedVariant, SOURCE, "XNB surface format {} is not supported", other),
    })
}

#[cfg(test)]
#[path = "xnb_tests.rs"]
mod tests;
