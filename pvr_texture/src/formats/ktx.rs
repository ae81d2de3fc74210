/// KTX 1.1 reader
///
/// Little- and big-endian files are accepted. Uncompressed rows are padded to
/// 4 bytes in the file; that padding and the cube face / mip padding are stripped.

use std::io::{Read, Seek, SeekFrom};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use crate::error::Result;
use crate::formats::stream::{peek_prefix, read_exact_vec, remaining_len, skip};
use crate::texture::{
    AxisX, AxisY, AxisZ, ColorSpace, CompressedPixelFormat, Orientation, PixelFormat, TextureDescriptor,
    TextureHeader, VariableType,
};
use crate::{pvr_bail, pvr_debug, pvr_err};

const SOURCE: &str = "pvr::formats::ktx";

/// 12-byte KTX 1.1 file identifier
pub const KTX_IDENTIFIER: [u8; 12] = [0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A];

const KTX_HEADER_SIZE: u64 = 64;
const ENDIAN_REFERENCE: u32 = 0x0403_0201;
const ENDIAN_REFERENCE_SWAPPED: u32 = 0x0102_0304;
const ORIENTATION_KEY: &[u8] = b"KTXorientation";

// ===== GL ENUMS =====

pub(crate) mod gl {
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const HALF_FLOAT_OES: u32 = 0x8D61;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;

    pub const ALPHA: u32 = 0x1906;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const LUMINANCE: u32 = 0x1909;
    pub const LUMINANCE_ALPHA: u32 = 0x190A;
    pub const RED: u32 = 0x1903;
    pub const RG: u32 = 0x8227;
    pub const BGRA: u32 = 0x80E1;

    pub const SRGB8: u32 = 0x8C41;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;

    pub const COMPRESSED_RGB_PVRTC_4BPPV1_IMG: u32 = 0x8C00;
    pub const COMPRESSED_RGB_PVRTC_2BPPV1_IMG: u32 = 0x8C01;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV1_IMG: u32 = 0x8C02;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV1_IMG: u32 = 0x8C03;
    pub const COMPRESSED_SRGB_PVRTC_2BPPV1_EXT: u32 = 0x8A54;
    pub const COMPRESSED_SRGB_PVRTC_4BPPV1_EXT: u32 = 0x8A55;
    pub const COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1_EXT: u32 = 0x8A56;
    pub const COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1_EXT: u32 = 0x8A57;
    pub const COMPRESSED_RGBA_PVRTC_2BPPV2_IMG: u32 = 0x9137;
    pub const COMPRESSED_RGBA_PVRTC_4BPPV2_IMG: u32 = 0x9138;
    pub const ETC1_RGB8_OES: u32 = 0x8D64;
    pub const COMPRESSED_R11_EAC: u32 = 0x9270;
    pub const COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
    pub const COMPRESSED_RG11_EAC: u32 = 0x9272;
    pub const COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;
    pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
    pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
    pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
    pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
    pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
    pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;
    pub const COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
    pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
    pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
    pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;
}

/// Endian-aware u32 reads for the header and image sizes
#[derive(Clone, Copy)]
struct Endian {
    swapped: bool,
}

impl Endian {
    fn read_u32<S: Read + ?Sized>(self, stream: &mut S) -> Result<u32> {
        Ok(if self.swapped {
            stream.read_u32::<BigEndian>()?
        } else {
            stream.read_u32::<LittleEndian>()?
        })
    }
}

struct KtxHeader {
    gl_type: u32,
    gl_type_size: u32,
    gl_format: u32,
    gl_internal_format: u32,
    width: u32,
    height: u32,
    depth: u32,
    array_elements: u32,
    faces: u32,
    mip_levels: u32,
    key_value_bytes: u32,
}

// ===== DETECTION =====

/// True if the stream starts with the KTX 1.1 identifier
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    Ok(peek_prefix(stream, KTX_IDENTIFIER.len())? == KTX_IDENTIFIER)
}

// ===== READING =====

/// Read a KTX 1.1 texture
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    let start = stream.stream_position()?;
    if remaining_len(stream)? < KTX_HEADER_SIZE {
        pvr_bail!(CorruptData, SOURCE, "Stream is shorter than a KTX header");
    }
    let mut identifier = [0u8; 12];
    stream.read_exact(&mut identifier)?;
    if identifier != KTX_IDENTIFIER {
        pvr_bail!(Format, SOURCE, "Stream does not start with the KTX identifier");
    }

    let endian = match stream.read_u32::<LittleEndian>()? {
        ENDIAN_REFERENCE => Endian { swapped: false },
        ENDIAN_REFERENCE_SWAPPED => Endian { swapped: true },
        other => pvr_bail!(CorruptData, SOURCE, "Invalid KTX endianness marker 0x{:08x}", other),
    };

    let gl_type = endian.read_u32(stream)?;
    let gl_type_size = endian.read_u32(stream)?;
    let gl_format = endian.read_u32(stream)?;
    let gl_internal_format = endian.read_u32(stream)?;
    // glBaseInternalFormat is implied by the other three
    endian.read_u32(stream)?;
    let ktx = KtxHeader {
        gl_type,
        gl_type_size,
        gl_format,
        gl_internal_format,
        width: endian.read_u32(stream)?,
        height: endian.read_u32(stream)?,
        depth: endian.read_u32(stream)?,
        array_elements: endian.read_u32(stream)?,
        faces: endian.read_u32(stream)?,
        mip_levels: endian.read_u32(stream)?,
        key_value_bytes: endian.read_u32(stream)?,
    };

    let orientation = read_key_values(stream, endian, ktx.key_value_bytes)?;
    stream.seek(SeekFrom::Start(start + KTX_HEADER_SIZE + ktx.key_value_bytes as u64))?;

    let (pixel_format, channel_type, color_space) = map_gl_format(&ktx)?;
    let mut header = TextureHeader::new(pixel_format, channel_type, color_space, ktx.width, ktx.height.max(1));
    header.depth = ktx.depth.max(1);
    header.num_array_members = ktx.array_elements.max(1);
    header.num_faces = ktx.faces;
    header.num_mip_levels = ktx.mip_levels.max(1);
    if orientation != Orientation::default() {
        header.set_orientation(orientation);
    }
    header.validate()?;

    let mut texture = TextureDescriptor::zeroed(header)?;
    read_image_data(stream, endian, &ktx, &mut texture)?;
    pvr_debug!(
        SOURCE,
        "Loaded KTX {}x{} {} ({} mips)",
        texture.width(0), texture.height(0), texture.pixel_format(), texture.num_mip_levels()
    );
    Ok(texture)
}

fn read_key_values<S: Read + Seek + ?Sized>(stream: &mut S, endian: Endian, total: u32) -> Result<Orientation> {
    if total as u64 > remaining_len(stream)? {
        pvr_bail!(CorruptData, SOURCE, "Key/value data size {} exceeds the file", total);
    }
    let mut orientation = Orientation::default();
    let mut consumed: u64 = 0;
    while consumed < total as u64 {
        let size = endian.read_u32(stream)?;
        let entry = read_exact_vec(stream, size as usize, "KTX key/value pair")?;
        let padding = (4 - size % 4) % 4;
        skip(stream, padding as u64, "KTX key/value padding")?;
        consumed += 4 + size as u64 + padding as u64;

        let key_end = entry.iter().position(|&b| b == 0).unwrap_or(entry.len());
        if &entry[..key_end] == ORIENTATION_KEY {
            let value = String::from_utf8_lossy(&entry[(key_end + 1).min(entry.len())..]).into_owned();
            if value.contains("S=l") {
                orientation.x = AxisX::Left;
            }
            if value.contains("T=u") {
                orientation.y = AxisY::Up;
            }
            if value.contains("R=o") {
                orientation.z = AxisZ::Out;
            }
        }
    }
    if consumed > total as u64 {
        pvr_bail!(CorruptData, SOURCE, "Key/value pairs overrun their declared size {}", total);
    }
    Ok(orientation)
}

fn read_image_data<S: Read + Seek + ?Sized>(
    stream: &mut S,
    endian: Endian,
    ktx: &KtxHeader,
    texture: &mut TextureDescriptor,
) -> Result<()> {
    let compressed = texture.pixel_format().is_compressed();
    let bytes_per_pixel = (texture.pixel_format().bits_per_pixel() / 8) as usize;
    let (layers, faces) = (texture.num_array_members(), texture.num_faces());
    let cube_only = faces == 6 && layers == 1;

    for mip in 0..texture.num_mip_levels() {
        let image_size = endian.read_u32(stream)? as usize;
        let level = texture.header().level_size(mip);
        let (width, height, depth) = (texture.width(mip) as usize, texture.height(mip) as usize, texture.depth(mip) as usize);
        let row = bytes_per_pixel * width;
        let padded_row = row.div_ceil(4) * 4;
        let padded_level = if compressed { level } else { padded_row * height * depth };

        let per_image = if cube_only { 1 } else { layers as usize * faces as usize };
        if image_size != level * per_image && image_size != padded_level * per_image {
            pvr_bail!(
                CorruptData,
                SOURCE,
                "Mip {} image size {} does not match the expected {}",
                mip, image_size, level * per_image
            );
        }
        let cube_padding = if cube_only { (4 - level % 4) % 4 } else { 0 };

        for layer in 0..layers {
            for face in 0..faces {
                let target = texture.mip_data_mut(mip, face, layer)?;
                if compressed || row == padded_row {
                    let bytes = read_exact_vec(stream, level, "KTX image data")?;
                    target.copy_from_slice(&bytes);
                } else {
                    for dst in target.chunks_exact_mut(row) {
                        let bytes = read_exact_vec(stream, padded_row, "KTX scan line")?;
                        dst.copy_from_slice(&bytes[..row]);
                    }
                }
                if endian.swapped && !compressed {
                    swap_elements(target, ktx.gl_type_size);
                }
                skip(stream, cube_padding as u64, "KTX cube face padding")?;
            }
        }

        let mip_padding = (3 - ((image_size + 3) % 4)) as u64;
        let available = remaining_len(stream)?;
        skip(stream, mip_padding.min(available), "KTX mip padding")?;
    }
    Ok(())
}

/// Byte-swap each `element_size`-byte element in place
fn swap_elements(data: &mut [u8], element_size: u32) {
    match element_size {
        2 => {
            for chunk in data.chunks_exact_mut(2) {
                let value = BigEndian::read_u16(chunk);
                LittleEndian::write_u16(chunk, value);
            }
        }
        4 => {
            for chunk in data.chunks_exact_mut(4) {
                let value = BigEndian::read_u32(chunk);
                LittleEndian::write_u32(chunk, value);
            }
        }
        _ => {}
    }
}

// ===== FORMAT MAPPING =====

/// Map (glInternalFormat, glFormat, glType) to (pixel format, channel type, colour space)
fn map_gl_format(ktx: &KtxHeader) -> Result<(PixelFormat, VariableType, ColorSpace)> {
    if ktx.gl_type == 0 {
        return map_compressed(ktx.gl_internal_format);
    }

    let color_space = match ktx.gl_internal_format {
        gl::SRGB8 | gl::SRGB8_ALPHA8 => ColorSpace::Srgb,
        _ => ColorSpace::Linear,
    };

    let packed = match (ktx.gl_format, ktx.gl_type) {
        (gl::RGB, gl::UNSIGNED_SHORT_5_6_5) => Some(PixelFormat::RGB565),
        (gl::RGBA, gl::UNSIGNED_SHORT_4_4_4_4) => Some(PixelFormat::RGBA4444),
        (gl::RGBA, gl::UNSIGNED_SHORT_5_5_5_1) => Some(PixelFormat::RGBA5551),
        _ => None,
    };
    if let Some(format) = packed {
        return Ok((format, VariableType::UnsignedShortNorm, color_space));
    }

    let (bits, channel_type) = match ktx.gl_type {
        gl::UNSIGNED_BYTE => (8, VariableType::UnsignedByteNorm),
        gl::BYTE => (8, VariableType::SignedByteNorm),
        gl::UNSIGNED_SHORT => (16, VariableType::UnsignedShortNorm),
        gl::SHORT => (16, VariableType::SignedShortNorm),
        gl::UNSIGNED_INT => (32, VariableType::UnsignedIntegerNorm),
        gl::INT => (32, VariableType::SignedIntegerNorm),
        gl::HALF_FLOAT | gl::HALF_FLOAT_OES => (16, VariableType::SignedFloat),
        gl::FLOAT => (32, VariableType::SignedFloat),
        other => {
            return Err(pvr_err!(UnsupportedVariant, SOURCE, "KTX glType 0x{:04x} is not supported", other));
        }
    };

    let names: &[u8] = match ktx.gl_format {
        gl::RED => b"r",
        gl::RG => b"rg",
        gl::RGB => b"rgb",
        gl::RGBA => b"rgba",
        gl::BGRA => b"bgra",
        gl::LUMINANCE => b"l",
        gl::LUMINANCE_ALPHA => b"la",
        gl::ALPHA => b"a",
        other => {
            return Err(pvr_err!(UnsupportedVariant, SOURCE, "KTX glFormat 0x{:04x} is not supported", other));
        }
    };
    let mut channel_names = [0u8; 4];
    let mut channel_bits = [0u8; 4];
    for (i, &name) in names.iter().enumerate() {
        channel_names[i] = name;
        channel_bits[i] = bits;
    }
    Ok((PixelFormat::channels(channel_names, channel_bits), channel_type, color_space))
}

fn map_compressed(internal_format: u32) -> Result<(PixelFormat, VariableType, ColorSpace)> {
    use CompressedPixelFormat as C;
    use ColorSpace::{Linear, Srgb};

    let unorm = VariableType::UnsignedByteNorm;
    let (format, channel_type, color_space) = match internal_format {
        gl::COMPRESSED_RGB_PVRTC_2BPPV1_IMG => (C::PVRTCI_2bpp_RGB, unorm, Linear),
        gl::COMPRESSED_RGBA_PVRTC_2BPPV1_IMG => (C::PVRTCI_2bpp_RGBA, unorm, Linear),
        gl::COMPRESSED_RGB_PVRTC_4BPPV1_IMG => (C::PVRTCI_4bpp_RGB, unorm, Linear),
        gl::COMPRESSED_RGBA_PVRTC_4BPPV1_IMG => (C::PVRTCI_4bpp_RGBA, unorm, Linear),
        gl::COMPRESSED_SRGB_PVRTC_2BPPV1_EXT => (C::PVRTCI_2bpp_RGB, unorm, Srgb),
        gl::COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1_EXT => (C::PVRTCI_2bpp_RGBA, unorm, Srgb),
        gl::COMPRESSED_SRGB_PVRTC_4BPPV1_EXT => (C::PVRTCI_4bpp_RGB, unorm, Srgb),
        gl::COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1_EXT => (C::PVRTCI_4bpp_RGBA, unorm, Srgb),
        gl::COMPRESSED_RGBA_PVRTC_2BPPV2_IMG => (C::PVRTCII_2bpp, unorm, Linear),
        gl::COMPRESSED_RGBA_PVRTC_4BPPV2_IMG => (C::PVRTCII_4bpp, unorm, Linear),
        gl::ETC1_RGB8_OES => (C::ETC1, unorm, Linear),
        gl::COMPRESSED_RGB8_ETC2 => (C::ETC2_RGB, unorm, Linear),
        gl::COMPRESSED_SRGB8_ETC2 => (C::ETC2_RGB, unorm, Srgb),
        gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2 => (C::ETC2_RGB_A1, unorm, Linear),
        gl::COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2 => (C::ETC2_RGB_A1, unorm, Srgb),
        gl::COMPRESSED_RGBA8_ETC2_EAC => (C::ETC2_RGBA, unorm, Linear),
        gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC => (C::ETC2_RGBA, unorm, Srgb),
        gl::COMPRESSED_R11_EAC => (C::EAC_R11, unorm, Linear),
        gl::COMPRESSED_SIGNED_R11_EAC => (C::EAC_R11, VariableType::SignedByteNorm, Linear),
        gl::COMPRESSED_RG11_EAC => (C::EAC_RG11, unorm, Linear),
        gl::COMPRESSED_SIGNED_RG11_EAC => (C::EAC_RG11, VariableType::SignedByteNorm, Linear),
        gl::COMPRESSED_RGB_S3TC_DXT1_EXT | gl::COMPRESSED_RGBA_S3TC_DXT1_EXT => (C::DXT1, unorm, Linear),
        gl::COMPRESSED_RGBA_S3TC_DXT3_EXT => (C::DXT3, unorm, Linear),
        gl::COMPRESSED_RGBA_S3TC_DXT5_EXT => (C::DXT5, unorm, Linear),
        other => {
            return Err(pvr_err!(
                UnsupportedVariant,
                SOURCE,
                "KTX compressed internal format 0x{:04x} is not supported",
                other
            ));
        }
    };
    Ok((PixelFormat::compressed(format), channel_type, color_space))
}

#[cfg(test)]
#[path = "ktx_tests.rs"]
mod tests;
