/// DDS reader (legacy D3D9 header and DX10 extension)
///
/// DDS stores surface → face → mip; data is re-laid into mip → layer → face.

use std::io::{Read, Seek};
use byteorder::{LittleEndian, ReadBytesExt};
use crate::error::Result;
use crate::formats::stream::{peek_prefix, read_exact_vec, remaining_len};
use crate::texture::{
    ColorSpace, CompressedPixelFormat, PixelFormat, TextureDescriptor, TextureHeader, VariableType,
};
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::formats::dds";

/// "DDS "
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";

/// Magic plus the 124-byte header
pub const DDS_MIN_FILE_SIZE: u64 = 128;

const DDS_HEADER_SIZE: u32 = 124;
const DDS_PIXEL_FORMAT_SIZE: u32 = 32;

// header flags
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSD_DEPTH: u32 = 0x80_0000;

// caps
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_CUBEMAP_ALL_FACES: u32 = 0xFC00;
const DDSCAPS2_VOLUME: u32 = 0x20_0000;

// pixel format flags
const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_ALPHA: u32 = 0x2;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;
const DDPF_LUMINANCE: u32 = 0x2_0000;

// DX10 header
const DX10_RESOURCE_TEXTURE1D: u32 = 2;
const DX10_RESOURCE_TEXTURE3D: u32 = 4;
const DX10_MISC_TEXTURECUBE: u32 = 0x4;
const DX10_ALPHA_MODE_PREMULTIPLIED: u32 = 2;
const DX10_ALPHA_MODE_OPAQUE: u32 = 3;

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

#[derive(Debug, Clone, Copy, Default)]
struct DdsPixelFormat {
    flags: u32,
    fourcc: u32,
    bit_count: u32,
    r_mask: u32,
    g_mask: u32,
    b_mask: u32,
    a_mask: u32,
}

/// Decoded format: (pixel format, channel type, colour space, premultiplied)
type MappedFormat = (PixelFormat, VariableType, ColorSpace, bool);

// ===== DETECTION =====

/// True if the stream starts with "DDS "
pub fn is_supported_file<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<bool> {
    Ok(peek_prefix(stream, DDS_MAGIC.len())? == DDS_MAGIC)
}

// ===== READING =====

/// Read a DDS texture
pub fn read<S: Read + Seek + ?Sized>(stream: &mut S) -> Result<TextureDescriptor> {
    if remaining_len(stream)? < DDS_MIN_FILE_SIZE {
        pvr_bail!(CorruptData, SOURCE, "Stream is shorter than a DDS header ({} bytes)", DDS_MIN_FILE_SIZE);
    }
    let mut magic = [0u8; 4];
    stream.read_exact(&mut magic)?;
    if magic != DDS_MAGIC {
        pvr_bail!(Format, SOURCE, "Stream does not start with the DDS magic");
    }

    let size = stream.read_u32::<LittleEndian>()?;
    if size != DDS_HEADER_SIZE {
        pvr_bail!(CorruptData, SOURCE, "DDS header size is {}, expected {}", size, DDS_HEADER_SIZE);
    }
    let flags = stream.read_u32::<LittleEndian>()?;
    let height = stream.read_u32::<LittleEndian>()?;
    let width = stream.read_u32::<LittleEndian>()?;
    let _pitch_or_linear_size = stream.read_u32::<LittleEndian>()?;
    let depth = stream.read_u32::<LittleEndian>()?;
    let mip_count = stream.read_u32::<LittleEndian>()?;
    for _ in 0..11 {
        stream.read_u32::<LittleEndian>()?;
    }

    let pf_size = stream.read_u32::<LittleEndian>()?;
    if pf_size != DDS_PIXEL_FORMAT_SIZE {
        pvr_bail!(CorruptData, SOURCE, "DDS pixel format size is {}, expected {}", pf_size, DDS_PIXEL_FORMAT_SIZE);
    }
    let pixel_format = DdsPixelFormat {
        flags: stream.read_u32::<LittleEndian>()?,
        fourcc: stream.read_u32::<LittleEndian>()?,
        bit_count: stream.read_u32::<LittleEndian>()?,
        r_mask: stream.read_u32::<LittleEndian>()?,
        g_mask: stream.read_u32::<LittleEndian>()?,
        b_mask: stream.read_u32::<LittleEndian>()?,
        a_mask: stream.read_u32::<LittleEndian>()?,
    };
    let caps1 = stream.read_u32::<LittleEndian>()?;
    let caps2 = stream.read_u32::<LittleEndian>()?;
    // caps3, caps4, reserved2
    for _ in 0..3 {
        stream.read_u32::<LittleEndian>()?;
    }

    let has_mips = flags & DDSD_MIPMAPCOUNT != 0 || caps1 & DDSCAPS_MIPMAP != 0;
    let has_dx10 = pixel_format.flags & DDPF_FOURCC != 0 && pixel_format.fourcc == fourcc(b"DX10");

    let header = if has_dx10 {
        let dxgi_format = stream.read_u32::<LittleEndian>()?;
        let dimension = stream.read_u32::<LittleEndian>()?;
        let misc_flags = stream.read_u32::<LittleEndian>()?;
        let array_size = stream.read_u32::<LittleEndian>()?;
        let misc_flags2 = stream.read_u32::<LittleEndian>()?;

        let (format, channel_type, color_space, _) = map_dxgi_format(dxgi_format)?;
        let alpha_mode = misc_flags2 & 0x7;
        let format = if alpha_mode == DX10_ALPHA_MODE_OPAQUE { format.without_alpha() } else { format };
        let mut header = TextureHeader::new(format, channel_type, color_space, width, height);
        if dimension == DX10_RESOURCE_TEXTURE1D {
            header.height = 1;
        }
        if dimension == DX10_RESOURCE_TEXTURE3D {
            header.depth = depth;
        }
        if misc_flags & DX10_MISC_TEXTURECUBE != 0 {
            header.num_faces = 6;
        }
        header.num_array_members = array_size.max(1);
        header.set_premultiplied(alpha_mode == DX10_ALPHA_MODE_PREMULTIPLIED);
        if has_mips {
            header.num_mip_levels = mip_count.max(1);
        }
        header
    } else {
        let (format, channel_type, color_space, premultiplied) = map_legacy_format(&pixel_format)?;
        let mut header = TextureHeader::new(format, channel_type, color_space, width, height);
        if flags & DDSD_DEPTH != 0 || caps2 & DDSCAPS2_VOLUME != 0 {
            header.depth = depth.max(1);
        }
        if has_mips {
            header.num_mip_levels = mip_count.max(1);
        }
        if caps2 & DDSCAPS2_CUBEMAP != 0 {
            let faces = (caps2 & DDSCAPS2_CUBEMAP_ALL_FACES).count_ones();
            if faces != 6 {
                pvr_bail!(UnsupportedVariant, SOURCE, "Partial cube maps ({} faces) are not supported", faces);
            }
            header.num_faces = 6;
        }
        header.set_premultiplied(premultiplied);
        header
    };
    header.validate()?;

    let mut texture = TextureDescriptor::zeroed(header)?;
    let (layers, faces, mips) = (texture.num_array_members(), texture.num_faces(), texture.num_mip_levels());
    for layer in 0..layers {
        for face in 0..faces {
            for mip in 0..mips {
                let size = texture.header().level_size(mip);
                let bytes = read_exact_vec(stream, size, "DDS surface data")?;
                texture.mip_data_mut(mip, face, layer)?.copy_from_slice(&bytes);
            }
        }
    }
    pvr_debug!(
        SOURCE,
        "Loaded DDS {}x{} {} ({} mips, {} layers, {} faces)",
        texture.width(0), texture.height(0), texture.pixel_format(), mips, layers, faces
    );
    Ok(texture)
}

// ===== FORMAT MAPPING =====

fn map_legacy_format(pf: &DdsPixelFormat) -> Result<MappedFormat> {
    use CompressedPixelFormat as C;
    use ColorSpace::Linear;
    use VariableType::{SignedFloat as Sf, UnsignedByteNorm as Ubn, UnsignedShortNorm as Usn};

    let compressed = |format: C, premultiplied: bool| (PixelFormat::compressed(format), Ubn, Linear, premultiplied);

    if pf.flags & DDPF_FOURCC != 0 {
        let code = pf.fourcc;
        return Ok(match code {
            c if c == fourcc(b"DXT1") => compressed(C::DXT1, false),
            c if c == fourcc(b"DXT2") => compressed(C::DXT2, true),
            c if c == fourcc(b"DXT3") => compressed(C::DXT3, false),
            c if c == fourcc(b"DXT4") => compressed(C::DXT4, true),
            c if c == fourcc(b"DXT5") => compressed(C::DXT5, false),
            c if c == fourcc(b"ATI1") || c == fourcc(b"BC4U") => compressed(C::BC4, false),
            c if c == fourcc(b"ATI2") || c == fourcc(b"BC5U") => compressed(C::BC5, false),
            c if c == fourcc(b"PTC2") => compressed(C::PVRTCI_2bpp_RGBA, false),
            c if c == fourcc(b"PTC4") => compressed(C::PVRTCI_4bpp_RGBA, false),
            c if c == fourcc(b"ETC1") => compressed(C::ETC1, false),
            c if c == fourcc(b"ETC2") => compressed(C::ETC2_RGB, false),
            c if c == fourcc(b"UYVY") => compressed(C::UYVY, false),
            c if c == fourcc(b"YUY2") => compressed(C::YUY2, false),
            // D3DFORMAT values stored in the FourCC field
            36 => (PixelFormat::RGBA16161616, Usn, Linear, false),
            111 => (PixelFormat::channels([b'r', 0, 0, 0], [16, 0, 0, 0]), Sf, Linear, false),
            112 => (PixelFormat::channels([b'r', b'g', 0, 0], [16, 16, 0, 0]), Sf, Linear, false),
            113 => (PixelFormat::RGBA16161616, Sf, Linear, false),
            114 => (PixelFormat::channels([b'r', 0, 0, 0], [32, 0, 0, 0]), Sf, Linear, false),
            115 => (PixelFormat::channels([b'r', b'g', 0, 0], [32, 32, 0, 0]), Sf, Linear, false),
            116 => (PixelFormat::RGBA32323232, Sf, Linear, false),
            other => {
                pvr_bail!(
                    UnsupportedVariant,
                    SOURCE,
                    "DDS FourCC '{}' is not supported",
                    String::from_utf8_lossy(&other.to_le_bytes())
                );
            }
        });
    }

    let masks = (pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask);
    let has_alpha = pf.flags & DDPF_ALPHAPIXELS != 0;
    let mapped = if pf.flags & DDPF_RGB != 0 {
        match (pf.bit_count, has_alpha, masks) {
            (32, true, (0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000)) => Some((PixelFormat::BGRA8888, Ubn)),
            (32, true, (0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000)) => Some((PixelFormat::RGBA8888, Ubn)),
            (32, false, (0x00FF_0000, 0x0000_FF00, 0x0000_00FF, _)) => Some((PixelFormat::BGRX8888, Ubn)),
            (32, false, (0x0000_00FF, 0x0000_FF00, 0x00FF_0000, _)) => {
                Some((PixelFormat::channels(*b"rgbx", [8, 8, 8, 8]), Ubn))
            }
            (24, _, (0x00FF_0000, 0x0000_FF00, 0x0000_00FF, _)) => Some((PixelFormat::BGR888, Ubn)),
            (16, false, (0xF800, 0x07E0, 0x001F, _)) => Some((PixelFormat::RGB565, Usn)),
            (16, true, (0x7C00, 0x03E0, 0x001F, 0x8000)) => Some((PixelFormat::ARGB1555, Usn)),
            (16, false, (0x7C00, 0x03E0, 0x001F, _)) => Some((PixelFormat::XRGB1555, Usn)),
            (16, true, (0x0F00, 0x00F0, 0x000F, 0xF000)) => Some((PixelFormat::ARGB4444, Usn)),
            _ => None,
        }
    } else if pf.flags & DDPF_LUMINANCE != 0 {
        match (pf.bit_count, has_alpha, masks) {
            (8, false, (0xFF, _, _, _)) => Some((PixelFormat::L8, Ubn)),
            (16, true, (0x00FF, _, _, 0xFF00)) => Some((PixelFormat::LA88, Ubn)),
            (16, false, (0xFFFF, _, _, _)) => Some((PixelFormat::channels([b'l', 0, 0, 0], [16, 0, 0, 0]), Usn)),
            _ => None,
        }
    } else if pf.flags & DDPF_ALPHA != 0 {
        match (pf.bit_count, pf.a_mask) {
            (8, 0xFF) => Some((PixelFormat::A8, Ubn)),
            _ => None,
        }
    } else {
        None
    };

    match mapped {
        Some((format, channel_type)) => Ok((format, channel_type, Linear, false)),
        None => pvr_bail!(
            UnsupportedVariant,
            SOURCE,
            "DDS pixel layout (flags 0x{:x}, {} bpp, masks {:08x}/{:08x}/{:08x}/{:08x}) is not supported",
            pf.flags, pf.bit_count, pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask
        ),
    }
}

fn map_dxgi_format(dxgi: u32) -> Result<MappedFormat> {
    use CompressedPixelFormat as C;
    use ColorSpace::{Linear, Srgb};
    use VariableType::{
        SignedByteNorm as Sbn, SignedFloat as Sf, UnsignedByteNorm as Ubn, UnsignedFloat as Uf,
        UnsignedShortNorm as Usn,
    };

    let compressed = |format: C, channel_type: VariableType, color_space: ColorSpace| {
        (PixelFormat::compressed(format), channel_type, color_space, false)
    };
    Ok(match dxgi {
        2 => (PixelFormat::RGBA32323232, Sf, Linear, false),
        10 => (PixelFormat::RGBA16161616, Sf, Linear, false),
        11 => (PixelFormat::RGBA16161616, Usn, Linear, false),
        28 => (PixelFormat::RGBA8888, Ubn, Linear, false),
        29 => (PixelFormat::RGBA8888, Ubn, Srgb, false),
        49 => (PixelFormat::RG88, Ubn, Linear, false),
        61 => (PixelFormat::R8, Ubn, Linear, false),
        65 => (PixelFormat::A8, Ubn, Linear, false),
        71 => compressed(C::DXT1, Ubn, Linear),
        72 => compressed(C::DXT1, Ubn, Srgb),
        74 => compressed(C::DXT3, Ubn, Linear),
        75 => compressed(C::DXT3, Ubn, Srgb),
        77 => compressed(C::DXT5, Ubn, Linear),
        78 => compressed(C::DXT5, Ubn, Srgb),
        80 => compressed(C::BC4, Ubn, Linear),
        81 => compressed(C::BC4, Sbn, Linear),
        83 => compressed(C::BC5, Ubn, Linear),
        84 => compressed(C::BC5, Sbn, Linear),
        85 => (PixelFormat::RGB565, Usn, Linear, false),
        86 => (PixelFormat::ARGB1555, Usn, Linear, false),
        87 => (PixelFormat::BGRA8888, Ubn, Linear, false),
        88 => (PixelFormat::BGRX8888, Ubn, Linear, false),
        91 => (PixelFormat::BGRA8888, Ubn, Srgb, false),
        93 => (PixelFormat::BGRX8888, Ubn, Srgb, false),
        95 => compressed(C::BC6, Uf, Linear),
        96 => compressed(C::BC6, Sf, Linear),
        98 => compressed(C::BC7, Ubn, Linear),
        99 => compressed(C::BC7, Ubn, Srgb),
        115 => (PixelFormat::ARGB4444, Usn, Linear, false),
        other => pvr_bail!(UnsupportedVariant, SOURCE, "DXGI format {} is not supported", other),
    })
}

#[cfg(test)]
#[path = "dds_tests.rs"]
mod tests;
