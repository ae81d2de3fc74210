/// Pixel format token, channel numeric type and colour space
///
/// `PixelFormat` is a 64-bit value laid out exactly like the PVR v3 header field:
/// when the high 32 bits are zero the low bits hold a `CompressedPixelFormat`
/// enumerant, otherwise bytes 0..4 name the channels and bytes 4..8 hold their widths.

use std::fmt;
use crate::error::{Error, Result};

// ===== COMPRESSED FORMATS =====

/// Compressed (or otherwise non-channel-describable) pixel formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum CompressedPixelFormat {
    PVRTCI_2bpp_RGB = 0,
    PVRTCI_2bpp_RGBA = 1,
    PVRTCI_4bpp_RGB = 2,
    PVRTCI_4bpp_RGBA = 3,
    PVRTCII_2bpp = 4,
    PVRTCII_4bpp = 5,
    ETC1 = 6,
    DXT1 = 7,
    DXT2 = 8,
    DXT3 = 9,
    DXT4 = 10,
    DXT5 = 11,
    BC4 = 12,
    BC5 = 13,
    BC6 = 14,
    BC7 = 15,
    UYVY = 16,
    YUY2 = 17,
    BW1bpp = 18,
    SharedExponentR9G9B9E5 = 19,
    RGBG8888 = 20,
    GRGB8888 = 21,
    ETC2_RGB = 22,
    ETC2_RGBA = 23,
    ETC2_RGB_A1 = 24,
    EAC_R11 = 25,
    EAC_RG11 = 26,
}

impl CompressedPixelFormat {
    const ALL: [CompressedPixelFormat; 27] = [
        Self::PVRTCI_2bpp_RGB, Self::PVRTCI_2bpp_RGBA, Self::PVRTCI_4bpp_RGB, Self::PVRTCI_4bpp_RGBA,
        Self::PVRTCII_2bpp, Self::PVRTCII_4bpp, Self::ETC1, Self::DXT1, Self::DXT2, Self::DXT3,
        Self::DXT4, Self::DXT5, Self::BC4, Self::BC5, Self::BC6, Self::BC7, Self::UYVY, Self::YUY2,
        Self::BW1bpp, Self::SharedExponentR9G9B9E5, Self::RGBG8888, Self::GRGB8888, Self::ETC2_RGB,
        Self::ETC2_RGBA, Self::ETC2_RGB_A1, Self::EAC_R11, Self::EAC_RG11,
    ];

    /// Look up an enumerant by its numeric value
    pub fn from_u64(value: u64) -> Option<Self> {
        Self::ALL.get(usize::try_from(value).ok()?).copied()
    }

    /// Bits stored per texel
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::PVRTCI_2bpp_RGB | Self::PVRTCI_2bpp_RGBA | Self::PVRTCII_2bpp => 2,
            Self::PVRTCI_4bpp_RGB | Self::PVRTCI_4bpp_RGBA | Self::PVRTCII_4bpp => 4,
            Self::ETC1 | Self::DXT1 | Self::BC4 | Self::ETC2_RGB | Self::ETC2_RGB_A1 | Self::EAC_R11 => 4,
            Self::DXT2 | Self::DXT3 | Self::DXT4 | Self::DXT5 | Self::BC5 | Self::BC6 | Self::BC7 => 8,
            Self::ETC2_RGBA | Self::EAC_RG11 => 8,
            Self::UYVY | Self::YUY2 => 16,
            Self::BW1bpp => 1,
            Self::SharedExponentR9G9B9E5 | Self::RGBG8888 | Self::GRGB8888 => 32,
        }
    }

    /// Smallest addressable unit in texels (width, height, depth)
    ///
    /// PVRTC sizes use one word per block, so a 1x1 mip is 8 bytes rather than
    /// the four-word 8x8/16x8 padding some writers emit.
    pub fn block_dimensions(self) -> (u32, u32, u32) {
        match self {
            Self::PVRTCI_2bpp_RGB | Self::PVRTCI_2bpp_RGBA | Self::PVRTCII_2bpp => (8, 4, 1),
            Self::PVRTCI_4bpp_RGB | Self::PVRTCI_4bpp_RGBA | Self::PVRTCII_4bpp => (4, 4, 1),
            Self::ETC1 | Self::ETC2_RGB | Self::ETC2_RGBA | Self::ETC2_RGB_A1 | Self::EAC_R11 | Self::EAC_RG11 => (4, 4, 1),
            Self::DXT1 | Self::DXT2 | Self::DXT3 | Self::DXT4 | Self::DXT5 => (4, 4, 1),
            Self::BC4 | Self::BC5 | Self::BC6 | Self::BC7 => (4, 4, 1),
            Self::UYVY | Self::YUY2 | Self::RGBG8888 | Self::GRGB8888 => (2, 1, 1),
            Self::BW1bpp => (8, 1, 1),
            Self::SharedExponentR9G9B9E5 => (1, 1, 1),
        }
    }

    /// True for PVRTC version 1 formats
    pub fn is_pvrtc1(self) -> bool {
        matches!(
            self,
            Self::PVRTCI_2bpp_RGB | Self::PVRTCI_2bpp_RGBA | Self::PVRTCI_4bpp_RGB | Self::PVRTCI_4bpp_RGBA
        )
    }

    /// True for ETC1 and the ETC2/EAC family
    pub fn is_etc(self) -> bool {
        matches!(
            self,
            Self::ETC1 | Self::ETC2_RGB | Self::ETC2_RGBA | Self::ETC2_RGB_A1 | Self::EAC_R11 | Self::EAC_RG11
        )
    }

    /// True when the channel type picks between a signed and an unsigned encoding
    pub fn has_signed_variant(self) -> bool {
        matches!(self, Self::BC4 | Self::BC5 | Self::BC6 | Self::EAC_R11 | Self::EAC_RG11)
    }
}

// ===== PIXEL FORMAT =====

/// 64-bit pixel format token
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat(u64);

impl PixelFormat {
    pub const RGBA8888: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', b'a'], [8, 8, 8, 8]);
    pub const BGRA8888: PixelFormat = PixelFormat::channels([b'b', b'g', b'r', b'a'], [8, 8, 8, 8]);
    pub const BGRX8888: PixelFormat = PixelFormat::channels([b'b', b'g', b'r', b'x'], [8, 8, 8, 8]);
    pub const RGB888: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', 0], [8, 8, 8, 0]);
    pub const BGR888: PixelFormat = PixelFormat::channels([b'b', b'g', b'r', 0], [8, 8, 8, 0]);
    pub const RGB565: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', 0], [5, 6, 5, 0]);
    pub const RGBA4444: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', b'a'], [4, 4, 4, 4]);
    pub const RGBA5551: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', b'a'], [5, 5, 5, 1]);
    pub const ARGB1555: PixelFormat = PixelFormat::channels([b'a', b'r', b'g', b'b'], [1, 5, 5, 5]);
    pub const XRGB1555: PixelFormat = PixelFormat::channels([b'x', b'r', b'g', b'b'], [1, 5, 5, 5]);
    pub const ARGB4444: PixelFormat = PixelFormat::channels([b'a', b'r', b'g', b'b'], [4, 4, 4, 4]);
    pub const L8: PixelFormat = PixelFormat::channels([b'l', 0, 0, 0], [8, 0, 0, 0]);
    pub const LA88: PixelFormat = PixelFormat::channels([b'l', b'a', 0, 0], [8, 8, 0, 0]);
    pub const A8: PixelFormat = PixelFormat::channels([b'a', 0, 0, 0], [8, 0, 0, 0]);
    pub const R8: PixelFormat = PixelFormat::channels([b'r', 0, 0, 0], [8, 0, 0, 0]);
    pub const RG88: PixelFormat = PixelFormat::channels([b'r', b'g', 0, 0], [8, 8, 0, 0]);
    pub const RGBA16161616: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', b'a'], [16, 16, 16, 16]);
    pub const RGBA32323232: PixelFormat = PixelFormat::channels([b'r', b'g', b'b', b'a'], [32, 32, 32, 32]);

    /// Build a channel-described format. Unused trailing channels are 0 in both arrays.
    pub const fn channels(names: [u8; 4], bits: [u8; 4]) -> Self {
        PixelFormat(
            names[0] as u64
                | (names[1] as u64) << 8
                | (names[2] as u64) << 16
                | (names[3] as u64) << 24
                | (bits[0] as u64) << 32
                | (bits[1] as u64) << 40
                | (bits[2] as u64) << 48
                | (bits[3] as u64) << 56,
        )
    }

    /// Build a compressed format token
    pub const fn compressed(format: CompressedPixelFormat) -> Self {
        PixelFormat(format as u64)
    }

    /// Validate a raw 64-bit token read from a file
    pub fn from_id(id: u64) -> Result<Self> {
        if id >> 32 == 0 {
            return match CompressedPixelFormat::from_u64(id) {
                Some(_) => Ok(PixelFormat(id)),
                None => Err(Error::UnsupportedVariant(format!(
                    "Compressed pixel format {} is not supported",
                    id
                ))),
            };
        }
        let format = PixelFormat(id);
        let names = format.channel_names();
        let bits = format.channel_bits();
        for i in 0..4 {
            let named = names[i] != 0;
            let sized = bits[i] != 0;
            if named != sized {
                return Err(Error::CorruptData(format!(
                    "Pixel format 0x{:016x} has mismatched channel {} name/width",
                    id, i
                )));
            }
            if named && !b"rgbalixdsc".contains(&names[i]) {
                return Err(Error::UnsupportedVariant(format!(
                    "Pixel format 0x{:016x} uses unknown channel '{}'",
                    id, names[i] as char
                )));
            }
        }
        Ok(format)
    }

    /// Raw 64-bit value
    pub fn id(&self) -> u64 {
        self.0
    }

    /// True when the token holds a `CompressedPixelFormat`
    pub fn is_compressed(&self) -> bool {
        self.0 >> 32 == 0
    }

    /// The compressed enumerant, if any
    pub fn compressed_format(&self) -> Option<CompressedPixelFormat> {
        if self.is_compressed() {
            CompressedPixelFormat::from_u64(self.0)
        } else {
            None
        }
    }

    /// Channel names (`b'r'`, `b'g'`, ...), 0 for unused slots
    pub fn channel_names(&self) -> [u8; 4] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2], b[3]]
    }

    /// Channel widths in bits, 0 for unused slots
    pub fn channel_bits(&self) -> [u8; 4] {
        let b = self.0.to_le_bytes();
        [b[4], b[5], b[6], b[7]]
    }

    /// Number of channels of an uncompressed format (0 for compressed)
    pub fn channel_count(&self) -> u32 {
        if self.is_compressed() {
            return 0;
        }
        self.channel_bits().iter().filter(|&&b| b != 0).count() as u32
    }

    /// Bits stored per texel
    pub fn bits_per_pixel(&self) -> u32 {
        match self.compressed_format() {
            Some(format) => format.bits_per_pixel(),
            None => self.channel_bits().iter().map(|&b| b as u32).sum(),
        }
    }

    /// Smallest addressable unit (1x1x1 for uncompressed formats)
    pub fn block_dimensions(&self) -> (u32, u32, u32) {
        match self.compressed_format() {
            Some(format) => format.block_dimensions(),
            None => (1, 1, 1),
        }
    }

    /// True for PVRTC 1 (2bpp or 4bpp)
    pub fn is_pvrtc(&self) -> bool {
        self.compressed_format().is_some_and(|f| f.is_pvrtc1())
    }

    /// True for ETC1 / ETC2 / EAC
    pub fn is_etc(&self) -> bool {
        self.compressed_format().is_some_and(|f| f.is_etc())
    }

    /// Returns a copy with every 'a' channel renamed to 'x'
    pub fn without_alpha(&self) -> PixelFormat {
        if self.is_compressed() {
            return *self;
        }
        let mut bytes = self.0.to_le_bytes();
        for name in bytes.iter_mut().take(4) {
            if *name == b'a' {
                *name = b'x';
            }
        }
        PixelFormat(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(format) = self.compressed_format() {
            return write!(f, "{:?}", format);
        }
        for &name in self.channel_names().iter().filter(|&&n| n != 0) {
            write!(f, "{}", name as char)?;
        }
        for &bits in self.channel_bits().iter().filter(|&&b| b != 0) {
            write!(f, "{}", bits)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({})", self)
    }
}

// ===== CHANNEL TYPE / COLOR SPACE =====

/// Numeric encoding of each channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    UnsignedByteNorm = 0,
    SignedByteNorm = 1,
    UnsignedByte = 2,
    SignedByte = 3,
    UnsignedShortNorm = 4,
    SignedShortNorm = 5,
    UnsignedShort = 6,
    SignedShort = 7,
    UnsignedIntegerNorm = 8,
    SignedIntegerNorm = 9,
    UnsignedInteger = 10,
    SignedInteger = 11,
    SignedFloat = 12,
    UnsignedFloat = 13,
}

impl VariableType {
    /// Decode the PVR v3 `channelType` field
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Self::UnsignedByteNorm,
            1 => Self::SignedByteNorm,
            2 => Self::UnsignedByte,
            3 => Self::SignedByte,
            4 => Self::UnsignedShortNorm,
            5 => Self::SignedShortNorm,
            6 => Self::UnsignedShort,
            7 => Self::SignedShort,
            8 => Self::UnsignedIntegerNorm,
            9 => Self::SignedIntegerNorm,
            10 => Self::UnsignedInteger,
            11 => Self::SignedInteger,
            12 => Self::SignedFloat,
            13 => Self::UnsignedFloat,
            other => {
                return Err(Error::CorruptData(format!("Unknown channel type {}", other)));
            }
        })
    }

    /// True for the normalized integer encodings
    pub fn is_normalized(self) -> bool {
        matches!(
            self,
            Self::UnsignedByteNorm
                | Self::SignedByteNorm
                | Self::UnsignedShortNorm
                | Self::SignedShortNorm
                | Self::UnsignedIntegerNorm
                | Self::SignedIntegerNorm
        )
    }

    /// True for signed encodings
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::SignedByteNorm
                | Self::SignedByte
                | Self::SignedShortNorm
                | Self::SignedShort
                | Self::SignedIntegerNorm
                | Self::SignedInteger
                | Self::SignedFloat
        )
    }
}

/// Colour space of the stored data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Linear = 0,
    Srgb = 1,
}

impl ColorSpace {
    /// Decode the PVR v3 `colourSpace` field
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Srgb),
            other => Err(Error::CorruptData(format!("Unknown colour space {}", other))),
        }
    }
}

// ===== TEXTURE FORMAT =====

/// Full format key: what a backend matches against its native format set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFormat {
    pub pixel_format: PixelFormat,
    pub channel_type: VariableType,
    pub color_space: ColorSpace,
}

impl TextureFormat {
    pub const fn new(pixel_format: PixelFormat, channel_type: VariableType, color_space: ColorSpace) -> Self {
        Self { pixel_format, channel_type, color_space }
    }

    /// RGBA8888 unsigned-normalized, the decompression target
    pub const fn rgba8888(color_space: ColorSpace) -> Self {
        Self::new(PixelFormat::RGBA8888, VariableType::UnsignedByteNorm, color_space)
    }

    /// Compressed format with the conventional UNorm channel type
    pub const fn compressed(format: CompressedPixelFormat, color_space: ColorSpace) -> Self {
        Self::new(PixelFormat::compressed(format), VariableType::UnsignedByteNorm, color_space)
    }

    /// Canonical key for capability sets and format tables.
    ///
    /// Most compressed formats carry no meaningful channel type and are pinned
    /// to UNorm. BC4, BC5, BC6 and EAC keep their signedness, folded to SNorm
    /// or UNorm (SFloat or UFloat for BC6).
    pub fn normalized(self) -> Self {
        if !self.pixel_format.is_compressed() {
            return self;
        }
        let format = self.pixel_format.compressed_format();
        let signed = format.is_some_and(|f| f.has_signed_variant()) && self.channel_type.is_signed();
        let channel_type = match (format, signed) {
            (Some(CompressedPixelFormat::BC6), true) => VariableType::SignedFloat,
            (Some(CompressedPixelFormat::BC6), false) => VariableType::UnsignedFloat,
            (_, true) => VariableType::SignedByteNorm,
            (_, false) => VariableType::UnsignedByteNorm,
        };
        Self { channel_type, ..self }
    }
}

#[cfg(test)]
#[path = "pixel_format_tests.rs"]
mod tests;
