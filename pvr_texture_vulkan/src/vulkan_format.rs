/// Format mapping between pvr `TextureFormat` keys and `vk::Format`

use ash::vk;
use pvr_texture::pvr::texture::{
    ColorSpace, CompressedPixelFormat, PixelFormat, TextureFormat, VariableType,
};
use ColorSpace::{Linear, Srgb};
use CompressedPixelFormat as C;

/// Feature group a Vulkan format belongs to
///
/// Block-compressed families are only usable when the device enables the
/// matching feature or extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    Uncompressed,
    Etc2,
    Bc,
    Pvrtc,
}

const fn unorm(pixel_format: PixelFormat, color_space: ColorSpace) -> TextureFormat {
    TextureFormat::new(pixel_format, VariableType::UnsignedByteNorm, color_space)
}

const fn block(format: CompressedPixelFormat, color_space: ColorSpace) -> TextureFormat {
    TextureFormat::compressed(format, color_space)
}

/// Compressed key with an explicit channel type, for the signed and float block formats
const fn typed_block(format: CompressedPixelFormat, channel_type: VariableType) -> TextureFormat {
    TextureFormat::new(PixelFormat::compressed(format), channel_type, Linear)
}

/// Every format key the Vulkan backend can store, first match wins on reverse lookup
///
/// Keys are already in `TextureFormat::normalized` form.
pub const FORMAT_TABLE: &[(TextureFormat, vk::Format)] = &[
    // 8-bit per channel
    (unorm(PixelFormat::RGBA8888, Linear), vk::Format::R8G8B8A8_UNORM),
    (unorm(PixelFormat::RGBA8888, Srgb), vk::Format::R8G8B8A8_SRGB),
    (TextureFormat::new(PixelFormat::RGBA8888, VariableType::UnsignedByte, Linear), vk::Format::R8G8B8A8_UINT),
    (unorm(PixelFormat::BGRA8888, Linear), vk::Format::B8G8R8A8_UNORM),
    (unorm(PixelFormat::BGRA8888, Srgb), vk::Format::B8G8R8A8_SRGB),
    (unorm(PixelFormat::RGB888, Linear), vk::Format::R8G8B8_UNORM),
    (unorm(PixelFormat::RGB888, Srgb), vk::Format::R8G8B8_SRGB),
    (unorm(PixelFormat::BGR888, Linear), vk::Format::B8G8R8_UNORM),
    (unorm(PixelFormat::BGR888, Srgb), vk::Format::B8G8R8_SRGB),
    (unorm(PixelFormat::RG88, Linear), vk::Format::R8G8_UNORM),
    (unorm(PixelFormat::R8, Linear), vk::Format::R8_UNORM),
    // Packed 16-bit
    (unorm(PixelFormat::RGB565, Linear), vk::Format::R5G6B5_UNORM_PACK16),
    (unorm(PixelFormat::RGBA4444, Linear), vk::Format::R4G4B4A4_UNORM_PACK16),
    (unorm(PixelFormat::RGBA5551, Linear), vk::Format::R5G5B5A1_UNORM_PACK16),
    (unorm(PixelFormat::ARGB1555, Linear), vk::Format::A1R5G5B5_UNORM_PACK16),
    // Wide formats
    (TextureFormat::new(PixelFormat::RGBA16161616, VariableType::UnsignedShortNorm, Linear), vk::Format::R16G16B16A16_UNORM),
    (TextureFormat::new(PixelFormat::RGBA16161616, VariableType::SignedFloat, Linear), vk::Format::R16G16B16A16_SFLOAT),
    (TextureFormat::new(PixelFormat::RGBA32323232, VariableType::SignedFloat, Linear), vk::Format::R32G32B32A32_SFLOAT),
    (block(C::SharedExponentR9G9B9E5, Linear), vk::Format::E5B9G9R9_UFLOAT_PACK32),
    // PVRTC (VK_IMG_format_pvrtc)
    (block(C::PVRTCI_2bpp_RGB, Linear), vk::Format::PVRTC1_2BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCI_2bpp_RGB, Srgb), vk::Format::PVRTC1_2BPP_SRGB_BLOCK_IMG),
    (block(C::PVRTCI_2bpp_RGBA, Linear), vk::Format::PVRTC1_2BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCI_2bpp_RGBA, Srgb), vk::Format::PVRTC1_2BPP_SRGB_BLOCK_IMG),
    (block(C::PVRTCI_4bpp_RGB, Linear), vk::Format::PVRTC1_4BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCI_4bpp_RGB, Srgb), vk::Format::PVRTC1_4BPP_SRGB_BLOCK_IMG),
    (block(C::PVRTCI_4bpp_RGBA, Linear), vk::Format::PVRTC1_4BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCI_4bpp_RGBA, Srgb), vk::Format::PVRTC1_4BPP_SRGB_BLOCK_IMG),
    (block(C::PVRTCII_2bpp, Linear), vk::Format::PVRTC2_2BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCII_2bpp, Srgb), vk::Format::PVRTC2_2BPP_SRGB_BLOCK_IMG),
    (block(C::PVRTCII_4bpp, Linear), vk::Format::PVRTC2_4BPP_UNORM_BLOCK_IMG),
    (block(C::PVRTCII_4bpp, Srgb), vk::Format::PVRTC2_4BPP_SRGB_BLOCK_IMG),
    // ETC / EAC (ETC1 data is valid ETC2 RGB data)
    (block(C::ETC2_RGB, Linear), vk::Format::ETC2_R8G8B8_UNORM_BLOCK),
    (block(C::ETC2_RGB, Srgb), vk::Format::ETC2_R8G8B8_SRGB_BLOCK),
    (block(C::ETC1, Linear), vk::Format::ETC2_R8G8B8_UNORM_BLOCK),
    (block(C::ETC1, Srgb), vk::Format::ETC2_R8G8B8_SRGB_BLOCK),
    (block(C::ETC2_RGBA, Linear), vk::Format::ETC2_R8G8B8A8_UNORM_BLOCK),
    (block(C::ETC2_RGBA, Srgb), vk::Format::ETC2_R8G8B8A8_SRGB_BLOCK),
    (block(C::ETC2_RGB_A1, Linear), vk::Format::ETC2_R8G8B8A1_UNORM_BLOCK),
    (block(C::ETC2_RGB_A1, Srgb), vk::Format::ETC2_R8G8B8A1_SRGB_BLOCK),
    (block(C::EAC_R11, Linear), vk::Format::EAC_R11_UNORM_BLOCK),
    (typed_block(C::EAC_R11, VariableType::SignedByteNorm), vk::Format::EAC_R11_SNORM_BLOCK),
    (block(C::EAC_RG11, Linear), vk::Format::EAC_R11G11_UNORM_BLOCK),
    (typed_block(C::EAC_RG11, VariableType::SignedByteNorm), vk::Format::EAC_R11G11_SNORM_BLOCK),
    // S3TC / BC
    (block(C::DXT1, Linear), vk::Format::BC1_RGBA_UNORM_BLOCK),
    (block(C::DXT1, Srgb), vk::Format::BC1_RGBA_SRGB_BLOCK),
    (block(C::DXT3, Linear), vk::Format::BC2_UNORM_BLOCK),
    (block(C::DXT3, Srgb), vk::Format::BC2_SRGB_BLOCK),
    (block(C::DXT5, Linear), vk::Format::BC3_UNORM_BLOCK),
    (block(C::DXT5, Srgb), vk::Format::BC3_SRGB_BLOCK),
    (block(C::BC4, Linear), vk::Format::BC4_UNORM_BLOCK),
    (typed_block(C::BC4, VariableType::SignedByteNorm), vk::Format::BC4_SNORM_BLOCK),
    (block(C::BC5, Linear), vk::Format::BC5_UNORM_BLOCK),
    (typed_block(C::BC5, VariableType::SignedByteNorm), vk::Format::BC5_SNORM_BLOCK),
    (typed_block(C::BC6, VariableType::UnsignedFloat), vk::Format::BC6H_UFLOAT_BLOCK),
    (typed_block(C::BC6, VariableType::SignedFloat), vk::Format::BC6H_SFLOAT_BLOCK),
    (block(C::BC7, Linear), vk::Format::BC7_UNORM_BLOCK),
    (block(C::BC7, Srgb), vk::Format::BC7_SRGB_BLOCK),
];

/// Vulkan format storing `format`, if any
pub fn to_vk_format(format: TextureFormat) -> Option<vk::Format> {
    let key = format.normalized();
    FORMAT_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|&(_, vk_format)| vk_format)
}

/// Format key for a Vulkan format (the first table entry wins)
pub fn from_vk_format(vk_format: vk::Format) -> Option<TextureFormat> {
    FORMAT_TABLE
        .iter()
        .find(|(_, candidate)| *candidate == vk_format)
        .map(|&(format, _)| format)
}

/// Feature group of a format key
pub fn format_family(format: TextureFormat) -> FormatFamily {
    match format.pixel_format.compressed_format() {
        None => FormatFamily::Uncompressed,
        Some(C::PVRTCI_2bpp_RGB | C::PVRTCI_2bpp_RGBA | C::PVRTCI_4bpp_RGB | C::PVRTCI_4bpp_RGBA)
        | Some(C::PVRTCII_2bpp | C::PVRTCII_4bpp) => FormatFamily::Pvrtc,
        Some(C::ETC1 | C::ETC2_RGB | C::ETC2_RGBA | C::ETC2_RGB_A1 | C::EAC_R11 | C::EAC_RG11) => FormatFamily::Etc2,
        Some(C::DXT1 | C::DXT2 | C::DXT3 | C::DXT4 | C::DXT5 | C::BC4 | C::BC5 | C::BC6 | C::BC7) => FormatFamily::Bc,
        Some(_) => FormatFamily::Uncompressed,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
