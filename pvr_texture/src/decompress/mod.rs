/// Decompress module - PVRTC and ETC block decoders
///
/// Decoders are pure functions from compressed bytes to an RGBA8888 raster.
/// `decompress_texture` converts a whole descriptor, one (mip, layer, face)
/// unit per rayon task.

pub mod pvrtc;
pub mod etc;

use rayon::prelude::*;
use crate::error::Result;
use crate::texture::{
    CompressedPixelFormat, PixelFormat, SubresourceIndex, TextureDescriptor, TextureFormat, TextureHeader,
    VariableType,
};
use crate::{pvr_bail, pvr_debug};

const SOURCE: &str = "pvr::decompress";

/// True when a CPU decoder exists for `format`
pub fn is_decompressible(format: PixelFormat) -> bool {
    match format.compressed_format() {
        Some(compressed) => compressed.is_pvrtc1() || etc::is_supported(compressed),
        None => false,
    }
}

/// Format a decompressed texture ends up in: RGBA8888 UNorm in the source colour space
pub fn decompressed_format(format: TextureFormat) -> TextureFormat {
    TextureFormat::rgba8888(format.color_space)
}

/// Decode one 2D image of `format` into `width * height` RGBA8888 texels
pub fn decompress_image(format: CompressedPixelFormat, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    match format {
        CompressedPixelFormat::PVRTCI_2bpp_RGB | CompressedPixelFormat::PVRTCI_2bpp_RGBA => {
            pvrtc::decompress(data, width, height, true)
        }
        CompressedPixelFormat::PVRTCI_4bpp_RGB | CompressedPixelFormat::PVRTCI_4bpp_RGBA => {
            pvrtc::decompress(data, width, height, false)
        }
        other if other.is_etc() => etc::decompress(data, width, height, other),
        other => pvr_bail!(UnsupportedVariant, SOURCE, "No decompressor for {:?}", other),
    }
}

/// Decode every sub-resource of a compressed texture into a new RGBA8888 texture
///
/// Dimensions, mip/layer/face counts, colour space and metadata carry over. With
/// `parallel` the units are spread over the rayon pool; the result is identical
/// either way.
pub fn decompress_texture(texture: &TextureDescriptor, parallel: bool) -> Result<TextureDescriptor> {
    let source = texture.header();
    let format = match source.pixel_format.compressed_format() {
        Some(format) if is_decompressible(source.pixel_format) => format,
        _ => pvr_bail!(
            UnsupportedVariant,
            SOURCE,
            "Texture format {} cannot be decompressed",
            source.pixel_format
        ),
    };

    let header = TextureHeader {
        pixel_format: PixelFormat::RGBA8888,
        channel_type: VariableType::UnsignedByteNorm,
        ..source.clone()
    };
    let mut output = TextureDescriptor::zeroed(header)?;
    let units = output.subresources_mut();

    let decode = |(index, target): (SubresourceIndex, &mut [u8])| {
        decompress_unit(texture, format, index, target)
    };
    if parallel {
        units.into_par_iter().try_for_each(decode)?;
    } else {
        units.into_iter().try_for_each(decode)?;
    }

    pvr_debug!(
        SOURCE,
        "Decompressed {:?} {}x{} ({} mips, {} layers, {} faces)",
        format, source.width, source.height,
        source.num_mip_levels, source.num_array_members, source.num_faces
    );
    Ok(output)
}

/// Decode one sub-resource; volume levels are decoded slice by slice
fn decompress_unit(
    texture: &TextureDescriptor,
    format: CompressedPixelFormat,
    index: SubresourceIndex,
    target: &mut [u8],
) -> Result<()> {
    let input = texture.mip_data(index.mip, index.face, index.layer)?;
    let (width, height, depth) = (texture.width(index.mip), texture.height(index.mip), texture.depth(index.mip));
    let input_slice = input.len() / depth as usize;
    let output_slice = target.len() / depth as usize;
    for (source, destination) in input.chunks_exact(input_slice).zip(target.chunks_exact_mut(output_slice)) {
        let pixels = decompress_image(format, source, width, height)?;
        destination.copy_from_slice(&pixels);
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
