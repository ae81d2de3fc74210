/// Texture header: format, dimensions, layout counts and metadata
///
/// All size arithmetic for the canonical layout lives here. Data is ordered
/// mip level → array member → face, with depth slices contiguous inside a face.

use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::texture::pixel_format::{ColorSpace, PixelFormat, TextureFormat, VariableType};

/// Upper bound on mip levels accepted from a file
pub const MAX_MIP_LEVELS: u32 = 32;

/// Upper bound on array members accepted from a file
pub const MAX_ARRAY_MEMBERS: u32 = 2048;

/// Upper bound on any dimension accepted from a file
pub const MAX_DIMENSION: u32 = 1 << 16;

/// PVR v3 identifier, also used as the metadata FourCC for PVR-defined keys
pub const PVR_V3_IDENTIFIER: u32 = 0x0352_5650;

/// PVR metadata key holding the 3-byte axis orientation
pub const METADATA_KEY_ORIENTATION: u32 = 3;

bitflags! {
    /// PVR v3 header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeaderFlags: u32 {
        const COMPRESSED = 0x1;
        const PREMULTIPLIED = 0x2;
    }
}

// ===== METADATA =====

/// One metadata block (PVR v3 layout: fourcc, key, size, data)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDataBlock {
    pub fourcc: u32,
    pub key: u32,
    pub data: Vec<u8>,
}

impl MetaDataBlock {
    /// Bytes occupied in a PVR v3 file
    pub fn serialized_size(&self) -> usize {
        12 + self.data.len()
    }
}

/// Horizontal axis direction of increasing x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisX {
    #[default]
    Right,
    Left,
}

/// Vertical axis direction of increasing y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisY {
    #[default]
    Down,
    Up,
}

/// Depth axis direction of increasing z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisZ {
    #[default]
    In,
    Out,
}

/// Orientation of the stored data (default: top-left origin, rows going down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub x: AxisX,
    pub y: AxisY,
    pub z: AxisZ,
}

impl Orientation {
    fn to_bytes(self) -> [u8; 3] {
        [
            matches!(self.x, AxisX::Left) as u8,
            matches!(self.y, AxisY::Up) as u8,
            matches!(self.z, AxisZ::Out) as u8,
        ]
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 3 {
            return None;
        }
        Some(Self {
            x: if bytes[0] != 0 { AxisX::Left } else { AxisX::Right },
            y: if bytes[1] != 0 { AxisY::Up } else { AxisY::Down },
            z: if bytes[2] != 0 { AxisZ::Out } else { AxisZ::In },
        })
    }
}

// ===== TEXTURE HEADER =====

/// Format-agnostic texture header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureHeader {
    /// Header flags (premultiplied, ...)
    pub flags: HeaderFlags,
    /// Pixel format token
    pub pixel_format: PixelFormat,
    /// Colour space
    pub color_space: ColorSpace,
    /// Channel numeric type
    pub channel_type: VariableType,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels (1 for 2D)
    pub depth: u32,
    /// Number of array members (1 = not an array)
    pub num_array_members: u32,
    /// Number of faces (6 = cube map)
    pub num_faces: u32,
    /// Number of mip levels, including the base level
    pub num_mip_levels: u32,
    /// Raw metadata blocks in file order
    pub metadata: Vec<MetaDataBlock>,
}

impl TextureHeader {
    /// Single-level 2D header
    pub fn new(pixel_format: PixelFormat, channel_type: VariableType, color_space: ColorSpace, width: u32, height: u32) -> Self {
        Self {
            flags: HeaderFlags::empty(),
            pixel_format,
            color_space,
            channel_type,
            width,
            height,
            depth: 1,
            num_array_members: 1,
            num_faces: 1,
            num_mip_levels: 1,
            metadata: Vec::new(),
        }
    }

    /// Check every layout invariant, including that the total size fits in memory
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Error::CorruptData(format!(
                "Texture dimensions must be non-zero ({}x{}x{})",
                self.width, self.height, self.depth
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION || self.depth > MAX_DIMENSION {
            return Err(Error::CorruptData(format!(
                "Texture dimensions {}x{}x{} exceed {}",
                self.width, self.height, self.depth, MAX_DIMENSION
            )));
        }
        if self.num_mip_levels == 0 || self.num_mip_levels > MAX_MIP_LEVELS {
            return Err(Error::CorruptData(format!(
                "Mip level count {} outside 1..={}",
                self.num_mip_levels, MAX_MIP_LEVELS
            )));
        }
        if self.num_array_members == 0 || self.num_array_members > MAX_ARRAY_MEMBERS {
            return Err(Error::CorruptData(format!(
                "Array member count {} outside 1..={}",
                self.num_array_members, MAX_ARRAY_MEMBERS
            )));
        }
        if self.num_faces != 1 && self.num_faces != 6 {
            return Err(Error::CorruptData(format!(
                "Face count must be 1 or 6, got {}",
                self.num_faces
            )));
        }
        self.checked_total_size()
            .ok_or_else(|| Error::CorruptData("Texture data size overflows".to_string()))?;
        Ok(())
    }

    /// Format key used for capability matching
    pub fn texture_format(&self) -> TextureFormat {
        TextureFormat::new(self.pixel_format, self.channel_type, self.color_space)
    }

    pub fn is_premultiplied(&self) -> bool {
        self.flags.contains(HeaderFlags::PREMULTIPLIED)
    }

    pub fn set_premultiplied(&mut self, premultiplied: bool) {
        self.flags.set(HeaderFlags::PREMULTIPLIED, premultiplied);
    }

    pub fn is_cube_map(&self) -> bool {
        self.num_faces == 6
    }

    // ===== DIMENSIONS =====

    /// Width of a mip level (0 if the level does not exist)
    pub fn width_at(&self, mip: u32) -> u32 {
        mip_dimension(self.width, mip, self.num_mip_levels)
    }

    /// Height of a mip level (0 if the level does not exist)
    pub fn height_at(&self, mip: u32) -> u32 {
        mip_dimension(self.height, mip, self.num_mip_levels)
    }

    /// Depth of a mip level (0 if the level does not exist)
    pub fn depth_at(&self, mip: u32) -> u32 {
        mip_dimension(self.depth, mip, self.num_mip_levels)
    }

    // ===== SIZES =====

    /// Bytes of one face of one array member at `mip`, padded to whole blocks
    pub fn level_size(&self, mip: u32) -> usize {
        self.checked_level_size(mip).unwrap_or(0) as usize
    }

    /// Bytes of all mips, array members and faces
    pub fn total_data_size(&self) -> usize {
        self.checked_total_size().unwrap_or(0) as usize
    }

    /// Byte length of the (mip, face, layer) slice
    pub fn data_size(&self, mip: u32, face: u32, layer: u32) -> Result<usize> {
        self.check_indices(mip, face, layer)?;
        Ok(self.level_size(mip))
    }

    /// Byte offset of the (mip, face, layer) slice within the data buffer
    pub fn data_offset(&self, mip: u32, face: u32, layer: u32) -> Result<usize> {
        self.check_indices(mip, face, layer)?;
        let per_level = self.surfaces_per_level();
        let preceding: usize = (0..mip).map(|m| self.level_size(m) * per_level).sum();
        let level = self.level_size(mip);
        Ok(preceding + (layer as usize * self.num_faces as usize + face as usize) * level)
    }

    /// Validate a sub-resource index
    pub fn check_indices(&self, mip: u32, face: u32, layer: u32) -> Result<()> {
        if mip >= self.num_mip_levels {
            return Err(Error::IndexOutOfRange(format!(
                "Mip level {} out of range (texture has {})",
                mip, self.num_mip_levels
            )));
        }
        if face >= self.num_faces {
            return Err(Error::IndexOutOfRange(format!(
                "Face {} out of range (texture has {})",
                face, self.num_faces
            )));
        }
        if layer >= self.num_array_members {
            return Err(Error::IndexOutOfRange(format!(
                "Array layer {} out of range (texture has {})",
                layer, self.num_array_members
            )));
        }
        Ok(())
    }

    fn surfaces_per_level(&self) -> usize {
        self.num_array_members as usize * self.num_faces as usize
    }

    fn checked_level_size(&self, mip: u32) -> Option<u64> {
        if mip >= self.num_mip_levels {
            return None;
        }
        let (bw, bh, bd) = self.pixel_format.block_dimensions();
        let w = round_up(self.width_at(mip) as u64, bw as u64);
        let h = round_up(self.height_at(mip) as u64, bh as u64);
        let d = round_up(self.depth_at(mip) as u64, bd as u64);
        let bits = (self.pixel_format.bits_per_pixel() as u64)
            .checked_mul(w)?
            .checked_mul(h)?
            .checked_mul(d)?;
        Some(bits / 8)
    }

    fn checked_total_size(&self) -> Option<u64> {
        let per_level = (self.num_array_members as u64).checked_mul(self.num_faces as u64)?;
        let mut total: u64 = 0;
        for mip in 0..self.num_mip_levels {
            total = total.checked_add(self.checked_level_size(mip)?.checked_mul(per_level)?)?;
        }
        usize::try_from(total).ok()?;
        Some(total)
    }

    // ===== METADATA =====

    /// Find a metadata block by FourCC and key
    pub fn metadata_block(&self, fourcc: u32, key: u32) -> Option<&MetaDataBlock> {
        self.metadata.iter().find(|b| b.fourcc == fourcc && b.key == key)
    }

    /// Insert or replace a metadata block
    pub fn set_metadata_block(&mut self, block: MetaDataBlock) {
        match self.metadata.iter_mut().find(|b| b.fourcc == block.fourcc && b.key == block.key) {
            Some(existing) => *existing = block,
            None => self.metadata.push(block),
        }
    }

    /// Total serialized size of all metadata blocks
    pub fn metadata_size(&self) -> usize {
        self.metadata.iter().map(|b| b.serialized_size()).sum()
    }

    /// Data orientation (default when no orientation block is present)
    pub fn orientation(&self) -> Orientation {
        self.metadata_block(PVR_V3_IDENTIFIER, METADATA_KEY_ORIENTATION)
            .and_then(|b| Orientation::from_bytes(&b.data))
            .unwrap_or_default()
    }

    /// Record the data orientation as a PVR metadata block
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.set_metadata_block(MetaDataBlock {
            fourcc: PVR_V3_IDENTIFIER,
            key: METADATA_KEY_ORIENTATION,
            data: orientation.to_bytes().to_vec(),
        });
    }
}

fn mip_dimension(base: u32, mip: u32, levels: u32) -> u32 {
    if mip >= levels {
        return 0;
    }
    base.checked_shr(mip).unwrap_or(0).max(1)
}

fn round_up(value: u64, multiple: u64) -> u64 {
    value.div_ceil(multiple) * multiple
}

#[cfg(test)]
#[path = "header_tests.rs"]
mod tests;
