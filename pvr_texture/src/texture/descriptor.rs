/// TextureDescriptor - canonical texture: header plus exclusively owned data

use crate::error::{Error, Result};
use crate::texture::header::TextureHeader;
use crate::texture::pixel_format::{PixelFormat, TextureFormat};

/// Address of one (mip, array layer, face) slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceIndex {
    pub mip: u32,
    pub layer: u32,
    pub face: u32,
}

/// Canonical, container-independent texture
///
/// The backing buffer always has exactly `header.total_data_size()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    header: TextureHeader,
    data: Vec<u8>,
}

impl TextureDescriptor {
    /// Wrap existing data; the length must match the header's layout
    pub fn new(header: TextureHeader, data: Vec<u8>) -> Result<Self> {
        header.validate()?;
        let expected = header.total_data_size();
        if data.len() != expected {
            return Err(Error::CorruptData(format!(
                "Texture data is {} bytes, header describes {}",
                data.len(),
                expected
            )));
        }
        Ok(Self { header, data })
    }

    /// Allocate a zero-filled texture for `header`
    pub fn zeroed(header: TextureHeader) -> Result<Self> {
        header.validate()?;
        let data = vec![0u8; header.total_data_size()];
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &TextureHeader {
        &self.header
    }

    /// Full backing buffer in canonical order
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (TextureHeader, Vec<u8>) {
        (self.header, self.data)
    }

    // ===== HEADER SHORTCUTS =====

    pub fn pixel_format(&self) -> PixelFormat {
        self.header.pixel_format
    }

    pub fn texture_format(&self) -> TextureFormat {
        self.header.texture_format()
    }

    pub fn num_mip_levels(&self) -> u32 {
        self.header.num_mip_levels
    }

    pub fn num_faces(&self) -> u32 {
        self.header.num_faces
    }

    pub fn num_array_members(&self) -> u32 {
        self.header.num_array_members
    }

    pub fn width(&self, mip: u32) -> u32 {
        self.header.width_at(mip)
    }

    pub fn height(&self, mip: u32) -> u32 {
        self.header.height_at(mip)
    }

    pub fn depth(&self, mip: u32) -> u32 {
        self.header.depth_at(mip)
    }

    // ===== DATA ACCESS =====

    /// Byte length of the (mip, face, layer) slice
    pub fn data_size(&self, mip: u32, face: u32, layer: u32) -> Result<usize> {
        self.header.data_size(mip, face, layer)
    }

    /// Byte offset of the (mip, face, layer) slice
    pub fn data_offset(&self, mip: u32, face: u32, layer: u32) -> Result<usize> {
        self.header.data_offset(mip, face, layer)
    }

    /// Total byte size of the data buffer
    pub fn total_data_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the (mip, face, layer) slice
    pub fn mip_data(&self, mip: u32, face: u32, layer: u32) -> Result<&[u8]> {
        let offset = self.header.data_offset(mip, face, layer)?;
        let size = self.header.level_size(mip);
        Ok(&self.data[offset..offset + size])
    }

    /// Mutable bytes of the (mip, face, layer) slice
    pub fn mip_data_mut(&mut self, mip: u32, face: u32, layer: u32) -> Result<&mut [u8]> {
        let offset = self.header.data_offset(mip, face, layer)?;
        let size = self.header.level_size(mip);
        Ok(&mut self.data[offset..offset + size])
    }

    /// Every slice in canonical (mip, layer, face) order
    pub fn subresources(&self) -> impl Iterator<Item = SubresourceIndex> + '_ {
        let header = &self.header;
        (0..header.num_mip_levels).flat_map(move |mip| {
            (0..header.num_array_members).flat_map(move |layer| {
                (0..header.num_faces).map(move |face| SubresourceIndex { mip, layer, face })
            })
        })
    }

    /// Split the buffer into disjoint mutable slices, one per sub-resource, in canonical order
    pub fn subresources_mut(&mut self) -> Vec<(SubresourceIndex, &mut [u8])> {
        let indices: Vec<SubresourceIndex> = self.subresources().collect();
        let mut rest: &mut [u8] = &mut self.data;
        let mut out = Vec::with_capacity(indices.len());
        for index in indices {
            let size = self.header.level_size(index.mip);
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(size);
            out.push((index, head));
            rest = tail;
        }
        out
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
