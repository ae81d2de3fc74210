/// TextureBackend trait, native texture info and sub-resource regions

use crate::capability::BackendCapabilities;
use crate::error::Result;
use crate::texture::{SubresourceIndex, TextureFormat, TextureHeader};

// ===== TEXTURE INFO =====

/// Layout of a native texture: what the backend allocates and what a handle describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Format the native resource stores
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Depth in texels (1 for 2D)
    pub depth: u32,
    pub mip_levels: u32,
    /// Number of array layers (1 = not an array)
    pub array_layers: u32,
    /// 6 for cube maps, otherwise 1
    pub faces: u32,
}

impl TextureInfo {
    /// Layout of `header` stored as `format`
    pub fn from_header(header: &TextureHeader, format: TextureFormat) -> Self {
        Self {
            format,
            width: header.width,
            height: header.height,
            depth: header.depth,
            mip_levels: header.num_mip_levels,
            array_layers: header.num_array_members,
            faces: header.num_faces,
        }
    }

    pub fn is_cube_map(&self) -> bool {
        self.faces == 6
    }

    pub fn is_array(&self) -> bool {
        self.array_layers > 1
    }

    pub fn is_volume(&self) -> bool {
        self.depth > 1
    }

    /// Texel extent of a mip level (each axis at least 1)
    pub fn extent(&self, mip: u32) -> (u32, u32, u32) {
        let at = |base: u32| base.checked_shr(mip).unwrap_or(0).max(1);
        (at(self.width), at(self.height), at(self.depth))
    }

    /// Bytes of one (mip, layer, face) slice in `format`
    pub fn subresource_size(&self, mip: u32) -> usize {
        self.to_header().level_size(mip)
    }

    /// Number of (mip, layer, face) slices
    pub fn subresource_count(&self) -> u32 {
        self.mip_levels * self.array_layers * self.faces
    }

    /// Region covering the slice at `index`
    pub fn region(&self, index: SubresourceIndex) -> SubresourceRegion {
        let (width, height, depth) = self.extent(index.mip);
        SubresourceRegion { index, width, height, depth }
    }

    /// True if `index` addresses a slice of this texture
    pub fn contains(&self, index: SubresourceIndex) -> bool {
        index.mip < self.mip_levels && index.layer < self.array_layers && index.face < self.faces
    }

    fn to_header(&self) -> TextureHeader {
        let mut header = TextureHeader::new(
            self.format.pixel_format,
            self.format.channel_type,
            self.format.color_space,
            self.width,
            self.height,
        );
        header.depth = self.depth;
        header.num_mip_levels = self.mip_levels;
        header.num_array_members = self.array_layers;
        header.num_faces = self.faces;
        header
    }
}

/// One (mip, layer, face) destination with its texel extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRegion {
    pub index: SubresourceIndex,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

// ===== TRAITS =====

/// Backend-owned texture resource
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
pub trait NativeTexture: Send {
    /// Get the layout of this texture
    fn info(&self) -> &TextureInfo;
}

/// A graphics context able to create and fill textures
///
/// Calls are context-bound; the upload driver takes `&mut self` so uploads into
/// one context are serialised by ownership.
pub trait TextureBackend {
    /// Native handle type
    type Texture: NativeTexture;

    /// Short backend name for logs ("mock", "vulkan", "gles")
    fn name(&self) -> &str;

    /// Native formats and limits of this context
    fn capabilities(&self) -> &BackendCapabilities;

    /// Create storage for the full mip chain, every layer and every face
    fn allocate(&mut self, info: &TextureInfo) -> Result<Self::Texture>;

    /// Copy one sub-resource into the texture
    fn write_subresource(&mut self, texture: &mut Self::Texture, region: &SubresourceRegion, data: &[u8]) -> Result<()>;

    /// Make the texture ready for sampling once every sub-resource is written
    fn finalize(&mut self, texture: &mut Self::Texture) -> Result<()>;

    /// Destroy a texture that will never reach the caller
    fn release(&mut self, texture: Self::Texture);
}
