/// VulkanTexture - image, view and memory of an uploaded texture

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use pvr_texture::pvr::upload::{NativeTexture, SubresourceRegion, TextureInfo};
use std::sync::Arc;

use crate::vulkan_buffer::StagingBuffer;
use crate::vulkan_context::VulkanContext;

/// A staged sub-resource waiting for `finalize` to record its copy
pub(crate) struct PendingCopy {
    pub(crate) staging: StagingBuffer,
    pub(crate) region: SubresourceRegion,
}

/// Vulkan texture implementation
///
/// Owns its image, view and memory; everything is destroyed on drop. Keeps
/// the context alive so the device outlives the image.
pub struct VulkanTexture {
    /// Shared context (device, allocator)
    pub(crate) context: Arc<VulkanContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
    pub(crate) allocation: Option<Allocation>,
    /// Writes staged since allocation, consumed by `finalize`
    pub(crate) pending: Vec<PendingCopy>,
    /// True once the image is in SHADER_READ_ONLY_OPTIMAL
    pub(crate) ready: bool,
    pub(crate) info: TextureInfo,
}

impl VulkanTexture {
    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn vk_format(&self) -> vk::Format {
        self.format
    }

    /// True once every write has been submitted and the image is sampleable
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Sub-resources written but not yet submitted
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Array layer index Vulkan uses for (layer, face)
    pub(crate) fn vk_layer(&self, layer: u32, face: u32) -> u32 {
        layer * self.info.faces + face
    }

    pub(crate) fn vk_layer_count(&self) -> u32 {
        self.info.array_layers * self.info.faces
    }
}

impl NativeTexture for VulkanTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        self.pending.clear();
        unsafe {
            // Null handles are ignored by vkDestroy*
            self.context.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.take() {
                self.context.allocator().free(allocation).ok();
            }

            self.context.device.destroy_image(self.image, None);
        }
    }
}
