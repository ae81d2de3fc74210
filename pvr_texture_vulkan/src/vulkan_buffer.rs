/// StagingBuffer - host-visible buffer holding one sub-resource until upload

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use pvr_texture::pvr::Result;
use pvr_texture::pvr_err;
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;

const SOURCE: &str = "pvr::vulkan";

/// Transfer-source buffer filled from the CPU
pub(crate) struct StagingBuffer {
    ctx: Arc<VulkanContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    pub(crate) size: u64,
}

impl StagingBuffer {
    /// Create a CpuToGpu buffer holding a copy of `data`
    pub(crate) fn with_data(ctx: &Arc<VulkanContext>, data: &[u8]) -> Result<Self> {
        unsafe {
            let size = data.len() as u64;
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to create staging buffer: {:?}", e))?;

            // From here on the buffer is released by Drop on any error
            let mut staging = Self { ctx: Arc::clone(ctx), buffer, allocation: None, size };

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx
                .allocator()
                .allocate(&AllocationCreateDesc {
                    name: "texture_staging_buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    pvr_err!(UploadFailure, SOURCE, "Out of memory for staging buffer ({:.2} MB): {}", size_mb, e)
                })?;

            let (memory, offset, mapped_ptr) = (allocation.memory(), allocation.offset(), allocation.mapped_ptr());
            staging.allocation = Some(allocation);

            ctx.device
                .bind_buffer_memory(buffer, memory, offset)
                .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to bind staging buffer memory: {:?}", e))?;

            let mapped_ptr = mapped_ptr
                .ok_or_else(|| pvr_err!(UploadFailure, SOURCE, "Staging buffer is not host-mapped"))?
                .as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr, data.len());

            Ok(staging)
        }
    }
}

impl Drop for StagingBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                self.ctx.allocator().free(allocation).ok();
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
