/// VulkanBackend - TextureBackend implementation on a headless Vulkan context
///
/// `allocate` creates an optimal-tiling image with its full mip chain, layers
/// and faces. `write_subresource` copies each slice into its own staging
/// buffer. `finalize` records every copy plus the layout transitions in one
/// command buffer, submits it and waits, leaving the image in
/// SHADER_READ_ONLY_OPTIMAL.

use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use pvr_texture::pvr::capability::{BackendCapabilities, CapabilityCache};
use pvr_texture::pvr::upload::{SubresourceRegion, TextureBackend, TextureInfo};
use pvr_texture::pvr::Result;
use pvr_texture::{pvr_bail, pvr_debug, pvr_err, pvr_info, pvr_trace};
use std::sync::Arc;

use crate::vulkan_buffer::StagingBuffer;
use crate::vulkan_context::{VulkanConfig, VulkanContext};
use crate::vulkan_format::{format_family, to_vk_format, FORMAT_TABLE};
use crate::vulkan_texture::{PendingCopy, VulkanTexture};

const SOURCE: &str = "pvr::vulkan";

/// Texture upload backend for Vulkan
pub struct VulkanBackend {
    context: Arc<VulkanContext>,
    capabilities: CapabilityCache,
}

impl VulkanBackend {
    /// Create a context and a backend on it
    pub fn new(config: &VulkanConfig) -> Result<Self> {
        let context = Arc::new(VulkanContext::new(config)?);
        Ok(Self::with_context(context))
    }

    /// Backend on an existing context
    pub fn with_context(context: Arc<VulkanContext>) -> Self {
        Self { context, capabilities: CapabilityCache::new() }
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.context
    }

    fn image_layout(info: &TextureInfo) -> (vk::ImageType, vk::ImageViewType, vk::ImageCreateFlags) {
        if info.is_volume() {
            return (vk::ImageType::TYPE_3D, vk::ImageViewType::TYPE_3D, vk::ImageCreateFlags::empty());
        }
        if info.is_cube_map() {
            let view_type = if info.is_array() {
                vk::ImageViewType::CUBE_ARRAY
            } else {
                vk::ImageViewType::CUBE
            };
            return (vk::ImageType::TYPE_2D, view_type, vk::ImageCreateFlags::CUBE_COMPATIBLE);
        }
        let view_type = if info.is_array() {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };
        (vk::ImageType::TYPE_2D, view_type, vk::ImageCreateFlags::empty())
    }

    fn full_range(texture: &VulkanTexture) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: texture.info.mip_levels,
            base_array_layer: 0,
            layer_count: texture.vk_layer_count(),
        }
    }

    /// Record barriers and copies for every pending write
    unsafe fn record_upload(&self, command_buffer: vk::CommandBuffer, texture: &VulkanTexture) -> Result<()> {
        let device = &self.context.device;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to begin upload command buffer: {:?}", e))?;

        // Transition all mips and layers: UNDEFINED -> TRANSFER_DST_OPTIMAL
        let barrier_to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(texture.image)
            .subresource_range(Self::full_range(texture))
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_transfer],
        );

        for pending in &texture.pending {
            let region = &pending.region;
            let copy = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: region.index.mip,
                    base_array_layer: texture.vk_layer(region.index.layer, region.index.face),
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: region.width,
                    height: region.height,
                    depth: region.depth,
                });

            device.cmd_copy_buffer_to_image(
                command_buffer,
                pending.staging.buffer,
                texture.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[copy],
            );
        }

        // TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL
        let barrier_to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(texture.image)
            .subresource_range(Self::full_range(texture))
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);

        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_shader],
        );

        device
            .end_command_buffer(command_buffer)
            .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to end upload command buffer: {:?}", e))
    }

    /// Submit a recorded command buffer and block until it completes
    unsafe fn submit_and_wait(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        let device = &self.context.device;
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        device
            .queue_submit(self.context.queue, &[submit_info], self.context.upload_fence)
            .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to submit texture upload: {:?}", e))?;

        let waited = device.wait_for_fences(&[self.context.upload_fence], true, u64::MAX);
        device.reset_fences(&[self.context.upload_fence]).ok();
        waited.map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to wait for texture upload: {:?}", e))
    }
}

/// Query format support and limits from the physical device
fn query_capabilities(context: &VulkanContext) -> BackendCapabilities {
    let features = context.features();
    let mut capabilities = BackendCapabilities::new();
    let required = vk::FormatFeatureFlags::SAMPLED_IMAGE | vk::FormatFeatureFlags::TRANSFER_DST;

    for &(format, vk_format) in FORMAT_TABLE {
        if !features.allows(format_family(format)) {
            continue;
        }
        let properties = unsafe {
            context
                .instance
                .get_physical_device_format_properties(context.physical_device, vk_format)
        };
        if properties.optimal_tiling_features.contains(required) {
            capabilities.insert(format);
        }
    }

    let limits = unsafe {
        context
            .instance
            .get_physical_device_properties(context.physical_device)
            .limits
    };
    capabilities.max_dimension = limits.max_image_dimension2_d.min(limits.max_image_dimension_cube);
    capabilities.max_volume_dimension = limits.max_image_dimension3_d;
    capabilities.max_array_layers = limits.max_image_array_layers;
    capabilities.cube_map_arrays = features.cube_map_arrays;

    pvr_info!(
        SOURCE,
        "Queried {} native formats on '{}' (max {}px, {} layers)",
        capabilities.format_count(), context.device_name(), capabilities.max_dimension, capabilities.max_array_layers
    );
    capabilities
}

impl TextureBackend for VulkanBackend {
    type Texture = VulkanTexture;

    fn name(&self) -> &str {
        "vulkan"
    }

    fn capabilities(&self) -> &BackendCapabilities {
        self.capabilities.get_or_query(|| query_capabilities(&self.context))
    }

    fn allocate(&mut self, info: &TextureInfo) -> Result<VulkanTexture> {
        let format = match to_vk_format(info.format) {
            Some(format) => format,
            None => pvr_bail!(AllocationFailure, SOURCE, "No Vulkan format for {}", info.format.pixel_format),
        };
        if !self.capabilities().supports(info.format) {
            pvr_bail!(AllocationFailure, SOURCE, "{:?} is not sampleable on this device", format);
        }

        let layer_count = info.array_layers * info.faces;
        if info.is_volume() && layer_count > 1 {
            pvr_bail!(AllocationFailure, SOURCE, "3D images cannot have {} layers", layer_count);
        }
        if info.is_cube_map() && info.width != info.height {
            pvr_bail!(AllocationFailure, SOURCE, "Cube map faces must be square ({}x{})", info.width, info.height);
        }
        let (image_type, view_type, flags) = Self::image_layout(info);
        let device = &self.context.device;

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .flags(flags)
                .image_type(image_type)
                .format(format)
                .extent(vk::Extent3D {
                    width: info.width,
                    height: info.height,
                    depth: info.depth,
                })
                .mip_levels(info.mip_levels)
                .array_layers(layer_count)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device
                .create_image(&image_create_info, None)
                .map_err(|e| pvr_err!(AllocationFailure, SOURCE, "Failed to create texture image: {:?}", e))?;

            // From here on Drop destroys whatever has been created
            let mut texture = VulkanTexture {
                context: Arc::clone(&self.context),
                image,
                view: vk::ImageView::null(),
                format,
                allocation: None,
                pending: Vec::new(),
                ready: false,
                info: info.clone(),
            };

            let requirements = device.get_image_memory_requirements(image);
            let allocation = self
                .context
                .allocator()
                .allocate(&AllocationCreateDesc {
                    name: "texture",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    pvr_err!(
                        AllocationFailure,
                        SOURCE,
                        "Out of GPU memory for texture ({}x{}x{}, {} layers, {:.2} MB): {}",
                        info.width, info.height, info.depth, layer_count, size_mb, e
                    )
                })?;
            let (memory, offset) = (allocation.memory(), allocation.offset());
            texture.allocation = Some(allocation);

            device
                .bind_image_memory(image, memory, offset)
                .map_err(|e| pvr_err!(AllocationFailure, SOURCE, "Failed to bind texture image memory: {:?}", e))?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(Self::full_range(&texture));

            texture.view = device
                .create_image_view(&view_create_info, None)
                .map_err(|e| pvr_err!(AllocationFailure, SOURCE, "Failed to create texture image view: {:?}", e))?;

            pvr_debug!(
                SOURCE,
                "Allocated {:?} image {}x{}x{} ({} mips, {} layers, {:?})",
                format, info.width, info.height, info.depth, info.mip_levels, layer_count, view_type
            );
            Ok(texture)
        }
    }

    fn write_subresource(&mut self, texture: &mut VulkanTexture, region: &SubresourceRegion, data: &[u8]) -> Result<()> {
        if texture.ready {
            pvr_bail!(UploadFailure, SOURCE, "Texture is already finalized");
        }
        if !texture.info.contains(region.index) {
            pvr_bail!(UploadFailure, SOURCE, "Sub-resource {:?} is outside the texture", region.index);
        }
        let expected = texture.info.subresource_size(region.index.mip);
        if data.len() != expected {
            pvr_bail!(
                UploadFailure,
                SOURCE,
                "Sub-resource {:?} got {} bytes, expected {}",
                region.index, data.len(), expected
            );
        }

        let staging = StagingBuffer::with_data(&self.context, data)?;
        pvr_trace!(SOURCE, "Staged {:?} ({} bytes)", region.index, staging.size);
        texture.pending.push(PendingCopy { staging, region: *region });
        Ok(())
    }

    fn finalize(&mut self, texture: &mut VulkanTexture) -> Result<()> {
        if texture.ready {
            return Ok(());
        }
        let device = &self.context.device;
        let pool = self.context.command_pool();

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| pvr_err!(UploadFailure, SOURCE, "Failed to allocate upload command buffer: {:?}", e))?;
            let command_buffer = match command_buffers.first() {
                Some(&command_buffer) => command_buffer,
                None => pvr_bail!(UploadFailure, SOURCE, "Driver returned no command buffer"),
            };

            let result = self
                .record_upload(command_buffer, texture)
                .and_then(|()| self.submit_and_wait(command_buffer));
            device.free_command_buffers(*pool, &command_buffers);
            result?;
        }

        let copies = texture.pending.len();
        texture.pending.clear();
        texture.ready = true;
        pvr_debug!(SOURCE, "Submitted {} sub-resource copies", copies);
        Ok(())
    }

    fn release(&mut self, texture: VulkanTexture) {
        pvr_trace!(SOURCE, "Releasing {:?} image", texture.format);
        drop(texture);
    }
}
