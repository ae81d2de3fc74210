/*!
# PVR Texture - Vulkan Backend

Vulkan implementation of the `TextureBackend` trait from `pvr_texture`.

This crate creates a headless Vulkan context using the Ash library for Vulkan
bindings and gpu-allocator for memory management, queries the device's native
texture formats once, and uploads canonical texture descriptors through
staging buffers.

With the `vulkan-validation` feature, validation layer messages are routed to
the pvr logger.
*/

mod vulkan_backend;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_format;
mod vulkan_texture;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_backend::VulkanBackend;
pub use vulkan_context::{DeviceFeatures, VulkanConfig, VulkanContext};
pub use vulkan_format::{format_family, from_vk_format, to_vk_format, FormatFamily, FORMAT_TABLE};
pub use vulkan_texture::VulkanTexture;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, reset_validation_stats, ValidationStats};

/// Re-export of the Vulkan bindings the public API exposes
pub use ash::vk;
