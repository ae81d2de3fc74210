/// VulkanContext - headless instance, device and upload resources
///
/// Contains everything an upload needs:
/// - Device and queue for transfer + layout transitions
/// - Allocator for image and staging memory
/// - Command pool and fence for one-shot upload submissions
///
/// Shared (via `Arc`) by the backend and every texture it creates, so the
/// device outlives all of its images.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use pvr_texture::pvr::Result;
use pvr_texture::{pvr_debug, pvr_err, pvr_info, pvr_warn};
use std::ffi::{c_char, CString};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

use crate::vulkan_format::FormatFamily;

const SOURCE: &str = "pvr::vulkan";

#[cfg(feature = "vulkan-validation")]
const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

// ===== CONFIG =====

/// Vulkan backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulkanConfig {
    /// Enable VK_LAYER_KHRONOS_validation (only honoured with the
    /// `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub application_name: String,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(feature = "vulkan-validation"),
            application_name: "pvr_texture".to_string(),
        }
    }
}

/// Optional features the device was created with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    pub etc2: bool,
    pub bc: bool,
    /// VK_IMG_format_pvrtc enabled
    pub pvrtc: bool,
    pub cube_map_arrays: bool,
}

impl DeviceFeatures {
    /// True if formats of `family` may be used on this device
    pub fn allows(&self, family: FormatFamily) -> bool {
        match family {
            FormatFamily::Uncompressed => true,
            FormatFamily::Etc2 => self.etc2,
            FormatFamily::Bc => self.bc,
            FormatFamily::Pvrtc => self.pvrtc,
        }
    }
}

// ===== CONTEXT =====

/// Headless Vulkan context used for texture uploads
pub struct VulkanContext {
    entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,

    /// Dropped manually in `Drop`, before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Upload command pool (TRANSIENT + RESET_COMMAND_BUFFER), externally synchronised
    pub(crate) upload_command_pool: Mutex<vk::CommandPool>,
    pub(crate) upload_fence: vk::Fence,

    features: DeviceFeatures,
    device_name: String,

    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanContext {
    /// Create a headless context on the first suitable GPU (discrete preferred)
    pub fn new(config: &VulkanConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to load Vulkan library: {}", e))?;

            let app_name = CString::new(config.application_name.as_str())
                .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Invalid application name: {}", e))?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"pvr_texture")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_1);

            #[allow(unused_mut)]
            let mut layer_names: Vec<*const c_char> = Vec::new();
            #[allow(unused_mut)]
            let mut extension_names: Vec<*const c_char> = Vec::new();
            let validation = Self::validation_requested(&entry, config);
            #[cfg(feature = "vulkan-validation")]
            if validation {
                layer_names.push(VALIDATION_LAYER.as_ptr());
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to create instance: {:?}", e))?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                match crate::debug::create_messenger(&entry, &instance) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };
            #[cfg(not(feature = "vulkan-validation"))]
            let _ = validation;

            let setup = Self::create_device(&instance);
            let (physical_device, device, queue_family, features) = match setup {
                Ok(parts) => parts,
                Err(e) => {
                    #[cfg(feature = "vulkan-validation")]
                    if let Some((loader, messenger)) = &debug_messenger {
                        loader.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            let queue = device.get_device_queue(queue_family, 0);
            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to create allocator: {:?}", e))?;

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to create upload command pool: {:?}", e))?;

            let upload_fence = device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to create upload fence: {:?}", e))?;

            pvr_info!(
                SOURCE,
                "Vulkan context on '{}' (queue family {}, {:?})",
                device_name, queue_family, features
            );

            Ok(Self {
                entry,
                instance,
                physical_device,
                device,
                queue,
                queue_family,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                upload_command_pool: Mutex::new(upload_command_pool),
                upload_fence,
                features,
                device_name,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            })
        }
    }

    /// Name reported by the driver for the selected GPU
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn features(&self) -> DeviceFeatures {
        self.features
    }

    /// Loader entry points (kept alive for the lifetime of the instance)
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Lock the allocator (a poisoned lock is still usable)
    pub(crate) fn allocator(&self) -> MutexGuard<'_, Allocator> {
        self.allocator.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn command_pool(&self) -> MutexGuard<'_, vk::CommandPool> {
        self.upload_command_pool.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validation is only compiled in with the `vulkan-validation` feature
    fn validation_requested(entry: &ash::Entry, config: &VulkanConfig) -> bool {
        if !config.enable_validation {
            return false;
        }
        #[cfg(feature = "vulkan-validation")]
        {
            let available = unsafe { entry.enumerate_instance_layer_properties() }
                .map(|layers| {
                    layers
                        .iter()
                        .any(|layer| layer.layer_name_as_c_str() == Ok(VALIDATION_LAYER))
                })
                .unwrap_or(false);
            if !available {
                pvr_warn!(SOURCE, "VK_LAYER_KHRONOS_validation is not installed; continuing without validation");
            }
            available
        }
        #[cfg(not(feature = "vulkan-validation"))]
        {
            let _ = entry;
            pvr_warn!(SOURCE, "Validation requested but the vulkan-validation feature is disabled");
            false
        }
    }

    /// Pick a GPU with a graphics queue and create the logical device
    unsafe fn create_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, ash::Device, u32, DeviceFeatures)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to enumerate physical devices: {:?}", e))?;

        let mut candidates: Vec<(vk::PhysicalDevice, u32, bool)> = physical_devices
            .into_iter()
            .filter_map(|physical_device| {
                let families = instance.get_physical_device_queue_family_properties(physical_device);
                let family = families
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))?;
                let discrete = instance.get_physical_device_properties(physical_device).device_type
                    == vk::PhysicalDeviceType::DISCRETE_GPU;
                Some((physical_device, family as u32, discrete))
            })
            .collect();
        candidates.sort_by_key(|&(_, _, discrete)| !discrete);

        let (physical_device, queue_family, _) = candidates
            .into_iter()
            .next()
            .ok_or_else(|| pvr_err!(InitializationFailed, SOURCE, "No Vulkan GPU with a graphics queue found"))?;

        let supported = instance.get_physical_device_features(physical_device);
        let pvrtc = instance
            .enumerate_device_extension_properties(physical_device)
            .map(|extensions| {
                extensions
                    .iter()
                    .any(|ext| ext.extension_name_as_c_str() == Ok(ash::img::format_pvrtc::NAME))
            })
            .unwrap_or(false);

        let features = DeviceFeatures {
            etc2: supported.texture_compression_etc2 == vk::TRUE,
            bc: supported.texture_compression_bc == vk::TRUE,
            pvrtc,
            cube_map_arrays: supported.image_cube_array == vk::TRUE,
        };

        let enabled = vk::PhysicalDeviceFeatures::default()
            .texture_compression_etc2(features.etc2)
            .texture_compression_bc(features.bc)
            .image_cube_array(features.cube_map_arrays);

        let mut device_extensions: Vec<*const c_char> = Vec::new();
        if pvrtc {
            device_extensions.push(ash::img::format_pvrtc::NAME.as_ptr());
        }

        let queue_priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family)
            .queue_priorities(&queue_priorities)];

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extensions)
            .enabled_features(&enabled);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(|e| pvr_err!(InitializationFailed, SOURCE, "Failed to create device: {:?}", e))?;

        pvr_debug!(SOURCE, "Logical device created on queue family {}", queue_family);
        Ok((physical_device, device, queue_family, features))
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            self.device.destroy_fence(self.upload_fence, None);
            let pool = *self.command_pool();
            self.device.destroy_command_pool(pool, None);

            // Free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);

            #[cfg(feature = "vulkan-validation")]
            if let Some((loader, messenger)) = self.debug_messenger.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
        pvr_debug!(SOURCE, "Vulkan context destroyed");
    }
}
