//! Provides API to the selected GPU (logical device)
//!
//! The device is created with every capability the hardware reports and
//! the harness knows how to use, so a single device serves every case;
//! per-case requirements are validated against [`Device::enabled`] before
//! any resource exists

use ash::nv;
use ash::vk;

use crate::on_error_ret;
use crate::{dev, extensions, hw, libvk};

use std::error::Error;
use std::sync::Arc;
use std::{fmt, ptr};

/// Device configuration structure
///
/// Note: on queue creation: every queue family in [`hw`](self::DeviceCfg::hw)
/// will be enabled and every queue within family will have equal priority
pub struct DeviceCfg<'a> {
    pub lib: &'a libvk::Instance,
    pub hw: &'a hw::HWDevice,
    pub allocator: Option<dev::Callback>,
    /// Also create a protected-capable queue in the universal family
    /// (requires the protected memory feature)
    pub protected: bool,
}

#[derive(Debug)]
pub enum DeviceError {
    Creating,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to create Device (vkCreateDevice call failed)")
    }
}

impl Error for DeviceError {}

/// `Device` represents logical device and provides API to the selected GPU
pub struct Device {
    i_core: Arc<dev::Core>,
    i_hw: hw::HWDevice,
    i_enabled: hw::Capabilities,
    i_protected: bool,
}

impl Device {
    /// Create new [`Device`] object according to [`DeviceCfg`]
    pub fn new(cfg: &DeviceCfg) -> Result<Device, DeviceError> {
        let caps = *cfg.hw.capabilities();
        let mut protected = cfg.protected && caps.protected_memory;

        let priorities: Vec<Vec<f32>> = cfg
            .hw
            .queues()
            .map(|info| vec![1.0f32; info.count() as usize])
            .collect();

        let mut dev_queue_create_info: Vec<vk::DeviceQueueCreateInfo> = cfg
            .hw
            .queues()
            .zip(priorities.iter())
            .map(|(info, prio)| {
                vk::DeviceQueueCreateInfo {
                    s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                    p_next: ptr::null(),
                    flags: vk::DeviceQueueCreateFlags::empty(),
                    queue_family_index: info.index(),
                    queue_count: info.count(),
                    p_queue_priorities: prio.as_ptr(),
                    _marker: std::marker::PhantomData,
                }
            })
            .collect();

        // A protected queue coexists with the unprotected ones in the
        // universal family; it is requested through the create flag and
        // fetched later with vkGetDeviceQueue2
        if protected {
            let family = cfg
                .hw
                .find_first_queue(|q| q.is_universal() && q.is_protected_capable());

            match family {
                Some(universal) => {
                    for info in dev_queue_create_info.iter_mut() {
                        if info.queue_family_index == universal.index() {
                            info.flags = vk::DeviceQueueCreateFlags::PROTECTED;
                        }
                    }
                }
                None => protected = false,
            }
        }

        let mut enabled_extensions: Vec<*const i8> = Vec::new();

        if caps.has_atomic_int64_ext {
            enabled_extensions.push(extensions::SHADER_IMAGE_ATOMIC_INT64_EXT_NAME);
        }
        if caps.has_atomic_float_ext {
            enabled_extensions.push(extensions::SHADER_ATOMIC_FLOAT_EXT_NAME);
        }
        if caps.has_copy_memory_indirect_ext {
            enabled_extensions.push(extensions::COPY_MEMORY_INDIRECT_EXT_NAME);
        }

        let base_features = vk::PhysicalDeviceFeatures {
            sparse_binding: caps.sparse_binding as vk::Bool32,
            sparse_residency_image2_d: caps.sparse_residency_image2d as vk::Bool32,
            shader_int64: caps.shader_int64 as vk::Bool32,
            dual_src_blend: caps.dual_src_blend as vk::Bool32,
            ..Default::default()
        };

        let mut ycbcr = vk::PhysicalDeviceSamplerYcbcrConversionFeatures::default()
            .sampler_ycbcr_conversion(caps.sampler_ycbcr_conversion);
        let mut protected_features = vk::PhysicalDeviceProtectedMemoryFeatures::default()
            .protected_memory(protected);
        let mut vk12 = vk::PhysicalDeviceVulkan12Features::default()
            .buffer_device_address(caps.buffer_device_address);
        let mut atomic_int64 = vk::PhysicalDeviceShaderImageAtomicInt64FeaturesEXT::default()
            .shader_image_int64_atomics(caps.shader_image_int64_atomics);
        let mut atomic_float = vk::PhysicalDeviceShaderAtomicFloatFeaturesEXT::default()
            .shader_image_float32_atomics(caps.shader_image_float32_atomics)
            .shader_image_float32_atomic_add(caps.shader_image_float32_atomic_add);
        let mut indirect_copy = vk::PhysicalDeviceCopyMemoryIndirectFeaturesNV::default()
            .indirect_copy(caps.indirect_memory_copy);

        let is_vk12 = vk::api_version_major(cfg.hw.version()) > 1
            || vk::api_version_minor(cfg.hw.version()) >= 2;

        let mut create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&dev_queue_create_info)
            .enabled_extension_names(&enabled_extensions)
            .enabled_features(&base_features)
            .push_next(&mut ycbcr)
            .push_next(&mut protected_features);

        if is_vk12 {
            create_info = create_info.push_next(&mut vk12);
        }

        if caps.has_atomic_int64_ext {
            create_info = create_info.push_next(&mut atomic_int64);
        }
        if caps.has_atomic_float_ext {
            create_info = create_info.push_next(&mut atomic_float);
        }
        if caps.has_copy_memory_indirect_ext {
            create_info = create_info.push_next(&mut indirect_copy);
        }

        let device: ash::Device = on_error_ret!(
            unsafe {
                cfg.lib
                    .instance()
                    .create_device(cfg.hw.device(), &create_info, None)
            },
            DeviceError::Creating
        );

        let indirect_loader = if caps.has_copy_memory_indirect_ext {
            Some(nv::copy_memory_indirect::Device::new(cfg.lib.instance(), &device))
        } else {
            None
        };

        Ok(Device {
            i_core: Arc::new(dev::Core::new(device, cfg.allocator, indirect_loader)),
            i_hw: cfg.hw.clone(),
            i_enabled: caps,
            i_protected: protected,
        })
    }

    #[doc(hidden)]
    pub(crate) fn core(&self) -> &Arc<dev::Core> {
        &self.i_core
    }

    #[doc(hidden)]
    pub fn device(&self) -> &ash::Device {
        self.i_core.device()
    }

    #[doc(hidden)]
    pub fn allocator(&self) -> Option<&dev::Callback> {
        self.i_core.allocator()
    }

    /// Return physical device in use
    pub fn hw(&self) -> &hw::HWDevice {
        &self.i_hw
    }

    /// Capabilities actually enabled at creation
    pub fn enabled(&self) -> &hw::Capabilities {
        &self.i_enabled
    }

    /// Was a protected-capable queue requested and granted
    pub fn is_protected(&self) -> bool {
        self.i_protected
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("i_core", &self.i_core)
            .field("i_hw", &self.i_hw.name())
            .finish()
    }
}
