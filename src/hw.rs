//! Provide information about available hardware
//!
//! Everything the harness asks the driver *before* building resources
//! lives here: queue family classification, memory types, format
//! features, image format limits and feature bits. A capability found
//! missing at this level short-circuits a case to "not supported"

use ash::vk;

use crate::libvk;
use crate::on_error_ret;
use crate::params::QueueClass;

use std::ffi::CStr;
use std::fmt;

#[derive(Debug)]
pub enum HWError {
    Enumerate,
}

impl fmt::Display for HWError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to enumerate physical devices (vkEnumeratePhysicalDevices call failed)")
    }
}

impl std::error::Error for HWError {}

/// Represents GPU type
///
#[doc = "See more <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPhysicalDeviceType.html>"]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HWType {
    Unknown,
    Integrated,
    Discrete,
    Virtualized,
    CPU,
}

impl HWType {
    fn new(t: vk::PhysicalDeviceType) -> HWType {
        match t {
            vk::PhysicalDeviceType::INTEGRATED_GPU => HWType::Integrated,
            vk::PhysicalDeviceType::DISCRETE_GPU => HWType::Discrete,
            vk::PhysicalDeviceType::VIRTUAL_GPU => HWType::Virtualized,
            vk::PhysicalDeviceType::CPU => HWType::CPU,
            _ => HWType::Unknown,
        }
    }
}

impl fmt::Display for HWType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HWType::Unknown => "Unknown",
                HWType::Integrated => "Integrated GPU",
                HWType::Discrete => "Discrete GPU",
                HWType::Virtualized => "Virtual GPU",
                HWType::CPU => "CPU",
            }
        )
    }
}

/// Represent information about single queue family
///
#[doc = "See more <https://registry.khronos.org/vulkan/specs/1.3-extensions/html/vkspec.html#VkQueueFlagBits>"]
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyDescription {
    i_index: u32,
    i_count: u32,
    i_property: vk::QueueFlags,
    i_granularity: vk::Extent3D,
}

impl QueueFamilyDescription {
    fn new(property: &vk::QueueFamilyProperties, index: u32) -> QueueFamilyDescription {
        QueueFamilyDescription {
            i_index: index,
            i_count: property.queue_count,
            i_property: property.queue_flags,
            i_granularity: property.min_image_transfer_granularity,
        }
    }

    /// Minimum image transfer granularity of the family; copies on
    /// dedicated transfer queues must respect it
    pub fn transfer_granularity(&self) -> vk::Extent3D {
        self.i_granularity
    }

    /// Copies at arbitrary texel offsets need (1, 1, 1) granularity
    pub fn has_unit_transfer_granularity(&self) -> bool {
        self.i_granularity.width == 1
            && self.i_granularity.height == 1
            && self.i_granularity.depth == 1
    }

    /// Return how many queues in family
    pub fn count(&self) -> u32 {
        self.i_count
    }

    /// Return queue family index
    pub fn index(&self) -> u32 {
        self.i_index
    }

    /// Is VK_QUEUE_GRAPHICS_BIT set for queue family
    pub fn is_graphics(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::GRAPHICS)
    }

    /// Is VK_QUEUE_COMPUTE_BIT set for queue family
    pub fn is_compute(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::COMPUTE)
    }

    /// Is VK_QUEUE_TRANSFER_BIT set for queue family
    ///
    /// Graphics and compute families implicitly support transfer even when
    /// they do not advertise the bit
    pub fn is_transfer(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::TRANSFER)
            || self.is_graphics()
            || self.is_compute()
    }

    /// Is VK_QUEUE_SPARSE_BINDING_BIT set for queue family
    pub fn is_sparse_binding(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::SPARSE_BINDING)
    }

    /// Is VK_QUEUE_PROTECTED_BIT set for queue family
    pub fn is_protected_capable(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::PROTECTED)
    }

    /// Graphics + compute capable
    pub fn is_universal(&self) -> bool {
        self.is_graphics() && self.is_compute()
    }

    /// Transfer-only: no graphics, no compute
    pub fn is_dedicated_transfer(&self) -> bool {
        self.i_property.contains(vk::QueueFlags::TRANSFER)
            && !self.is_graphics()
            && !self.is_compute()
    }

    /// Compute-only: no graphics
    pub fn is_dedicated_compute(&self) -> bool {
        self.is_compute() && !self.is_graphics()
    }

    /// Does the family satisfy the requested queue class
    pub fn matches_class(&self, class: QueueClass) -> bool {
        match class {
            QueueClass::Universal => self.is_universal(),
            QueueClass::DedicatedTransfer => self.is_dedicated_transfer(),
            QueueClass::DedicatedCompute => self.is_dedicated_compute(),
        }
    }
}

/// Represents memory capabilities
///
#[doc = "See more <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkMemoryPropertyFlagBits.html>"]
pub type MemoryProperty = vk::MemoryPropertyFlags;

/// Represents information about single memory type
#[derive(Debug, Clone, Copy)]
pub struct MemoryDescription {
    i_mem_index: u32,
    i_heap_size: u64,
    i_heap_index: u32,
    i_property: vk::MemoryPropertyFlags,
}

impl MemoryDescription {
    fn new(properties: &vk::PhysicalDeviceMemoryProperties, mem_index: usize) -> MemoryDescription {
        let mem_type: vk::MemoryType = properties.memory_types[mem_index];
        let heap_size: u64 = properties.memory_heaps[mem_type.heap_index as usize].size;

        MemoryDescription {
            i_mem_index: mem_index as u32,
            i_heap_size: heap_size,
            i_heap_index: mem_type.heap_index,
            i_property: mem_type.property_flags,
        }
    }

    /// Return memory type index
    pub fn index(&self) -> u32 {
        self.i_mem_index
    }

    /// Return heap size in bytes
    pub fn heap_size(&self) -> u64 {
        self.i_heap_size
    }

    /// Return heap index
    pub fn heap_index(&self) -> u32 {
        self.i_heap_index
    }

    /// Method checks that selected memory satisfies requirements defined by `flags`
    pub fn is_compatible(&self, flags: MemoryProperty) -> bool {
        self.i_property.contains(flags)
    }

    /// Is VK_MEMORY_HEAP_DEVICE_LOCAL_BIT set
    pub fn is_local(&self) -> bool {
        self.i_property.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL)
    }

    /// Is VK_MEMORY_PROPERTY_HOST_VISIBLE_BIT set for the memory
    pub fn is_host_visible(&self) -> bool {
        self.i_property.contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
    }

    /// Is VK_MEMORY_PROPERTY_HOST_COHERENT_BIT set for the memory
    pub fn is_host_coherent(&self) -> bool {
        self.i_property.contains(vk::MemoryPropertyFlags::HOST_COHERENT)
    }

    /// Is VK_MEMORY_PROPERTY_PROTECTED_BIT set for the memory
    pub fn is_protected(&self) -> bool {
        self.i_property.contains(vk::MemoryPropertyFlags::PROTECTED)
    }
}

/// Feature bits the harness may depend on, queried once per device
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub sampler_ycbcr_conversion: bool,
    pub protected_memory: bool,
    pub sparse_binding: bool,
    pub sparse_residency_image2d: bool,
    pub shader_int64: bool,
    pub dual_src_blend: bool,
    pub shader_image_int64_atomics: bool,
    pub shader_image_float32_atomics: bool,
    pub shader_image_float32_atomic_add: bool,
    pub buffer_device_address: bool,
    pub indirect_memory_copy: bool,
    /// Queue capabilities the indirect copy commands may execute on
    pub indirect_copy_queues: vk::QueueFlags,
    pub has_atomic_int64_ext: bool,
    pub has_atomic_float_ext: bool,
    pub has_copy_memory_indirect_ext: bool,
}

pub struct HWDevice {
    i_device: vk::PhysicalDevice,
    i_name: String,
    i_hw_type: HWType,
    i_version: u32,
    i_queues: Vec<QueueFamilyDescription>,
    i_heap_info: Vec<MemoryDescription>,
    i_caps: Capabilities,
    i_limits: vk::PhysicalDeviceLimits,
}

impl Clone for HWDevice {
    fn clone(&self) -> HWDevice {
        HWDevice {
            i_device: self.i_device,
            i_name: self.i_name.clone(),
            i_hw_type: self.i_hw_type,
            i_version: self.i_version,
            i_queues: self.i_queues.clone(),
            i_heap_info: self.i_heap_info.clone(),
            i_caps: self.i_caps,
            i_limits: self.i_limits,
        }
    }
}

impl HWDevice {
    fn new(lib: &libvk::Instance, hw: vk::PhysicalDevice) -> HWDevice {
        let properties: vk::PhysicalDeviceProperties =
            unsafe { lib.instance().get_physical_device_properties(hw) };

        let queue_properties: Vec<vk::QueueFamilyProperties> = unsafe {
            lib.instance().get_physical_device_queue_family_properties(hw)
        };

        let memory_desc: Vec<MemoryDescription> = unsafe {
            let mem_props: vk::PhysicalDeviceMemoryProperties =
                lib.instance().get_physical_device_memory_properties(hw);

            (0..mem_props.memory_type_count as usize)
                .map(|i| MemoryDescription::new(&mem_props, i))
                .collect()
        };

        HWDevice {
            i_device: hw,
            i_name: unsafe {
                CStr::from_ptr(&properties.device_name[0])
                    .to_str()
                    .unwrap_or("<invalid device name>")
                    .to_owned()
            },
            i_hw_type: HWType::new(properties.device_type),
            i_version: properties.api_version,
            i_queues: queue_properties
                .iter()
                .enumerate()
                .map(|(i, prop)| QueueFamilyDescription::new(prop, i as u32))
                .collect(),
            i_heap_info: memory_desc,
            i_caps: query_capabilities(lib, hw, properties.api_version),
            i_limits: properties.limits,
        }
    }

    pub fn device(&self) -> vk::PhysicalDevice {
        self.i_device
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.i_name
    }

    /// Return device type
    pub fn device_type(&self) -> HWType {
        self.i_hw_type
    }

    /// Return packed API version
    pub fn version(&self) -> u32 {
        self.i_version
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.i_caps
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.i_limits
    }

    /// Return iterator over available queues
    pub fn queues(&self) -> impl Iterator<Item = &QueueFamilyDescription> {
        self.i_queues.iter()
    }

    /// Return iterator over available memory types
    pub fn memory(&self) -> impl Iterator<Item = &MemoryDescription> {
        self.i_heap_info.iter()
    }

    /// Return first suitable queue or None
    pub fn find_first_queue<T>(&self, f: T) -> Option<&QueueFamilyDescription>
    where
        T: Fn(&QueueFamilyDescription) -> bool,
    {
        self.queues().find(move |x| f(x))
    }

    /// Family serving the requested queue class, if the device exposes one
    pub fn find_queue_class(&self, class: QueueClass) -> Option<&QueueFamilyDescription> {
        self.find_first_queue(|q| q.matches_class(class))
    }

    /// Return first suitable memory or None
    pub fn find_first_memory<T>(&self, f: T) -> Option<&MemoryDescription>
    where
        T: Fn(&MemoryDescription) -> bool,
    {
        self.memory().find(move |x| f(x))
    }

    /// Memory type out of `type_bits` satisfying `props`
    pub fn find_memory_type(
        &self,
        type_bits: u32,
        props: MemoryProperty,
    ) -> Option<&MemoryDescription> {
        self.find_first_memory(|m| ((type_bits >> m.index()) & 1) == 1 && m.is_compatible(props))
    }

    /// Format features for `format` under `tiling`
    pub fn format_features(
        &self,
        lib: &libvk::Instance,
        format: vk::Format,
        tiling: vk::ImageTiling,
    ) -> vk::FormatFeatureFlags {
        let props = unsafe {
            lib.instance().get_physical_device_format_properties(self.i_device, format)
        };

        match tiling {
            vk::ImageTiling::LINEAR => props.linear_tiling_features,
            _ => props.optimal_tiling_features,
        }
    }

    /// Creation limits for an image configuration, or `None` when the
    /// combination is unsupported
    pub fn image_format_properties(
        &self,
        lib: &libvk::Instance,
        format: vk::Format,
        tiling: vk::ImageTiling,
        usage: vk::ImageUsageFlags,
        flags: vk::ImageCreateFlags,
    ) -> Option<vk::ImageFormatProperties> {
        unsafe {
            lib.instance()
                .get_physical_device_image_format_properties(
                    self.i_device,
                    format,
                    vk::ImageType::TYPE_2D,
                    tiling,
                    usage,
                    flags,
                )
                .ok()
        }
    }
}

fn query_capabilities(
    lib: &libvk::Instance,
    hw: vk::PhysicalDevice,
    api_version: u32,
) -> Capabilities {
    let mut caps = Capabilities::default();

    let base = unsafe { lib.instance().get_physical_device_features(hw) };
    caps.sparse_binding = base.sparse_binding != 0;
    caps.sparse_residency_image2d = base.sparse_residency_image2_d != 0;
    caps.shader_int64 = base.shader_int64 != 0;
    caps.dual_src_blend = base.dual_src_blend != 0;

    let ext_props = unsafe {
        lib.instance()
            .enumerate_device_extension_properties(hw)
            .unwrap_or_default()
    };

    let has_ext = |name: &CStr| {
        ext_props
            .iter()
            .any(|e| unsafe { CStr::from_ptr(e.extension_name.as_ptr()) } == name)
    };

    caps.has_atomic_int64_ext = has_ext(ash::ext::shader_image_atomic_int64::NAME);
    caps.has_atomic_float_ext = has_ext(ash::ext::shader_atomic_float::NAME);
    caps.has_copy_memory_indirect_ext = has_ext(ash::nv::copy_memory_indirect::NAME);

    // Extended feature queries need an 1.1+ device
    if vk::api_version_minor(api_version) == 0 && vk::api_version_major(api_version) == 1 {
        return caps;
    }

    let is_vk12 = vk::api_version_major(api_version) > 1 || vk::api_version_minor(api_version) >= 2;

    let mut ycbcr = vk::PhysicalDeviceSamplerYcbcrConversionFeatures::default();
    let mut protected = vk::PhysicalDeviceProtectedMemoryFeatures::default();
    let mut atomic_int64 = vk::PhysicalDeviceShaderImageAtomicInt64FeaturesEXT::default();
    let mut atomic_float = vk::PhysicalDeviceShaderAtomicFloatFeaturesEXT::default();
    let mut indirect_copy = vk::PhysicalDeviceCopyMemoryIndirectFeaturesNV::default();
    let mut vk12 = vk::PhysicalDeviceVulkan12Features::default();

    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .push_next(&mut ycbcr)
        .push_next(&mut protected);

    if is_vk12 {
        features2 = features2.push_next(&mut vk12);
    }

    unsafe { lib.instance().get_physical_device_features2(hw, &mut features2) };

    caps.sampler_ycbcr_conversion = ycbcr.sampler_ycbcr_conversion != 0;
    caps.protected_memory = protected.protected_memory != 0;
    caps.buffer_device_address = vk12.buffer_device_address != 0;

    // Chaining a struct of an extension the driver never heard of is not
    // valid usage, so the extension feature structs go in a second query
    // guarded by extension presence
    if caps.has_atomic_int64_ext || caps.has_atomic_float_ext || caps.has_copy_memory_indirect_ext {
        let mut features2 = vk::PhysicalDeviceFeatures2::default();

        if caps.has_atomic_int64_ext {
            features2 = features2.push_next(&mut atomic_int64);
        }
        if caps.has_atomic_float_ext {
            features2 = features2.push_next(&mut atomic_float);
        }
        if caps.has_copy_memory_indirect_ext {
            features2 = features2.push_next(&mut indirect_copy);
        }

        unsafe { lib.instance().get_physical_device_features2(hw, &mut features2) };

        caps.shader_image_int64_atomics = atomic_int64.shader_image_int64_atomics != 0;
        caps.shader_image_float32_atomics = atomic_float.shader_image_float32_atomics != 0;
        caps.shader_image_float32_atomic_add = atomic_float.shader_image_float32_atomic_add != 0;
        caps.indirect_memory_copy = indirect_copy.indirect_copy != 0;
    }

    if caps.has_copy_memory_indirect_ext {
        let mut indirect_props = vk::PhysicalDeviceCopyMemoryIndirectPropertiesNV::default();
        let mut props2 = vk::PhysicalDeviceProperties2::default().push_next(&mut indirect_props);

        unsafe { lib.instance().get_physical_device_properties2(hw, &mut props2) };

        caps.indirect_copy_queues = indirect_props.supported_queues;
    }

    caps
}

impl fmt::Display for HWDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device: {}", self.i_name)?;
        writeln!(f, "Device type: {}", self.i_hw_type)?;
        writeln!(
            f,
            "API version: {}.{}.{}",
            vk::api_version_major(self.i_version),
            vk::api_version_minor(self.i_version),
            vk::api_version_patch(self.i_version)
        )?;

        for (i, queue) in self.i_queues.iter().enumerate() {
            writeln!(
                f,
                "Queue family {}: count {} graphics {} compute {} transfer {} sparse {}",
                i,
                queue.count(),
                queue.is_graphics(),
                queue.is_compute(),
                queue.is_transfer(),
                queue.is_sparse_binding()
            )?;
        }

        Ok(())
    }
}

pub struct Description(Vec<HWDevice>);

impl Description {
    /// Try to retrieve information about hardware
    pub fn poll(lib: &libvk::Instance) -> Result<Description, HWError> {
        let hw: Vec<vk::PhysicalDevice> = on_error_ret!(
            unsafe { lib.instance().enumerate_physical_devices() },
            HWError::Enumerate
        );

        Ok(Description(
            hw.into_iter().map(|dev| HWDevice::new(lib, dev)).collect(),
        ))
    }

    /// Return iterator over all available hardware devices
    pub fn list(&self) -> impl Iterator<Item = &HWDevice> {
        self.0.iter()
    }

    pub fn filter_hw<T>(&self, selector: T) -> impl Iterator<Item = &HWDevice>
    where
        T: Fn(&HWDevice) -> bool,
    {
        self.list().filter(move |x| selector(x))
    }

    /// First device satisfying `dev` that also exposes a queue family
    /// satisfying `queue`
    pub fn find_first<T, U>(&self, dev: T, queue: U) -> Option<(&HWDevice, &QueueFamilyDescription)>
    where
        T: Fn(&HWDevice) -> bool,
        U: Fn(&QueueFamilyDescription) -> bool,
    {
        for hw in self.filter_hw(dev) {
            if let Some(q) = hw.find_first_queue(&queue) {
                return Some((hw, q));
            }
        }

        None
    }
}
