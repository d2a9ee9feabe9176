//! Image resources
//!
//! [`Image`] owns a `VkImage` and every allocation backing it. Three
//! binding shapes exist: a single allocation, one allocation per plane
//! (disjoint multi-planar images) and sparse binding performed through the
//! queue with a semaphore the first submission must wait on

use ash::vk;

use crate::format;
use crate::{dev, hw, memory};
use crate::{on_error_ret, on_option_ret};

use std::fmt;
use std::sync::Arc;

/// Represents image usage flags
///
#[doc = "Vulkan documentation: <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkImageUsageFlagBits.html>"]
pub type ImageUsage = vk::ImageUsageFlags;

/// Image configuration
pub struct ImageCfg {
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub tiling: vk::ImageTiling,
    pub usage: ImageUsage,
    pub layers: u32,
    pub mip_levels: u32,
    pub properties: hw::MemoryProperty,
    /// Bind every plane to its own allocation
    pub disjoint: bool,
    /// Create with sparse binding flags; memory is attached later through
    /// [`Image::bind_sparse`]
    pub sparse: bool,
    pub protected: bool,
}

/// Image together with its bound memory and an optional identity view
pub struct Image {
    i_core: Arc<dev::Core>,
    i_image: vk::Image,
    i_view: vk::ImageView,
    i_memories: Vec<vk::DeviceMemory>,
    i_format: vk::Format,
    i_extent: vk::Extent3D,
    i_tiling: vk::ImageTiling,
    i_layers: u32,
    i_mip_levels: u32,
    i_host_visible: bool,
    i_sparse: bool,
    i_bind_semaphore: vk::Semaphore,
}

impl Image {
    pub fn new(device: &dev::Device, cfg: &ImageCfg) -> Result<Image, memory::MemoryError> {
        let mut flags = vk::ImageCreateFlags::empty();

        if cfg.disjoint {
            flags |= vk::ImageCreateFlags::DISJOINT;
        }
        if cfg.sparse {
            flags |= vk::ImageCreateFlags::SPARSE_BINDING;
        }
        if cfg.protected {
            flags |= vk::ImageCreateFlags::PROTECTED;
        }

        let image_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(vk::ImageType::TYPE_2D)
            .format(cfg.format)
            .extent(cfg.extent)
            .mip_levels(cfg.mip_levels.max(1))
            .array_layers(cfg.layers.max(1))
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(cfg.tiling)
            .usage(cfg.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = on_error_ret!(
            unsafe { device.device().create_image(&image_info, device.allocator()) },
            memory::MemoryError::Image
        );

        let mut memories: Vec<vk::DeviceMemory> = Vec::new();
        let host_visible =
            !cfg.sparse && cfg.properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE);

        if cfg.sparse {
            // binding happens on the queue, nothing to do here
        } else if cfg.disjoint {
            let desc = format::describe(cfg.format).expect("format outside the supported set");

            for plane in 0..desc.plane_count() {
                let mut plane_info = vk::ImagePlaneMemoryRequirementsInfo::default()
                    .plane_aspect(format::plane_aspect(plane));

                let req_info = vk::ImageMemoryRequirementsInfo2::default()
                    .image(image)
                    .push_next(&mut plane_info);

                let mut requirements = vk::MemoryRequirements2::default();

                unsafe {
                    device
                        .device()
                        .get_image_memory_requirements2(&req_info, &mut requirements)
                };

                match allocate_for(device, &requirements.memory_requirements, cfg.properties) {
                    Ok(mem) => memories.push(mem),
                    Err(e) => {
                        free_all(device.core(), image, &memories);
                        return Err(e);
                    }
                }
            }

            let mut plane_infos: Vec<vk::BindImagePlaneMemoryInfo> = (0..memories.len())
                .map(|plane| {
                    vk::BindImagePlaneMemoryInfo::default()
                        .plane_aspect(format::plane_aspect(plane as u32))
                })
                .collect();

            let bind_infos: Vec<vk::BindImageMemoryInfo> = plane_infos
                .iter_mut()
                .zip(memories.iter())
                .map(|(plane_info, &mem)| {
                    vk::BindImageMemoryInfo::default()
                        .image(image)
                        .memory(mem)
                        .memory_offset(0)
                        .push_next(plane_info)
                })
                .collect();

            on_error_ret!(
                unsafe { device.device().bind_image_memory2(&bind_infos) },
                {
                    free_all(device.core(), image, &memories);
                    memory::MemoryError::Bind
                }
            );
        } else {
            let requirements = unsafe { device.device().get_image_memory_requirements(image) };

            let mem = match allocate_for(device, &requirements, cfg.properties) {
                Ok(mem) => mem,
                Err(e) => {
                    free_all(device.core(), image, &memories);
                    return Err(e);
                }
            };

            memories.push(mem);

            on_error_ret!(
                unsafe { device.device().bind_image_memory(image, memories[0], 0) },
                {
                    free_all(device.core(), image, &memories);
                    memory::MemoryError::Bind
                }
            );
        }

        let desc = format::describe(cfg.format).expect("format outside the supported set");

        // identity view over layer 0/mip 0, only for single-plane images
        // bound to shader or attachment slots; views over transfer-only
        // images are invalid
        let viewable_usage = vk::ImageUsageFlags::SAMPLED
            | vk::ImageUsageFlags::STORAGE
            | vk::ImageUsageFlags::COLOR_ATTACHMENT
            | vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
            | vk::ImageUsageFlags::INPUT_ATTACHMENT;

        let view = if !desc.is_multi_planar() && cfg.usage.intersects(viewable_usage) {
            let view_info = vk::ImageViewCreateInfo::default()
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(cfg.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image(image);

            on_error_ret!(
                unsafe { device.device().create_image_view(&view_info, device.allocator()) },
                {
                    free_all(device.core(), image, &memories);
                    memory::MemoryError::ImageView
                }
            )
        } else {
            vk::ImageView::null()
        };

        Ok(Image {
            i_core: device.core().clone(),
            i_image: image,
            i_view: view,
            i_memories: memories,
            i_format: cfg.format,
            i_extent: cfg.extent,
            i_tiling: cfg.tiling,
            i_layers: cfg.layers.max(1),
            i_mip_levels: cfg.mip_levels.max(1),
            i_host_visible: host_visible,
            i_sparse: cfg.sparse,
            i_bind_semaphore: vk::Semaphore::null(),
        })
    }

    /// Attach memory to a sparse image through `queue` and record the
    /// semaphore later submissions must wait on
    ///
    /// The whole resource is made resident with one opaque bind; the cases
    /// driving sparse images touch every texel, so the resident subset is
    /// the full extent
    pub fn bind_sparse(
        &mut self,
        device: &dev::Device,
        queue: vk::Queue,
    ) -> Result<(), memory::MemoryError> {
        debug_assert!(self.i_sparse && self.i_memories.is_empty());

        let requirements = unsafe { device.device().get_image_memory_requirements(self.i_image) };

        let mem = allocate_for(device, &requirements, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        self.i_memories.push(mem);

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let semaphore = on_error_ret!(
            unsafe { device.device().create_semaphore(&semaphore_info, device.allocator()) },
            memory::MemoryError::SparseBind
        );

        let binds = [vk::SparseMemoryBind {
            resource_offset: 0,
            size: requirements.size,
            memory: mem,
            memory_offset: 0,
            flags: vk::SparseMemoryBindFlags::empty(),
        }];

        let opaque_binds = [vk::SparseImageOpaqueMemoryBindInfo::default()
            .image(self.i_image)
            .binds(&binds)];

        let semaphores = [semaphore];

        let bind_info = vk::BindSparseInfo::default()
            .image_opaque_binds(&opaque_binds)
            .signal_semaphores(&semaphores);

        on_error_ret!(
            unsafe {
                device
                    .device()
                    .queue_bind_sparse(queue, &[bind_info], vk::Fence::null())
            },
            {
                unsafe {
                    device.device().destroy_semaphore(semaphore, device.allocator());
                }
                memory::MemoryError::SparseBind
            }
        );

        self.i_bind_semaphore = semaphore;

        Ok(())
    }

    #[doc(hidden)]
    pub fn image(&self) -> vk::Image {
        self.i_image
    }

    /// Identity view over mip 0 / layer 0
    pub fn view(&self) -> vk::ImageView {
        self.i_view
    }

    pub fn image_format(&self) -> vk::Format {
        self.i_format
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.i_extent
    }

    pub fn tiling(&self) -> vk::ImageTiling {
        self.i_tiling
    }

    pub fn layers(&self) -> u32 {
        self.i_layers
    }

    pub fn mip_levels(&self) -> u32 {
        self.i_mip_levels
    }

    pub fn is_host_visible(&self) -> bool {
        self.i_host_visible
    }

    pub fn is_sparse(&self) -> bool {
        self.i_sparse
    }

    /// Semaphore signalled by the sparse bind, null until
    /// [`Image::bind_sparse`] ran
    pub fn bind_semaphore(&self) -> vk::Semaphore {
        self.i_bind_semaphore
    }

    /// Extent of plane `plane`
    pub fn plane_extent(&self, plane: u32) -> vk::Extent3D {
        let desc = format::describe(self.i_format).expect("format outside the supported set");
        desc.plane_extent(self.i_extent, plane)
    }

    /// Tight byte size of plane `plane`
    pub fn plane_size(&self, plane: u32) -> u64 {
        let desc = format::describe(self.i_format).expect("format outside the supported set");
        let extent = desc.plane_extent(self.i_extent, plane);

        extent.width as u64
            * extent.height as u64
            * extent.depth as u64
            * desc.plane_element_size(plane) as u64
    }

    /// Driver layout of a subresource, meaningful for linear tiling
    pub fn subresource_layout(
        &self,
        aspect: vk::ImageAspectFlags,
        mip_level: u32,
    ) -> vk::SubresourceLayout {
        let subresource = vk::ImageSubresource {
            aspect_mask: aspect,
            mip_level,
            array_layer: 0,
        };

        unsafe {
            self.i_core
                .device()
                .get_image_subresource_layout(self.i_image, subresource)
        }
    }

    /// Read plane `plane` of a host-visible linear image directly through
    /// its mapping, de-pitching rows to the tight layout
    ///
    /// The mapped range is invalidated before reading, coherent memory
    /// included
    pub fn read_plane_linear(&self, plane: u32) -> Result<Vec<u8>, memory::MemoryError> {
        if !self.i_host_visible || self.i_tiling != vk::ImageTiling::LINEAR {
            return Err(memory::MemoryError::Access);
        }

        let desc = format::describe(self.i_format).expect("format outside the supported set");

        let aspect = format::copy_aspect(desc, plane);
        let layout = self.subresource_layout(aspect, 0);

        // disjoint planes sit in their own allocations with layout
        // offsets relative to the plane binding
        let mem = if self.i_memories.len() > 1 {
            self.i_memories[plane as usize]
        } else {
            self.i_memories[0]
        };

        let dev = self.i_core.device();

        let mapped = on_error_ret!(
            unsafe { dev.map_memory(mem, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()) },
            memory::MemoryError::MapAccess
        );

        let range = vk::MappedMemoryRange::default()
            .memory(mem)
            .offset(0)
            .size(vk::WHOLE_SIZE);

        if unsafe { dev.invalidate_mapped_memory_ranges(&[range]) }.is_err() {
            unsafe { dev.unmap_memory(mem) };
            return Err(memory::MemoryError::Flush);
        }

        let extent = desc.plane_extent(self.i_extent, plane);
        let element_size = desc.plane_element_size(plane) as usize;
        let tight_row = extent.width as usize * element_size;

        let mut out = vec![0u8; tight_row * extent.height as usize * extent.depth as usize];

        unsafe {
            let base = (mapped as *const u8).add(layout.offset as usize);

            for z in 0..extent.depth as usize {
                for y in 0..extent.height as usize {
                    let src = base
                        .add(z * layout.depth_pitch as usize)
                        .add(y * layout.row_pitch as usize);
                    let dst_off = (z * extent.height as usize + y) * tight_row;

                    std::ptr::copy_nonoverlapping(src, out[dst_off..].as_mut_ptr(), tight_row);
                }
            }

            dev.unmap_memory(mem);
        }

        Ok(out)
    }

    /// Write plane `plane` of a host-visible linear image directly,
    /// re-pitching rows from the tight layout, flushing after the write
    pub fn write_plane_linear(&self, plane: u32, data: &[u8]) -> Result<(), memory::MemoryError> {
        if !self.i_host_visible || self.i_tiling != vk::ImageTiling::LINEAR {
            return Err(memory::MemoryError::Access);
        }

        let desc = format::describe(self.i_format).expect("format outside the supported set");

        let aspect = format::copy_aspect(desc, plane);
        let layout = self.subresource_layout(aspect, 0);

        let mem = if self.i_memories.len() > 1 {
            self.i_memories[plane as usize]
        } else {
            self.i_memories[0]
        };

        let extent = desc.plane_extent(self.i_extent, plane);
        let element_size = desc.plane_element_size(plane) as usize;
        let tight_row = extent.width as usize * element_size;

        if data.len() < tight_row * extent.height as usize * extent.depth as usize {
            return Err(memory::MemoryError::Access);
        }

        let dev = self.i_core.device();

        let mapped = on_error_ret!(
            unsafe { dev.map_memory(mem, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()) },
            memory::MemoryError::MapAccess
        );

        unsafe {
            let base = (mapped as *mut u8).add(layout.offset as usize);

            for z in 0..extent.depth as usize {
                for y in 0..extent.height as usize {
                    let dst = base
                        .add(z * layout.depth_pitch as usize)
                        .add(y * layout.row_pitch as usize);
                    let src_off = (z * extent.height as usize + y) * tight_row;

                    std::ptr::copy_nonoverlapping(data[src_off..].as_ptr(), dst, tight_row);
                }
            }
        }

        let range = vk::MappedMemoryRange::default()
            .memory(mem)
            .offset(0)
            .size(vk::WHOLE_SIZE);

        let flushed = unsafe { dev.flush_mapped_memory_ranges(&[range]) };

        unsafe { dev.unmap_memory(mem) };

        on_error_ret!(flushed, memory::MemoryError::Flush);

        Ok(())
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.i_view != vk::ImageView::null() {
                self.i_core
                    .device()
                    .destroy_image_view(self.i_view, self.i_core.allocator());
            }
            if self.i_bind_semaphore != vk::Semaphore::null() {
                self.i_core
                    .device()
                    .destroy_semaphore(self.i_bind_semaphore, self.i_core.allocator());
            }

            self.i_core
                .device()
                .destroy_image(self.i_image, self.i_core.allocator());

            for &mem in &self.i_memories {
                self.i_core.device().free_memory(mem, self.i_core.allocator());
            }
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("i_image", &self.i_image)
            .field("i_format", &self.i_format)
            .field("i_extent", &self.i_extent)
            .field("i_memories", &self.i_memories.len())
            .finish()
    }
}

fn free_all(core: &Arc<dev::Core>, image: vk::Image, memories: &[vk::DeviceMemory]) {
    unsafe {
        core.device().destroy_image(image, core.allocator());

        for &mem in memories {
            core.device().free_memory(mem, core.allocator());
        }
    }
}

fn allocate_for(
    device: &dev::Device,
    requirements: &vk::MemoryRequirements,
    properties: hw::MemoryProperty,
) -> Result<vk::DeviceMemory, memory::MemoryError> {
    let mem_desc = on_option_ret!(
        device
            .hw()
            .find_memory_type(requirements.memory_type_bits, properties),
        memory::MemoryError::NoSuitableMemory
    );

    let memory_info = vk::MemoryAllocateInfo::default()
        .allocation_size(requirements.size)
        .memory_type_index(mem_desc.index());

    let mem = on_error_ret!(
        unsafe { device.device().allocate_memory(&memory_info, device.allocator()) },
        memory::MemoryError::DeviceMemory
    );

    Ok(mem)
}
