//! Linear memory resources
//!
//! A [`Buffer`] owns a `VkBuffer` plus its backing allocation. Host-visible
//! buffers expose `write`/`read` which go through map + flush/invalidate;
//! the invalidate before every read is unconditional, coherent memory
//! included, so behavior holds under every memory model the spec allows

use ash::vk;

use crate::{dev, hw, memory};
use crate::{on_error_ret, on_option_ret};

use std::sync::Arc;
use std::{fmt, ptr};

/// Ash type which represents buffer usage
///
#[doc = "Vulkan documentation <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkBufferUsageFlagBits.html>"]
pub type BufferUsage = vk::BufferUsageFlags;

/// Buffer configuration
pub struct BufferCfg<'a> {
    pub size: u64,
    pub usage: BufferUsage,
    pub properties: hw::MemoryProperty,
    /// Allocate with a queryable device address
    pub device_address: bool,
    pub protected: bool,
    /// Non-empty list switches the buffer to concurrent sharing
    pub queue_families: &'a [u32],
}

/// Represents single buffer with bound memory
pub struct Buffer {
    i_core: Arc<dev::Core>,
    i_buffer: vk::Buffer,
    i_memory: vk::DeviceMemory,
    i_size: u64,
    i_host_visible: bool,
    i_device_address: bool,
}

impl Buffer {
    pub fn new(device: &dev::Device, cfg: &BufferCfg) -> Result<Buffer, memory::MemoryError> {
        let sharing_mode = if cfg.queue_families.len() > 1 {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };

        let flags = if cfg.protected {
            vk::BufferCreateFlags::PROTECTED
        } else {
            vk::BufferCreateFlags::empty()
        };

        let usage = if cfg.device_address {
            cfg.usage | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS
        } else {
            cfg.usage
        };

        let buffer_info = vk::BufferCreateInfo::default()
            .flags(flags)
            .size(cfg.size)
            .usage(usage)
            .sharing_mode(sharing_mode)
            .queue_family_indices(cfg.queue_families);

        let buffer: vk::Buffer = on_error_ret!(
            unsafe { device.device().create_buffer(&buffer_info, device.allocator()) },
            memory::MemoryError::Buffer
        );

        let requirements = unsafe { device.device().get_buffer_memory_requirements(buffer) };

        let mem_desc = on_option_ret!(
            device.hw().find_memory_type(requirements.memory_type_bits, cfg.properties),
            {
                free_buffer(device.core(), buffer);
                memory::MemoryError::NoSuitableMemory
            }
        );

        let mut flags_info = vk::MemoryAllocateFlagsInfo::default()
            .flags(vk::MemoryAllocateFlags::DEVICE_ADDRESS);

        let mut memory_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(mem_desc.index());

        if cfg.device_address {
            memory_info = memory_info.push_next(&mut flags_info);
        }

        let dev_memory: vk::DeviceMemory = on_error_ret!(
            unsafe { device.device().allocate_memory(&memory_info, device.allocator()) },
            {
                free_buffer(device.core(), buffer);
                memory::MemoryError::DeviceMemory
            }
        );

        on_error_ret!(
            unsafe { device.device().bind_buffer_memory(buffer, dev_memory, 0) },
            {
                unsafe {
                    device.device().free_memory(dev_memory, device.allocator());
                }
                free_buffer(device.core(), buffer);
                memory::MemoryError::Bind
            }
        );

        Ok(Buffer {
            i_core: device.core().clone(),
            i_buffer: buffer,
            i_memory: dev_memory,
            i_size: cfg.size,
            i_host_visible: mem_desc.is_host_visible(),
            i_device_address: cfg.device_address,
        })
    }

    #[doc(hidden)]
    pub fn buffer(&self) -> vk::Buffer {
        self.i_buffer
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.i_size
    }

    pub fn is_host_visible(&self) -> bool {
        self.i_host_visible
    }

    /// Device address of byte 0, available when the buffer was created
    /// with [`BufferCfg::device_address`]
    pub fn device_address(&self) -> Option<vk::DeviceAddress> {
        if !self.i_device_address {
            return None;
        }

        let info = vk::BufferDeviceAddressInfo::default().buffer(self.i_buffer);

        Some(unsafe { self.i_core.device().get_buffer_device_address(&info) })
    }

    /// Copy `data` into the buffer at `offset` through a mapped range
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<(), memory::MemoryError> {
        if !self.i_host_visible || offset + data.len() as u64 > self.i_size {
            return Err(memory::MemoryError::Access);
        }

        let dev = self.i_core.device();

        let mapped = on_error_ret!(
            unsafe {
                dev.map_memory(self.i_memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
            },
            memory::MemoryError::MapAccess
        );

        unsafe {
            ptr::copy_nonoverlapping(
                data.as_ptr(),
                (mapped as *mut u8).add(offset as usize),
                data.len(),
            );
        }

        let range = vk::MappedMemoryRange::default()
            .memory(self.i_memory)
            .offset(0)
            .size(vk::WHOLE_SIZE);

        let flushed = unsafe { dev.flush_mapped_memory_ranges(&[range]) };

        unsafe { dev.unmap_memory(self.i_memory) };

        on_error_ret!(flushed, memory::MemoryError::Flush);

        Ok(())
    }

    /// Read `size` bytes at `offset`, invalidating the mapped range first
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>, memory::MemoryError> {
        if !self.i_host_visible || offset + size > self.i_size {
            return Err(memory::MemoryError::Access);
        }

        let dev = self.i_core.device();

        let mapped = on_error_ret!(
            unsafe {
                dev.map_memory(self.i_memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
            },
            memory::MemoryError::MapAccess
        );

        let range = vk::MappedMemoryRange::default()
            .memory(self.i_memory)
            .offset(0)
            .size(vk::WHOLE_SIZE);

        let invalidated = unsafe { dev.invalidate_mapped_memory_ranges(&[range]) };

        if invalidated.is_err() {
            unsafe { dev.unmap_memory(self.i_memory) };
            return Err(memory::MemoryError::Flush);
        }

        let mut out = vec![0u8; size as usize];

        unsafe {
            ptr::copy_nonoverlapping(
                (mapped as *const u8).add(offset as usize),
                out.as_mut_ptr(),
                size as usize,
            );
            dev.unmap_memory(self.i_memory);
        }

        Ok(out)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_buffer(self.i_buffer, self.i_core.allocator());
            self.i_core
                .device()
                .free_memory(self.i_memory, self.i_core.allocator());
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("i_buffer", &self.i_buffer)
            .field("i_size", &self.i_size)
            .field("i_host_visible", &self.i_host_visible)
            .finish()
    }
}

fn free_buffer(core: &Arc<dev::Core>, buffer: vk::Buffer) {
    unsafe {
        core.device().destroy_buffer(buffer, core.allocator());
    }
}
