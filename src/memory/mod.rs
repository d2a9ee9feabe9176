//! Device memory resources
//!
//! Buffers and images together with their bound memory. Every type here
//! owns its handles exclusively and releases them on drop; nothing is
//! shared between case instances

pub mod buffer;
pub mod image;

#[doc(hidden)]
pub use buffer::*;
#[doc(hidden)]
pub use image::*;

use std::error::Error;
use std::fmt;

/// Errors during memory allocation, initialization and access
#[derive(Debug)]
pub enum MemoryError {
    /// Failed to [create](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkCreateBuffer.html) buffer
    Buffer,
    /// Failed to [create](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkCreateImage.html) image
    Image,
    /// Failed to [create](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkCreateImageView.html) image view
    ImageView,
    /// Failed to [allocate](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkAllocateMemory.html) memory
    DeviceMemory,
    /// No memory type satisfies the request
    NoSuitableMemory,
    /// Failed to
    /// [map](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkMapMemory.html) memory
    MapAccess,
    /// Failed to
    /// [flush](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkFlushMappedMemoryRanges.html)
    /// or invalidate memory
    Flush,
    /// Failed to
    /// [bind](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkBindBufferMemory.html) memory
    Bind,
    /// Failed to create or submit the sparse binding operation
    SparseBind,
    /// Access outside the resource or to non-host-visible memory
    Access,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            MemoryError::Buffer => "Failed to create buffer (vkCreateBuffer call failed)",
            MemoryError::Image => "Failed to create image (vkCreateImage call failed)",
            MemoryError::ImageView => "Failed to create image view (vkCreateImageView call failed)",
            MemoryError::DeviceMemory => "Failed to allocate memory (vkAllocateMemory call failed)",
            MemoryError::NoSuitableMemory => "No memory type satisfies the request",
            MemoryError::MapAccess => "Failed to map memory (vkMapMemory call failed)",
            MemoryError::Flush => {
                "Failed to flush or invalidate memory (vkFlushMappedMemoryRanges call failed)"
            }
            MemoryError::Bind => "Failed to bind memory (vkBindBufferMemory call failed)",
            MemoryError::SparseBind => "Failed to bind sparse memory (vkQueueBindSparse call failed)",
            MemoryError::Access => "Access outside the resource or to non-host-visible memory",
        };

        write!(f, "{}", err_msg)
    }
}

impl Error for MemoryError {}
