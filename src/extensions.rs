//! Instance and device extension names

use ash::{ext, khr, nv};

use std::ffi::c_char;

pub const DEBUG_EXT_NAME: *const c_char = ext::debug_utils::NAME.as_ptr();

/// Device ext: 64-bit image atomics
pub const SHADER_IMAGE_ATOMIC_INT64_EXT_NAME: *const c_char =
    ext::shader_image_atomic_int64::NAME.as_ptr();

/// Device ext: float image atomics
pub const SHADER_ATOMIC_FLOAT_EXT_NAME: *const c_char = ext::shader_atomic_float::NAME.as_ptr();

/// Device ext: indirect copy commands sourced from a device-address buffer
pub const COPY_MEMORY_INDIRECT_EXT_NAME: *const c_char = nv::copy_memory_indirect::NAME.as_ptr();

/// Device ext: sampler conversion for multi-planar formats (core in 1.1,
/// listed for drivers that still advertise it as an extension)
pub const SAMPLER_YCBCR_CONVERSION_EXT_NAME: *const c_char =
    khr::sampler_ycbcr_conversion::NAME.as_ptr();
