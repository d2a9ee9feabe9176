//! Execute-verify harness for Vulkan conformance checking
//!
//! A case is described once by an immutable [`params::ParameterSet`],
//! then driven by [`harness::Case`] through resource building, command
//! recording with explicit barriers, synchronous submission, readback
//! through a correct memory-visibility path and comparison against a
//! CPU-computed reference
//!
//! The device is consumed through `ash`; a missing capability at any
//! point yields a not-supported verdict instead of an error

pub mod macros;
pub mod libvk;
pub mod layers;
pub mod debug;
pub mod extensions;
pub mod hw;
pub mod dev;
pub mod format;
pub mod params;
pub mod memory;
pub mod shader;
pub mod pipeline;
pub mod graphics;
pub mod cmd;
pub mod queue;
pub mod pixels;
pub mod readback;
pub mod reference;
pub mod compare;
pub mod verdict;
pub mod harness;
pub mod fixture;
