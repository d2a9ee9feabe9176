//! Logical device handling
//!
//! Contains structs which allow you to work with the selected GPU

pub mod device;

#[doc(hidden)]
pub mod core;

pub use device::*;

#[doc(hidden)]
pub(crate) use self::core::*;
