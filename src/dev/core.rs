use crate::libvk;

use ash::nv;
use ash::vk;

use std::fmt;
use std::marker::PhantomData;

/// Allocation callback configuration
///
/// For now `Callback` must have static lifetime
#[doc = "See more: <https://docs.rs/ash/latest/ash/vk/struct.AllocationCallbacks.html>"]
pub type Callback = vk::AllocationCallbacks<'static>;

pub(crate) struct Core {
    i_device: ash::Device,
    i_callback: Option<Callback>,
    i_indirect_copy: Option<nv::copy_memory_indirect::Device>,
    _marker: PhantomData<*const libvk::Instance>,
}

impl Core {
    pub(crate) fn new(
        device: ash::Device,
        callback: Option<Callback>,
        indirect_copy: Option<nv::copy_memory_indirect::Device>,
    ) -> Core {
        Core {
            i_device: device,
            i_callback: callback,
            i_indirect_copy: indirect_copy,
            _marker: PhantomData,
        }
    }

    pub(crate) fn device(&self) -> &ash::Device {
        &self.i_device
    }

    pub(crate) fn allocator(&self) -> Option<&Callback> {
        self.i_callback.as_ref()
    }

    /// Loaded only when the indirect copy extension was enabled
    pub(crate) fn indirect_copy(&self) -> Option<&nv::copy_memory_indirect::Device> {
        self.i_indirect_copy.as_ref()
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("i_device", &(&self.i_device as *const ash::Device))
            .field("i_callback", &self.i_callback)
            .finish()
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        unsafe { self.i_device.destroy_device(self.i_callback.as_ref()) };
    }
}
