#![allow(dead_code)]
//! Shared state for the device-facing suites
//!
//! Machines without a Vulkan implementation yield `None` from every
//! accessor; suites return early instead of failing

use vkverify::{dev, harness, hw, libvk, shader};

use std::mem::MaybeUninit;
use std::sync::Once;

static INIT_INSTANCE: Once = Once::new();

static mut INSTANCE: MaybeUninit<Option<libvk::Instance>> = MaybeUninit::uninit();

static INIT_HW: Once = Once::new();

static mut HW: MaybeUninit<Option<hw::HWDevice>> = MaybeUninit::uninit();

static INIT_DEVICE: Once = Once::new();

static mut DEVICE: MaybeUninit<Option<dev::Device>> = MaybeUninit::uninit();

static INIT_CATALOG: Once = Once::new();

static mut CATALOG: MaybeUninit<shader::Catalog> = MaybeUninit::uninit();

pub fn get_instance() -> Option<&'static libvk::Instance> {
    unsafe {
        INIT_INSTANCE.call_once(|| {
            let cfg = libvk::InstanceCfg::default();

            #[allow(static_mut_refs)]
            INSTANCE.write(libvk::Instance::new(&cfg).ok());
        });

        #[allow(static_mut_refs)]
        INSTANCE.assume_init_ref().as_ref()
    }
}

pub fn get_hw() -> Option<&'static hw::HWDevice> {
    unsafe {
        INIT_HW.call_once(|| {
            let found = get_instance().and_then(|lib| {
                let list = hw::Description::poll(lib).ok()?;

                list.find_first(
                    |d| d.device_type() != hw::HWType::CPU,
                    hw::QueueFamilyDescription::is_universal,
                )
                .or_else(|| list.find_first(|_| true, hw::QueueFamilyDescription::is_universal))
                .map(|(d, _)| d.clone())
            });

            #[allow(static_mut_refs)]
            HW.write(found);
        });

        #[allow(static_mut_refs)]
        HW.assume_init_ref().as_ref()
    }
}

pub fn get_device() -> Option<&'static dev::Device> {
    unsafe {
        INIT_DEVICE.call_once(|| {
            let built = get_instance().zip(get_hw()).and_then(|(lib, hw_dev)| {
                let cfg = dev::DeviceCfg {
                    lib,
                    hw: hw_dev,
                    allocator: None,
                    protected: hw_dev.capabilities().protected_memory,
                };

                dev::Device::new(&cfg).ok()
            });

            #[allow(static_mut_refs)]
            DEVICE.write(built);
        });

        #[allow(static_mut_refs)]
        DEVICE.assume_init_ref().as_ref()
    }
}

/// Program catalog shared by the suites; starts empty, the execution
/// suite compiles its programs into a local catalog instead
pub fn get_catalog() -> &'static shader::Catalog {
    unsafe {
        INIT_CATALOG.call_once(|| {
            #[allow(static_mut_refs)]
            CATALOG.write(shader::Catalog::new());
        });

        #[allow(static_mut_refs)]
        CATALOG.assume_init_ref()
    }
}

/// Full case context, or `None` without a usable device
pub fn get_context() -> Option<harness::Context<'static>> {
    let lib = get_instance()?;
    let device = get_device()?;

    Some(harness::Context {
        lib,
        device,
        shaders: get_catalog(),
    })
}
