//! Shader module handling
//!
//! The harness never generates shader source; it consumes pre-compiled
//! SPIR-V words keyed by a name the orchestrator chooses. [`Catalog`]
//! holds the words, [`Shader`] wraps the device module built from them

use ash::util::read_spv;
use ash::vk;

use crate::dev;
use crate::on_error_ret;

use std::collections::HashMap;
use std::ffi::CString;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::{fmt, mem};

#[derive(Debug)]
pub enum ShaderError {
    InvalidFile,
    BytecodeRead,
    ShaderCreation,
    /// Requested name is absent from the catalog
    UnknownName,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            ShaderError::InvalidFile => "Failed to open SPIR-V file",
            ShaderError::BytecodeRead => "Failed to read SPIR-V bytecode",
            ShaderError::ShaderCreation => {
                "Failed to create shader module (vkCreateShaderModule call failed)"
            }
            ShaderError::UnknownName => "No program with the requested name in the catalog",
        };

        write!(f, "{}", err_msg)
    }
}

impl std::error::Error for ShaderError {}

/// Pre-compiled programs keyed by name
#[derive(Default)]
pub struct Catalog {
    i_programs: HashMap<String, Vec<u32>>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog { i_programs: HashMap::new() }
    }

    pub fn insert(&mut self, name: &str, words: Vec<u32>) {
        self.i_programs.insert(name.to_owned(), words);
    }

    pub fn get(&self, name: &str) -> Option<&[u32]> {
        self.i_programs.get(name).map(|w| w.as_slice())
    }

    /// Build a device module from catalog entry `name`
    pub fn load(&self, device: &dev::Device, name: &str) -> Result<Shader, ShaderError> {
        let words = match self.get(name) {
            Some(w) => w,
            None => return Err(ShaderError::UnknownName),
        };

        Shader::from_words(device, words)
    }
}

/// Shader type represents loaded shader bytecode wrapper
pub struct Shader {
    i_core: Arc<dev::Core>,
    i_module: vk::ShaderModule,
    i_entry: CString,
}

impl Shader {
    pub fn from_words(device: &dev::Device, words: &[u32]) -> Result<Shader, ShaderError> {
        let shader_info = vk::ShaderModuleCreateInfo {
            s_type: vk::StructureType::SHADER_MODULE_CREATE_INFO,
            p_next: std::ptr::null(),
            flags: vk::ShaderModuleCreateFlags::empty(),
            code_size: words.len() * mem::size_of::<u32>(),
            p_code: words.as_ptr(),
            _marker: std::marker::PhantomData,
        };

        let shader_module: vk::ShaderModule = on_error_ret!(
            unsafe { device.device().create_shader_module(&shader_info, device.allocator()) },
            ShaderError::ShaderCreation
        );

        Ok(Shader {
            i_core: device.core().clone(),
            i_module: shader_module,
            i_entry: CString::new("main").expect("entry point name"),
        })
    }

    pub fn from_file(device: &dev::Device, path: &str) -> Result<Shader, ShaderError> {
        let mut spv_file: File =
            on_error_ret!(File::open(Path::new(path)), ShaderError::InvalidFile);

        let spv_bytecode: Vec<u32> =
            on_error_ret!(read_spv(&mut spv_file), ShaderError::BytecodeRead);

        Shader::from_words(device, &spv_bytecode)
    }

    /// Return reference to name of entry function (point) in shader
    pub fn entry(&self) -> &CString {
        &self.i_entry
    }

    #[doc(hidden)]
    pub fn module(&self) -> vk::ShaderModule {
        self.i_module
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_shader_module(self.i_module, self.i_core.allocator());
        }
    }
}
