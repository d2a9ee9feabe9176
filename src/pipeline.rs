//! Compute pipeline and its descriptor bindings
//!
//! The dispatch cases bind storage images and storage buffers to fixed
//! binding slots; the pipeline owns the whole descriptor machinery so one
//! drop releases everything

use ash::vk;

use crate::{dev, memory, shader};
use crate::{on_error, on_error_ret};

use std::error::Error;
use std::sync::Arc;
use std::{fmt, ptr};

/// One descriptor binding, slot index is the position in the list
pub enum Binding<'a> {
    /// Storage image in GENERAL layout
    StorageImage(&'a memory::Image),
    StorageBuffer(&'a memory::Buffer),
}

/// Compute pipeline configuration
pub struct ComputeCfg<'a> {
    pub shader: &'a shader::Shader,
    pub bindings: &'a [Binding<'a>],
    pub push_constant_size: u32,
}

#[derive(Debug)]
pub enum PipelineError {
    DescriptorPool,
    DescriptorSetLayout,
    DescriptorSet,
    PipelineLayout,
    PipelineCache,
    Pipeline,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            PipelineError::DescriptorPool => {
                "Failed to create descriptor pool (vkCreateDescriptorPool call failed)"
            }
            PipelineError::DescriptorSetLayout => {
                "Failed to create descriptor set layout (vkCreateDescriptorSetLayout call failed)"
            }
            PipelineError::DescriptorSet => {
                "Failed to allocate descriptor set (vkAllocateDescriptorSets call failed)"
            }
            PipelineError::PipelineLayout => {
                "Failed to create pipeline layout (vkCreatePipelineLayout call failed)"
            }
            PipelineError::PipelineCache => {
                "Failed to create pipeline cache (vkCreatePipelineCache call failed)"
            }
            PipelineError::Pipeline => "Failed to create pipeline (vkCreatePipeline call failed)",
        };

        write!(f, "{}", err_msg)
    }
}

impl Error for PipelineError {}

/// Represents compute pipeline
pub struct ComputePipeline {
    i_core: Arc<dev::Core>,
    i_pipeline_layout: vk::PipelineLayout,
    i_desc_set_layout: vk::DescriptorSetLayout,
    i_desc_set: vk::DescriptorSet,
    i_desc_pool: vk::DescriptorPool,
    i_pipeline: vk::Pipeline,
    i_pipeline_cache: vk::PipelineCache,
}

impl ComputePipeline {
    pub fn new(device: &dev::Device, cfg: &ComputeCfg) -> Result<ComputePipeline, PipelineError> {
        let image_count = cfg
            .bindings
            .iter()
            .filter(|b| matches!(b, Binding::StorageImage(_)))
            .count() as u32;
        let buffer_count = cfg.bindings.len() as u32 - image_count;

        let mut desc_sizes: Vec<vk::DescriptorPoolSize> = Vec::new();

        if image_count > 0 {
            desc_sizes.push(vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_IMAGE,
                descriptor_count: image_count,
            });
        }
        if buffer_count > 0 {
            desc_sizes.push(vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: buffer_count,
            });
        }

        let desc_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(1)
            .pool_sizes(&desc_sizes);

        let desc_pool = on_error_ret!(
            unsafe { device.device().create_descriptor_pool(&desc_info, device.allocator()) },
            PipelineError::DescriptorPool
        );

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = cfg
            .bindings
            .iter()
            .enumerate()
            .map(|(i, b)| {
                vk::DescriptorSetLayoutBinding {
                    binding: i as u32,
                    descriptor_type: binding_type(b),
                    descriptor_count: 1,
                    stage_flags: vk::ShaderStageFlags::COMPUTE,
                    p_immutable_samplers: ptr::null(),
                    _marker: std::marker::PhantomData,
                }
            })
            .collect();

        let desc_layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let desc_set_layout = unsafe {
            on_error!(
                device
                    .device()
                    .create_descriptor_set_layout(&desc_layout_info, device.allocator()),
                {
                    device.device().destroy_descriptor_pool(desc_pool, device.allocator());
                    return Err(PipelineError::DescriptorSetLayout);
                }
            )
        };

        let set_layouts = [desc_set_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(desc_pool)
            .set_layouts(&set_layouts);

        let desc_sets = unsafe {
            on_error!(device.device().allocate_descriptor_sets(&alloc_info), {
                device
                    .device()
                    .destroy_descriptor_set_layout(desc_set_layout, device.allocator());
                device.device().destroy_descriptor_pool(desc_pool, device.allocator());
                return Err(PipelineError::DescriptorSet);
            })
        };

        let desc_set = desc_sets[0];

        let image_infos: Vec<vk::DescriptorImageInfo> = cfg
            .bindings
            .iter()
            .map(|b| match b {
                Binding::StorageImage(img) => vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: img.view(),
                    image_layout: vk::ImageLayout::GENERAL,
                },
                _ => vk::DescriptorImageInfo::default(),
            })
            .collect();

        let buffer_infos: Vec<vk::DescriptorBufferInfo> = cfg
            .bindings
            .iter()
            .map(|b| match b {
                Binding::StorageBuffer(buf) => vk::DescriptorBufferInfo {
                    buffer: buf.buffer(),
                    offset: 0,
                    range: vk::WHOLE_SIZE,
                },
                _ => vk::DescriptorBufferInfo::default(),
            })
            .collect();

        let writes: Vec<vk::WriteDescriptorSet> = cfg
            .bindings
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(desc_set)
                    .dst_binding(i as u32)
                    .descriptor_type(binding_type(b));

                match b {
                    Binding::StorageImage(_) => {
                        write.image_info(std::slice::from_ref(&image_infos[i]))
                    }
                    Binding::StorageBuffer(_) => {
                        write.buffer_info(std::slice::from_ref(&buffer_infos[i]))
                    }
                }
            })
            .collect();

        unsafe { device.device().update_descriptor_sets(&writes, &[]) };

        let push_const_range = vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::COMPUTE,
            offset: 0,
            size: cfg.push_constant_size,
        };

        let ranges = [push_const_range];

        let mut pipeline_layout_info =
            vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);

        if cfg.push_constant_size != 0 {
            pipeline_layout_info = pipeline_layout_info.push_constant_ranges(&ranges);
        }

        let pipeline_layout = unsafe {
            on_error!(
                device
                    .device()
                    .create_pipeline_layout(&pipeline_layout_info, device.allocator()),
                {
                    device
                        .device()
                        .destroy_descriptor_set_layout(desc_set_layout, device.allocator());
                    device.device().destroy_descriptor_pool(desc_pool, device.allocator());
                    return Err(PipelineError::PipelineLayout);
                }
            )
        };

        let cache_info = vk::PipelineCacheCreateInfo::default();

        let pipeline_cache = unsafe {
            on_error!(
                device.device().create_pipeline_cache(&cache_info, device.allocator()),
                {
                    device.device().destroy_pipeline_layout(pipeline_layout, device.allocator());
                    device
                        .device()
                        .destroy_descriptor_set_layout(desc_set_layout, device.allocator());
                    device.device().destroy_descriptor_pool(desc_pool, device.allocator());
                    return Err(PipelineError::PipelineCache);
                }
            )
        };

        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(cfg.shader.module())
            .name(cfg.shader.entry().as_c_str());

        let pipeline_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(pipeline_layout);

        let pipelines = unsafe {
            device
                .device()
                .create_compute_pipelines(pipeline_cache, &[pipeline_info], device.allocator())
        };

        let pipeline = match pipelines {
            Ok(p) => p[0],
            Err(_) => {
                unsafe {
                    device.device().destroy_pipeline_cache(pipeline_cache, device.allocator());
                    device.device().destroy_pipeline_layout(pipeline_layout, device.allocator());
                    device
                        .device()
                        .destroy_descriptor_set_layout(desc_set_layout, device.allocator());
                    device.device().destroy_descriptor_pool(desc_pool, device.allocator());
                }
                return Err(PipelineError::Pipeline);
            }
        };

        Ok(ComputePipeline {
            i_core: device.core().clone(),
            i_pipeline_layout: pipeline_layout,
            i_desc_set_layout: desc_set_layout,
            i_desc_set: desc_set,
            i_desc_pool: desc_pool,
            i_pipeline: pipeline,
            i_pipeline_cache: pipeline_cache,
        })
    }

    #[doc(hidden)]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.i_pipeline
    }

    #[doc(hidden)]
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.i_pipeline_layout
    }

    #[doc(hidden)]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.i_desc_set
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        let device = self.i_core.device();

        unsafe {
            device.destroy_pipeline(self.i_pipeline, self.i_core.allocator());
            device.destroy_pipeline_cache(self.i_pipeline_cache, self.i_core.allocator());
            device.destroy_pipeline_layout(self.i_pipeline_layout, self.i_core.allocator());
            device.destroy_descriptor_set_layout(self.i_desc_set_layout, self.i_core.allocator());
            device.destroy_descriptor_pool(self.i_desc_pool, self.i_core.allocator());
        }
    }
}

fn binding_type(binding: &Binding) -> vk::DescriptorType {
    match binding {
        Binding::StorageImage(_) => vk::DescriptorType::STORAGE_IMAGE,
        Binding::StorageBuffer(_) => vk::DescriptorType::STORAGE_BUFFER,
    }
}
