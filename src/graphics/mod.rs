//! Render pass, framebuffer and the blend pipeline
//!
//! The draw cases render flat-colored quads into a single color
//! attachment; every quad carries its own fixed-function blend
//! configuration, so each one gets a dedicated pipeline over a shared
//! render pass

use ash::vk;

use crate::params::BlendState;
use crate::{dev, memory, shader};
use crate::on_error_ret;

use std::error::Error;
use std::sync::Arc;
use std::{fmt, mem};

#[derive(Debug)]
pub enum GraphicsError {
    RenderPass,
    Framebuffer,
    PipelineLayout,
    Pipeline,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            GraphicsError::RenderPass => {
                "Failed to create render pass (vkCreateRenderPass call failed)"
            }
            GraphicsError::Framebuffer => {
                "Failed to create framebuffer (vkCreateFramebuffer call failed)"
            }
            GraphicsError::PipelineLayout => {
                "Failed to create pipeline layout (vkCreatePipelineLayout call failed)"
            }
            GraphicsError::Pipeline => "Failed to create pipeline (vkCreatePipeline call failed)",
        };

        write!(f, "{}", err_msg)
    }
}

impl Error for GraphicsError {}

/// Vertex consumed by the quad pipelines: position plus the two source
/// colors read by regular and dual-source factors
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub color1: [f32; 4],
}

/// Single-subpass render pass over one color attachment
///
/// The attachment is cleared on load and left in TRANSFER_SRC layout so
/// the readback copy follows without an extra transition
pub struct RenderPass {
    i_core: Arc<dev::Core>,
    i_render_pass: vk::RenderPass,
}

impl RenderPass {
    pub fn new(device: &dev::Device, format: vk::Format) -> Result<RenderPass, GraphicsError> {
        let attachment = vk::AttachmentDescription {
            flags: vk::AttachmentDescriptionFlags::empty(),
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        };

        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };

        let color_refs = [color_ref];

        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);

        let attachments = [attachment];
        let subpasses = [subpass];

        // chain the end-of-pass layout transition to the readback copy
        let dependency = vk::SubpassDependency {
            src_subpass: 0,
            dst_subpass: vk::SUBPASS_EXTERNAL,
            src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: vk::PipelineStageFlags::TRANSFER,
            src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access_mask: vk::AccessFlags::TRANSFER_READ,
            dependency_flags: vk::DependencyFlags::empty(),
        };

        let dependencies = [dependency];

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = on_error_ret!(
            unsafe { device.device().create_render_pass(&info, device.allocator()) },
            GraphicsError::RenderPass
        );

        Ok(RenderPass {
            i_core: device.core().clone(),
            i_render_pass: render_pass,
        })
    }

    #[doc(hidden)]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.i_render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_render_pass(self.i_render_pass, self.i_core.allocator());
        }
    }
}

/// Framebuffer binding one image view to a render pass
pub struct Framebuffer {
    i_core: Arc<dev::Core>,
    i_framebuffer: vk::Framebuffer,
    i_extent: vk::Extent2D,
}

impl Framebuffer {
    pub fn new(
        device: &dev::Device,
        render_pass: &RenderPass,
        image: &memory::Image,
    ) -> Result<Framebuffer, GraphicsError> {
        let extent = vk::Extent2D {
            width: image.extent().width,
            height: image.extent().height,
        };

        let views = [image.view()];

        let info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass())
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = on_error_ret!(
            unsafe { device.device().create_framebuffer(&info, device.allocator()) },
            GraphicsError::Framebuffer
        );

        Ok(Framebuffer {
            i_core: device.core().clone(),
            i_framebuffer: framebuffer,
            i_extent: extent,
        })
    }

    #[doc(hidden)]
    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.i_framebuffer
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.i_extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_framebuffer(self.i_framebuffer, self.i_core.allocator());
        }
    }
}

/// Blend pipeline configuration
pub struct BlendPipelineCfg<'a> {
    pub vertex_shader: &'a shader::Shader,
    pub fragment_shader: &'a shader::Shader,
    pub render_pass: &'a RenderPass,
    pub extent: vk::Extent2D,
    pub blend: BlendState,
    pub blend_constant: [f32; 4],
}

/// Graphics pipeline drawing quads with one blend configuration
pub struct BlendPipeline {
    i_core: Arc<dev::Core>,
    i_layout: vk::PipelineLayout,
    i_pipeline: vk::Pipeline,
}

impl BlendPipeline {
    pub fn new(device: &dev::Device, cfg: &BlendPipelineCfg) -> Result<BlendPipeline, GraphicsError> {
        let layout_info = vk::PipelineLayoutCreateInfo::default();

        let layout = on_error_ret!(
            unsafe { device.device().create_pipeline_layout(&layout_info, device.allocator()) },
            GraphicsError::PipelineLayout
        );

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(cfg.vertex_shader.module())
                .name(cfg.vertex_shader.entry().as_c_str()),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(cfg.fragment_shader.module())
                .name(cfg.fragment_shader.entry().as_c_str()),
        ];

        let vertex_binding = vk::VertexInputBindingDescription {
            binding: 0,
            stride: mem::size_of::<QuadVertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        };

        let vertex_attributes = [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 16,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 32,
            },
        ];

        let bindings = [vertex_binding];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: cfg.extent.width as f32,
            height: cfg.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: cfg.extent,
        };

        let viewports = [viewport];
        let scissors = [scissor];

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachment = vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::TRUE,
            src_color_blend_factor: cfg.blend.src_color,
            dst_color_blend_factor: cfg.blend.dst_color,
            color_blend_op: cfg.blend.color_op,
            src_alpha_blend_factor: cfg.blend.src_alpha,
            dst_alpha_blend_factor: cfg.blend.dst_alpha,
            alpha_blend_op: cfg.blend.alpha_op,
            color_write_mask: cfg.blend.write_mask,
        };

        let blend_attachments = [blend_attachment];

        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .attachments(&blend_attachments)
            .blend_constants(cfg.blend_constant);

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .layout(layout)
            .render_pass(cfg.render_pass.render_pass())
            .subpass(0);

        let pipelines = unsafe {
            device.device().create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[info],
                device.allocator(),
            )
        };

        let pipeline = match pipelines {
            Ok(p) => p[0],
            Err(_) => {
                unsafe {
                    device.device().destroy_pipeline_layout(layout, device.allocator());
                }
                return Err(GraphicsError::Pipeline);
            }
        };

        Ok(BlendPipeline {
            i_core: device.core().clone(),
            i_layout: layout,
            i_pipeline: pipeline,
        })
    }

    #[doc(hidden)]
    pub fn pipeline(&self) -> vk::Pipeline {
        self.i_pipeline
    }
}

impl Drop for BlendPipeline {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_pipeline(self.i_pipeline, self.i_core.allocator());
            self.i_core
                .device()
                .destroy_pipeline_layout(self.i_layout, self.i_core.allocator());
        }
    }
}
