//! Provide API to GPU command buffers
//!
//! [`Buffer`] records the operation sequence of a case: copies, dispatches
//! and draws interleaved with the barriers that order them. Barriers are
//! recorded with the masks of the *next* consumer, not an all-commands
//! mask; every cross-stage dependency a case creates must be covered here

use ash::vk;

use smallvec::SmallVec;

use crate::format;
use crate::params::{BufferRegion, ImageRegion};
use crate::{dev, graphics, memory, pipeline};

use crate::on_error_ret;

use std::marker::PhantomData;
use std::sync::Arc;
use std::{fmt, ptr};

/// AccessType specifies memory access
///
#[doc = "Vulkan documentation <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkAccessFlagBits.html>"]
pub type AccessType = vk::AccessFlags;

/// PipelineStage specifies single pipeline stage
///
#[doc = "Vulkan documentation <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPipelineStageFlagBits.html>"]
pub type PipelineStage = vk::PipelineStageFlags;

/// Image layout
///
#[doc = "Vulkan documentation <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkImageLayout.html>"]
pub type ImageLayout = vk::ImageLayout;

pub struct PoolCfg {
    pub queue_index: u32,
}

#[derive(Debug)]
pub enum PoolError {
    /// Failed to
    /// [create](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkCreateCommandPool.html)
    /// command pool
    Creating,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to create command pool (vkCreateCommandPool call failed)")
    }
}

impl std::error::Error for PoolError {}

/// All command buffers are allocated from `Pool`
pub struct Pool {
    i_core: Arc<dev::Core>,
    i_pool: vk::CommandPool,
}

impl Pool {
    pub fn new(dev: &dev::Device, cfg: &PoolCfg) -> Result<Pool, PoolError> {
        let pool_info = vk::CommandPoolCreateInfo {
            s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            queue_family_index: cfg.queue_index,
            _marker: PhantomData,
        };

        let cmd_pool = on_error_ret!(
            unsafe { dev.device().create_command_pool(&pool_info, None) },
            PoolError::Creating
        );

        Ok(Pool {
            i_core: dev.core().clone(),
            i_pool: cmd_pool,
        })
    }

    /// Allocate new command buffer and begin recording into it
    pub fn allocate(&self) -> Result<Buffer<'_>, BufferError> {
        let cmd_buff_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            p_next: ptr::null(),
            command_pool: self.i_pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            _marker: PhantomData,
        };

        let cmd_buffers = on_error_ret!(
            unsafe { self.i_core.device().allocate_command_buffers(&cmd_buff_info) },
            BufferError::Creating
        );

        let cmd_begin_info = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            p_next: ptr::null(),
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            p_inheritance_info: ptr::null(),
            _marker: PhantomData,
        };

        on_error_ret!(
            unsafe { self.i_core.device().begin_command_buffer(cmd_buffers[0], &cmd_begin_info) },
            BufferError::Begin
        );

        Ok(Buffer {
            i_buffer: cmd_buffers[0],
            i_pool: self,
        })
    }

    #[doc(hidden)]
    fn device(&self) -> &ash::Device {
        self.i_core.device()
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("i_core", &self.i_core)
            .field("i_pool", &self.i_pool)
            .finish()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        unsafe {
            self.i_core
                .device()
                .destroy_command_pool(self.i_pool, self.i_core.allocator());
        }
    }
}

#[derive(Debug)]
pub enum BufferError {
    /// Failed to
    /// [allocate](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkAllocateCommandBuffers.html)
    /// buffer
    Creating,
    /// Failed to
    /// [initialize](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkBeginCommandBuffer.html)
    /// buffer
    Begin,
    /// Failed to
    /// [complete](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkEndCommandBuffer.html)
    /// buffer
    Commit,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            BufferError::Creating => {
                "Failed to allocate command buffer (vkAllocateCommandBuffers call failed)"
            }
            BufferError::Begin => {
                "Failed to begin command buffer (vkBeginCommandBuffer call failed)"
            }
            BufferError::Commit => "Failed to end command buffer (vkEndCommandBuffer call failed)",
        };

        write!(f, "{}", err_msg)
    }
}

impl std::error::Error for BufferError {}

/// Buffer in which you can write commands
///
/// Note: this buffer is not ready for execution "as is"
///
/// For that you have to complete buffer via [`commit`](crate::cmd::Buffer::commit)
pub struct Buffer<'a> {
    i_pool: &'a Pool,
    i_buffer: vk::CommandBuffer,
}

impl<'a> Buffer<'a> {
    /// Modify buffer into executable
    ///
    /// Original buffer will not be available
    pub fn commit(self) -> Result<ExecutableBuffer<'a>, BufferError> {
        let dev = self.i_pool.device();

        on_error_ret!(
            unsafe { dev.end_command_buffer(self.i_buffer) },
            BufferError::Commit
        );

        Ok(ExecutableBuffer {
            i_buffer: self.i_buffer,
            _marker: PhantomData,
        })
    }

    /// Set *buffer* memory barrier
    ///
    /// `src` is what happens before the barrier (e.g. a transfer write),
    /// `dst` what the next consumer does (e.g. a host read)
    pub fn buffer_barrier(
        &self,
        mem: &memory::Buffer,
        src_access: AccessType,
        dst_access: AccessType,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
    ) {
        let dev = self.i_pool.device();

        let mem_barrier = vk::BufferMemoryBarrier {
            s_type: vk::StructureType::BUFFER_MEMORY_BARRIER,
            p_next: ptr::null(),
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: mem.buffer(),
            offset: 0,
            size: vk::WHOLE_SIZE,
            _marker: PhantomData,
        };

        unsafe {
            dev.cmd_pipeline_barrier(
                self.i_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[mem_barrier],
                &[],
            )
        }
    }

    /// Set image layout-transition barrier over `aspect`
    ///
    /// Moves the image from its current layout to the layout the next
    /// access requires and orders the accesses around it
    #[allow(clippy::too_many_arguments)]
    pub fn image_barrier(
        &self,
        image: &memory::Image,
        aspect: vk::ImageAspectFlags,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
        src_access: AccessType,
        dst_access: AccessType,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
    ) {
        let dev = self.i_pool.device();

        let barrier = vk::ImageMemoryBarrier {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
            p_next: ptr::null(),
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            old_layout,
            new_layout,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: image.image(),
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            },
            _marker: PhantomData,
        };

        unsafe {
            dev.cmd_pipeline_barrier(
                self.i_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            )
        }
    }

    /// Aspect mask covering every plane of the image's format
    fn full_aspect(image: &memory::Image) -> vk::ImageAspectFlags {
        let desc = format::describe(image.image_format()).expect("format outside the supported set");

        if !desc.is_multi_planar() {
            return vk::ImageAspectFlags::COLOR;
        }

        (0..desc.plane_count()).fold(vk::ImageAspectFlags::empty(), |acc, p| {
            acc | format::plane_aspect(p)
        })
    }

    /// Transition every plane of `image` at once
    #[allow(clippy::too_many_arguments)]
    pub fn image_barrier_all_planes(
        &self,
        image: &memory::Image,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
        src_access: AccessType,
        dst_access: AccessType,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
    ) {
        self.image_barrier(
            image,
            Self::full_aspect(image),
            old_layout,
            new_layout,
            src_access,
            dst_access,
            src_stage,
            dst_stage,
        );
    }

    /// Copy `regions` from `src` buffer into `dst` buffer
    pub fn copy_buffer(&self, src: &memory::Buffer, dst: &memory::Buffer, regions: &[BufferRegion]) {
        let dev = self.i_pool.device();

        let copies: SmallVec<[vk::BufferCopy; 4]> = regions
            .iter()
            .map(|r| {
                debug_assert!(r.src_offset + r.size <= src.size());
                debug_assert!(r.dst_offset + r.size <= dst.size());

                vk::BufferCopy {
                    src_offset: r.src_offset,
                    dst_offset: r.dst_offset,
                    size: r.size,
                }
            })
            .collect();

        unsafe {
            dev.cmd_copy_buffer(self.i_buffer, src.buffer(), dst.buffer(), &copies);
        }
    }

    /// Upload the tightly-packed plane data in `src` into every plane of
    /// `dst`, which must be in TRANSFER_DST layout
    ///
    /// Plane p's bytes start after the bytes of planes 0..p
    pub fn upload_image(&self, src: &memory::Buffer, dst: &memory::Image) {
        let dev = self.i_pool.device();
        let desc = format::describe(dst.image_format()).expect("format outside the supported set");

        let mut offset: u64 = 0;
        let mut copies: SmallVec<[vk::BufferImageCopy; 3]> = SmallVec::new();

        for plane in 0..desc.plane_count() {
            let extent = dst.plane_extent(plane);

            copies.push(vk::BufferImageCopy {
                buffer_offset: offset,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: format::copy_aspect(desc, plane),
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                image_extent: extent,
            });

            offset += dst.plane_size(plane);
        }

        unsafe {
            dev.cmd_copy_buffer_to_image(
                self.i_buffer,
                src.buffer(),
                dst.image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &copies,
            );
        }
    }

    /// Read every plane of `src` (TRANSFER_SRC layout) into `dst`,
    /// tightly packed in plane order
    pub fn read_image(&self, src: &memory::Image, dst: &memory::Buffer) {
        let dev = self.i_pool.device();
        let desc = format::describe(src.image_format()).expect("format outside the supported set");

        let mut offset: u64 = 0;
        let mut copies: SmallVec<[vk::BufferImageCopy; 3]> = SmallVec::new();

        for plane in 0..desc.plane_count() {
            let extent = src.plane_extent(plane);

            copies.push(vk::BufferImageCopy {
                buffer_offset: offset,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: format::copy_aspect(desc, plane),
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                image_extent: extent,
            });

            offset += src.plane_size(plane);
        }

        unsafe {
            dev.cmd_copy_image_to_buffer(
                self.i_buffer,
                src.image(),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.buffer(),
                &copies,
            );
        }
    }

    /// Copy `regions` of a packed planar source buffer into image planes
    ///
    /// The buffer is laid out like [`upload_image`](Buffer::upload_image)
    /// expects (tight rows, planes in order); each region addresses its
    /// source bytes inside the source plane's rectangle
    pub fn copy_buffer_to_image_regions(
        &self,
        src: &memory::Buffer,
        dst: &memory::Image,
        src_format: vk::Format,
        src_extent: vk::Extent3D,
        regions: &[ImageRegion],
    ) {
        let dev = self.i_pool.device();
        let dst_desc = format::describe(dst.image_format()).expect("format outside the supported set");

        let copies: SmallVec<[vk::BufferImageCopy; 4]> = regions
            .iter()
            .map(|r| {
                vk::BufferImageCopy {
                    buffer_offset: packed_texel_offset(src_format, src_extent, r.src_plane, r.src_offset),
                    buffer_row_length: plane_width(src_format, src_extent, r.src_plane),
                    buffer_image_height: plane_height(src_format, src_extent, r.src_plane),
                    image_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: format::copy_aspect(dst_desc, r.dst_plane),
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    image_offset: vk::Offset3D {
                        x: r.dst_offset[0],
                        y: r.dst_offset[1],
                        z: r.dst_offset[2],
                    },
                    image_extent: r.extent,
                }
            })
            .collect();

        unsafe {
            dev.cmd_copy_buffer_to_image(
                self.i_buffer,
                src.buffer(),
                dst.image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &copies,
            );
        }
    }

    /// Copy `regions` of image planes into a packed planar buffer
    pub fn copy_image_to_buffer_regions(
        &self,
        src: &memory::Image,
        dst: &memory::Buffer,
        dst_format: vk::Format,
        dst_extent: vk::Extent3D,
        regions: &[ImageRegion],
    ) {
        let dev = self.i_pool.device();
        let src_desc = format::describe(src.image_format()).expect("format outside the supported set");

        let copies: SmallVec<[vk::BufferImageCopy; 4]> = regions
            .iter()
            .map(|r| {
                vk::BufferImageCopy {
                    buffer_offset: packed_texel_offset(dst_format, dst_extent, r.dst_plane, r.dst_offset),
                    buffer_row_length: plane_width(dst_format, dst_extent, r.dst_plane),
                    buffer_image_height: plane_height(dst_format, dst_extent, r.dst_plane),
                    image_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: format::copy_aspect(src_desc, r.src_plane),
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    image_offset: vk::Offset3D {
                        x: r.src_offset[0],
                        y: r.src_offset[1],
                        z: r.src_offset[2],
                    },
                    image_extent: r.extent,
                }
            })
            .collect();

        unsafe {
            dev.cmd_copy_image_to_buffer(
                self.i_buffer,
                src.image(),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.buffer(),
                &copies,
            );
        }
    }

    /// Copy `regions` between two images in TRANSFER_SRC/TRANSFER_DST
    /// layouts
    ///
    /// Region validity (fit inside both planes) is a precondition
    /// established when the regions were generated
    pub fn copy_image(&self, src: &memory::Image, dst: &memory::Image, regions: &[ImageRegion]) {
        let dev = self.i_pool.device();

        let src_desc = format::describe(src.image_format()).expect("format outside the supported set");
        let dst_desc = format::describe(dst.image_format()).expect("format outside the supported set");

        let copies: SmallVec<[vk::ImageCopy; 4]> = regions
            .iter()
            .map(|r| {
                debug_assert!(r.fits(src.plane_extent(r.src_plane), dst.plane_extent(r.dst_plane)));

                vk::ImageCopy {
                    src_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: format::copy_aspect(src_desc, r.src_plane),
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    src_offset: vk::Offset3D {
                        x: r.src_offset[0],
                        y: r.src_offset[1],
                        z: r.src_offset[2],
                    },
                    dst_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: format::copy_aspect(dst_desc, r.dst_plane),
                        mip_level: 0,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    dst_offset: vk::Offset3D {
                        x: r.dst_offset[0],
                        y: r.dst_offset[1],
                        z: r.dst_offset[2],
                    },
                    extent: r.extent,
                }
            })
            .collect();

        unsafe {
            dev.cmd_copy_image(
                self.i_buffer,
                src.image(),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &copies,
            );
        }
    }

    /// Issue one indirect buffer-to-buffer copy over `count` command
    /// records starting at `address` with `stride` bytes between them
    ///
    /// The extension must have been enabled at device creation; cases
    /// verify support before recording
    pub fn copy_memory_indirect(&self, address: vk::DeviceAddress, count: u32, stride: u32) {
        let loader = self
            .i_pool
            .i_core
            .indirect_copy()
            .expect("indirect copy commands recorded without the extension");

        unsafe {
            loader.cmd_copy_memory_indirect(self.i_buffer, address, count, stride);
        }
    }

    /// Issue one indirect buffer-to-image copy; `subresources` carries one
    /// entry per command record
    pub fn copy_memory_to_image_indirect(
        &self,
        address: vk::DeviceAddress,
        stride: u32,
        dst: &memory::Image,
        subresources: &[vk::ImageSubresourceLayers],
    ) {
        let loader = self
            .i_pool
            .i_core
            .indirect_copy()
            .expect("indirect copy commands recorded without the extension");

        unsafe {
            loader.cmd_copy_memory_to_image_indirect(
                self.i_buffer,
                address,
                stride,
                dst.image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                subresources,
            );
        }
    }

    /// Bind specifically *compute* pipeline
    pub fn bind_compute_pipeline(&self, pipe: &pipeline::ComputePipeline) {
        let dev = self.i_pool.device();

        unsafe {
            dev.cmd_bind_pipeline(
                self.i_buffer,
                vk::PipelineBindPoint::COMPUTE,
                pipe.pipeline(),
            );

            dev.cmd_bind_descriptor_sets(
                self.i_buffer,
                vk::PipelineBindPoint::COMPUTE,
                pipe.pipeline_layout(),
                0,
                &[pipe.descriptor_set()],
                &[],
            );
        }
    }

    /// Dispatch work groups
    pub fn dispatch(&self, x: u32, y: u32, z: u32) {
        let dev = self.i_pool.device();

        unsafe { dev.cmd_dispatch(self.i_buffer, x, y, z) }
    }

    /// Update push constants with raw data
    pub fn update_push_constants(&self, pipe: &pipeline::ComputePipeline, data: &[u8]) {
        let dev = self.i_pool.device();

        unsafe {
            dev.cmd_push_constants(
                self.i_buffer,
                pipe.pipeline_layout(),
                vk::ShaderStageFlags::COMPUTE,
                0,
                data,
            )
        }
    }

    /// Begin render pass with selected framebuffer
    ///
    /// Must be ended with [`end_render_pass`](crate::cmd::Buffer::end_render_pass)
    pub fn begin_render_pass(
        &self,
        rp: &graphics::RenderPass,
        fb: &graphics::Framebuffer,
        clear_color: [f32; 4],
    ) {
        let dev = self.i_pool.device();

        let clear_value = [vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        }];

        let render_pass_begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(rp.render_pass())
            .framebuffer(fb.framebuffer())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: fb.extent(),
            })
            .clear_values(&clear_value);

        unsafe {
            dev.cmd_begin_render_pass(
                self.i_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            )
        };
    }

    /// Bind specifically *graphics* pipeline
    pub fn bind_blend_pipeline(&self, pipe: &graphics::BlendPipeline) {
        let dev = self.i_pool.device();

        unsafe {
            dev.cmd_bind_pipeline(self.i_buffer, vk::PipelineBindPoint::GRAPHICS, pipe.pipeline())
        }
    }

    /// Update vertex bindings
    ///
    /// Updating starts from **first** binding
    pub fn bind_vertex_buffer(&self, buffer: &memory::Buffer) {
        let dev = self.i_pool.device();

        unsafe { dev.cmd_bind_vertex_buffers(self.i_buffer, 0, &[buffer.buffer()], &[0]) }
    }

    /// Add `vkCmdDraw` call to the buffer
    pub fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        let dev = self.i_pool.device();

        unsafe {
            dev.cmd_draw(
                self.i_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
    }

    /// End render pass
    ///
    /// Must be after [`begin_render_pass`](crate::cmd::Buffer::begin_render_pass)
    pub fn end_render_pass(&self) {
        let dev = self.i_pool.device();

        unsafe {
            dev.cmd_end_render_pass(self.i_buffer);
        }
    }
}

impl<'a> fmt::Debug for Buffer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("i_pool", self.i_pool)
            .field("i_buffer", &self.i_buffer)
            .finish()
    }
}

/// Buffer which is ready for execution
pub struct ExecutableBuffer<'a> {
    i_buffer: vk::CommandBuffer,
    _marker: PhantomData<&'a Pool>,
}

#[doc(hidden)]
impl<'a> ExecutableBuffer<'a> {
    pub fn buffer(&self) -> &vk::CommandBuffer {
        &self.i_buffer
    }
}

impl<'a> fmt::Debug for ExecutableBuffer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableBuffer")
            .field("i_buffer", &self.i_buffer)
            .finish()
    }
}

/// Byte offset of texel `offset` of plane `plane` in the packed planar
/// buffer layout (tight rows, planes concatenated in order)
pub fn packed_texel_offset(
    buffer_format: vk::Format,
    extent: vk::Extent3D,
    plane: u32,
    offset: [i32; 3],
) -> u64 {
    let desc = format::describe(buffer_format).expect("format outside the supported set");

    let mut base: u64 = 0;

    for p in 0..plane {
        let pe = desc.plane_extent(extent, p);
        base += pe.width as u64
            * pe.height as u64
            * pe.depth as u64
            * desc.plane_element_size(p) as u64;
    }

    let pe = desc.plane_extent(extent, plane);
    let el = desc.plane_element_size(plane) as u64;

    base
        + (offset[2] as u64 * pe.height as u64 * pe.width as u64
            + offset[1] as u64 * pe.width as u64
            + offset[0] as u64)
            * el
}

fn plane_width(buffer_format: vk::Format, extent: vk::Extent3D, plane: u32) -> u32 {
    let desc = format::describe(buffer_format).expect("format outside the supported set");
    desc.plane_extent(extent, plane).width
}

fn plane_height(buffer_format: vk::Format, extent: vk::Extent3D, plane: u32) -> u32 {
    let desc = format::describe(buffer_format).expect("format outside the supported set");
    desc.plane_extent(extent, plane).height
}
