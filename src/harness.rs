//! Case orchestrator
//!
//! Drives one [`ParameterSet`] through the execute-verify sequence:
//! capability checks, resource building, command recording, synchronous
//! submission, readback, reference computation and comparison, ending in
//! exactly one [`Verdict`]. Each operation kind supplies a strategy over
//! the same driver; nothing built for one case outlives it

use ash::vk;

use crate::compare;
use crate::fixture;
use crate::format;
use crate::params::{
    AtomicCheck, AtomicDesc, AtomicOp, BlendDesc, BufferRegion, CopyDesc, CopyKind, ImageRegion,
    Operation, ParameterSet, QueueClass,
};
use crate::pixels::PlanarBuffer;
use crate::queue::{Queue, QueueCfg, SubmitWait, SUBMIT_TIMEOUT_NS};
use crate::reference;
use crate::reference::atomic::{initial_value, INVOCATIONS_PER_PIXEL};
use crate::verdict::{CaseError, Verdict};
use crate::{cmd, dev, graphics, hw, libvk, memory, pipeline, readback, shader};

/// Execution environment shared by every case of a run
///
/// The embedding runner creates the instance, the device and the shader
/// catalog once; cases borrow them and own everything else themselves
pub struct Context<'a> {
    pub lib: &'a libvk::Instance,
    pub device: &'a dev::Device,
    pub shaders: &'a shader::Catalog,
}

/// Catalog key of the compute program an atomic case dispatches
///
/// The runner compiles or loads programs under these names
pub fn atomic_shader_name(desc: &AtomicDesc) -> String {
    let ty = match desc.format {
        vk::Format::R32_UINT => "r32ui",
        vk::Format::R32_SINT => "r32i",
        vk::Format::R32_SFLOAT => "r32f",
        vk::Format::R64_UINT => "r64ui",
        vk::Format::R64_SINT => "r64i",
        _ => "unknown",
    };

    let check = match desc.check {
        AtomicCheck::EndResult => "end",
        AtomicCheck::IntermediateValues => "interm",
    };

    format!("atomic_{}_{}_{}", desc.op.name(), ty, check)
}

/// Catalog keys of the quad programs a blend case draws with
pub const QUAD_VERTEX_SHADER: &str = "quad_vert";
pub const QUAD_FRAGMENT_SHADER: &str = "quad_frag";
pub const QUAD_FRAGMENT_DUAL_SHADER: &str = "quad_frag_dual";

/// One executable case
pub struct Case {
    i_params: ParameterSet,
}

impl Case {
    pub fn new(params: ParameterSet) -> Case {
        Case { i_params: params }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.i_params
    }

    /// Execute the whole sequence and fold every outcome into a verdict
    pub fn run(&self, ctx: &Context) -> Verdict {
        log::info!("case '{}' starting", self.i_params.name);

        let strategy: &dyn Strategy = match &self.i_params.operation {
            Operation::Copy(_) => &CopyStrategy,
            Operation::Atomic(_) => &AtomicStrategy,
            Operation::Blend(_) => &BlendStrategy,
            Operation::Query(_) => &QueryStrategy,
        };

        let outcome = strategy
            .check_support(ctx, &self.i_params)
            .and_then(|_| strategy.execute(ctx, &self.i_params));

        let verdict = match outcome {
            Ok(()) => Verdict::Pass,
            Err(e) => {
                match &e {
                    CaseError::NotSupported(reason) => {
                        log::info!("case '{}' not supported: {}", self.i_params.name, reason)
                    }
                    other => log::warn!("case '{}': {}", self.i_params.name, other),
                }

                e.into_verdict()
            }
        };

        log::info!("case '{}': {}", self.i_params.name, verdict);

        verdict
    }
}

/// Per-kind behavior plugged into the shared driver
trait Strategy {
    /// Every capability the case relies on, checked before any resource
    /// is created
    fn check_support(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError>;

    /// Build, record, submit, read back, verify
    fn execute(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError>;
}

fn ierr<E: std::fmt::Display>(e: E) -> CaseError {
    CaseError::Internal(e.to_string())
}

fn ns(reason: &str) -> CaseError {
    CaseError::NotSupported(reason.to_owned())
}

fn select_queue(ctx: &Context, class: QueueClass, protected: bool) -> Result<Queue, CaseError> {
    let family = match ctx.device.hw().find_queue_class(class) {
        Some(f) => f,
        None => return Err(ns("no queue family of the requested class")),
    };

    if protected {
        if !ctx.device.is_protected() {
            return Err(ns("device has no protected queue"));
        }

        return Ok(Queue::new_protected(ctx.device, family.index()));
    }

    Ok(Queue::new(
        ctx.device,
        &QueueCfg { family_index: family.index(), queue_index: 0 },
    ))
}

/// Queue used for sparse binding operations; may differ from the case's
/// execution queue
fn sparse_bind_queue(ctx: &Context) -> Result<Queue, CaseError> {
    let family = match ctx
        .device
        .hw()
        .find_first_queue(hw::QueueFamilyDescription::is_sparse_binding)
    {
        Some(f) => f,
        None => return Err(ns("no sparse binding capable queue family")),
    };

    Ok(Queue::new(
        ctx.device,
        &QueueCfg { family_index: family.index(), queue_index: 0 },
    ))
}

fn check_image_creatable(
    ctx: &Context,
    fmt: vk::Format,
    tiling: vk::ImageTiling,
    usage: vk::ImageUsageFlags,
    flags: vk::ImageCreateFlags,
    extent: vk::Extent3D,
) -> Result<(), CaseError> {
    let props = match ctx.device.hw().image_format_properties(ctx.lib, fmt, tiling, usage, flags) {
        Some(p) => p,
        None => return Err(ns(&format!("{:?} unusable with {:?}/{:?}", fmt, tiling, usage))),
    };

    if extent.width > props.max_extent.width
        || extent.height > props.max_extent.height
        || extent.depth > props.max_extent.depth
    {
        return Err(ns(&format!("{:?} extent over the device limit", fmt)));
    }

    Ok(())
}

fn check_transfer_format(
    ctx: &Context,
    fmt: vk::Format,
    tiling: vk::ImageTiling,
    disjoint: bool,
) -> Result<(), CaseError> {
    let desc = match format::describe(fmt) {
        Some(d) => d,
        None => return Err(ns(&format!("{:?} outside the supported format set", fmt))),
    };

    if desc.is_multi_planar() && !ctx.device.enabled().sampler_ycbcr_conversion {
        return Err(ns("multi-planar formats not supported"));
    }

    let features = ctx.device.hw().format_features(ctx.lib, fmt, tiling);

    if !features.contains(vk::FormatFeatureFlags::TRANSFER_SRC | vk::FormatFeatureFlags::TRANSFER_DST)
    {
        return Err(ns(&format!("{:?} lacks transfer features", fmt)));
    }

    if disjoint && !features.contains(vk::FormatFeatureFlags::DISJOINT) {
        return Err(ns(&format!("{:?} lacks the disjoint feature", fmt)));
    }

    Ok(())
}

fn image_create_flags(desc: &CopyDesc) -> vk::ImageCreateFlags {
    let mut flags = vk::ImageCreateFlags::empty();

    if desc.disjoint {
        flags |= vk::ImageCreateFlags::DISJOINT;
    }
    if desc.sparse {
        flags |= vk::ImageCreateFlags::SPARSE_BINDING;
    }
    if desc.protected {
        flags |= vk::ImageCreateFlags::PROTECTED;
    }

    flags
}

/// Full-plane region list: plane p of the source onto plane p of the
/// destination
fn full_plane_regions(fmt: vk::Format, extent: vk::Extent3D) -> Vec<ImageRegion> {
    let desc = format::describe(fmt).expect("format outside the supported set");

    (0..desc.plane_count())
        .map(|p| ImageRegion {
            src_plane: p,
            dst_plane: p,
            src_offset: [0; 3],
            dst_offset: [0; 3],
            extent: desc.plane_extent(extent, p),
        })
        .collect()
}

fn queue_class_flag(class: QueueClass) -> vk::QueueFlags {
    match class {
        QueueClass::Universal => vk::QueueFlags::GRAPHICS,
        QueueClass::DedicatedTransfer => vk::QueueFlags::TRANSFER,
        QueueClass::DedicatedCompute => vk::QueueFlags::COMPUTE,
    }
}

// ---------------------------------------------------------------------
// copy
// ---------------------------------------------------------------------

struct CopyStrategy;

impl Strategy for CopyStrategy {
    fn check_support(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Copy(d) => d,
            _ => unreachable!(),
        };

        let caps = ctx.device.enabled();

        let family = match ctx.device.hw().find_queue_class(params.queue) {
            Some(f) => f,
            None => return Err(ns("no queue family of the requested class")),
        };

        if desc.protected && !caps.protected_memory {
            return Err(ns("protected memory not supported"));
        }

        if desc.sparse {
            if !caps.sparse_binding {
                return Err(ns("sparse binding not supported"));
            }

            sparse_bind_queue(ctx)?;
        }

        if let Some(indirect) = &desc.indirect {
            if !caps.indirect_memory_copy {
                return Err(ns("indirect memory copy not supported"));
            }
            if !caps.buffer_device_address {
                return Err(ns("buffer device addresses not supported"));
            }
            if !caps.indirect_copy_queues.contains(queue_class_flag(params.queue)) {
                return Err(ns("indirect copy not supported on the requested queue class"));
            }

            // the stride contract is structural, not a device property
            let record_size = if matches!(desc.kind, CopyKind::BufferToImage { .. }) {
                std::mem::size_of::<vk::CopyMemoryToImageIndirectCommandNV>()
            } else {
                std::mem::size_of::<vk::CopyMemoryIndirectCommandNV>()
            };

            assert!(
                indirect.stride as usize >= record_size,
                "indirect stride below the command record size"
            );
        }

        let involves_images = !matches!(desc.kind, CopyKind::BufferToBuffer { .. });

        if involves_images {
            check_transfer_format(ctx, desc.src_format, desc.tiling, desc.disjoint)?;
            check_transfer_format(ctx, desc.dst_format, desc.tiling, desc.disjoint)?;

            let usage = vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
            let flags = image_create_flags(desc);

            if matches!(desc.kind, CopyKind::ImageToImage { .. } | CopyKind::ImageToBuffer { .. }) {
                check_image_creatable(ctx, desc.src_format, desc.tiling, usage, flags, desc.src_extent)?;
            }
            if matches!(desc.kind, CopyKind::ImageToImage { .. } | CopyKind::BufferToImage { .. }) {
                check_image_creatable(ctx, desc.dst_format, desc.tiling, usage, flags, desc.dst_extent)?;
            }

            if params.queue == QueueClass::DedicatedTransfer && !family.has_unit_transfer_granularity()
            {
                return Err(ns("transfer queue granularity too coarse for texel regions"));
            }
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Copy(d) => d,
            _ => unreachable!(),
        };

        let queue = select_queue(ctx, params.queue, desc.protected)?;
        let pool = cmd::Pool::new(ctx.device, &cmd::PoolCfg { queue_index: queue.family_index() })
            .map_err(ierr)?;

        match &desc.kind {
            CopyKind::BufferToBuffer { size, regions, from_fixture } => {
                copy_buffer_to_buffer(ctx, params, desc, &queue, &pool, *size, regions, *from_fixture)
            }
            CopyKind::BufferToImage { regions } => {
                copy_buffer_to_image(ctx, params, desc, &queue, &pool, regions)
            }
            CopyKind::ImageToBuffer { regions } => {
                copy_image_to_buffer(ctx, params, desc, &queue, &pool, regions)
            }
            CopyKind::ImageToImage { regions } => {
                copy_image_to_image(ctx, params, desc, &queue, &pool, regions)
            }
        }
    }
}

fn source_bytes(
    params: &ParameterSet,
    size: u64,
    from_fixture: bool,
) -> Result<(Vec<u8>, u64), CaseError> {
    if from_fixture {
        let data = fixture::load().map_err(ierr)?;
        let len = data.len() as u64;
        return Ok((data, len));
    }

    let data = PlanarBuffer::new_filled(vk::Format::R8_UNORM, extent_1d(size), params.seed).packed();

    Ok((data, size))
}

fn extent_1d(size: u64) -> vk::Extent3D {
    vk::Extent3D { width: size as u32, height: 1, depth: 1 }
}

#[allow(clippy::too_many_arguments)]
fn copy_buffer_to_buffer(
    ctx: &Context,
    params: &ParameterSet,
    desc: &CopyDesc,
    queue: &Queue,
    pool: &cmd::Pool,
    size: u64,
    regions: &[BufferRegion],
    from_fixture: bool,
) -> Result<(), CaseError> {
    // protected content can not be mirrored back by design; the protected
    // variant verifies the submission path only
    if desc.protected {
        let buffer_cfg = memory::BufferCfg {
            size: size.max(64),
            usage: vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST,
            properties: vk::MemoryPropertyFlags::PROTECTED | vk::MemoryPropertyFlags::DEVICE_LOCAL,
            device_address: false,
            protected: true,
            queue_families: &[],
        };

        let src = memory::Buffer::new(ctx.device, &buffer_cfg).map_err(ierr)?;
        let dst = memory::Buffer::new(ctx.device, &buffer_cfg).map_err(ierr)?;

        let rec = pool.allocate().map_err(ierr)?;
        rec.copy_buffer(&src, &dst, regions);
        let exec = rec.commit().map_err(ierr)?;

        queue.exec(&exec, &[], true, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

        return Ok(());
    }

    let (src_data, size) = source_bytes(params, size, from_fixture)?;
    let dst_initial =
        PlanarBuffer::new_filled(vk::Format::R8_UNORM, extent_1d(size), params.seed ^ 0x5a5a).packed();

    let indirect = desc.indirect.as_ref();

    let src = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size,
            usage: vk::BufferUsageFlags::TRANSFER_SRC,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: indirect.is_some(),
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    let dst = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size,
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: indirect.is_some(),
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    src.write(0, &src_data).map_err(ierr)?;
    dst.write(0, &dst_initial).map_err(ierr)?;

    // one record per region when executing indirectly
    let param_buffer = if let Some(cfg) = indirect {
        let stride = cfg.stride as usize;
        let mut bytes = vec![0u8; stride * regions.len()];

        let src_addr = src.device_address().expect("source lacks a device address");
        let dst_addr = dst.device_address().expect("destination lacks a device address");

        for (i, r) in regions.iter().enumerate() {
            let at = i * stride;
            bytes[at..at + 8].copy_from_slice(&(src_addr + r.src_offset).to_le_bytes());
            bytes[at + 8..at + 16].copy_from_slice(&(dst_addr + r.dst_offset).to_le_bytes());
            bytes[at + 16..at + 24].copy_from_slice(&r.size.to_le_bytes());
        }

        let buf = memory::Buffer::new(
            ctx.device,
            &memory::BufferCfg {
                size: bytes.len() as u64,
                usage: vk::BufferUsageFlags::empty(),
                properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
                device_address: true,
                protected: false,
                queue_families: &[],
            },
        )
        .map_err(ierr)?;

        buf.write(0, &bytes).map_err(ierr)?;

        Some(buf)
    } else {
        None
    };

    let rec = pool.allocate().map_err(ierr)?;

    rec.buffer_barrier(
        &src,
        vk::AccessFlags::HOST_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        vk::PipelineStageFlags::HOST,
        vk::PipelineStageFlags::TRANSFER,
    );
    rec.buffer_barrier(
        &dst,
        vk::AccessFlags::HOST_WRITE,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::HOST,
        vk::PipelineStageFlags::TRANSFER,
    );

    match (&param_buffer, indirect) {
        (Some(buf), Some(cfg)) => {
            rec.buffer_barrier(
                buf,
                vk::AccessFlags::HOST_WRITE,
                vk::AccessFlags::TRANSFER_READ,
                vk::PipelineStageFlags::HOST,
                vk::PipelineStageFlags::TRANSFER,
            );

            let addr = buf.device_address().expect("parameter buffer lacks a device address");
            rec.copy_memory_indirect(addr, regions.len() as u32, cfg.stride);
        }
        _ => rec.copy_buffer(&src, &dst, regions),
    }

    rec.buffer_barrier(
        &dst,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::HOST_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::HOST,
    );

    let exec = rec.commit().map_err(ierr)?;
    queue.exec(&exec, &[], false, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

    let actual = readback::from_buffer(&dst, size).map_err(ierr)?;

    let mut expected = dst_initial;
    reference::copy::apply_buffer_copies(&src_data, &mut expected, regions);

    compare::compare_bytes(&actual, &expected).map_err(|e| CaseError::Comparison(e.to_string()))
}

/// Copy-case images share this construction: device-local, transfer both
/// ways, case flags applied
fn build_copy_image(
    ctx: &Context,
    desc: &CopyDesc,
    fmt: vk::Format,
    extent: vk::Extent3D,
) -> Result<memory::Image, CaseError> {
    memory::Image::new(
        ctx.device,
        &memory::ImageCfg {
            format: fmt,
            extent,
            tiling: desc.tiling,
            usage: vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST,
            layers: 1,
            mip_levels: 1,
            properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            disjoint: desc.disjoint,
            sparse: desc.sparse,
            protected: desc.protected,
        },
    )
    .map_err(ierr)
}

fn staging_with(ctx: &Context, data: &[u8], usage: vk::BufferUsageFlags) -> Result<memory::Buffer, CaseError> {
    let buf = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size: data.len() as u64,
            usage,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: false,
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    buf.write(0, data).map_err(ierr)?;

    Ok(buf)
}

fn sparse_waits(image: &memory::Image) -> Vec<SubmitWait> {
    if image.bind_semaphore() == vk::Semaphore::null() {
        return Vec::new();
    }

    vec![SubmitWait {
        semaphore: image.bind_semaphore(),
        stage: vk::PipelineStageFlags::TRANSFER,
    }]
}

/// Masked comparison when either side carries undefined low bits
fn compare_copy_result(
    actual: &PlanarBuffer,
    expected: &PlanarBuffer,
    src_format: vk::Format,
) -> Result<(), CaseError> {
    let src_bits = format::describe(src_format).map(|d| d.dont_care_low_bits).unwrap_or(0);
    let dst_bits = format::describe(actual.buffer_format())
        .map(|d| d.dont_care_low_bits)
        .unwrap_or(0);

    let bits = src_bits.max(dst_bits);

    let result = if bits > 0 {
        compare::compare_masked_bits(actual, expected, bits)
    } else {
        compare::compare_exact(actual, expected)
    };

    result.map_err(|e| CaseError::Comparison(e.to_string()))
}

fn copy_buffer_to_image(
    ctx: &Context,
    params: &ParameterSet,
    desc: &CopyDesc,
    queue: &Queue,
    pool: &cmd::Pool,
    regions: &[ImageRegion],
) -> Result<(), CaseError> {
    let regions = if regions.is_empty() {
        full_plane_regions(desc.dst_format, desc.dst_extent)
    } else {
        regions.to_vec()
    };

    let src_content = PlanarBuffer::new_filled(desc.src_format, desc.src_extent, params.seed);
    let dst_initial = PlanarBuffer::new_filled(desc.dst_format, desc.dst_extent, params.seed ^ 0x5a5a);

    let mut dst_image = build_copy_image(ctx, desc, desc.dst_format, desc.dst_extent)?;

    if desc.sparse {
        let bind_queue = sparse_bind_queue(ctx)?;
        dst_image.bind_sparse(ctx.device, bind_queue.queue()).map_err(ierr)?;
    }

    let indirect = desc.indirect.as_ref();

    let src_buf = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size: src_content.byte_size(),
            usage: vk::BufferUsageFlags::TRANSFER_SRC,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: indirect.is_some(),
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    src_buf.write(0, &src_content.packed()).map_err(ierr)?;

    let init_buf = staging_with(ctx, &dst_initial.packed(), vk::BufferUsageFlags::TRANSFER_SRC)?;
    let read_buf = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size: dst_initial.byte_size(),
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: false,
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    let rec = pool.allocate().map_err(ierr)?;

    rec.image_barrier_all_planes(
        &dst_image,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.upload_image(&init_buf, &dst_image);

    // initial fill must land before the copy overwrites parts of it
    rec.image_barrier_all_planes(
        &dst_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );

    match indirect {
        Some(cfg) => {
            let desc_fmt =
                format::describe(desc.dst_format).expect("format outside the supported set");
            let src_addr = src_buf.device_address().expect("source lacks a device address");

            let stride = cfg.stride as usize;
            let mut bytes = vec![0u8; stride * regions.len()];
            let mut subresources = Vec::with_capacity(regions.len());

            for (i, r) in regions.iter().enumerate() {
                let src_desc =
                    format::describe(desc.src_format).expect("format outside the supported set");
                let src_plane_extent = src_desc.plane_extent(desc.src_extent, r.src_plane);

                let at = i * stride;
                let addr = src_addr
                    + cmd::packed_texel_offset(desc.src_format, desc.src_extent, r.src_plane, r.src_offset);

                bytes[at..at + 8].copy_from_slice(&addr.to_le_bytes());
                bytes[at + 8..at + 12].copy_from_slice(&src_plane_extent.width.to_le_bytes());
                bytes[at + 12..at + 16].copy_from_slice(&src_plane_extent.height.to_le_bytes());
                // image_subresource + image_offset + image_extent trail the
                // addressed fields in the command record
                bytes[at + 16..at + 20]
                    .copy_from_slice(&format::copy_aspect(desc_fmt, r.dst_plane).as_raw().to_le_bytes());
                bytes[at + 20..at + 24].copy_from_slice(&0u32.to_le_bytes());
                bytes[at + 24..at + 28].copy_from_slice(&0u32.to_le_bytes());
                bytes[at + 28..at + 32].copy_from_slice(&1u32.to_le_bytes());
                bytes[at + 32..at + 36].copy_from_slice(&r.dst_offset[0].to_le_bytes());
                bytes[at + 36..at + 40].copy_from_slice(&r.dst_offset[1].to_le_bytes());
                bytes[at + 40..at + 44].copy_from_slice(&r.dst_offset[2].to_le_bytes());
                bytes[at + 44..at + 48].copy_from_slice(&r.extent.width.to_le_bytes());
                bytes[at + 48..at + 52].copy_from_slice(&r.extent.height.to_le_bytes());
                bytes[at + 52..at + 56].copy_from_slice(&r.extent.depth.to_le_bytes());

                subresources.push(vk::ImageSubresourceLayers {
                    aspect_mask: format::copy_aspect(desc_fmt, r.dst_plane),
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            }

            let param_buf = memory::Buffer::new(
                ctx.device,
                &memory::BufferCfg {
                    size: bytes.len() as u64,
                    usage: vk::BufferUsageFlags::empty(),
                    properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
                    device_address: true,
                    protected: false,
                    queue_families: &[],
                },
            )
            .map_err(ierr)?;

            param_buf.write(0, &bytes).map_err(ierr)?;

            let addr = param_buf.device_address().expect("parameter buffer lacks a device address");

            rec.copy_memory_to_image_indirect(addr, cfg.stride, &dst_image, &subresources);

            // keep the parameter buffer alive until submission completed
            let exec = rec.commit().map_err(ierr)?;
            finish_image_copy_readback(
                ctx, queue, pool, exec, &dst_image, &read_buf, &src_content, &dst_initial, &regions,
                desc,
            )?;

            drop(param_buf);

            return Ok(());
        }
        None => {
            rec.copy_buffer_to_image_regions(
                &src_buf,
                &dst_image,
                desc.src_format,
                desc.src_extent,
                &regions,
            );
        }
    }

    let exec = rec.commit().map_err(ierr)?;

    finish_image_copy_readback(
        ctx, queue, pool, exec, &dst_image, &read_buf, &src_content, &dst_initial, &regions, desc,
    )
}

/// Shared tail of the image-destination copy cases: transition, read
/// back, compute the reference and compare
#[allow(clippy::too_many_arguments)]
fn finish_image_copy_readback(
    _ctx: &Context,
    queue: &Queue,
    pool: &cmd::Pool,
    exec: cmd::ExecutableBuffer,
    dst_image: &memory::Image,
    read_buf: &memory::Buffer,
    src_content: &PlanarBuffer,
    dst_initial: &PlanarBuffer,
    regions: &[ImageRegion],
    desc: &CopyDesc,
) -> Result<(), CaseError> {
    queue
        .exec(&exec, &sparse_waits(dst_image), desc.protected, SUBMIT_TIMEOUT_NS)
        .map_err(ierr)?;

    let rec = pool.allocate().map_err(ierr)?;

    rec.image_barrier_all_planes(
        dst_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.read_image(dst_image, read_buf);

    rec.buffer_barrier(
        read_buf,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::HOST_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::HOST,
    );

    let exec = rec.commit().map_err(ierr)?;
    queue.exec(&exec, &[], desc.protected, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

    let mirror = readback::from_staging(read_buf, dst_initial.buffer_format(), dst_initial.extent())
        .map_err(ierr)?;

    let mut expected = dst_initial.clone();
    reference::copy::apply_image_copies(src_content, &mut expected, regions);

    compare_copy_result(mirror.content(), &expected, desc.src_format)
}

fn copy_image_to_buffer(
    ctx: &Context,
    params: &ParameterSet,
    desc: &CopyDesc,
    queue: &Queue,
    pool: &cmd::Pool,
    regions: &[ImageRegion],
) -> Result<(), CaseError> {
    let regions = if regions.is_empty() {
        full_plane_regions(desc.src_format, desc.src_extent)
    } else {
        regions.to_vec()
    };

    let src_content = PlanarBuffer::new_filled(desc.src_format, desc.src_extent, params.seed);
    let dst_initial = PlanarBuffer::new_filled(desc.dst_format, desc.dst_extent, params.seed ^ 0x5a5a);

    let mut src_image = build_copy_image(ctx, desc, desc.src_format, desc.src_extent)?;

    if desc.sparse {
        let bind_queue = sparse_bind_queue(ctx)?;
        src_image.bind_sparse(ctx.device, bind_queue.queue()).map_err(ierr)?;
    }

    let upload_buf = staging_with(ctx, &src_content.packed(), vk::BufferUsageFlags::TRANSFER_SRC)?;

    let dst_buf = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size: dst_initial.byte_size(),
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: false,
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    dst_buf.write(0, &dst_initial.packed()).map_err(ierr)?;

    let rec = pool.allocate().map_err(ierr)?;

    rec.image_barrier_all_planes(
        &src_image,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.upload_image(&upload_buf, &src_image);

    rec.image_barrier_all_planes(
        &src_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.buffer_barrier(
        &dst_buf,
        vk::AccessFlags::HOST_WRITE,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::HOST,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.copy_image_to_buffer_regions(&src_image, &dst_buf, desc.dst_format, desc.dst_extent, &regions);

    rec.buffer_barrier(
        &dst_buf,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::HOST_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::HOST,
    );

    let exec = rec.commit().map_err(ierr)?;
    queue
        .exec(&exec, &sparse_waits(&src_image), desc.protected, SUBMIT_TIMEOUT_NS)
        .map_err(ierr)?;

    let packed = readback::from_buffer(&dst_buf, dst_initial.byte_size()).map_err(ierr)?;
    let actual = PlanarBuffer::from_packed(desc.dst_format, desc.dst_extent, &packed);

    let mut expected = dst_initial.clone();
    reference::copy::apply_image_copies(&src_content, &mut expected, &regions);

    compare_copy_result(&actual, &expected, desc.src_format)
}

fn copy_image_to_image(
    ctx: &Context,
    params: &ParameterSet,
    desc: &CopyDesc,
    queue: &Queue,
    pool: &cmd::Pool,
    regions: &[ImageRegion],
) -> Result<(), CaseError> {
    let regions = if regions.is_empty() {
        full_plane_regions(desc.src_format, desc.src_extent)
    } else {
        regions.to_vec()
    };

    let src_content = PlanarBuffer::new_filled(desc.src_format, desc.src_extent, params.seed);
    let dst_initial = PlanarBuffer::new_filled(desc.dst_format, desc.dst_extent, params.seed ^ 0x5a5a);

    let mut src_image = build_copy_image(ctx, desc, desc.src_format, desc.src_extent)?;
    let mut dst_image = build_copy_image(ctx, desc, desc.dst_format, desc.dst_extent)?;

    if desc.sparse {
        let bind_queue = sparse_bind_queue(ctx)?;
        src_image.bind_sparse(ctx.device, bind_queue.queue()).map_err(ierr)?;
        dst_image.bind_sparse(ctx.device, bind_queue.queue()).map_err(ierr)?;
    }

    let src_upload = staging_with(ctx, &src_content.packed(), vk::BufferUsageFlags::TRANSFER_SRC)?;
    let dst_upload = staging_with(ctx, &dst_initial.packed(), vk::BufferUsageFlags::TRANSFER_SRC)?;

    let read_buf = memory::Buffer::new(
        ctx.device,
        &memory::BufferCfg {
            size: dst_initial.byte_size(),
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
            device_address: false,
            protected: false,
            queue_families: &[],
        },
    )
    .map_err(ierr)?;

    let rec = pool.allocate().map_err(ierr)?;

    rec.image_barrier_all_planes(
        &src_image,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
    );
    rec.image_barrier_all_planes(
        &dst_image,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.upload_image(&src_upload, &src_image);
    rec.upload_image(&dst_upload, &dst_image);

    rec.image_barrier_all_planes(
        &src_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );
    rec.image_barrier_all_planes(
        &dst_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.copy_image(&src_image, &dst_image, &regions);

    let exec = rec.commit().map_err(ierr)?;

    let mut waits = sparse_waits(&src_image);
    waits.extend(sparse_waits(&dst_image));

    queue.exec(&exec, &waits, desc.protected, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

    let rec = pool.allocate().map_err(ierr)?;

    rec.image_barrier_all_planes(
        &dst_image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::TRANSFER_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::TRANSFER,
    );

    rec.read_image(&dst_image, &read_buf);

    rec.buffer_barrier(
        &read_buf,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::HOST_READ,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::HOST,
    );

    let exec = rec.commit().map_err(ierr)?;
    queue.exec(&exec, &[], desc.protected, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

    let mirror =
        readback::from_staging(&read_buf, desc.dst_format, desc.dst_extent).map_err(ierr)?;

    let mut expected = dst_initial.clone();
    reference::copy::apply_image_copies(&src_content, &mut expected, &regions);

    compare_copy_result(mirror.content(), &expected, desc.src_format)
}

// ---------------------------------------------------------------------
// atomic
// ---------------------------------------------------------------------

struct AtomicStrategy;

impl Strategy for AtomicStrategy {
    fn check_support(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Atomic(d) => d,
            _ => unreachable!(),
        };

        if params.queue == QueueClass::DedicatedTransfer {
            return Err(ns("atomic dispatches need a compute capable queue"));
        }

        if ctx.device.hw().find_queue_class(params.queue).is_none() {
            return Err(ns("no queue family of the requested class"));
        }

        let caps = ctx.device.enabled();

        match desc.format {
            vk::Format::R64_UINT | vk::Format::R64_SINT => {
                if !caps.shader_int64 || !caps.shader_image_int64_atomics {
                    return Err(ns("64-bit image atomics not supported"));
                }
            }
            vk::Format::R32_SFLOAT => {
                if !caps.shader_image_float32_atomics {
                    return Err(ns("float image atomics not supported"));
                }
                if desc.op == AtomicOp::Add && !caps.shader_image_float32_atomic_add {
                    return Err(ns("float image atomic add not supported"));
                }
            }
            vk::Format::R32_UINT | vk::Format::R32_SINT => {}
            _ => return Err(ns("format does not support image atomics")),
        }

        let features = ctx.device.hw().format_features(ctx.lib, desc.format, desc.tiling);

        if !features.contains(vk::FormatFeatureFlags::STORAGE_IMAGE_ATOMIC) {
            return Err(ns(&format!(
                "{:?} lacks atomic storage with {:?} tiling",
                desc.format, desc.tiling
            )));
        }

        if desc.sparse {
            if !caps.sparse_binding {
                return Err(ns("sparse binding not supported"));
            }

            sparse_bind_queue(ctx)?;
        }

        let usage = vk::ImageUsageFlags::STORAGE
            | vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST;

        let flags = if desc.sparse {
            vk::ImageCreateFlags::SPARSE_BINDING
        } else {
            vk::ImageCreateFlags::empty()
        };

        check_image_creatable(ctx, desc.format, desc.tiling, usage, flags, desc.extent)?;

        if ctx.shaders.get(&atomic_shader_name(desc)).is_none() {
            return Err(ns(&format!("program '{}' not in the catalog", atomic_shader_name(desc))));
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Atomic(d) => d,
            _ => unreachable!(),
        };

        let queue = select_queue(ctx, params.queue, false)?;
        let pool = cmd::Pool::new(ctx.device, &cmd::PoolCfg { queue_index: queue.family_index() })
            .map_err(ierr)?;

        let grid = desc.extent;
        let extended = vk::Extent3D {
            width: grid.width * INVOCATIONS_PER_PIXEL as u32,
            height: grid.height,
            depth: grid.depth,
        };

        let usage = vk::ImageUsageFlags::STORAGE
            | vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST;

        let mut result_image = memory::Image::new(
            ctx.device,
            &memory::ImageCfg {
                format: desc.format,
                extent: grid,
                tiling: desc.tiling,
                usage,
                layers: 1,
                mip_levels: 1,
                properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                disjoint: false,
                sparse: desc.sparse,
                protected: false,
            },
        )
        .map_err(ierr)?;

        if desc.sparse {
            let bind_queue = sparse_bind_queue(ctx)?;
            result_image.bind_sparse(ctx.device, bind_queue.queue()).map_err(ierr)?;
        }

        let interm_image = if desc.check == AtomicCheck::IntermediateValues {
            Some(
                memory::Image::new(
                    ctx.device,
                    &memory::ImageCfg {
                        format: desc.format,
                        extent: extended,
                        tiling: desc.tiling,
                        usage,
                        layers: 1,
                        mip_levels: 1,
                        properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                        disjoint: false,
                        sparse: false,
                        protected: false,
                    },
                )
                .map_err(ierr)?,
            )
        } else {
            None
        };

        let initial = initial_content(desc);
        let init_buf = staging_with(ctx, &initial.packed(), vk::BufferUsageFlags::TRANSFER_SRC)?;

        let (read_target_extent, read_size) = match desc.check {
            AtomicCheck::EndResult => (grid, initial.byte_size()),
            AtomicCheck::IntermediateValues => {
                let shape = PlanarBuffer::new(desc.format, extended);
                (extended, shape.byte_size())
            }
        };

        let read_buf = memory::Buffer::new(
            ctx.device,
            &memory::BufferCfg {
                size: read_size,
                usage: vk::BufferUsageFlags::TRANSFER_DST,
                properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
                device_address: false,
                protected: false,
                queue_families: &[],
            },
        )
        .map_err(ierr)?;

        let shader = ctx
            .shaders
            .load(ctx.device, &atomic_shader_name(desc))
            .map_err(ierr)?;

        let mut bindings = vec![pipeline::Binding::StorageImage(&result_image)];
        if let Some(interm) = &interm_image {
            bindings.push(pipeline::Binding::StorageImage(interm));
        }

        let pipe = pipeline::ComputePipeline::new(
            ctx.device,
            &pipeline::ComputeCfg {
                shader: &shader,
                bindings: &bindings,
                push_constant_size: 0,
            },
        )
        .map_err(ierr)?;

        let rec = pool.allocate().map_err(ierr)?;

        rec.image_barrier(
            &result_image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        );

        rec.upload_image(&init_buf, &result_image);

        rec.image_barrier(
            &result_image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::GENERAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::COMPUTE_SHADER,
        );

        if let Some(interm) = &interm_image {
            rec.image_barrier(
                interm,
                vk::ImageAspectFlags::COLOR,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::GENERAL,
                vk::AccessFlags::empty(),
                vk::AccessFlags::SHADER_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::COMPUTE_SHADER,
            );
        }

        rec.bind_compute_pipeline(&pipe);
        rec.dispatch(extended.width, extended.height, extended.depth);

        let read_target: &memory::Image = match &interm_image {
            Some(interm) => interm,
            None => &result_image,
        };

        rec.image_barrier(
            read_target,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::SHADER_WRITE,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::PipelineStageFlags::TRANSFER,
        );

        rec.read_image(read_target, &read_buf);

        rec.buffer_barrier(
            &read_buf,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::HOST_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::HOST,
        );

        let exec = rec.commit().map_err(ierr)?;

        queue
            .exec(&exec, &sparse_waits(&result_image), false, SUBMIT_TIMEOUT_NS)
            .map_err(ierr)?;

        let mirror =
            readback::from_staging(&read_buf, desc.format, read_target_extent).map_err(ierr)?;

        compare::compare_atomic(desc.op, desc.check, desc.format, mirror.content(), grid)
            .map_err(|e| CaseError::Comparison(e.to_string()))
    }
}

/// Image content before the dispatch: the operation's initial value in
/// every texel
fn initial_content(desc: &AtomicDesc) -> PlanarBuffer {
    let mut content = PlanarBuffer::new(desc.format, desc.extent);

    let extent = desc.extent;

    for z in 0..extent.depth {
        for y in 0..extent.height {
            for x in 0..extent.width {
                let texel = content.texel_mut(0, x, y, z);

                match desc.format {
                    vk::Format::R32_UINT => {
                        texel.copy_from_slice(&initial_value::<u32>(desc.op).to_le_bytes())
                    }
                    vk::Format::R32_SINT => {
                        texel.copy_from_slice(&initial_value::<i32>(desc.op).to_le_bytes())
                    }
                    vk::Format::R32_SFLOAT => {
                        let v = initial_value::<i32>(desc.op) as f32;
                        texel.copy_from_slice(&v.to_le_bytes())
                    }
                    vk::Format::R64_UINT => {
                        texel.copy_from_slice(&initial_value::<u64>(desc.op).to_le_bytes())
                    }
                    vk::Format::R64_SINT => {
                        texel.copy_from_slice(&initial_value::<i64>(desc.op).to_le_bytes())
                    }
                    _ => unreachable!("format does not support image atomics"),
                }
            }
        }
    }

    content
}

// ---------------------------------------------------------------------
// blend
// ---------------------------------------------------------------------

struct BlendStrategy;

impl Strategy for BlendStrategy {
    fn check_support(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Blend(d) => d,
            _ => unreachable!(),
        };

        if params.queue != QueueClass::Universal {
            return Err(ns("draws need the universal queue"));
        }

        if ctx.device.hw().find_queue_class(QueueClass::Universal).is_none() {
            return Err(ns("no universal queue family"));
        }

        if format::blend_threshold(desc.format).is_none() {
            return Err(ns(&format!("{:?} is not a blendable attachment format", desc.format)));
        }

        let features = ctx
            .device
            .hw()
            .format_features(ctx.lib, desc.format, vk::ImageTiling::OPTIMAL);

        if !features.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT_BLEND) {
            return Err(ns(&format!("{:?} lacks attachment blending", desc.format)));
        }

        if desc.uses_dual_source() && !ctx.device.enabled().dual_src_blend {
            return Err(ns("dual-source blending not supported"));
        }

        let usage = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC;
        check_image_creatable(
            ctx,
            desc.format,
            vk::ImageTiling::OPTIMAL,
            usage,
            vk::ImageCreateFlags::empty(),
            desc.extent,
        )?;

        let frag = if desc.uses_dual_source() {
            QUAD_FRAGMENT_DUAL_SHADER
        } else {
            QUAD_FRAGMENT_SHADER
        };

        if ctx.shaders.get(QUAD_VERTEX_SHADER).is_none() || ctx.shaders.get(frag).is_none() {
            return Err(ns("quad programs not in the catalog"));
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Blend(d) => d,
            _ => unreachable!(),
        };

        let queue = select_queue(ctx, QueueClass::Universal, false)?;
        let pool = cmd::Pool::new(ctx.device, &cmd::PoolCfg { queue_index: queue.family_index() })
            .map_err(ierr)?;

        let color_image = memory::Image::new(
            ctx.device,
            &memory::ImageCfg {
                format: desc.format,
                extent: desc.extent,
                tiling: vk::ImageTiling::OPTIMAL,
                usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
                layers: 1,
                mip_levels: 1,
                properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                disjoint: false,
                sparse: false,
                protected: false,
            },
        )
        .map_err(ierr)?;

        let render_pass = graphics::RenderPass::new(ctx.device, desc.format).map_err(ierr)?;
        let framebuffer =
            graphics::Framebuffer::new(ctx.device, &render_pass, &color_image).map_err(ierr)?;

        let vertex_shader = ctx.shaders.load(ctx.device, QUAD_VERTEX_SHADER).map_err(ierr)?;
        let frag_name = if desc.uses_dual_source() {
            QUAD_FRAGMENT_DUAL_SHADER
        } else {
            QUAD_FRAGMENT_SHADER
        };
        let fragment_shader = ctx.shaders.load(ctx.device, frag_name).map_err(ierr)?;

        let vertices = quad_vertices(desc);
        let vertex_buf = staging_with(
            ctx,
            bytemuck::cast_slice(&vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        let pipelines: Vec<graphics::BlendPipeline> = desc
            .quads
            .iter()
            .map(|q| {
                graphics::BlendPipeline::new(
                    ctx.device,
                    &graphics::BlendPipelineCfg {
                        vertex_shader: &vertex_shader,
                        fragment_shader: &fragment_shader,
                        render_pass: &render_pass,
                        extent: vk::Extent2D {
                            width: desc.extent.width,
                            height: desc.extent.height,
                        },
                        blend: q.state,
                        blend_constant: desc.blend_constant,
                    },
                )
            })
            .collect::<Result<_, _>>()
            .map_err(ierr)?;

        let read_buf = memory::Buffer::new(
            ctx.device,
            &memory::BufferCfg {
                size: PlanarBuffer::new(desc.format, desc.extent).byte_size(),
                usage: vk::BufferUsageFlags::TRANSFER_DST,
                properties: vk::MemoryPropertyFlags::HOST_VISIBLE,
                device_address: false,
                protected: false,
                queue_families: &[],
            },
        )
        .map_err(ierr)?;

        let rec = pool.allocate().map_err(ierr)?;

        rec.begin_render_pass(&render_pass, &framebuffer, desc.clear_color);
        rec.bind_vertex_buffer(&vertex_buf);

        for (i, pipe) in pipelines.iter().enumerate() {
            rec.bind_blend_pipeline(pipe);
            rec.draw(6, 1, i as u32 * 6, 0);
        }

        rec.end_render_pass();

        // the pass leaves the attachment in TRANSFER_SRC; order the
        // attachment writes against the readback copy
        rec.image_barrier(
            &color_image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::PipelineStageFlags::TRANSFER,
        );

        rec.read_image(&color_image, &read_buf);

        rec.buffer_barrier(
            &read_buf,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::HOST_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::HOST,
        );

        let exec = rec.commit().map_err(ierr)?;
        queue.exec(&exec, &[], false, SUBMIT_TIMEOUT_NS).map_err(ierr)?;

        let mirror = readback::from_staging(&read_buf, desc.format, desc.extent).map_err(ierr)?;

        let expected = reference::blend::rasterize(desc);
        let threshold = format::blend_threshold(desc.format).expect("checked during support");

        compare::compare_threshold(mirror.content(), &expected, threshold)
            .map_err(|e| CaseError::Comparison(e.to_string()))
    }
}

/// Two CCW triangles per quad, at pixel-boundary NDC coordinates
fn quad_vertices(desc: &BlendDesc) -> Vec<graphics::QuadVertex> {
    let w = desc.extent.width as f32;
    let h = desc.extent.height as f32;

    let mut vertices = Vec::with_capacity(desc.quads.len() * 6);

    for quad in &desc.quads {
        let x0 = 2.0 * quad.rect.x as f32 / w - 1.0;
        let y0 = 2.0 * quad.rect.y as f32 / h - 1.0;
        let x1 = 2.0 * (quad.rect.x + quad.rect.width) as f32 / w - 1.0;
        let y1 = 2.0 * (quad.rect.y + quad.rect.height) as f32 / h - 1.0;

        let corners = [
            [x0, y0],
            [x1, y0],
            [x0, y1],
            [x1, y0],
            [x1, y1],
            [x0, y1],
        ];

        for c in corners {
            vertices.push(graphics::QuadVertex {
                position: [c[0], c[1], 0.0, 1.0],
                color: quad.color,
                color1: quad.color1,
            });
        }
    }

    vertices
}

// ---------------------------------------------------------------------
// query
// ---------------------------------------------------------------------

struct QueryStrategy;

impl Strategy for QueryStrategy {
    fn check_support(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Query(d) => d,
            _ => unreachable!(),
        };

        if format::describe(desc.format).is_none() {
            return Err(ns(&format!("{:?} outside the supported format set", desc.format)));
        }

        let usage = vk::ImageUsageFlags::TRANSFER_SRC;

        let props = match ctx.device.hw().image_format_properties(
            ctx.lib,
            desc.format,
            desc.tiling,
            usage,
            vk::ImageCreateFlags::empty(),
        ) {
            Some(p) => p,
            None => return Err(ns(&format!("{:?} unusable with {:?}", desc.format, desc.tiling))),
        };

        if desc.extent.width > props.max_extent.width
            || desc.extent.height > props.max_extent.height
            || desc.extent.depth > props.max_extent.depth
        {
            return Err(ns("extent over the device limit"));
        }

        if desc.effective_mip_levels() > props.max_mip_levels {
            return Err(ns("mip chain longer than the device supports"));
        }

        if desc.array_layers.max(1) > props.max_array_layers {
            return Err(ns("more array layers than the device supports"));
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, params: &ParameterSet) -> Result<(), CaseError> {
        let desc = match &params.operation {
            Operation::Query(d) => d,
            _ => unreachable!(),
        };

        let image = memory::Image::new(
            ctx.device,
            &memory::ImageCfg {
                format: desc.format,
                extent: desc.extent,
                tiling: desc.tiling,
                usage: vk::ImageUsageFlags::TRANSFER_SRC,
                layers: desc.array_layers.max(1),
                mip_levels: desc.effective_mip_levels(),
                properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                disjoint: false,
                sparse: false,
                protected: false,
            },
        )
        .map_err(ierr)?;

        // the driver-reported allocation must hold the algebraically
        // derived subresource tree
        let reported = unsafe {
            ctx.device.device().get_image_memory_requirements(image.image())
        };

        let min_bytes = reference::query::min_total_bytes(desc);

        if reported.size < min_bytes {
            return Err(CaseError::Comparison(format!(
                "allocation of {} bytes can not hold the {} byte subresource tree",
                reported.size, min_bytes
            )));
        }

        // linear images additionally expose per-level layouts to check
        // against the derived extents
        if desc.tiling == vk::ImageTiling::LINEAR {
            for (level, extent) in reference::query::mip_extents(desc).iter().enumerate() {
                let layout = image.subresource_layout(vk::ImageAspectFlags::COLOR, level as u32);
                let min_row = reference::query::min_row_bytes(desc, level as u32);

                if layout.row_pitch < min_row {
                    return Err(CaseError::Comparison(format!(
                        "level {} row pitch {} below the {} byte row of extent {:?}",
                        level, layout.row_pitch, min_row, extent
                    )));
                }
            }
        }

        Ok(())
    }
}
