//! Declarative case parameters
//!
//! A [`ParameterSet`] fully specifies one case: the operation to exercise,
//! the formats and extents involved and the capability flags it relies on.
//! It is created once at registration time and never mutated; every later
//! stage (resource building, recording, reference computation, comparison)
//! derives from it

use ash::vk;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::format;

/// Structure specifying a three-dimensional extent
///
#[doc = "Ash documentation: <https://docs.rs/ash/latest/ash/vk/struct.Extent3D.html>"]
pub type Extent3D = vk::Extent3D;

/// Specifying the tiling arrangement of texel blocks in an image
///
#[doc = "Vulkan documentation: <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkImageTiling.html>"]
pub type Tiling = vk::ImageTiling;

/// Queue class a case submits to
///
/// Requesting a dedicated class on a device that exposes none is a
/// not-supported outcome, never a silent fallback to the universal queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueClass {
    /// Graphics + compute capable family
    Universal,
    /// Transfer-only family (no graphics, no compute bits)
    DedicatedTransfer,
    /// Compute-only family (no graphics bit)
    DedicatedCompute,
}

/// One copy region between two image planes, in plane texel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRegion {
    pub src_plane: u32,
    pub dst_plane: u32,
    pub src_offset: [i32; 3],
    pub dst_offset: [i32; 3],
    pub extent: Extent3D,
}

impl ImageRegion {
    /// Region validity is established at generation time; this is the
    /// predicate the generator guarantees
    pub fn fits(&self, src_plane_extent: Extent3D, dst_plane_extent: Extent3D) -> bool {
        let fits_axis = |off: i32, len: u32, bound: u32| -> bool {
            off >= 0 && (off as u64 + len as u64) <= bound as u64
        };

        fits_axis(self.src_offset[0], self.extent.width, src_plane_extent.width)
            && fits_axis(self.src_offset[1], self.extent.height, src_plane_extent.height)
            && fits_axis(self.src_offset[2], self.extent.depth, src_plane_extent.depth)
            && fits_axis(self.dst_offset[0], self.extent.width, dst_plane_extent.width)
            && fits_axis(self.dst_offset[1], self.extent.height, dst_plane_extent.height)
            && fits_axis(self.dst_offset[2], self.extent.depth, dst_plane_extent.depth)
    }
}

/// One copy region between two buffers, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

/// Indirect execution parameters for a copy
///
/// `stride` is the distance between consecutive command records in the
/// parameter buffer; it must never be smaller than the record itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectCfg {
    pub stride: u32,
}

/// Data flow of a copy case
#[derive(Debug, Clone)]
pub enum CopyKind {
    /// Buffer to buffer, optionally sourced from the on-disk fixture
    BufferToBuffer {
        size: u64,
        regions: Vec<BufferRegion>,
        from_fixture: bool,
    },
    BufferToImage {
        regions: Vec<ImageRegion>,
    },
    ImageToBuffer {
        regions: Vec<ImageRegion>,
    },
    ImageToImage {
        regions: Vec<ImageRegion>,
    },
}

/// Copy case description
#[derive(Debug, Clone)]
pub struct CopyDesc {
    pub kind: CopyKind,
    pub src_format: vk::Format,
    pub dst_format: vk::Format,
    pub src_extent: Extent3D,
    pub dst_extent: Extent3D,
    pub tiling: Tiling,
    /// Bind each plane of a multi-planar image to its own allocation
    pub disjoint: bool,
    pub sparse: bool,
    pub protected: bool,
    /// Issue one indirect command over a parameter buffer instead of
    /// discrete copy commands
    pub indirect: Option<IndirectCfg>,
}

/// Read-modify-write operation performed by every invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicOp {
    Add,
    Sub,
    Inc,
    Dec,
    Min,
    Max,
    And,
    Or,
    Xor,
    Exchange,
    CompareExchange,
}

impl AtomicOp {
    /// An order-independent operation is one for which the end result does
    /// not depend on the order in which the operations are carried
    /// (commutative and associative)
    pub fn is_order_independent(self) -> bool {
        !matches!(self, AtomicOp::Exchange | AtomicOp::CompareExchange)
    }

    /// Stable lowercase token, used in case and program names
    pub fn name(self) -> &'static str {
        match self {
            AtomicOp::Add => "add",
            AtomicOp::Sub => "sub",
            AtomicOp::Inc => "inc",
            AtomicOp::Dec => "dec",
            AtomicOp::Min => "min",
            AtomicOp::Max => "max",
            AtomicOp::And => "and",
            AtomicOp::Or => "or",
            AtomicOp::Xor => "xor",
            AtomicOp::Exchange => "exchange",
            AtomicOp::CompareExchange => "compare_exchange",
        }
    }
}

/// Which observable of the atomic dispatch is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicCheck {
    /// Final per-pixel value after all invocations
    EndResult,
    /// The value each invocation observed from its own atomic call
    IntermediateValues,
}

/// Atomic case description
#[derive(Debug, Clone)]
pub struct AtomicDesc {
    pub op: AtomicOp,
    pub check: AtomicCheck,
    /// R32_UINT, R32_SINT, R32_SFLOAT, R64_UINT or R64_SINT
    pub format: vk::Format,
    /// Logical grid; the dispatch runs INVOCATIONS_PER_PIXEL along x
    pub extent: Extent3D,
    pub tiling: Tiling,
    pub sparse: bool,
}

/// Fixed-function blend configuration of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub src_color: vk::BlendFactor,
    pub dst_color: vk::BlendFactor,
    pub color_op: vk::BlendOp,
    pub src_alpha: vk::BlendFactor,
    pub dst_alpha: vk::BlendFactor,
    pub alpha_op: vk::BlendOp,
    pub write_mask: vk::ColorComponentFlags,
}

impl BlendState {
    /// True when any factor reads the second fragment color
    pub fn uses_dual_source(&self) -> bool {
        let dual = |f: vk::BlendFactor| {
            matches!(
                f,
                vk::BlendFactor::SRC1_COLOR
                    | vk::BlendFactor::ONE_MINUS_SRC1_COLOR
                    | vk::BlendFactor::SRC1_ALPHA
                    | vk::BlendFactor::ONE_MINUS_SRC1_ALPHA
            )
        };

        dual(self.src_color) || dual(self.dst_color) || dual(self.src_alpha) || dual(self.dst_alpha)
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One flat-colored quad blended over the attachment
#[derive(Debug, Clone, Copy)]
pub struct BlendQuad {
    pub rect: QuadRect,
    pub color: [f32; 4],
    /// Second source color, read by SRC1_* factors
    pub color1: [f32; 4],
    pub state: BlendState,
}

/// Blend case description
#[derive(Debug, Clone)]
pub struct BlendDesc {
    pub format: vk::Format,
    pub extent: Extent3D,
    pub clear_color: [f32; 4],
    pub blend_constant: [f32; 4],
    pub quads: Vec<BlendQuad>,
}

impl BlendDesc {
    pub fn uses_dual_source(&self) -> bool {
        self.quads.iter().any(|q| q.state.uses_dual_source())
    }
}

/// Format query case: mip-chain geometry derived algebraically and checked
/// against what the device reports
#[derive(Debug, Clone)]
pub struct QueryDesc {
    pub format: vk::Format,
    pub extent: Extent3D,
    /// 0 requests the full chain down to 1x1x1
    pub mip_levels: u32,
    pub array_layers: u32,
    pub tiling: Tiling,
}

impl QueryDesc {
    /// Levels in the full mip chain of `extent`
    pub fn full_mip_count(extent: Extent3D) -> u32 {
        let largest = extent.width.max(extent.height).max(extent.depth).max(1);
        32 - largest.leading_zeros()
    }

    pub fn effective_mip_levels(&self) -> u32 {
        if self.mip_levels == 0 {
            Self::full_mip_count(self.extent)
        } else {
            self.mip_levels
        }
    }
}

/// The operation a case exercises
#[derive(Debug, Clone)]
pub enum Operation {
    Copy(CopyDesc),
    Atomic(AtomicDesc),
    Blend(BlendDesc),
    Query(QueryDesc),
}

/// Immutable, fully-specified description of one case
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub name: String,
    pub operation: Operation,
    pub queue: QueueClass,
    /// Seed for deterministic region generation; cases are reproducible
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(name: &str, operation: Operation) -> ParameterSet {
        ParameterSet {
            name: name.to_owned(),
            operation,
            queue: QueueClass::Universal,
            seed: 0x6792903,
        }
    }

    pub fn with_queue(mut self, queue: QueueClass) -> ParameterSet {
        self.queue = queue;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> ParameterSet {
        self.seed = seed;
        self
    }
}

/// Deterministically generate `count` copy regions between the planes of
/// `src_format` and `dst_format`
///
/// Each region picks a plane pair whose texels occupy the same number of
/// bytes, then a random offset/extent fitting inside both planes. The
/// caller's extents must be multiples of every plane divisor
pub fn generate_image_regions(
    seed: u64,
    src_format: vk::Format,
    src_extent: Extent3D,
    dst_format: vk::Format,
    dst_extent: Extent3D,
    count: usize,
) -> Vec<ImageRegion> {
    let src_desc = format::describe(src_format).expect("unknown source format");
    let dst_desc = format::describe(dst_format).expect("unknown destination format");

    let mut pairs: Vec<(u32, u32)> = Vec::new();

    for src_plane in 0..src_desc.plane_count() {
        for dst_plane in 0..dst_desc.plane_count() {
            if format::copy_compatible(
                src_desc.plane_format(src_plane),
                dst_desc.plane_format(dst_plane),
            ) {
                pairs.push((src_plane, dst_plane));
            }
        }
    }

    assert!(!pairs.is_empty(), "formats share no copy-compatible planes");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut regions = Vec::with_capacity(count);

    for _ in 0..count {
        let (src_plane, dst_plane) = pairs[rng.gen_range(0..pairs.len())];

        let src_plane_extent = src_desc.plane_extent(src_extent, src_plane);
        let dst_plane_extent = dst_desc.plane_extent(dst_extent, dst_plane);

        let max_width = src_plane_extent.width.min(dst_plane_extent.width);
        let max_height = src_plane_extent.height.min(dst_plane_extent.height);

        let width = rng.gen_range(1..=max_width);
        let height = rng.gen_range(1..=max_height);

        let src_offset = [
            rng.gen_range(0..=(src_plane_extent.width - width)) as i32,
            rng.gen_range(0..=(src_plane_extent.height - height)) as i32,
            0,
        ];
        let dst_offset = [
            rng.gen_range(0..=(dst_plane_extent.width - width)) as i32,
            rng.gen_range(0..=(dst_plane_extent.height - height)) as i32,
            0,
        ];

        let region = ImageRegion {
            src_plane,
            dst_plane,
            src_offset,
            dst_offset,
            extent: Extent3D { width, height, depth: 1 },
        };

        debug_assert!(region.fits(src_plane_extent, dst_plane_extent));

        regions.push(region);
    }

    regions
}

/// Deterministically generate `count` buffer copy regions inside
/// `[0, size)` on both sides, non-overlapping on the destination
pub fn generate_buffer_regions(seed: u64, size: u64, count: usize) -> Vec<BufferRegion> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut regions = Vec::with_capacity(count);

    let slot = size / count as u64;
    assert!(slot > 0, "buffer too small for the requested region count");

    for i in 0..count {
        let len = rng.gen_range(1..=slot);
        let src_offset = rng.gen_range(0..=(size - len));
        // destination slots are disjoint so the reference is order-free
        let dst_offset = i as u64 * slot + rng.gen_range(0..=(slot - len));

        regions.push(BufferRegion { src_offset, dst_offset, size: len });
    }

    regions
}
