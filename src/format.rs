//! Static format description tables
//!
//! Process-wide read-only data: texel sizes, numeric classes, channel bit
//! depths, plane layouts of multi-planar formats and the comparison
//! thresholds derived from channel widths
//!
//! Vulkan documentation <https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkFormat.html>

use ash::vk;

use half::f16;

/// Image formats
///
#[doc = "Values: <https://docs.rs/ash/latest/ash/vk/struct.Format.html>"]
pub type ImageFormat = vk::Format;

/// Numeric interpretation of a format's channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericClass {
    UnsignedNormalized,
    SignedNormalized,
    UnsignedInt,
    SignedInt,
    Float,
    UnsignedFloat,
}

impl NumericClass {
    /// Fixed-point classes clamp blend inputs before the blend equation
    pub fn is_fixed_point(self) -> bool {
        matches!(
            self,
            NumericClass::UnsignedNormalized | NumericClass::SignedNormalized
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, NumericClass::UnsignedInt | NumericClass::SignedInt)
    }
}

/// Memory layout of one plane of a multi-planar format
#[derive(Debug, Clone, Copy)]
pub struct PlaneDesc {
    /// Single-plane format with the identical per-texel memory layout
    pub compatible: vk::Format,
    /// Width/height subsampling relative to the logical image extent
    pub divisor: (u32, u32),
    /// Bytes per texel of the plane
    pub element_size: u32,
}

/// Description of one format's memory and numeric properties
#[derive(Debug, Clone, Copy)]
pub struct FormatDesc {
    pub format: vk::Format,
    /// Bytes per texel; 0 for multi-planar formats (ask the planes)
    pub texel_size: u32,
    pub class: NumericClass,
    /// Bit depth per channel in RGBA order, 0 when the channel is absent
    pub channel_bits: [u32; 4],
    /// Stored blue-first; threshold vectors are swizzled to match
    pub bgr_order: bool,
    /// Low bits of each 16-bit word that carry no defined data
    pub dont_care_low_bits: u32,
    /// Empty for single-plane formats
    pub planes: &'static [PlaneDesc],
}

impl FormatDesc {
    pub fn is_multi_planar(&self) -> bool {
        self.planes.len() > 1
    }

    pub fn plane_count(&self) -> u32 {
        if self.planes.is_empty() { 1 } else { self.planes.len() as u32 }
    }

    /// Extent of plane `plane` for a logical image extent
    ///
    /// Subsampled planes are smaller than the image by their divisor
    pub fn plane_extent(&self, extent: vk::Extent3D, plane: u32) -> vk::Extent3D {
        if self.planes.is_empty() {
            return extent;
        }

        let desc = &self.planes[plane as usize];

        vk::Extent3D {
            width: extent.width / desc.divisor.0,
            height: extent.height / desc.divisor.1,
            depth: extent.depth,
        }
    }

    /// Bytes per texel of plane `plane`
    pub fn plane_element_size(&self, plane: u32) -> u32 {
        if self.planes.is_empty() {
            self.texel_size
        } else {
            self.planes[plane as usize].element_size
        }
    }

    /// Plane-compatible single-plane format, or the format itself
    pub fn plane_format(&self, plane: u32) -> vk::Format {
        if self.planes.is_empty() {
            self.format
        } else {
            self.planes[plane as usize].compatible
        }
    }
}

const PLANES_G8_B8_R8_420: [PlaneDesc; 3] = [
    PlaneDesc { compatible: vk::Format::R8_UNORM, divisor: (1, 1), element_size: 1 },
    PlaneDesc { compatible: vk::Format::R8_UNORM, divisor: (2, 2), element_size: 1 },
    PlaneDesc { compatible: vk::Format::R8_UNORM, divisor: (2, 2), element_size: 1 },
];

const PLANES_G8_B8R8_420: [PlaneDesc; 2] = [
    PlaneDesc { compatible: vk::Format::R8_UNORM, divisor: (1, 1), element_size: 1 },
    PlaneDesc { compatible: vk::Format::R8G8_UNORM, divisor: (2, 2), element_size: 2 },
];

const PLANES_G10X6_B10X6R10X6_420: [PlaneDesc; 2] = [
    PlaneDesc { compatible: vk::Format::R10X6_UNORM_PACK16, divisor: (1, 1), element_size: 2 },
    PlaneDesc { compatible: vk::Format::R10X6G10X6_UNORM_2PACK16, divisor: (2, 2), element_size: 4 },
];

const PLANES_G12X4_B12X4R12X4_420: [PlaneDesc; 2] = [
    PlaneDesc { compatible: vk::Format::R12X4_UNORM_PACK16, divisor: (1, 1), element_size: 2 },
    PlaneDesc { compatible: vk::Format::R12X4G12X4_UNORM_2PACK16, divisor: (2, 2), element_size: 4 },
];

const PLANES_G16_B16R16_420: [PlaneDesc; 2] = [
    PlaneDesc { compatible: vk::Format::R16_UNORM, divisor: (1, 1), element_size: 2 },
    PlaneDesc { compatible: vk::Format::R16G16_UNORM, divisor: (2, 2), element_size: 4 },
];

macro_rules! fmt_desc {
    ($format:expr, $size:expr, $class:expr, $bits:expr, $bgr:expr, $dc:expr, $planes:expr) => {
        FormatDesc {
            format: $format,
            texel_size: $size,
            class: $class,
            channel_bits: $bits,
            bgr_order: $bgr,
            dont_care_low_bits: $dc,
            planes: $planes,
        }
    };
}

/// Every format the harness knows how to build, copy, blend into or verify
static FORMAT_TABLE: [FormatDesc; 28] = [
    fmt_desc!(vk::Format::R8_UNORM, 1, NumericClass::UnsignedNormalized, [8, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R8G8_UNORM, 2, NumericClass::UnsignedNormalized, [8, 8, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R8G8B8A8_UNORM, 4, NumericClass::UnsignedNormalized, [8, 8, 8, 8], false, 0, &[]),
    fmt_desc!(vk::Format::B8G8R8A8_UNORM, 4, NumericClass::UnsignedNormalized, [8, 8, 8, 8], true, 0, &[]),
    fmt_desc!(vk::Format::R8G8B8A8_SNORM, 4, NumericClass::SignedNormalized, [8, 8, 8, 8], false, 0, &[]),
    fmt_desc!(vk::Format::R8G8B8A8_UINT, 4, NumericClass::UnsignedInt, [8, 8, 8, 8], false, 0, &[]),
    fmt_desc!(vk::Format::R8G8B8A8_SINT, 4, NumericClass::SignedInt, [8, 8, 8, 8], false, 0, &[]),
    fmt_desc!(vk::Format::R4G4B4A4_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [4, 4, 4, 4], false, 0, &[]),
    fmt_desc!(vk::Format::R5G6B5_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [5, 6, 5, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R5G5B5A1_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [5, 5, 5, 1], false, 0, &[]),
    fmt_desc!(vk::Format::A1R5G5B5_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [5, 5, 5, 1], false, 0, &[]),
    fmt_desc!(vk::Format::A2B10G10R10_UNORM_PACK32, 4, NumericClass::UnsignedNormalized, [10, 10, 10, 2], false, 0, &[]),
    fmt_desc!(vk::Format::R16_UNORM, 2, NumericClass::UnsignedNormalized, [16, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R16G16_UNORM, 4, NumericClass::UnsignedNormalized, [16, 16, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R16G16B16A16_SFLOAT, 8, NumericClass::Float, [16, 16, 16, 16], false, 0, &[]),
    fmt_desc!(vk::Format::R32_UINT, 4, NumericClass::UnsignedInt, [32, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R32_SINT, 4, NumericClass::SignedInt, [32, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R32_SFLOAT, 4, NumericClass::Float, [32, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R32G32B32A32_SFLOAT, 16, NumericClass::Float, [32, 32, 32, 32], false, 0, &[]),
    fmt_desc!(vk::Format::R64_UINT, 8, NumericClass::UnsignedInt, [64, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R64_SINT, 8, NumericClass::SignedInt, [64, 0, 0, 0], false, 0, &[]),
    fmt_desc!(vk::Format::R10X6_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [10, 0, 0, 0], false, 6, &[]),
    fmt_desc!(vk::Format::R10X6G10X6_UNORM_2PACK16, 4, NumericClass::UnsignedNormalized, [10, 10, 0, 0], false, 6, &[]),
    fmt_desc!(vk::Format::R12X4_UNORM_PACK16, 2, NumericClass::UnsignedNormalized, [12, 0, 0, 0], false, 4, &[]),
    fmt_desc!(vk::Format::R12X4G12X4_UNORM_2PACK16, 4, NumericClass::UnsignedNormalized, [12, 12, 0, 0], false, 4, &[]),
    fmt_desc!(vk::Format::G8_B8_R8_3PLANE_420_UNORM, 0, NumericClass::UnsignedNormalized, [8, 8, 8, 0], false, 0, &PLANES_G8_B8_R8_420),
    fmt_desc!(vk::Format::G8_B8R8_2PLANE_420_UNORM, 0, NumericClass::UnsignedNormalized, [8, 8, 8, 0], false, 0, &PLANES_G8_B8R8_420),
    fmt_desc!(vk::Format::G16_B16R16_2PLANE_420_UNORM, 0, NumericClass::UnsignedNormalized, [16, 16, 16, 0], false, 0, &PLANES_G16_B16R16_420),
];

/// Multi-planar formats whose 16-bit words carry undefined low bits;
/// they compare under a mask
static MASKED_FORMAT_TABLE: [FormatDesc; 2] = [
    fmt_desc!(vk::Format::G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16, 0, NumericClass::UnsignedNormalized, [10, 10, 10, 0], false, 6, &PLANES_G10X6_B10X6R10X6_420),
    fmt_desc!(vk::Format::G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16, 0, NumericClass::UnsignedNormalized, [12, 12, 12, 0], false, 4, &PLANES_G12X4_B12X4R12X4_420),
];

/// Look up the description of `format`
///
/// Returns `None` for formats outside the supported set
pub fn describe(format: vk::Format) -> Option<&'static FormatDesc> {
    FORMAT_TABLE
        .iter()
        .chain(MASKED_FORMAT_TABLE.iter())
        .find(|d| d.format == format)
}

/// Aspect flag addressing plane `plane` of a multi-planar image
pub fn plane_aspect(plane: u32) -> vk::ImageAspectFlags {
    match plane {
        0 => vk::ImageAspectFlags::PLANE_0,
        1 => vk::ImageAspectFlags::PLANE_1,
        2 => vk::ImageAspectFlags::PLANE_2,
        _ => unreachable!("plane index out of range"),
    }
}

/// Aspect for copies touching plane `plane`: single-plane images use COLOR
pub fn copy_aspect(desc: &FormatDesc, plane: u32) -> vk::ImageAspectFlags {
    if desc.is_multi_planar() {
        plane_aspect(plane)
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Two plane formats may copy between each other iff their texels occupy
/// the same number of bytes
pub fn copy_compatible(a: vk::Format, b: vk::Format) -> bool {
    match (describe(a), describe(b)) {
        (Some(da), Some(db)) => {
            !da.is_multi_planar() && !db.is_multi_planar() && da.texel_size == db.texel_size
        }
        _ => false,
    }
}

/// Number of blended primitives accumulating rounding error; the
/// per-channel thresholds below are calibrated against it
const BLENDED_QUADS: u32 = 4;

fn norm_channel_threshold(class: NumericClass, bits: u32) -> f32 {
    match class {
        NumericClass::UnsignedNormalized => {
            BLENDED_QUADS as f32 / ((1u64 << bits) - 1) as f32
        }
        NumericClass::SignedNormalized => {
            BLENDED_QUADS as f32 / ((1u64 << (bits - 1)) - 1) as f32
        }
        _ => unreachable!("threshold formula applies to fixed-point formats only"),
    }
}

/// Per-channel comparison threshold for rendered output in `format`
///
/// The values encode acceptable rounding error for specific device
/// rounding behaviors; they are a fixed table, not a derivation
pub fn blend_threshold(format: vk::Format) -> Option<[f32; 4]> {
    let desc = describe(format)?;

    let t = match format {
        vk::Format::R4G4B4A4_UNORM_PACK16 => {
            let c = norm_channel_threshold(desc.class, 4);
            [c, c, c, c]
        }
        vk::Format::R5G6B5_UNORM_PACK16 => [
            norm_channel_threshold(desc.class, 5),
            norm_channel_threshold(desc.class, 6),
            norm_channel_threshold(desc.class, 5),
            1.0,
        ],
        vk::Format::R5G5B5A1_UNORM_PACK16 => [
            norm_channel_threshold(desc.class, 5),
            norm_channel_threshold(desc.class, 5),
            norm_channel_threshold(desc.class, 5),
            0.1,
        ],
        vk::Format::A1R5G5B5_UNORM_PACK16 => [
            0.1,
            norm_channel_threshold(desc.class, 5),
            norm_channel_threshold(desc.class, 5),
            norm_channel_threshold(desc.class, 5),
        ],
        vk::Format::A2B10G10R10_UNORM_PACK32 => [
            norm_channel_threshold(desc.class, 10),
            norm_channel_threshold(desc.class, 10),
            norm_channel_threshold(desc.class, 10),
            0.34,
        ],
        vk::Format::R16G16B16A16_SFLOAT => [0.005; 4],
        vk::Format::R32_SFLOAT | vk::Format::R32G32B32A32_SFLOAT => [0.00001; 4],
        _ if desc.class.is_fixed_point() => {
            let mut t = [1.0f32; 4];
            for (slot, &bits) in t.iter_mut().zip(desc.channel_bits.iter()) {
                if bits > 0 {
                    *slot = norm_channel_threshold(desc.class, bits);
                }
            }
            t
        }
        _ => return None,
    };

    if desc.bgr_order {
        Some([t[2], t[1], t[0], t[3]])
    } else {
        Some(t)
    }
}

/// Byte mask for masked comparison at byte offset `byte_index` within a
/// plane whose texels carry `dont_care_low_bits` undefined bits
///
/// Texels are 16-bit little endian words; the undefined bits sit in the
/// low byte
pub fn dont_care_byte_mask(dont_care_low_bits: u32, byte_index: usize) -> u8 {
    if byte_index & 0x1 != 0 {
        return 0xff;
    }

    match dont_care_low_bits {
        6 => 0xc0,
        4 => 0xf0,
        _ => 0xff,
    }
}

fn unorm_decode(raw: u32, bits: u32) -> f32 {
    raw as f32 / ((1u64 << bits) - 1) as f32
}

fn unorm_encode(value: f32, bits: u32) -> u32 {
    let max = ((1u64 << bits) - 1) as f32;
    (value.clamp(0.0, 1.0) * max + 0.5) as u32
}

fn snorm_decode(raw: i32, bits: u32) -> f32 {
    let max = ((1u64 << (bits - 1)) - 1) as f32;
    (raw as f32 / max).max(-1.0)
}

fn snorm_encode(value: f32, bits: u32) -> i32 {
    let max = ((1u64 << (bits - 1)) - 1) as f32;
    let v = value.clamp(-1.0, 1.0) * max;
    if v >= 0.0 { (v + 0.5) as i32 } else { (v - 0.5) as i32 }
}

/// Decode one texel into RGBA floats
///
/// Integer-class formats decode to their numeric value casted; absent
/// channels read 0 (alpha 1)
pub fn decode_texel(desc: &FormatDesc, bytes: &[u8]) -> [f32; 4] {
    debug_assert!(bytes.len() >= desc.texel_size as usize);

    let mut rgba = [0.0, 0.0, 0.0, 1.0];

    match desc.format {
        vk::Format::R8_UNORM => {
            rgba[0] = unorm_decode(bytes[0] as u32, 8);
        }
        vk::Format::R8G8_UNORM => {
            rgba[0] = unorm_decode(bytes[0] as u32, 8);
            rgba[1] = unorm_decode(bytes[1] as u32, 8);
        }
        vk::Format::R8G8B8A8_UNORM => {
            for c in 0..4 {
                rgba[c] = unorm_decode(bytes[c] as u32, 8);
            }
        }
        vk::Format::B8G8R8A8_UNORM => {
            rgba[0] = unorm_decode(bytes[2] as u32, 8);
            rgba[1] = unorm_decode(bytes[1] as u32, 8);
            rgba[2] = unorm_decode(bytes[0] as u32, 8);
            rgba[3] = unorm_decode(bytes[3] as u32, 8);
        }
        vk::Format::R8G8B8A8_SNORM => {
            for c in 0..4 {
                rgba[c] = snorm_decode(bytes[c] as i8 as i32, 8);
            }
        }
        vk::Format::R8G8B8A8_UINT => {
            for c in 0..4 {
                rgba[c] = bytes[c] as f32;
            }
        }
        vk::Format::R8G8B8A8_SINT => {
            for c in 0..4 {
                rgba[c] = bytes[c] as i8 as f32;
            }
        }
        vk::Format::R4G4B4A4_UNORM_PACK16 => {
            let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            rgba[0] = unorm_decode((w >> 12) & 0xf, 4);
            rgba[1] = unorm_decode((w >> 8) & 0xf, 4);
            rgba[2] = unorm_decode((w >> 4) & 0xf, 4);
            rgba[3] = unorm_decode(w & 0xf, 4);
        }
        vk::Format::R5G6B5_UNORM_PACK16 => {
            let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            rgba[0] = unorm_decode((w >> 11) & 0x1f, 5);
            rgba[1] = unorm_decode((w >> 5) & 0x3f, 6);
            rgba[2] = unorm_decode(w & 0x1f, 5);
        }
        vk::Format::R5G5B5A1_UNORM_PACK16 => {
            let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            rgba[0] = unorm_decode((w >> 11) & 0x1f, 5);
            rgba[1] = unorm_decode((w >> 6) & 0x1f, 5);
            rgba[2] = unorm_decode((w >> 1) & 0x1f, 5);
            rgba[3] = (w & 0x1) as f32;
        }
        vk::Format::A1R5G5B5_UNORM_PACK16 => {
            let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            rgba[3] = ((w >> 15) & 0x1) as f32;
            rgba[0] = unorm_decode((w >> 10) & 0x1f, 5);
            rgba[1] = unorm_decode((w >> 5) & 0x1f, 5);
            rgba[2] = unorm_decode(w & 0x1f, 5);
        }
        vk::Format::A2B10G10R10_UNORM_PACK32 => {
            let w = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            rgba[3] = unorm_decode((w >> 30) & 0x3, 2);
            rgba[2] = unorm_decode((w >> 20) & 0x3ff, 10);
            rgba[1] = unorm_decode((w >> 10) & 0x3ff, 10);
            rgba[0] = unorm_decode(w & 0x3ff, 10);
        }
        vk::Format::R16_UNORM => {
            let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            rgba[0] = unorm_decode(w, 16);
        }
        vk::Format::R16G16_UNORM => {
            rgba[0] = unorm_decode(u16::from_le_bytes([bytes[0], bytes[1]]) as u32, 16);
            rgba[1] = unorm_decode(u16::from_le_bytes([bytes[2], bytes[3]]) as u32, 16);
        }
        vk::Format::R16G16B16A16_SFLOAT => {
            for c in 0..4 {
                let w = u16::from_le_bytes([bytes[c * 2], bytes[c * 2 + 1]]);
                rgba[c] = f16::from_bits(w).to_f32();
            }
        }
        vk::Format::R32_UINT => {
            rgba[0] = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32;
        }
        vk::Format::R32_SINT => {
            rgba[0] = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32;
        }
        vk::Format::R32_SFLOAT => {
            rgba[0] = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        vk::Format::R32G32B32A32_SFLOAT => {
            for c in 0..4 {
                let off = c * 4;
                rgba[c] = f32::from_le_bytes([
                    bytes[off],
                    bytes[off + 1],
                    bytes[off + 2],
                    bytes[off + 3],
                ]);
            }
        }
        _ => unreachable!("no texel decoder for {:?}", desc.format),
    }

    rgba
}

/// Encode RGBA floats into one texel at `out`
///
/// Fixed-point formats clamp and round to nearest; float formats store the
/// value bit pattern unmodified
pub fn encode_texel(desc: &FormatDesc, rgba: [f32; 4], out: &mut [u8]) {
    debug_assert!(out.len() >= desc.texel_size as usize);

    match desc.format {
        vk::Format::R8_UNORM => {
            out[0] = unorm_encode(rgba[0], 8) as u8;
        }
        vk::Format::R8G8_UNORM => {
            out[0] = unorm_encode(rgba[0], 8) as u8;
            out[1] = unorm_encode(rgba[1], 8) as u8;
        }
        vk::Format::R8G8B8A8_UNORM => {
            for c in 0..4 {
                out[c] = unorm_encode(rgba[c], 8) as u8;
            }
        }
        vk::Format::B8G8R8A8_UNORM => {
            out[0] = unorm_encode(rgba[2], 8) as u8;
            out[1] = unorm_encode(rgba[1], 8) as u8;
            out[2] = unorm_encode(rgba[0], 8) as u8;
            out[3] = unorm_encode(rgba[3], 8) as u8;
        }
        vk::Format::R8G8B8A8_SNORM => {
            for c in 0..4 {
                out[c] = snorm_encode(rgba[c], 8) as i8 as u8;
            }
        }
        vk::Format::R8G8B8A8_UINT => {
            for c in 0..4 {
                out[c] = rgba[c] as u8;
            }
        }
        vk::Format::R8G8B8A8_SINT => {
            for c in 0..4 {
                out[c] = rgba[c] as i8 as u8;
            }
        }
        vk::Format::R4G4B4A4_UNORM_PACK16 => {
            let w = (unorm_encode(rgba[0], 4) << 12)
                | (unorm_encode(rgba[1], 4) << 8)
                | (unorm_encode(rgba[2], 4) << 4)
                | unorm_encode(rgba[3], 4);
            out[..2].copy_from_slice(&(w as u16).to_le_bytes());
        }
        vk::Format::R5G6B5_UNORM_PACK16 => {
            let w = (unorm_encode(rgba[0], 5) << 11)
                | (unorm_encode(rgba[1], 6) << 5)
                | unorm_encode(rgba[2], 5);
            out[..2].copy_from_slice(&(w as u16).to_le_bytes());
        }
        vk::Format::R5G5B5A1_UNORM_PACK16 => {
            let w = (unorm_encode(rgba[0], 5) << 11)
                | (unorm_encode(rgba[1], 5) << 6)
                | (unorm_encode(rgba[2], 5) << 1)
                | unorm_encode(rgba[3], 1);
            out[..2].copy_from_slice(&(w as u16).to_le_bytes());
        }
        vk::Format::A1R5G5B5_UNORM_PACK16 => {
            let w = (unorm_encode(rgba[3], 1) << 15)
                | (unorm_encode(rgba[0], 5) << 10)
                | (unorm_encode(rgba[1], 5) << 5)
                | unorm_encode(rgba[2], 5);
            out[..2].copy_from_slice(&(w as u16).to_le_bytes());
        }
        vk::Format::A2B10G10R10_UNORM_PACK32 => {
            let w = (unorm_encode(rgba[3], 2) << 30)
                | (unorm_encode(rgba[2], 10) << 20)
                | (unorm_encode(rgba[1], 10) << 10)
                | unorm_encode(rgba[0], 10);
            out[..4].copy_from_slice(&w.to_le_bytes());
        }
        vk::Format::R16_UNORM => {
            out[..2].copy_from_slice(&(unorm_encode(rgba[0], 16) as u16).to_le_bytes());
        }
        vk::Format::R16G16_UNORM => {
            out[..2].copy_from_slice(&(unorm_encode(rgba[0], 16) as u16).to_le_bytes());
            out[2..4].copy_from_slice(&(unorm_encode(rgba[1], 16) as u16).to_le_bytes());
        }
        vk::Format::R16G16B16A16_SFLOAT => {
            for c in 0..4 {
                let bits = f16::from_f32(rgba[c]).to_bits();
                out[c * 2..c * 2 + 2].copy_from_slice(&bits.to_le_bytes());
            }
        }
        vk::Format::R32_SFLOAT => {
            out[..4].copy_from_slice(&rgba[0].to_le_bytes());
        }
        vk::Format::R32G32B32A32_SFLOAT => {
            for c in 0..4 {
                out[c * 4..c * 4 + 4].copy_from_slice(&rgba[c].to_le_bytes());
            }
        }
        _ => unreachable!("no texel encoder for {:?}", desc.format),
    }
}
