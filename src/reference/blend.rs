//! Fixed-function blend reference
//!
//! Software evaluation of the blend equation per destination pixel. The
//! clamping rules are the load-bearing part: for fixed-point attachment
//! formats the source color, destination color, blend constant and the
//! computed factors are all clamped before the equation; floating-point
//! attachments are never clamped

use ash::vk;

use crate::format;
use crate::format::NumericClass;
use crate::params::{BlendDesc, BlendState};
use crate::pixels::PlanarBuffer;

fn clamp_vec(v: [f32; 4], class: NumericClass) -> [f32; 4] {
    let (lo, hi) = match class {
        NumericClass::UnsignedNormalized => (0.0f32, 1.0f32),
        NumericClass::SignedNormalized => (-1.0, 1.0),
        _ => return v,
    };

    [
        v[0].clamp(lo, hi),
        v[1].clamp(lo, hi),
        v[2].clamp(lo, hi),
        v[3].clamp(lo, hi),
    ]
}

#[allow(clippy::too_many_arguments)]
fn factor_component(
    factor: vk::BlendFactor,
    channel: usize,
    src: [f32; 4],
    src1: [f32; 4],
    dst: [f32; 4],
    constant: [f32; 4],
    is_alpha: bool,
) -> f32 {
    let c = channel;

    match factor {
        vk::BlendFactor::ZERO => 0.0,
        vk::BlendFactor::ONE => 1.0,
        vk::BlendFactor::SRC_COLOR => src[c],
        vk::BlendFactor::ONE_MINUS_SRC_COLOR => 1.0 - src[c],
        vk::BlendFactor::DST_COLOR => dst[c],
        vk::BlendFactor::ONE_MINUS_DST_COLOR => 1.0 - dst[c],
        vk::BlendFactor::SRC_ALPHA => src[3],
        vk::BlendFactor::ONE_MINUS_SRC_ALPHA => 1.0 - src[3],
        vk::BlendFactor::DST_ALPHA => dst[3],
        vk::BlendFactor::ONE_MINUS_DST_ALPHA => 1.0 - dst[3],
        vk::BlendFactor::CONSTANT_COLOR => constant[c],
        vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR => 1.0 - constant[c],
        vk::BlendFactor::CONSTANT_ALPHA => constant[3],
        vk::BlendFactor::ONE_MINUS_CONSTANT_ALPHA => 1.0 - constant[3],
        vk::BlendFactor::SRC_ALPHA_SATURATE => {
            if is_alpha {
                1.0
            } else {
                src[3].min(1.0 - dst[3])
            }
        }
        vk::BlendFactor::SRC1_COLOR => src1[c],
        vk::BlendFactor::ONE_MINUS_SRC1_COLOR => 1.0 - src1[c],
        vk::BlendFactor::SRC1_ALPHA => src1[3],
        vk::BlendFactor::ONE_MINUS_SRC1_ALPHA => 1.0 - src1[3],
        _ => unreachable!("blend factor outside the supported set"),
    }
}

fn apply_op(op: vk::BlendOp, src_term: f32, dst_term: f32, src: f32, dst: f32) -> f32 {
    match op {
        vk::BlendOp::ADD => src_term + dst_term,
        vk::BlendOp::SUBTRACT => src_term - dst_term,
        vk::BlendOp::REVERSE_SUBTRACT => dst_term - src_term,
        // min/max ignore the factors and act on the raw colors
        vk::BlendOp::MIN => src.min(dst),
        vk::BlendOp::MAX => src.max(dst),
        _ => unreachable!("blend op outside the supported set"),
    }
}

/// Blend one pixel
///
/// `class` is the attachment format's numeric class and controls the
/// clamping path
pub fn blend_pixel(
    state: &BlendState,
    src: [f32; 4],
    src1: [f32; 4],
    dst: [f32; 4],
    constant: [f32; 4],
    class: NumericClass,
) -> [f32; 4] {
    let src = clamp_vec(src, class);
    let src1 = clamp_vec(src1, class);
    let dst = clamp_vec(dst, class);
    let constant = clamp_vec(constant, class);

    let mut out = [0.0f32; 4];

    for c in 0..3 {
        let sf = factor_component(state.src_color, c, src, src1, dst, constant, false);
        let df = factor_component(state.dst_color, c, src, src1, dst, constant, false);

        let sf = clamp_vec([sf; 4], class)[0];
        let df = clamp_vec([df; 4], class)[0];

        out[c] = apply_op(state.color_op, src[c] * sf, dst[c] * df, src[c], dst[c]);
    }

    let sf = factor_component(state.src_alpha, 3, src, src1, dst, constant, true);
    let df = factor_component(state.dst_alpha, 3, src, src1, dst, constant, true);

    let sf = clamp_vec([sf; 4], class)[0];
    let df = clamp_vec([df; 4], class)[0];

    out[3] = apply_op(state.alpha_op, src[3] * sf, dst[3] * df, src[3], dst[3]);

    out
}

/// Rasterize the whole case: clear, then blend every quad in order
///
/// Quads are axis-aligned and fully cover each pixel they touch, so
/// coverage is exact and the only numerics in play are the blend equation
/// and the attachment format's storage rounding
pub fn rasterize(desc: &BlendDesc) -> PlanarBuffer {
    let fmt_desc = format::describe(desc.format).expect("format outside the supported set");

    assert!(
        !fmt_desc.class.is_integer(),
        "blending is undefined for integer attachment formats"
    );

    let mut target = PlanarBuffer::new(desc.format, desc.extent);

    for y in 0..desc.extent.height {
        for x in 0..desc.extent.width {
            target.write_rgba(x, y, desc.clear_color);
        }
    }

    for quad in &desc.quads {
        let x1 = (quad.rect.x + quad.rect.width).min(desc.extent.width);
        let y1 = (quad.rect.y + quad.rect.height).min(desc.extent.height);

        for y in quad.rect.y..y1 {
            for x in quad.rect.x..x1 {
                let dst = target.read_rgba(x, y);

                let blended = blend_pixel(
                    &quad.state,
                    quad.color,
                    quad.color1,
                    dst,
                    desc.blend_constant,
                    fmt_desc.class,
                );

                let masked = [
                    if quad.state.write_mask.contains(vk::ColorComponentFlags::R) {
                        blended[0]
                    } else {
                        dst[0]
                    },
                    if quad.state.write_mask.contains(vk::ColorComponentFlags::G) {
                        blended[1]
                    } else {
                        dst[1]
                    },
                    if quad.state.write_mask.contains(vk::ColorComponentFlags::B) {
                        blended[2]
                    } else {
                        dst[2]
                    },
                    if quad.state.write_mask.contains(vk::ColorComponentFlags::A) {
                        blended[3]
                    } else {
                        dst[3]
                    },
                ];

                target.write_rgba(x, y, masked);
            }
        }
    }

    target
}
