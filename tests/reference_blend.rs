use ash::vk;

use vkverify::format;
use vkverify::format::NumericClass;
use vkverify::params::{BlendDesc, BlendQuad, BlendState, QuadRect};
use vkverify::reference::blend::{blend_pixel, rasterize};

fn simple_state(
    src_color: vk::BlendFactor,
    dst_color: vk::BlendFactor,
) -> BlendState {
    BlendState {
        src_color,
        dst_color,
        color_op: vk::BlendOp::ADD,
        src_alpha: src_color,
        dst_alpha: dst_color,
        alpha_op: vk::BlendOp::ADD,
        write_mask: vk::ColorComponentFlags::RGBA,
    }
}

fn full_quad(extent: u32, color: [f32; 4], state: BlendState) -> BlendQuad {
    BlendQuad {
        rect: QuadRect { x: 0, y: 0, width: extent, height: extent },
        color,
        color1: [0.0; 4],
        state,
    }
}

#[test]
fn constant_color_blend_clamps_on_fixed_point_targets() {
    // out-of-range constant (2.0, 0.5, -1.0, 1.0) times out-of-range quad
    // color (2.0, 0.5, 1.0, -1.0) on UNORM: both clamp before the
    // equation, so the result is (1.0, 0.25, 0.0, 0.0)
    let desc = BlendDesc {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D { width: 4, height: 4, depth: 1 },
        clear_color: [0.0, 0.0, 0.0, 0.0],
        blend_constant: [2.0, 0.5, -1.0, 1.0],
        quads: vec![full_quad(
            4,
            [2.0, 0.5, 1.0, -1.0],
            simple_state(vk::BlendFactor::CONSTANT_COLOR, vk::BlendFactor::ZERO),
        )],
    };

    let out = rasterize(&desc);
    let got = out.read_rgba(1, 2);

    let expect = [1.0, 0.25, 0.0, 0.0];

    for c in 0..4 {
        assert!(
            (got[c] - expect[c]).abs() <= 1.0 / 255.0,
            "channel {}: got {}, expected {}",
            c,
            got[c],
            expect[c]
        );
    }
}

#[test]
fn float_targets_never_clamp() {
    let unclamped = blend_pixel(
        &simple_state(vk::BlendFactor::ONE, vk::BlendFactor::ZERO),
        [2.0, -3.0, 0.5, 10.0],
        [0.0; 4],
        [0.0; 4],
        [0.0; 4],
        NumericClass::Float,
    );

    assert_eq!(unclamped, [2.0, -3.0, 0.5, 10.0]);

    let clamped = blend_pixel(
        &simple_state(vk::BlendFactor::ONE, vk::BlendFactor::ZERO),
        [2.0, -3.0, 0.5, 10.0],
        [0.0; 4],
        [0.0; 4],
        [0.0; 4],
        NumericClass::UnsignedNormalized,
    );

    assert_eq!(clamped, [1.0, 0.0, 0.5, 1.0]);
}

#[test]
fn snorm_clamps_to_signed_unit_range() {
    let out = blend_pixel(
        &simple_state(vk::BlendFactor::ONE, vk::BlendFactor::ZERO),
        [-2.0, -0.5, 2.0, 0.0],
        [0.0; 4],
        [0.0; 4],
        [0.0; 4],
        NumericClass::SignedNormalized,
    );

    assert_eq!(out, [-1.0, -0.5, 1.0, 0.0]);
}

#[test]
fn dst_factor_reads_the_previous_content() {
    // src*0 + dst*1 keeps the cleared color
    let desc = BlendDesc {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D { width: 2, height: 2, depth: 1 },
        clear_color: [0.25, 0.5, 0.75, 1.0],
        blend_constant: [0.0; 4],
        quads: vec![full_quad(
            2,
            [1.0, 1.0, 1.0, 1.0],
            simple_state(vk::BlendFactor::ZERO, vk::BlendFactor::ONE),
        )],
    };

    let out = rasterize(&desc);
    let got = out.read_rgba(0, 0);

    for (channel, expect) in got.iter().zip([0.25, 0.5, 0.75, 1.0]) {
        assert!((channel - expect).abs() <= 1.0 / 255.0);
    }
}

#[test]
fn write_mask_preserves_disabled_channels() {
    let mut state = simple_state(vk::BlendFactor::ONE, vk::BlendFactor::ZERO);
    state.write_mask = vk::ColorComponentFlags::R | vk::ColorComponentFlags::B;

    let desc = BlendDesc {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D { width: 2, height: 2, depth: 1 },
        clear_color: [0.0, 0.5, 0.0, 0.5],
        blend_constant: [0.0; 4],
        quads: vec![full_quad(2, [1.0, 1.0, 1.0, 1.0], state)],
    };

    let out = rasterize(&desc);
    let got = out.read_rgba(1, 1);

    assert!((got[0] - 1.0).abs() <= 1.0 / 255.0);
    assert!((got[1] - 0.5).abs() <= 1.0 / 255.0);
    assert!((got[2] - 1.0).abs() <= 1.0 / 255.0);
    assert!((got[3] - 0.5).abs() <= 1.0 / 255.0);
}

#[test]
fn dual_source_factors_read_the_second_color() {
    let state = BlendState {
        src_color: vk::BlendFactor::SRC1_COLOR,
        dst_color: vk::BlendFactor::ZERO,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::SRC1_ALPHA,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
        write_mask: vk::ColorComponentFlags::RGBA,
    };

    assert!(state.uses_dual_source());

    let out = blend_pixel(
        &state,
        [1.0, 1.0, 1.0, 1.0],
        [0.5, 0.25, 0.0, 0.5],
        [0.0; 4],
        [0.0; 4],
        NumericClass::Float,
    );

    assert_eq!(out, [0.5, 0.25, 0.0, 0.5]);
}

#[test]
fn min_max_ops_ignore_the_factors() {
    let state = BlendState {
        src_color: vk::BlendFactor::ZERO,
        dst_color: vk::BlendFactor::ZERO,
        color_op: vk::BlendOp::MAX,
        src_alpha: vk::BlendFactor::ZERO,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::MIN,
        write_mask: vk::ColorComponentFlags::RGBA,
    };

    let out = blend_pixel(
        &state,
        [0.75, 0.1, 0.5, 0.9],
        [0.0; 4],
        [0.25, 0.6, 0.5, 0.3],
        [0.0; 4],
        NumericClass::Float,
    );

    assert_eq!(out, [0.75, 0.6, 0.5, 0.3]);
}

#[test]
fn quads_blend_in_submission_order() {
    // second quad halves whatever the first one wrote
    let desc = BlendDesc {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D { width: 2, height: 2, depth: 1 },
        clear_color: [0.0; 4],
        blend_constant: [0.5, 0.5, 0.5, 0.5],
        quads: vec![
            full_quad(
                2,
                [1.0, 1.0, 1.0, 1.0],
                simple_state(vk::BlendFactor::ONE, vk::BlendFactor::ZERO),
            ),
            full_quad(
                2,
                [0.0, 0.0, 0.0, 0.0],
                simple_state(vk::BlendFactor::ZERO, vk::BlendFactor::CONSTANT_COLOR),
            ),
        ],
    };

    let out = rasterize(&desc);
    let got = out.read_rgba(0, 1);

    for channel in got {
        assert!((channel - 0.5).abs() <= 1.0 / 255.0);
    }
}

#[test]
fn threshold_table_tracks_channel_widths() {
    let t565 = format::blend_threshold(vk::Format::R5G6B5_UNORM_PACK16).unwrap();

    assert!((t565[0] - 4.0 / 31.0).abs() < 1e-6);
    assert!((t565[1] - 4.0 / 63.0).abs() < 1e-6);
    assert!((t565[2] - 4.0 / 31.0).abs() < 1e-6);
    assert_eq!(t565[3], 1.0);

    let t8888 = format::blend_threshold(vk::Format::R8G8B8A8_UNORM).unwrap();
    assert!((t8888[0] - 4.0 / 255.0).abs() < 1e-6);

    let t5551 = format::blend_threshold(vk::Format::R5G5B5A1_UNORM_PACK16).unwrap();
    assert_eq!(t5551[3], 0.1);

    let t1010102 = format::blend_threshold(vk::Format::A2B10G10R10_UNORM_PACK32).unwrap();
    assert_eq!(t1010102[3], 0.34);

    let tf = format::blend_threshold(vk::Format::R32G32B32A32_SFLOAT).unwrap();
    assert_eq!(tf[0], 0.00001);

    let th = format::blend_threshold(vk::Format::R16G16B16A16_SFLOAT).unwrap();
    assert_eq!(th[0], 0.005);

    // integer formats are not blendable
    assert!(format::blend_threshold(vk::Format::R8G8B8A8_UINT).is_none());
}
