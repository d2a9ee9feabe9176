//! Dispatch and draw cases against a real device
//!
//! Needs the `shader-compile` feature: the programs are compiled with
//! shaderc at run time and handed to the harness through the catalog

#[path = "./mod.rs"]
mod test_context;

use ash::vk;

use vkverify::harness;
use vkverify::harness::Case;
use vkverify::params::{
    AtomicCheck, AtomicDesc, AtomicOp, BlendDesc, BlendQuad, BlendState, Operation, ParameterSet,
    QuadRect,
};
use vkverify::shader;

const ATOMIC_ADD_R32UI_END: &str = r#"
#version 450
layout(local_size_x = 1, local_size_y = 1, local_size_z = 1) in;
layout(r32ui, binding = 0) coherent uniform uimage2D result_image;

void main(void)
{
    int gx = int(gl_GlobalInvocationID.x);
    int gy = int(gl_GlobalInvocationID.y);
    int gz = int(gl_GlobalInvocationID.z);
    int width = int(gl_NumWorkGroups.x) / 5;
    uint arg = uint(gx*gx + gy*gy + gz*gz);
    imageAtomicAdd(result_image, ivec2(gx % width, gy), arg);
}
"#;

const ATOMIC_EXCHANGE_R32UI_INTERM: &str = r#"
#version 450
layout(local_size_x = 1, local_size_y = 1, local_size_z = 1) in;
layout(r32ui, binding = 0) coherent uniform uimage2D result_image;
layout(r32ui, binding = 1) writeonly uniform uimage2D interm_image;

void main(void)
{
    int gx = int(gl_GlobalInvocationID.x);
    int gy = int(gl_GlobalInvocationID.y);
    int width = int(gl_NumWorkGroups.x) / 5;
    uint arg = uint(gx * int(gl_NumWorkGroups.y) + gy);
    uint prev = imageAtomicExchange(result_image, ivec2(gx % width, gy), arg);
    imageStore(interm_image, ivec2(gx, gy), uvec4(prev, 0u, 0u, 0u));
}
"#;

const QUAD_VERT: &str = r#"
#version 450
layout(location = 0) in vec4 in_position;
layout(location = 1) in vec4 in_color;
layout(location = 2) in vec4 in_color1;
layout(location = 0) out vec4 frag_color;
layout(location = 1) out vec4 frag_color1;

void main(void)
{
    gl_Position = in_position;
    frag_color = in_color;
    frag_color1 = in_color1;
}
"#;

const QUAD_FRAG: &str = r#"
#version 450
layout(location = 0) in vec4 frag_color;
layout(location = 1) in vec4 frag_color1;
layout(location = 0) out vec4 out_color;

void main(void)
{
    out_color = frag_color;
}
"#;

fn compile(
    compiler: &shaderc::Compiler,
    source: &str,
    kind: shaderc::ShaderKind,
    file_name: &str,
) -> Vec<u32> {
    compiler
        .compile_into_spirv(source, kind, file_name, "main", None)
        .expect("shader compilation failed")
        .as_binary()
        .to_vec()
}

fn build_catalog() -> shader::Catalog {
    let compiler = shaderc::Compiler::new().expect("shaderc unavailable");
    let mut catalog = shader::Catalog::new();

    catalog.insert(
        "atomic_add_r32ui_end",
        compile(&compiler, ATOMIC_ADD_R32UI_END, shaderc::ShaderKind::Compute, "add.comp"),
    );
    catalog.insert(
        "atomic_exchange_r32ui_interm",
        compile(
            &compiler,
            ATOMIC_EXCHANGE_R32UI_INTERM,
            shaderc::ShaderKind::Compute,
            "exchange.comp",
        ),
    );
    catalog.insert(
        harness::QUAD_VERTEX_SHADER,
        compile(&compiler, QUAD_VERT, shaderc::ShaderKind::Vertex, "quad.vert"),
    );
    catalog.insert(
        harness::QUAD_FRAGMENT_SHADER,
        compile(&compiler, QUAD_FRAG, shaderc::ShaderKind::Fragment, "quad.frag"),
    );

    catalog
}

fn run_with_shaders(params: ParameterSet) {
    let name = params.name.clone();

    let (Some(lib), Some(device)) = (test_context::get_instance(), test_context::get_device())
    else {
        eprintln!("skipped '{}': no Vulkan implementation", name);
        return;
    };

    let catalog = build_catalog();

    let ctx = harness::Context { lib, device, shaders: &catalog };

    let verdict = Case::new(params).run(&ctx);

    assert!(!verdict.is_fail(), "case '{}' failed: {}", name, verdict);
}

#[test]
fn atomic_add_end_result() {
    run_with_shaders(ParameterSet::new(
        "atomic.add.r32ui.end",
        Operation::Atomic(AtomicDesc {
            op: AtomicOp::Add,
            check: AtomicCheck::EndResult,
            format: vk::Format::R32_UINT,
            extent: vk::Extent3D { width: 4, height: 4, depth: 1 },
            tiling: vk::ImageTiling::OPTIMAL,
            sparse: false,
        }),
    ));
}

#[test]
fn atomic_exchange_intermediate_values() {
    run_with_shaders(ParameterSet::new(
        "atomic.exchange.r32ui.interm",
        Operation::Atomic(AtomicDesc {
            op: AtomicOp::Exchange,
            check: AtomicCheck::IntermediateValues,
            format: vk::Format::R32_UINT,
            extent: vk::Extent3D { width: 4, height: 4, depth: 1 },
            tiling: vk::ImageTiling::OPTIMAL,
            sparse: false,
        }),
    ));
}

#[test]
fn constant_color_blend_clamps_on_unorm() {
    // out-of-range constant and quad color must clamp before the blend
    // equation on a fixed-point attachment
    run_with_shaders(ParameterSet::new(
        "blend.constant_color.clamp",
        Operation::Blend(BlendDesc {
            format: vk::Format::R8G8B8A8_UNORM,
            extent: vk::Extent3D { width: 16, height: 16, depth: 1 },
            clear_color: [0.0; 4],
            blend_constant: [2.0, 0.5, -1.0, 1.0],
            quads: vec![BlendQuad {
                rect: QuadRect { x: 0, y: 0, width: 16, height: 16 },
                color: [2.0, 0.5, 1.0, -1.0],
                color1: [0.0; 4],
                state: BlendState {
                    src_color: vk::BlendFactor::CONSTANT_COLOR,
                    dst_color: vk::BlendFactor::ZERO,
                    color_op: vk::BlendOp::ADD,
                    src_alpha: vk::BlendFactor::CONSTANT_COLOR,
                    dst_alpha: vk::BlendFactor::ZERO,
                    alpha_op: vk::BlendOp::ADD,
                    write_mask: vk::ColorComponentFlags::RGBA,
                },
            }],
        }),
    ));
}

#[test]
fn two_quads_blend_in_order() {
    let state_one = BlendState {
        src_color: vk::BlendFactor::ONE,
        dst_color: vk::BlendFactor::ZERO,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::ONE,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
        write_mask: vk::ColorComponentFlags::RGBA,
    };

    let state_two = BlendState {
        src_color: vk::BlendFactor::SRC_ALPHA,
        dst_color: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        color_op: vk::BlendOp::ADD,
        src_alpha: vk::BlendFactor::ONE,
        dst_alpha: vk::BlendFactor::ZERO,
        alpha_op: vk::BlendOp::ADD,
        write_mask: vk::ColorComponentFlags::RGBA,
    };

    run_with_shaders(ParameterSet::new(
        "blend.two_quads.over",
        Operation::Blend(BlendDesc {
            format: vk::Format::R8G8B8A8_UNORM,
            extent: vk::Extent3D { width: 16, height: 16, depth: 1 },
            clear_color: [0.1, 0.1, 0.1, 1.0],
            blend_constant: [0.0; 4],
            quads: vec![
                BlendQuad {
                    rect: QuadRect { x: 0, y: 0, width: 16, height: 16 },
                    color: [0.8, 0.2, 0.4, 1.0],
                    color1: [0.0; 4],
                    state: state_one,
                },
                BlendQuad {
                    rect: QuadRect { x: 4, y: 4, width: 8, height: 8 },
                    color: [0.0, 1.0, 0.0, 0.5],
                    color1: [0.0; 4],
                    state: state_two,
                },
            ],
        }),
    ));
}
