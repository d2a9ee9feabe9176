#[path = "./mod.rs"]
mod test_context;

use ash::vk;

use vkverify::harness::Case;
use vkverify::params::{Operation, ParameterSet, QueryDesc};

fn run_query(name: &str, desc: QueryDesc) {
    let Some(ctx) = test_context::get_context() else {
        eprintln!("skipped '{}': no Vulkan implementation", name);
        return;
    };

    let verdict = Case::new(ParameterSet::new(name, Operation::Query(desc))).run(&ctx);

    assert!(!verdict.is_fail(), "case '{}' failed: {}", name, verdict);
}

#[test]
fn full_mip_chain_geometry() {
    run_query(
        "query.mips.full_chain",
        QueryDesc {
            format: vk::Format::R8G8B8A8_UNORM,
            extent: vk::Extent3D { width: 64, height: 64, depth: 1 },
            mip_levels: 0,
            array_layers: 1,
            tiling: vk::ImageTiling::OPTIMAL,
        },
    );
}

#[test]
fn layered_image_allocation_bound() {
    run_query(
        "query.layers.allocation",
        QueryDesc {
            format: vk::Format::R8G8B8A8_UNORM,
            extent: vk::Extent3D { width: 32, height: 32, depth: 1 },
            mip_levels: 3,
            array_layers: 6,
            tiling: vk::ImageTiling::OPTIMAL,
        },
    );
}

#[test]
fn linear_image_row_pitch() {
    run_query(
        "query.linear.row_pitch",
        QueryDesc {
            format: vk::Format::R8G8B8A8_UNORM,
            extent: vk::Extent3D { width: 16, height: 16, depth: 1 },
            mip_levels: 1,
            array_layers: 1,
            tiling: vk::ImageTiling::LINEAR,
        },
    );
}

#[test]
fn packed_format_geometry() {
    run_query(
        "query.packed.geometry",
        QueryDesc {
            format: vk::Format::R5G6B5_UNORM_PACK16,
            extent: vk::Extent3D { width: 20, height: 12, depth: 1 },
            mip_levels: 0,
            array_layers: 1,
            tiling: vk::ImageTiling::OPTIMAL,
        },
    );
}
