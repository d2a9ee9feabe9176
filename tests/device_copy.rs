#[path = "./mod.rs"]
mod test_context;

use ash::vk;

use vkverify::harness::Case;
use vkverify::params::{
    generate_buffer_regions, generate_image_regions, CopyDesc, CopyKind, IndirectCfg, Operation,
    ParameterSet, QueueClass,
};
use vkverify::verdict::Verdict;
use vkverify::fixture;

fn extent(width: u32, height: u32) -> vk::Extent3D {
    vk::Extent3D { width, height, depth: 1 }
}

fn run(params: ParameterSet) -> Option<Verdict> {
    let ctx = test_context::get_context()?;

    Some(Case::new(params).run(&ctx))
}

fn expect_pass_or_unsupported(params: ParameterSet) {
    let name = params.name.clone();

    match run(params) {
        None => eprintln!("skipped '{}': no Vulkan implementation", name),
        Some(v) => assert!(!v.is_fail(), "case '{}' failed: {}", name, v),
    }
}

fn plain_copy(name: &str, kind: CopyKind, fmt: vk::Format, extent: vk::Extent3D) -> ParameterSet {
    ParameterSet::new(
        name,
        Operation::Copy(CopyDesc {
            kind,
            src_format: fmt,
            dst_format: fmt,
            src_extent: extent,
            dst_extent: extent,
            tiling: vk::ImageTiling::OPTIMAL,
            disjoint: false,
            sparse: false,
            protected: false,
            indirect: None,
        }),
    )
}

#[test]
fn buffer_copy_of_the_fixture_payload() {
    let size = fixture::load().expect("fixture present").len() as u64;
    let regions = generate_buffer_regions(0xf1c5, size, 4);

    expect_pass_or_unsupported(plain_copy(
        "copy.buffer.fixture",
        CopyKind::BufferToBuffer { size: 0, regions, from_fixture: true },
        vk::Format::R8_UNORM,
        extent(1, 1),
    ));
}

#[test]
fn single_texel_upload_round_trips() {
    // 1x1x1 R8G8B8A8_UINT from a tightly packed buffer
    expect_pass_or_unsupported(plain_copy(
        "copy.image.single_texel",
        CopyKind::BufferToImage { regions: Vec::new() },
        vk::Format::R8G8B8A8_UINT,
        extent(1, 1),
    ));
}

#[test]
fn image_to_image_region_list() {
    let fmt = vk::Format::R8G8B8A8_UNORM;
    let regions = generate_image_regions(0xabc, fmt, extent(16, 16), fmt, extent(16, 16), 4);

    expect_pass_or_unsupported(plain_copy(
        "copy.image.regions",
        CopyKind::ImageToImage { regions },
        fmt,
        extent(16, 16),
    ));
}

#[test]
fn image_readback_through_a_buffer() {
    expect_pass_or_unsupported(plain_copy(
        "copy.image.readback",
        CopyKind::ImageToBuffer { regions: Vec::new() },
        vk::Format::R8G8B8A8_UNORM,
        extent(8, 8),
    ));
}

#[test]
fn disjoint_multi_planar_copy() {
    let fmt = vk::Format::G8_B8_R8_3PLANE_420_UNORM;
    let regions = generate_image_regions(0x77, fmt, extent(16, 16), fmt, extent(16, 16), 6);

    let mut params = plain_copy(
        "copy.image.disjoint_planes",
        CopyKind::ImageToImage { regions },
        fmt,
        extent(16, 16),
    );

    if let Operation::Copy(desc) = &mut params.operation {
        desc.disjoint = true;
    }

    expect_pass_or_unsupported(params);
}

#[test]
fn dedicated_transfer_queue_copy() {
    let fmt = vk::Format::R8G8B8A8_UNORM;
    let regions = generate_image_regions(0x31, fmt, extent(8, 8), fmt, extent(8, 8), 2);

    let params = plain_copy(
        "copy.image.transfer_queue",
        CopyKind::ImageToImage { regions },
        fmt,
        extent(8, 8),
    )
    .with_queue(QueueClass::DedicatedTransfer);

    expect_pass_or_unsupported(params);
}

#[test]
fn indirect_buffer_copy_normal_and_long_stride() {
    for (label, stride) in [("normal", 24u32), ("long", 40u32)] {
        let regions = generate_buffer_regions(0x9e, 4096, 4);

        let mut params = plain_copy(
            &format!("copy.buffer.indirect.{}", label),
            CopyKind::BufferToBuffer { size: 4096, regions, from_fixture: false },
            vk::Format::R8_UNORM,
            extent(1, 1),
        );

        if let Operation::Copy(desc) = &mut params.operation {
            desc.indirect = Some(IndirectCfg { stride });
        }

        expect_pass_or_unsupported(params);
    }
}

#[test]
fn sparse_image_copy() {
    let mut params = plain_copy(
        "copy.image.sparse",
        CopyKind::ImageToImage { regions: Vec::new() },
        vk::Format::R8G8B8A8_UNORM,
        extent(64, 64),
    );

    if let Operation::Copy(desc) = &mut params.operation {
        desc.sparse = true;
    }

    expect_pass_or_unsupported(params);
}

#[test]
fn requesting_an_absent_queue_class_is_not_supported() {
    let Some(ctx) = test_context::get_context() else {
        eprintln!("skipped: no Vulkan implementation");
        return;
    };

    // only meaningful when the device exposes no dedicated compute family
    if ctx.device.hw().find_queue_class(QueueClass::DedicatedCompute).is_some() {
        return;
    }

    let params = plain_copy(
        "copy.buffer.no_compute_queue",
        CopyKind::BufferToBuffer {
            size: 256,
            regions: generate_buffer_regions(1, 256, 2),
            from_fixture: false,
        },
        vk::Format::R8_UNORM,
        extent(1, 1),
    )
    .with_queue(QueueClass::DedicatedCompute);

    let verdict = Case::new(params).run(&ctx);

    assert!(verdict.is_not_supported(), "expected not-supported, got {}", verdict);
}
