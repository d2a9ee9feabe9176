use ash::vk;

use vkverify::params::{generate_buffer_regions, generate_image_regions, BufferRegion, ImageRegion};
use vkverify::pixels::PlanarBuffer;
use vkverify::reference::copy::{apply_buffer_copies, apply_image_copies};
use vkverify::{compare, fixture};

fn extent(width: u32, height: u32) -> vk::Extent3D {
    vk::Extent3D { width, height, depth: 1 }
}

#[test]
fn single_texel_rgba8_copy() {
    // a 1x1x1 region of a tightly packed 4-byte pixel survives bit exact
    let mut src = PlanarBuffer::new(vk::Format::R8G8B8A8_UINT, extent(1, 1));
    src.texel_mut(0, 0, 0, 0).copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);

    let mut dst = PlanarBuffer::new(vk::Format::R8G8B8A8_UINT, extent(1, 1));

    let region = ImageRegion {
        src_plane: 0,
        dst_plane: 0,
        src_offset: [0; 3],
        dst_offset: [0; 3],
        extent: extent(1, 1),
    };

    apply_image_copies(&src, &mut dst, &[region]);

    assert_eq!(dst.texel(0, 0, 0, 0), &[0x12, 0x34, 0x56, 0x78]);
    assert!(compare::compare_exact(&dst, &src).is_ok());
}

#[test]
fn copied_region_round_trips_and_rest_is_untouched() {
    let src = PlanarBuffer::new_filled(vk::Format::R8G8B8A8_UINT, extent(16, 16), 7);
    let initial = PlanarBuffer::new_filled(vk::Format::R8G8B8A8_UINT, extent(16, 16), 8);

    let region = ImageRegion {
        src_plane: 0,
        dst_plane: 0,
        src_offset: [2, 3, 0],
        dst_offset: [5, 1, 0],
        extent: extent(4, 6),
    };

    let mut dst = initial.clone();
    apply_image_copies(&src, &mut dst, &[region]);

    for y in 0..16 {
        for x in 0..16 {
            let inside = x >= 5 && x < 9 && y >= 1 && y < 7;

            if inside {
                let sx = x - 5 + 2;
                let sy = y - 1 + 3;
                assert_eq!(dst.texel(0, x, y, 0), src.texel(0, sx, sy, 0));
            } else {
                assert_eq!(dst.texel(0, x, y, 0), initial.texel(0, x, y, 0));
            }
        }
    }
}

#[test]
fn disjoint_plane_copy_leaves_other_planes_alone() {
    let fmt = vk::Format::G8_B8_R8_3PLANE_420_UNORM;
    let src = PlanarBuffer::new_filled(fmt, extent(8, 8), 11);
    let initial = PlanarBuffer::new_filled(fmt, extent(8, 8), 12);

    // touch plane 1 only
    let region = ImageRegion {
        src_plane: 1,
        dst_plane: 1,
        src_offset: [0; 3],
        dst_offset: [1, 1, 0],
        extent: extent(2, 2),
    };

    let mut dst = initial.clone();
    apply_image_copies(&src, &mut dst, &[region]);

    assert_eq!(dst.plane_bytes(0), initial.plane_bytes(0));
    assert_eq!(dst.plane_bytes(2), initial.plane_bytes(2));
    assert_ne!(dst.plane_bytes(1), initial.plane_bytes(1));
}

#[test]
fn generated_regions_fit_both_planes() {
    let src_fmt = vk::Format::G8_B8R8_2PLANE_420_UNORM;
    let dst_fmt = vk::Format::G8_B8_R8_3PLANE_420_UNORM;

    let regions = generate_image_regions(0x1234, src_fmt, extent(16, 16), dst_fmt, extent(8, 8), 10);

    assert_eq!(regions.len(), 10);

    let src = PlanarBuffer::new_filled(src_fmt, extent(16, 16), 1);
    let mut dst = PlanarBuffer::new_filled(dst_fmt, extent(8, 8), 2);

    // panics inside if any region escapes its plane
    apply_image_copies(&src, &mut dst, &regions);
}

#[test]
fn generated_regions_are_deterministic() {
    let fmt = vk::Format::G8_B8R8_2PLANE_420_UNORM;

    let a = generate_image_regions(42, fmt, extent(16, 16), fmt, extent(16, 16), 6);
    let b = generate_image_regions(42, fmt, extent(16, 16), fmt, extent(16, 16), 6);
    let c = generate_image_regions(43, fmt, extent(16, 16), fmt, extent(16, 16), 6);

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn buffer_copies_apply_in_order() {
    let src: Vec<u8> = (0u8..=255).collect();
    let mut dst = vec![0xaau8; 256];

    let regions = [
        BufferRegion { src_offset: 0, dst_offset: 16, size: 8 },
        BufferRegion { src_offset: 100, dst_offset: 20, size: 8 },
    ];

    apply_buffer_copies(&src, &mut dst, &regions);

    // the second region overwrites the overlap
    assert_eq!(&dst[16..20], &[0, 1, 2, 3]);
    assert_eq!(&dst[20..28], &[100, 101, 102, 103, 104, 105, 106, 107]);
    assert_eq!(dst[15], 0xaa);
    assert_eq!(dst[28], 0xaa);
}

#[test]
fn generated_buffer_regions_have_disjoint_destinations() {
    let regions = generate_buffer_regions(9, 4096, 8);

    assert_eq!(regions.len(), 8);

    let mut covered = vec![false; 4096];

    for r in &regions {
        assert!(r.src_offset + r.size <= 4096);
        assert!(r.dst_offset + r.size <= 4096);

        for i in r.dst_offset..r.dst_offset + r.size {
            assert!(!covered[i as usize], "destination ranges overlap");
            covered[i as usize] = true;
        }
    }
}

#[test]
fn fixture_is_padded_to_64_bytes() {
    let data = fixture::load().expect("fixture file present in the repository");

    assert!(!data.is_empty());
    assert_eq!(data.len() % 64, 0);
}
