use ash::vk;

use vkverify::params::QueryDesc;
use vkverify::reference::query::{min_row_bytes, min_total_bytes, mip_extent, mip_extents};

fn desc(width: u32, height: u32, mip_levels: u32, layers: u32) -> QueryDesc {
    QueryDesc {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D { width, height, depth: 1 },
        mip_levels,
        array_layers: layers,
        tiling: vk::ImageTiling::OPTIMAL,
    }
}

#[test]
fn full_chain_length_is_floor_log2_plus_one() {
    assert_eq!(QueryDesc::full_mip_count(vk::Extent3D { width: 1, height: 1, depth: 1 }), 1);
    assert_eq!(QueryDesc::full_mip_count(vk::Extent3D { width: 16, height: 16, depth: 1 }), 5);
    assert_eq!(QueryDesc::full_mip_count(vk::Extent3D { width: 20, height: 4, depth: 1 }), 5);
    assert_eq!(QueryDesc::full_mip_count(vk::Extent3D { width: 1, height: 1, depth: 256 }), 9);
}

#[test]
fn levels_shrink_and_clamp_at_one() {
    let extents = mip_extents(&desc(20, 8, 0, 1));

    assert_eq!(extents.len(), 5);
    assert_eq!((extents[0].width, extents[0].height), (20, 8));
    assert_eq!((extents[1].width, extents[1].height), (10, 4));
    assert_eq!((extents[2].width, extents[2].height), (5, 2));
    assert_eq!((extents[3].width, extents[3].height), (2, 1));
    assert_eq!((extents[4].width, extents[4].height), (1, 1));

    let tail = mip_extent(vk::Extent3D { width: 20, height: 8, depth: 1 }, 10);
    assert_eq!((tail.width, tail.height, tail.depth), (1, 1, 1));
}

#[test]
fn total_bytes_sum_levels_and_layers() {
    // 4x4 RGBA8, two levels: (16 + 4) * 4 bytes per layer
    let one_layer = min_total_bytes(&desc(4, 4, 2, 1));
    assert_eq!(one_layer, 80);

    let three_layers = min_total_bytes(&desc(4, 4, 2, 3));
    assert_eq!(three_layers, 240);

    // explicit level count below the full chain is honored
    let truncated = min_total_bytes(&desc(16, 16, 1, 1));
    assert_eq!(truncated, 16 * 16 * 4);
}

#[test]
fn row_bytes_follow_the_level_width() {
    let d = desc(16, 16, 0, 1);

    assert_eq!(min_row_bytes(&d, 0), 64);
    assert_eq!(min_row_bytes(&d, 2), 16);
    assert_eq!(min_row_bytes(&d, 4), 4);
}
