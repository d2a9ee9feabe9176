//! Format query reference
//!
//! Expected mip-chain geometry derived algebraically from the declared
//! extent, never from driver feedback

use ash::vk;

use crate::format;
use crate::params::QueryDesc;

/// Extent of mip level `level`
pub fn mip_extent(extent: vk::Extent3D, level: u32) -> vk::Extent3D {
    vk::Extent3D {
        width: (extent.width >> level).max(1),
        height: (extent.height >> level).max(1),
        depth: (extent.depth >> level).max(1),
    }
}

/// Extents of every level in the chain
pub fn mip_extents(desc: &QueryDesc) -> Vec<vk::Extent3D> {
    (0..desc.effective_mip_levels())
        .map(|l| mip_extent(desc.extent, l))
        .collect()
}

/// Tight byte size of the whole subresource tree: every level of every
/// layer, no padding
///
/// A driver-reported allocation size below this bound can not hold the
/// image
pub fn min_total_bytes(desc: &QueryDesc) -> u64 {
    let fmt = format::describe(desc.format).expect("format outside the supported set");

    let per_layer: u64 = (0..desc.effective_mip_levels())
        .map(|l| {
            let e = mip_extent(desc.extent, l);

            (0..fmt.plane_count())
                .map(|p| {
                    let pe = fmt.plane_extent(e, p);
                    pe.width as u64
                        * pe.height as u64
                        * pe.depth as u64
                        * fmt.plane_element_size(p) as u64
                })
                .sum::<u64>()
        })
        .sum();

    per_layer * desc.array_layers.max(1) as u64
}

/// Tight row size in bytes of level `level`, plane 0
pub fn min_row_bytes(desc: &QueryDesc, level: u32) -> u64 {
    let fmt = format::describe(desc.format).expect("format outside the supported set");
    let e = mip_extent(desc.extent, level);

    e.width as u64 * fmt.plane_element_size(0) as u64
}
