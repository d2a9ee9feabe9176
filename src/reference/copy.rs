//! Copy reference
//!
//! Byte-exact reproduction of region copies with the same offset/extent
//! arithmetic the recorder uses, applied to host pixel buffers

use crate::params::{BufferRegion, ImageRegion};
use crate::pixels::PlanarBuffer;

/// Apply `regions` from `src` onto `dst` in order
///
/// Texels outside every region keep their previous content; overlapping
/// destinations resolve in region order, matching command order on the
/// device
pub fn apply_image_copies(src: &PlanarBuffer, dst: &mut PlanarBuffer, regions: &[ImageRegion]) {
    for region in regions {
        let src_plane = src.plane(region.src_plane);
        let dst_extent = dst.plane(region.dst_plane).extent;
        let dst_element_size = dst.plane(region.dst_plane).element_size;

        assert_eq!(
            src_plane.element_size, dst_element_size,
            "copied planes must have equal texel sizes"
        );

        assert!(region.fits(src_plane.extent, dst_extent));

        let row_bytes = region.extent.width as usize * src_plane.element_size as usize;

        for z in 0..region.extent.depth {
            for y in 0..region.extent.height {
                let src_off = plane_offset(
                    src_plane.extent,
                    src_plane.element_size,
                    region.src_offset[0] as u32,
                    region.src_offset[1] as u32 + y,
                    region.src_offset[2] as u32 + z,
                );

                let dst_off = plane_offset(
                    dst_extent,
                    dst_element_size,
                    region.dst_offset[0] as u32,
                    region.dst_offset[1] as u32 + y,
                    region.dst_offset[2] as u32 + z,
                );

                let row = src.plane_bytes(region.src_plane)[src_off..src_off + row_bytes].to_vec();

                dst.plane_bytes_mut(region.dst_plane)[dst_off..dst_off + row_bytes]
                    .copy_from_slice(&row);
            }
        }
    }
}

/// Apply buffer byte-range copies in order
pub fn apply_buffer_copies(src: &[u8], dst: &mut [u8], regions: &[BufferRegion]) {
    for region in regions {
        let s = region.src_offset as usize;
        let d = region.dst_offset as usize;
        let n = region.size as usize;

        assert!(s + n <= src.len() && d + n <= dst.len());

        dst[d..d + n].copy_from_slice(&src[s..s + n]);
    }
}

fn plane_offset(extent: ash::vk::Extent3D, element_size: u32, x: u32, y: u32, z: u32) -> usize {
    let row = extent.width as usize * element_size as usize;
    let slice = row * extent.height as usize;

    z as usize * slice + y as usize * row + x as usize * element_size as usize
}
