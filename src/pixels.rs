//! CPU-side planar pixel buffers
//!
//! [`PlanarBuffer`] is the host-addressable shape shared by uploaded
//! source data, readback mirrors and reference content: one byte array
//! per plane, addressed by (plane, x, y, z)

use ash::vk;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::format;

/// One plane's bytes at its own (possibly subsampled) extent
#[derive(Debug, Clone)]
pub struct Plane {
    pub bytes: Vec<u8>,
    pub extent: vk::Extent3D,
    pub element_size: u32,
}

impl Plane {
    fn texel_offset(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.extent.width && y < self.extent.height && z < self.extent.depth);

        let row = self.extent.width as usize * self.element_size as usize;
        let slice = row * self.extent.height as usize;

        z as usize * slice + y as usize * row + (x as usize * self.element_size as usize)
    }
}

/// Host pixel store with the plane layout of a device format
#[derive(Debug, Clone)]
pub struct PlanarBuffer {
    i_format: vk::Format,
    i_extent: vk::Extent3D,
    i_planes: Vec<Plane>,
}

impl PlanarBuffer {
    /// Zero-initialized buffer shaped like an image of `format`/`extent`
    pub fn new(format: vk::Format, extent: vk::Extent3D) -> PlanarBuffer {
        let desc = format::describe(format).expect("format outside the supported set");

        let planes = (0..desc.plane_count())
            .map(|p| {
                let pe = desc.plane_extent(extent, p);
                let element_size = desc.plane_element_size(p);
                let size =
                    pe.width as usize * pe.height as usize * pe.depth as usize * element_size as usize;

                Plane {
                    bytes: vec![0u8; size],
                    extent: pe,
                    element_size,
                }
            })
            .collect();

        PlanarBuffer {
            i_format: format,
            i_extent: extent,
            i_planes: planes,
        }
    }

    /// Deterministic pseudo-random content, reproducible from `seed`
    pub fn new_filled(format: vk::Format, extent: vk::Extent3D, seed: u64) -> PlanarBuffer {
        let mut buffer = PlanarBuffer::new(format, extent);
        let mut rng = StdRng::seed_from_u64(seed);

        for plane in &mut buffer.i_planes {
            rng.fill(plane.bytes.as_mut_slice());
        }

        buffer
    }

    /// Rebuild from the tightly-packed plane-after-plane byte layout the
    /// readback staging buffer holds
    pub fn from_packed(format: vk::Format, extent: vk::Extent3D, packed: &[u8]) -> PlanarBuffer {
        let mut buffer = PlanarBuffer::new(format, extent);
        let mut offset = 0usize;

        for plane in &mut buffer.i_planes {
            let len = plane.bytes.len();
            plane.bytes.copy_from_slice(&packed[offset..offset + len]);
            offset += len;
        }

        buffer
    }

    /// Concatenated plane bytes, the upload layout
    pub fn packed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.i_planes.iter().map(|p| p.bytes.len()).sum());

        for plane in &self.i_planes {
            out.extend_from_slice(&plane.bytes);
        }

        out
    }

    pub fn buffer_format(&self) -> vk::Format {
        self.i_format
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.i_extent
    }

    pub fn plane_count(&self) -> u32 {
        self.i_planes.len() as u32
    }

    pub fn plane(&self, plane: u32) -> &Plane {
        &self.i_planes[plane as usize]
    }

    pub fn plane_bytes(&self, plane: u32) -> &[u8] {
        &self.i_planes[plane as usize].bytes
    }

    pub fn plane_bytes_mut(&mut self, plane: u32) -> &mut [u8] {
        &mut self.i_planes[plane as usize].bytes
    }

    /// Bytes of one texel
    pub fn texel(&self, plane: u32, x: u32, y: u32, z: u32) -> &[u8] {
        let p = &self.i_planes[plane as usize];
        let off = p.texel_offset(x, y, z);

        &p.bytes[off..off + p.element_size as usize]
    }

    pub fn texel_mut(&mut self, plane: u32, x: u32, y: u32, z: u32) -> &mut [u8] {
        let p = &mut self.i_planes[plane as usize];
        let off = p.texel_offset(x, y, z);
        let size = p.element_size as usize;

        &mut p.bytes[off..off + size]
    }

    /// Decode the plane-0 texel at (x, y) into RGBA floats
    ///
    /// Meaningful for single-plane formats with a decoder in the format
    /// table
    pub fn read_rgba(&self, x: u32, y: u32) -> [f32; 4] {
        let desc = format::describe(self.i_format).expect("format outside the supported set");

        format::decode_texel(desc, self.texel(0, x, y, 0))
    }

    /// Encode RGBA floats into the plane-0 texel at (x, y)
    pub fn write_rgba(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let desc = format::describe(self.i_format).expect("format outside the supported set");

        format::encode_texel(desc, rgba, self.texel_mut(0, x, y, 0));
    }

    /// Total byte size over all planes
    pub fn byte_size(&self) -> u64 {
        self.i_planes.iter().map(|p| p.bytes.len() as u64).sum()
    }
}
