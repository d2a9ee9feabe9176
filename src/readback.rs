//! Readback path
//!
//! Turns device-written resources into host mirrors. Two paths exist and
//! the right one depends on where the resource lives:
//!
//! - host-visible memory: barrier to HOST_READ, wait for the submission,
//!   then invalidate the mapped range and read (the resource types do the
//!   invalidate unconditionally)
//! - device-local memory: a transfer into a host-visible staging buffer
//!   recorded as part of the command sequence, then the staging buffer is
//!   read like any host-visible resource
//!
//! Multi-planar images are read plane by plane at each plane's own extent

use ash::vk;

use crate::pixels::PlanarBuffer;
use crate::{memory, pixels};

/// Host mirror of one device resource
///
/// Lifetime is bounded by one readback: produced, compared, discarded
#[derive(Debug, Clone)]
pub struct HostMirror {
    i_content: PlanarBuffer,
}

impl HostMirror {
    pub fn content(&self) -> &PlanarBuffer {
        &self.i_content
    }

    pub fn into_content(self) -> PlanarBuffer {
        self.i_content
    }
}

/// Mirror a staging buffer the device copied an image into
///
/// The staging layout is tightly-packed plane-after-plane, the layout
/// [`crate::cmd::Buffer::read_image`] records
pub fn from_staging(
    staging: &memory::Buffer,
    format: vk::Format,
    extent: vk::Extent3D,
) -> Result<HostMirror, memory::MemoryError> {
    let shape = PlanarBuffer::new(format, extent);
    let packed = staging.read(0, shape.byte_size())?;

    Ok(HostMirror {
        i_content: PlanarBuffer::from_packed(format, extent, &packed),
    })
}

/// Mirror a host-visible buffer directly
pub fn from_buffer(
    buffer: &memory::Buffer,
    size: u64,
) -> Result<Vec<u8>, memory::MemoryError> {
    buffer.read(0, size)
}

/// Mirror a host-visible linear image through its mapping, plane by plane
pub fn from_linear_image(image: &memory::Image) -> Result<HostMirror, memory::MemoryError> {
    let mut content = PlanarBuffer::new(image.image_format(), image.extent());

    for plane in 0..content.plane_count() {
        let bytes = image.read_plane_linear(plane)?;
        content.plane_bytes_mut(plane).copy_from_slice(&bytes);
    }

    Ok(HostMirror { i_content: content })
}

/// Wrap reference-shaped content as a mirror (host-side short circuit for
/// resources whose bytes were produced on the host)
pub fn from_planar(content: pixels::PlanarBuffer) -> HostMirror {
    HostMirror { i_content: content }
}
