//! Queue submission gate
//!
//! One submit-and-wait per logical phase: the caller blocks on a fence
//! until the device finished, so consecutive phases of a case never
//! overlap. A submission can wait on the sparse binding semaphore and can
//! be marked protected; a device error or fence timeout is fatal for the
//! case, not a comparison failure

use ash::vk;

use crate::on_error_ret;
use crate::{cmd, dev};

use std::fmt;
use std::sync::Arc;

/// Default wall-clock budget for one submission
pub const SUBMIT_TIMEOUT_NS: u64 = 10_000_000_000;

pub struct QueueCfg {
    pub family_index: u32,
    pub queue_index: u32,
}

#[derive(Debug)]
pub enum QueueError {
    /// Failed to
    /// [create](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkCreateFence.html)
    /// fence
    Fence,
    /// Failed to
    /// [submit](https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/vkQueueSubmit.html)
    /// command buffers
    Submit,
    /// Fence wait returned an error or ran over the timeout
    Timeout,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err_msg = match self {
            QueueError::Fence => "Failed to create fence (vkCreateFence call failed)",
            QueueError::Submit => "Failed to submit command buffer (vkQueueSubmit call failed)",
            QueueError::Timeout => "Device did not finish in time (vkWaitForFences call failed)",
        };

        write!(f, "{}", err_msg)
    }
}

impl std::error::Error for QueueError {}

/// Semaphore a submission must wait on before `stage`
#[derive(Debug, Clone, Copy)]
pub struct SubmitWait {
    pub semaphore: vk::Semaphore,
    pub stage: cmd::PipelineStage,
}

/// Device queue the gate submits to
pub struct Queue {
    i_core: Arc<dev::Core>,
    i_queue: vk::Queue,
    i_family: u32,
}

impl Queue {
    /// Fetch queue `cfg.queue_index` of family `cfg.family_index`
    pub fn new(device: &dev::Device, cfg: &QueueCfg) -> Queue {
        let queue = unsafe {
            device
                .device()
                .get_device_queue(cfg.family_index, cfg.queue_index)
        };

        Queue {
            i_core: device.core().clone(),
            i_queue: queue,
            i_family: cfg.family_index,
        }
    }

    /// Fetch the protected-capable queue of `family_index`
    ///
    /// Valid only when the device was created with a protected queue in
    /// that family
    pub fn new_protected(device: &dev::Device, family_index: u32) -> Queue {
        let info = vk::DeviceQueueInfo2::default()
            .flags(vk::DeviceQueueCreateFlags::PROTECTED)
            .queue_family_index(family_index)
            .queue_index(0);

        let queue = unsafe { device.device().get_device_queue2(&info) };

        Queue {
            i_core: device.core().clone(),
            i_queue: queue,
            i_family: family_index,
        }
    }

    pub fn family_index(&self) -> u32 {
        self.i_family
    }

    #[doc(hidden)]
    pub fn queue(&self) -> vk::Queue {
        self.i_queue
    }

    /// Submit `buffer` and block until the device reports completion
    ///
    /// `waits` carries the semaphores the submission must wait on (sparse
    /// binding); `protected` marks the submission protected
    pub fn exec(
        &self,
        buffer: &cmd::ExecutableBuffer,
        waits: &[SubmitWait],
        protected: bool,
        timeout_ns: u64,
    ) -> Result<(), QueueError> {
        let dev = self.i_core.device();

        let fence_info = vk::FenceCreateInfo::default();

        let fence = on_error_ret!(
            unsafe { dev.create_fence(&fence_info, self.i_core.allocator()) },
            QueueError::Fence
        );

        let wait_semaphores: Vec<vk::Semaphore> = waits.iter().map(|w| w.semaphore).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = waits.iter().map(|w| w.stage).collect();
        let buffers = [*buffer.buffer()];

        let mut protected_info = vk::ProtectedSubmitInfo::default().protected_submit(true);

        let mut submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&buffers);

        if protected {
            submit_info = submit_info.push_next(&mut protected_info);
        }

        let submitted = unsafe { dev.queue_submit(self.i_queue, &[submit_info], fence) };

        if submitted.is_err() {
            unsafe { dev.destroy_fence(fence, self.i_core.allocator()) };
            return Err(QueueError::Submit);
        }

        let waited = unsafe { dev.wait_for_fences(&[fence], true, timeout_ns) };

        unsafe { dev.destroy_fence(fence, self.i_core.allocator()) };

        on_error_ret!(waited, QueueError::Timeout);

        Ok(())
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("i_queue", &self.i_queue)
            .field("i_family", &self.i_family)
            .finish()
    }
}
