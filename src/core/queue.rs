use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use ash::vk;

use crate::{CommandBuffer, Device, Error, Fence};

/// Physical VkQueue object.
#[derive(Debug)]
struct DeviceQueue {
    handle: vk::Queue,
}

/// Exposes the device queue that task graphs submit to. Vulkan requires queue submission to be
/// externally synchronized, so the raw queue is guarded by a mutex and this handle is cheap to clone.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Queue {
    #[derivative(Debug = "ignore")]
    device: Device,
    queue: Arc<Mutex<DeviceQueue>>,
    family_index: u32,
    flags: vk::QueueFlags,
}

impl Queue {
    /// Retrieve queue `index` of the device's queue family.
    pub fn new(device: Device, index: u32, flags: vk::QueueFlags) -> Result<Self> {
        let family_index = device.queue_family_index();
        let handle = unsafe { device.get_device_queue(family_index, index) };
        if handle == vk::Queue::null() {
            return Err(Error::NoCapableQueue.into());
        }
        info!("Created device queue #{} of family {} supporting {:?}", index, family_index, flags);
        Ok(Queue {
            device,
            queue: Arc::new(Mutex::new(DeviceQueue {
                handle,
            })),
            family_index,
            flags,
        })
    }

    fn acquire_device_queue(&self) -> Result<MutexGuard<DeviceQueue>> {
        Ok(self.queue.lock().map_err(|_| Error::PoisonError)?)
    }

    /// Submits a set of finished command buffers to the queue, and signals the given fence when the
    /// submission is done.
    pub fn submit(&self, command_buffers: &[&CommandBuffer], fence: Option<&Fence>) -> Result<()> {
        let handles = command_buffers
            .iter()
            .map(|cmd| unsafe { cmd.handle() })
            .collect::<Vec<_>>();
        let info = vk::SubmitInfo::builder().command_buffers(&handles).build();
        let fence = match fence {
            None => vk::Fence::null(),
            Some(fence) => unsafe { fence.handle() },
        };
        let queue = self.acquire_device_queue()?;
        unsafe { self.device.queue_submit(queue.handle, std::slice::from_ref(&info), fence)? };
        Ok(())
    }

    /// Wait until all work submitted to this queue has completed.
    pub fn wait_idle(&self) -> Result<()> {
        let queue = self.acquire_device_queue()?;
        unsafe { self.device.queue_wait_idle(queue.handle)? };
        Ok(())
    }

    /// Obtain the raw vulkan handle of a queue.
    /// # Safety
    /// The returned handle must not be used for submission without external synchronization.
    pub unsafe fn handle(&self) -> Result<vk::Queue> {
        Ok(self.acquire_device_queue()?.handle)
    }

    /// The queue family this queue belongs to.
    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    /// All operations supported by this queue.
    pub fn flags(&self) -> vk::QueueFlags {
        self.flags
    }

    /// The device this queue was created from.
    pub fn device(&self) -> &Device {
        &self.device
    }
}
