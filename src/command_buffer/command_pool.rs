use anyhow::Result;
use ash::vk;

use crate::{Device, Error};

/// Wrapper around a `VkCommandPool`. Command buffers allocated from it are freed together with the pool.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CommandPool {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::CommandPool,
}

impl CommandPool {
    /// Create a command pool for the given queue family.
    pub fn new(device: Device, family: u32, flags: vk::CommandPoolCreateFlags) -> Result<Self> {
        let info = vk::CommandPoolCreateInfo {
            flags,
            queue_family_index: family,
            ..Default::default()
        };
        let handle = unsafe { device.create_command_pool(&info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkCommandPool {:p}", handle);

        Ok(CommandPool {
            device,
            handle,
        })
    }

    /// Allocate a single primary command buffer from this pool.
    pub fn allocate_primary(&self) -> Result<vk::CommandBuffer> {
        let info = vk::CommandBufferAllocateInfo {
            command_pool: self.handle,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            ..Default::default()
        };
        let buffers = unsafe { self.device.allocate_command_buffers(&info)? };
        Ok(buffers
            .first()
            .copied()
            .ok_or(Error::Uncategorized("driver returned no command buffer"))?)
    }

    /// Get unsafe access to the underlying `VkCommandPool` handle.
    /// # Safety
    /// The caller must not destroy the pool.
    pub unsafe fn handle(&self) -> vk::CommandPool {
        self.handle
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkCommandPool {:p}", self.handle);
        unsafe {
            self.device.destroy_command_pool(self.handle, None);
        }
    }
}
