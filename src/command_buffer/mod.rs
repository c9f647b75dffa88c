//! Most functions in this module are a relatively thin wrapper over Vulkan commands.
//!
//! # Incomplete command buffers
//!
//! Vulkan command buffers need to call `vkEndCommandBuffer` before they can be submitted. After this call, no more commands should be
//! recorded to it. For this reason, we expose two command buffer types. The [`IncompleteCommandBuffer`] still accepts commands, and can only
//! be converted into a [`CommandBuffer`] by calling [`IncompleteCommandBuffer::finish`]. This turns it into a complete command buffer, which can
//! be submitted to a [`Queue`](crate::Queue).
//!
//! Task bodies receive a shared reference to the incomplete command buffer of their graph, so recording methods take `&self`
//! and return `&Self` to allow chaining.

use ash::vk;

use crate::Device;

mod command_pool;
mod incomplete;

pub use command_pool::CommandPool;

/// This struct represents a finished command buffer. This command buffer can't be recorded to anymore.
/// It can only be obtained by calling [`IncompleteCommandBuffer::finish()`].
#[derive(Debug)]
pub struct CommandBuffer {
    handle: vk::CommandBuffer,
}

/// This struct represents an incomplete command buffer.
/// This is a command buffer that has not been called [`IncompleteCommandBuffer::finish()`] on yet.
/// Calling this method will turn it into an immutable command buffer which can then be submitted
/// to the queue its pool was created for.
///
/// # Example
/// ```no_run
/// # use vkb::*;
/// # let context: Context = unimplemented!();
/// let queue = context.graphics_queue();
/// let pool = CommandPool::new(context.device().clone(), queue.family_index(), vk::CommandPoolCreateFlags::TRANSIENT)?;
/// let cmd = IncompleteCommandBuffer::new(
///     context.device().clone(),
///     pool.allocate_primary()?,
///     vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
/// )?;
/// // ... record some commands
/// let fence = Fence::new(context.device().clone(), false)?;
/// queue.submit(&[&cmd.finish()?], Some(&fence))?;
/// fence.wait()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Derivative)]
#[derivative(Debug)]
pub struct IncompleteCommandBuffer {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::CommandBuffer,
}

impl CommandBuffer {
    /// Get unsafe access to the underlying command buffer
    /// # Safety
    /// Any vulkan calls that modify the command buffer state may lead to validation errors or put the
    /// system in an undefined state.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }
}
