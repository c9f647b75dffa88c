//! Traits that abstract over the memory pool, so the task graph can run on a custom pool type.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::{BufferView, MemoryUsage};

/// An image resource owned by a memory pool. Dropping the last reference frees it.
pub trait ImageResource {
    /// Raw `VkImage` handle. Null once the resource was released.
    fn image(&self) -> vk::Image;
    /// Default view over the full image. Null once the resource was released.
    fn view(&self) -> vk::ImageView;
    /// Whether the image and its backing memory are still alive.
    fn is_valid(&self) -> bool;
}

/// A buffer resource owned by a memory pool. Dropping the last reference frees it.
pub trait BufferResource {
    /// Raw `VkBuffer` handle. Null once the resource was released.
    fn buffer(&self) -> vk::Buffer;
    /// Size of the buffer in bytes.
    fn size(&self) -> vk::DeviceSize;
    /// Whether the buffer and its backing memory are still alive.
    fn is_valid(&self) -> bool;

    /// View over the entire buffer.
    fn view_full(&self) -> BufferView {
        BufferView {
            handle: self.buffer(),
            offset: 0,
            size: self.size(),
        }
    }
}

/// A memory pool creates images and buffers together with their backing memory.
///
/// Resources are handed out as shared pointers. The pool must release a resource (destroy its
/// Vulkan objects and return its memory) exactly once, when the last pointer to it is dropped.
/// Implement this to supply a custom pool to [`TaskGraph`](crate::TaskGraph), which defaults
/// to [`DefaultMemoryPool`](crate::DefaultMemoryPool).
pub trait MemoryPool: Clone {
    /// Image allocation type handed out by this pool.
    type Image: ImageResource;
    /// Buffer allocation type handed out by this pool.
    type Buffer: BufferResource;

    /// Create an image from the given create info, bind memory to it and create a default view.
    /// # Errors
    /// * Fails if image creation, memory allocation or view creation fails. Nothing is leaked in that case.
    fn allocate_image(&self, info: &vk::ImageCreateInfo, usage: MemoryUsage) -> Result<Arc<Self::Image>>;

    /// Create a buffer from the given create info and bind memory to it.
    /// # Errors
    /// * Fails if buffer creation or memory allocation fails. Nothing is leaked in that case.
    fn allocate_buffer(&self, info: &vk::BufferCreateInfo, usage: MemoryUsage) -> Result<Arc<Self::Buffer>>;
}
