//! Reference counted image and buffer allocations handed out by the [`DefaultMemoryPool`](crate::DefaultMemoryPool).
//!
//! Allocations are shared through an `Arc`. Once the last reference is dropped, the Vulkan objects
//! are destroyed and the memory goes back to the pool that created them.

use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan as vk_alloc;

use crate::{BufferResource, DefaultMemoryPool, Error, ImageResource, MemoryUsage};

/// An image with bound memory and a default image view.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ImageAllocation {
    #[derivative(Debug = "ignore")]
    pub(crate) pool: DefaultMemoryPool,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
    pub(crate) extent: vk::Extent3D,
    pub(crate) mip_levels: u32,
    pub(crate) array_layers: u32,
    #[derivative(Debug = "ignore")]
    pub(crate) memory: Option<vk_alloc::Allocation>,
}

/// A buffer with bound memory. Buffers allocated with a host visible [`MemoryUsage`] are persistently mapped.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BufferAllocation {
    #[derivative(Debug = "ignore")]
    pub(crate) pool: DefaultMemoryPool,
    pub(crate) buffer: vk::Buffer,
    pub(crate) size: vk::DeviceSize,
    pub(crate) usage: MemoryUsage,
    #[derivative(Debug = "ignore")]
    pub(crate) memory: Option<vk_alloc::Allocation>,
}

/// A view into a range of a buffer. Used as the source and destination of buffer commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferView {
    pub(crate) handle: vk::Buffer,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

impl BufferView {
    /// Raw handle of the viewed buffer.
    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }
}

impl ImageAllocation {
    /// Format the image was created with.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Size of the base mip level.
    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn array_layers(&self) -> u32 {
        self.array_layers
    }

    /// Subresource range covering every mip level and layer of this image.
    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: crate::util::format::aspect_from_format(self.format),
            base_mip_level: 0,
            level_count: self.mip_levels,
            base_array_layer: 0,
            layer_count: self.array_layers,
        }
    }
}

impl ImageResource for ImageAllocation {
    fn image(&self) -> vk::Image {
        self.image
    }

    fn view(&self) -> vk::ImageView {
        self.view
    }

    fn is_valid(&self) -> bool {
        self.image != vk::Image::null() && self.memory.is_some()
    }
}

impl Drop for ImageAllocation {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        pool.free_image(self);
    }
}

impl BufferAllocation {
    /// Memory usage this buffer was allocated with.
    pub fn usage(&self) -> MemoryUsage {
        self.usage
    }

    /// Whether this buffer has a persistent host mapping.
    pub fn is_mapped(&self) -> bool {
        self.memory
            .as_ref()
            .and_then(|memory| memory.mapped_ptr())
            .is_some()
    }

    /// Create a view into a sub range of this buffer.
    /// # Errors
    /// Fails if the range does not fit inside the buffer.
    pub fn view(&self, offset: vk::DeviceSize, size: vk::DeviceSize) -> Result<BufferView> {
        match offset.checked_add(size) {
            Some(end) if end <= self.size => Ok(BufferView {
                handle: self.buffer,
                offset,
                size,
            }),
            _ => Err(Error::BufferViewOutOfRange.into()),
        }
    }

    /// Copy raw bytes into the start of this buffer through its host mapping.
    /// # Errors
    /// * Fails if the buffer was already released.
    /// * Fails if the buffer is not host visible.
    /// * Fails if `data` is larger than the buffer.
    pub fn update(&self, data: &[u8]) -> Result<()> {
        self.pool.update(self, data)
    }

    /// Copy a slice of plain values into the start of this buffer. See [`BufferAllocation::update`].
    /// `T` must be [`Pod`](bytemuck::Pod), so it has no padding bytes that would be read uninitialized.
    pub fn update_slice<T: bytemuck::Pod>(&self, data: &[T]) -> Result<()> {
        self.update(bytemuck::cast_slice(data))
    }

    /// Read back the full contents of this buffer through its host mapping.
    /// # Errors
    /// * Fails if the buffer was already released or is not host visible.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let memory = self.memory.as_ref().ok_or(Error::InvalidAllocation)?;
        let pointer = memory.mapped_ptr().ok_or(Error::UnmappableBuffer)?;
        let mut bytes = vec![0u8; self.size as usize];
        // SAFETY: The mapping covers at least `size` bytes for as long as the allocation lives.
        unsafe {
            std::ptr::copy_nonoverlapping(pointer.as_ptr().cast::<u8>(), bytes.as_mut_ptr(), bytes.len());
        }
        Ok(bytes)
    }
}

impl BufferResource for BufferAllocation {
    fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    fn size(&self) -> vk::DeviceSize {
        self.size
    }

    fn is_valid(&self) -> bool {
        self.buffer != vk::Buffer::null() && self.memory.is_some()
    }
}

impl Drop for BufferAllocation {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        pool.free_buffer(self);
    }
}
