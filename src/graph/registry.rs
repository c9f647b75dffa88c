//! The task registry records resource requests and accesses while tasks are declared, and
//! materializes the requested resources the first time a task body touches them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::{
    AliasedBufferHandle, AliasedImageHandle, BufferResource, BufferView, DefaultMemoryPool, Error, ImageResource, MemoryPool, MemoryUsage,
    TransientBufferHandle, TransientImageHandle,
};

/// Creation parameters recorded by [`TaskRegistry::request_image`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub usage: vk::ImageUsageFlags,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
}

/// Creation parameters recorded by [`TaskRegistry::request_buffer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferRequest {
    pub usage: vk::BufferUsageFlags,
    pub size: vk::DeviceSize,
}

/// How a task declared it would access a resource. Both kinds are currently resolved the same way.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Copy, Clone)]
struct AliasBinding<H> {
    transient: H,
    access: Access,
}

impl ImageRequest {
    /// Image create info used to materialize this request. Transient images are always 2D with a
    /// single mip level, a single layer and a single sample.
    /// # Errors
    /// * Fails with [`Error::InvalidImageExtent`] if the depth is not 1, or the width or height is 0.
    pub fn create_info(&self) -> Result<vk::ImageCreateInfo> {
        let extent = self.extent;
        if extent.depth != 1 || extent.width == 0 || extent.height == 0 {
            return Err(Error::InvalidImageExtent(extent).into());
        }
        Ok(vk::ImageCreateInfo {
            image_type: vk::ImageType::TYPE_2D,
            format: self.format,
            extent,
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: self.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        })
    }
}

impl BufferRequest {
    /// Buffer create info used to materialize this request.
    /// # Errors
    /// * Fails with [`Error::EmptyBuffer`] if the requested size is 0.
    pub fn create_info(&self) -> Result<vk::BufferCreateInfo> {
        if self.size == 0 {
            return Err(Error::EmptyBuffer.into());
        }
        Ok(vk::BufferCreateInfo {
            size: self.size,
            usage: self.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        })
    }
}

/// A transient handle that can be aliased through [`TaskRegistry::read`] and [`TaskRegistry::write`].
pub trait TransientHandle: Copy {
    /// The aliased handle kind produced for this transient handle.
    type Alias: Copy;

    #[doc(hidden)]
    fn bind_alias<P: MemoryPool>(self, registry: &mut TaskRegistry<P>, access: Access) -> Self::Alias;
}

impl TransientHandle for TransientImageHandle {
    type Alias = AliasedImageHandle;

    fn bind_alias<P: MemoryPool>(self, registry: &mut TaskRegistry<P>, access: Access) -> AliasedImageHandle {
        let alias = AliasedImageHandle::new(registry.next_aliased_image_id);
        registry.next_aliased_image_id += 1;
        registry.aliased_images.insert(
            alias,
            AliasBinding {
                transient: self,
                access,
            },
        );
        alias
    }
}

impl TransientHandle for TransientBufferHandle {
    type Alias = AliasedBufferHandle;

    fn bind_alias<P: MemoryPool>(self, registry: &mut TaskRegistry<P>, access: Access) -> AliasedBufferHandle {
        let alias = AliasedBufferHandle::new(registry.next_aliased_buffer_id);
        registry.next_aliased_buffer_id += 1;
        registry.aliased_buffers.insert(
            alias,
            AliasBinding {
                transient: self,
                access,
            },
        );
        alias
    }
}

/// Records the resources requested by every task in a graph, and the accesses tasks declared on them.
///
/// Requests are pure bookkeeping and never fail. Resources are allocated from the memory pool the
/// first time an alias to them is resolved, and every later resolution through any alias of the
/// same transient handle returns that same allocation.
///
/// # Example
/// ```no_run
/// # use vkb::*;
/// # let context: Context = unimplemented!();
/// let mut registry = TaskRegistry::new(context.memory_pool().clone());
/// let color = registry.request_image(
///     vk::ImageUsageFlags::COLOR_ATTACHMENT,
///     vk::Format::R8G8B8A8_UNORM,
///     vk::Extent3D { width: 800, height: 600, depth: 1 },
/// );
/// let written = registry.write(color);
/// let sampled = registry.read(color);
/// assert_eq!(registry.image(written)?, registry.image(sampled)?);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TaskRegistry<P: MemoryPool = DefaultMemoryPool> {
    #[derivative(Debug = "ignore")]
    pool: P,
    next_transient_image_id: u32,
    next_transient_buffer_id: u32,
    next_aliased_image_id: u32,
    next_aliased_buffer_id: u32,
    requested_images: HashMap<TransientImageHandle, ImageRequest>,
    requested_buffers: HashMap<TransientBufferHandle, BufferRequest>,
    #[derivative(Debug = "ignore")]
    aliased_images: HashMap<AliasedImageHandle, AliasBinding<TransientImageHandle>>,
    #[derivative(Debug = "ignore")]
    aliased_buffers: HashMap<AliasedBufferHandle, AliasBinding<TransientBufferHandle>>,
    #[derivative(Debug = "ignore")]
    allocated_images: HashMap<TransientImageHandle, Arc<P::Image>>,
    #[derivative(Debug = "ignore")]
    allocated_buffers: HashMap<TransientBufferHandle, Arc<P::Buffer>>,
}

impl<P: MemoryPool> TaskRegistry<P> {
    /// Create an empty registry that materializes resources from `pool`.
    pub fn new(pool: P) -> Self {
        Self {
            pool,
            next_transient_image_id: 0,
            next_transient_buffer_id: 0,
            next_aliased_image_id: 0,
            next_aliased_buffer_id: 0,
            requested_images: HashMap::new(),
            requested_buffers: HashMap::new(),
            aliased_images: HashMap::new(),
            aliased_buffers: HashMap::new(),
            allocated_images: HashMap::new(),
            allocated_buffers: HashMap::new(),
        }
    }

    /// Request a transient image. Every call yields a new handle, even for identical parameters.
    pub fn request_image(&mut self, usage: vk::ImageUsageFlags, format: vk::Format, extent: vk::Extent3D) -> TransientImageHandle {
        let handle = TransientImageHandle::new(self.next_transient_image_id);
        self.next_transient_image_id += 1;
        self.requested_images.insert(
            handle,
            ImageRequest {
                usage,
                format,
                extent,
            },
        );
        handle
    }

    /// Request a transient buffer. Every call yields a new handle, even for identical parameters.
    pub fn request_buffer(&mut self, usage: vk::BufferUsageFlags, size: vk::DeviceSize) -> TransientBufferHandle {
        let handle = TransientBufferHandle::new(self.next_transient_buffer_id);
        self.next_transient_buffer_id += 1;
        self.requested_buffers.insert(
            handle,
            BufferRequest {
                usage,
                size,
            },
        );
        handle
    }

    /// Declare a read access to a transient resource and obtain an alias for use in the task body.
    pub fn read<H: TransientHandle>(&mut self, handle: H) -> H::Alias {
        handle.bind_alias(self, Access::Read)
    }

    /// Declare a write access to a transient resource and obtain an alias for use in the task body.
    pub fn write<H: TransientHandle>(&mut self, handle: H) -> H::Alias {
        handle.bind_alias(self, Access::Write)
    }

    /// Resolve an alias to the image allocation behind it, allocating it on first use.
    /// Returns `Ok(None)` for an alias this registry does not know.
    /// # Errors
    /// * Fails if the request is not a valid 2D image, see [`ImageRequest::create_info`].
    /// * Fails if allocating the image from the memory pool fails.
    pub fn image_allocation(&mut self, alias: AliasedImageHandle) -> Result<Option<Arc<P::Image>>> {
        let Some(binding) = self.aliased_images.get(&alias) else {
            return Ok(None);
        };
        let transient = binding.transient;
        if let Some(image) = self.allocated_images.get(&transient) {
            return Ok(Some(image.clone()));
        }
        let Some(request) = self.requested_images.get(&transient) else {
            warn!("Alias {:?} refers to transient image {:?} that was never requested", alias, transient);
            return Ok(None);
        };
        let image = self.pool.allocate_image(&request.create_info()?, MemoryUsage::GpuOnly)?;
        trace!("Materialized transient image {:?} ({:?}, {:?})", transient, request.format, request.extent);
        self.allocated_images.insert(transient, image.clone());
        Ok(Some(image))
    }

    /// Resolve an alias to the buffer allocation behind it, allocating it on first use.
    /// Returns `Ok(None)` for an alias this registry does not know.
    /// # Errors
    /// * Fails if the request has a size of zero.
    /// * Fails if allocating the buffer from the memory pool fails.
    pub fn buffer_allocation(&mut self, alias: AliasedBufferHandle) -> Result<Option<Arc<P::Buffer>>> {
        let Some(binding) = self.aliased_buffers.get(&alias) else {
            return Ok(None);
        };
        let transient = binding.transient;
        if let Some(buffer) = self.allocated_buffers.get(&transient) {
            return Ok(Some(buffer.clone()));
        }
        let Some(request) = self.requested_buffers.get(&transient) else {
            warn!("Alias {:?} refers to transient buffer {:?} that was never requested", alias, transient);
            return Ok(None);
        };
        let buffer = self.pool.allocate_buffer(&request.create_info()?, MemoryUsage::GpuOnly)?;
        trace!("Materialized transient buffer {:?} ({} bytes)", transient, request.size);
        self.allocated_buffers.insert(transient, buffer.clone());
        Ok(Some(buffer))
    }

    /// Raw image behind an alias. See [`TaskRegistry::image_allocation`].
    pub fn image(&mut self, alias: AliasedImageHandle) -> Result<Option<vk::Image>> {
        Ok(self.image_allocation(alias)?.map(|image| image.image()))
    }

    /// Default view of the image behind an alias. See [`TaskRegistry::image_allocation`].
    pub fn image_view(&mut self, alias: AliasedImageHandle) -> Result<Option<vk::ImageView>> {
        Ok(self.image_allocation(alias)?.map(|image| image.view()))
    }

    /// Raw buffer behind an alias. See [`TaskRegistry::buffer_allocation`].
    pub fn buffer(&mut self, alias: AliasedBufferHandle) -> Result<Option<vk::Buffer>> {
        Ok(self.buffer_allocation(alias)?.map(|buffer| buffer.buffer()))
    }

    /// View over the full buffer behind an alias. See [`TaskRegistry::buffer_allocation`].
    pub fn buffer_view(&mut self, alias: AliasedBufferHandle) -> Result<Option<BufferView>> {
        Ok(self.buffer_allocation(alias)?.map(|buffer| buffer.view_full()))
    }

    /// The transient image an alias refers to.
    pub fn resolve_image(&self, alias: AliasedImageHandle) -> Option<TransientImageHandle> {
        self.aliased_images.get(&alias).map(|binding| binding.transient)
    }

    /// The transient buffer an alias refers to.
    pub fn resolve_buffer(&self, alias: AliasedBufferHandle) -> Option<TransientBufferHandle> {
        self.aliased_buffers.get(&alias).map(|binding| binding.transient)
    }

    /// The access declared when this alias was created.
    pub fn image_access(&self, alias: AliasedImageHandle) -> Option<Access> {
        self.aliased_images.get(&alias).map(|binding| binding.access)
    }

    /// The access declared when this alias was created.
    pub fn buffer_access(&self, alias: AliasedBufferHandle) -> Option<Access> {
        self.aliased_buffers.get(&alias).map(|binding| binding.access)
    }

    pub fn image_request(&self, handle: TransientImageHandle) -> Option<&ImageRequest> {
        self.requested_images.get(&handle)
    }

    pub fn buffer_request(&self, handle: TransientBufferHandle) -> Option<&BufferRequest> {
        self.requested_buffers.get(&handle)
    }

    /// Number of transient images allocated so far.
    pub fn materialized_images(&self) -> usize {
        self.allocated_images.len()
    }

    /// Number of transient buffers allocated so far.
    pub fn materialized_buffers(&self) -> usize {
        self.allocated_buffers.len()
    }

    /// The memory pool transient resources are allocated from.
    pub fn pool(&self) -> &P {
        &self.pool
    }
}
