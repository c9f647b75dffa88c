//! Contains the default memory pool, based on the [`gpu_allocator`] crate.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan as vk_alloc;
use gpu_allocator::vulkan::AllocationScheme;

use crate::util::format::{aspect_from_format, view_type_for};
use crate::{BufferAllocation, Device, Error, ImageAllocation, Instance, MemoryPool, MemoryUsage, PhysicalDevice};

/// Counters of live allocations owned by a [`DefaultMemoryPool`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    /// Number of live image allocations.
    pub images: usize,
    /// Number of live buffer allocations.
    pub buffers: usize,
    /// Total size in bytes of all live buffers.
    pub buffer_bytes: u64,
}

/// Usage of one device memory heap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Index of the heap in the device memory properties.
    pub index: u32,
    pub flags: vk::MemoryHeapFlags,
    /// Total size of the heap in bytes.
    pub size: vk::DeviceSize,
    /// Bytes currently in use by this process. `None` without `VK_EXT_memory_budget`.
    pub usage: Option<vk::DeviceSize>,
    /// Bytes this process can allocate before running into trouble. `None` without `VK_EXT_memory_budget`.
    pub budget: Option<vk::DeviceSize>,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct PoolInner {
    // Declared before the device so the allocator releases its memory blocks while the device is alive.
    #[derivative(Debug = "ignore")]
    allocator: Mutex<vk_alloc::Allocator>,
    #[derivative(Debug = "ignore")]
    device: Device,
    #[derivative(Debug = "ignore")]
    instance: ash::Instance,
    #[derivative(Debug = "ignore")]
    physical_device: vk::PhysicalDevice,
    #[derivative(Debug = "ignore")]
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    memory_budget: bool,
    images: AtomicUsize,
    buffers: AtomicUsize,
    buffer_bytes: AtomicU64,
}

/// The default memory pool. This calls into the `gpu_allocator` crate.
/// It's important to note that this pool is `Clone`, `Send` and `Sync`. All its internal state is safely
/// wrapped inside an `Arc`, and every allocation keeps a clone of the pool it came from alive.
///
/// # Example
/// ```no_run
/// # use vkb::*;
/// # let context: Context = unimplemented!();
/// let pool = context.memory_pool().clone();
/// let info = vk::BufferCreateInfo::builder()
///     .size(256)
///     .usage(vk::BufferUsageFlags::TRANSFER_SRC)
///     .build();
/// let staging = pool.allocate_buffer(&info, MemoryUsage::CpuToGpu)?;
/// staging.update_slice(&[1.0f32, 2.0, 3.0, 4.0])?;
/// assert_eq!(pool.stats().buffers, 1);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DefaultMemoryPool {
    inner: Arc<PoolInner>,
}

impl DefaultMemoryPool {
    /// Create a new memory pool for the given device.
    /// # Errors
    /// * May fail if creating the internal `gpu_allocator` fails.
    pub fn new(instance: &Instance, device: &Device, physical_device: &PhysicalDevice) -> Result<Self> {
        let allocator = vk_alloc::Allocator::new(&vk_alloc::AllocatorCreateDesc {
            instance: (*instance).clone(),
            // SAFETY: The caller passed in a valid Device reference.
            device: unsafe { device.handle() },
            // SAFETY: The caller passed in a valid PhysicalDevice reference.
            physical_device: unsafe { physical_device.handle() },
            debug_settings: Default::default(),
            buffer_device_address: false,
        })?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                allocator: Mutex::new(allocator),
                device: device.clone(),
                instance: (*instance).clone(),
                physical_device: unsafe { physical_device.handle() },
                memory_properties: *physical_device.memory_properties(),
                memory_budget: physical_device.supports_memory_budget(),
                images: AtomicUsize::new(0),
                buffers: AtomicUsize::new(0),
                buffer_bytes: AtomicU64::new(0),
            }),
        })
    }

    /// Snapshot of the live allocation counters.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            images: self.inner.images.load(Ordering::Acquire),
            buffers: self.inner.buffers.load(Ordering::Acquire),
            buffer_bytes: self.inner.buffer_bytes.load(Ordering::Acquire),
        }
    }

    /// Per-heap usage of device memory. Usage and budget are only reported when the device
    /// supports `VK_EXT_memory_budget`, otherwise only the heap sizes are filled in.
    pub fn heap_stats(&self) -> Vec<HeapStats> {
        let properties = &self.inner.memory_properties;
        let heaps = &properties.memory_heaps[..properties.memory_heap_count as usize];
        let mut budget = vk::PhysicalDeviceMemoryBudgetPropertiesEXT::default();
        if self.inner.memory_budget {
            let mut query = vk::PhysicalDeviceMemoryProperties2::builder().push_next(&mut budget);
            // SAFETY: The extension was enabled on the device and the instance targets Vulkan 1.1 or later.
            unsafe {
                self.inner
                    .instance
                    .get_physical_device_memory_properties2(self.inner.physical_device, &mut query)
            };
        }
        heaps
            .iter()
            .enumerate()
            .map(|(index, heap)| HeapStats {
                index: index as u32,
                flags: heap.flags,
                size: heap.size,
                usage: self.inner.memory_budget.then_some(budget.heap_usage[index]),
                budget: self.inner.memory_budget.then_some(budget.heap_budget[index]),
            })
            .collect()
    }

    /// The device this pool allocates from.
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    fn lock_allocator(&self) -> Result<MutexGuard<vk_alloc::Allocator>> {
        Ok(self.inner.allocator.lock().map_err(|_| Error::PoisonError)?)
    }

    fn allocate_memory(&self, name: &str, requirements: vk::MemoryRequirements, usage: MemoryUsage, linear: bool) -> Result<vk_alloc::Allocation> {
        let mut allocator = self.lock_allocator()?;
        let allocation = allocator.allocate(&vk_alloc::AllocationCreateDesc {
            name,
            requirements,
            location: gpu_allocator::MemoryLocation::from(usage),
            linear,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        Ok(allocation)
    }

    fn release_memory(&self, memory: vk_alloc::Allocation) {
        match self.inner.allocator.lock() {
            Ok(mut allocator) => {
                if let Err(err) = allocator.free(memory) {
                    error!("Failed to free allocation: {}", err);
                }
            }
            Err(_) => error!("Allocator mutex poisoned, leaking allocation"),
        }
    }

    /// Copy `data` into the start of a host visible buffer.
    /// # Errors
    /// * Fails with [`Error::InvalidAllocation`] if the buffer was already released.
    /// * Fails with [`Error::UnmappableBuffer`] if the buffer has no host mapping.
    /// * Fails with [`Error::UpdateOutOfRange`] if `data` does not fit.
    pub fn update(&self, allocation: &BufferAllocation, data: &[u8]) -> Result<()> {
        let memory = allocation.memory.as_ref().ok_or(Error::InvalidAllocation)?;
        let size = data.len() as u64;
        if size > allocation.size {
            return Err(Error::UpdateOutOfRange {
                size,
                capacity: allocation.size,
            }
            .into());
        }
        let pointer = memory.mapped_ptr().ok_or(Error::UnmappableBuffer)?;
        // SAFETY: The mapping is at least `allocation.size` bytes and we checked the length above.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), pointer.as_ptr().cast::<u8>(), data.len());
        }
        Ok(())
    }

    /// Destroy the view, then the image, then return its memory. Does nothing for an already released image.
    pub(crate) fn free_image(&self, allocation: &mut ImageAllocation) {
        if allocation.image == vk::Image::null() && allocation.memory.is_none() {
            return;
        }
        let device = &self.inner.device;
        unsafe {
            if allocation.view != vk::ImageView::null() {
                #[cfg(feature = "log-objects")]
                trace!("Destroying VkImageView {:p}", allocation.view);
                device.destroy_image_view(allocation.view, None);
            }
            if allocation.image != vk::Image::null() {
                #[cfg(feature = "log-objects")]
                trace!("Destroying VkImage {:p}", allocation.image);
                device.destroy_image(allocation.image, None);
            }
        }
        allocation.view = vk::ImageView::null();
        allocation.image = vk::Image::null();
        if let Some(memory) = allocation.memory.take() {
            self.release_memory(memory);
        }
        let live = self.inner.images.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        trace!("Released image allocation, {} images live", live);
    }

    /// Destroy the buffer, then return its memory. Does nothing for an already released buffer.
    pub(crate) fn free_buffer(&self, allocation: &mut BufferAllocation) {
        if allocation.buffer == vk::Buffer::null() && allocation.memory.is_none() {
            return;
        }
        if allocation.buffer != vk::Buffer::null() {
            #[cfg(feature = "log-objects")]
            trace!("Destroying VkBuffer {:p}", allocation.buffer);
            unsafe { self.inner.device.destroy_buffer(allocation.buffer, None) };
        }
        allocation.buffer = vk::Buffer::null();
        if let Some(memory) = allocation.memory.take() {
            self.release_memory(memory);
        }
        self.inner.buffers.fetch_sub(1, Ordering::AcqRel);
        self.inner.buffer_bytes.fetch_sub(allocation.size, Ordering::AcqRel);
    }
}

impl MemoryPool for DefaultMemoryPool {
    type Image = ImageAllocation;
    type Buffer = BufferAllocation;

    fn allocate_image(&self, info: &vk::ImageCreateInfo, usage: MemoryUsage) -> Result<Arc<ImageAllocation>> {
        let device = &self.inner.device;
        let image = unsafe { device.create_image(info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkImage {:p}", image);

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = match self.allocate_memory("image", requirements, usage, info.tiling == vk::ImageTiling::LINEAR) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_image(image, None) };
                return Err(err);
            }
        };

        // From here on, dropping the allocation releases everything created so far.
        self.inner.images.fetch_add(1, Ordering::AcqRel);
        let mut allocation = ImageAllocation {
            pool: self.clone(),
            image,
            view: vk::ImageView::null(),
            format: info.format,
            extent: info.extent,
            mip_levels: info.mip_levels,
            array_layers: info.array_layers,
            memory: Some(memory),
        };

        if let Some(memory) = &allocation.memory {
            unsafe { device.bind_image_memory(image, memory.memory(), memory.offset())? };
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(view_type_for(info.image_type, info.array_layers))
            .format(info.format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_from_format(info.format),
                base_mip_level: 0,
                level_count: info.mip_levels,
                base_array_layer: 0,
                layer_count: info.array_layers,
            })
            .build();
        allocation.view = unsafe { device.create_image_view(&view_info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkImageView {:p}", allocation.view);

        Ok(Arc::new(allocation))
    }

    fn allocate_buffer(&self, info: &vk::BufferCreateInfo, usage: MemoryUsage) -> Result<Arc<BufferAllocation>> {
        let device = &self.inner.device;
        let buffer = unsafe { device.create_buffer(info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkBuffer {:p}", buffer);

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = match self.allocate_memory("buffer", requirements, usage, true) {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        self.inner.buffers.fetch_add(1, Ordering::AcqRel);
        self.inner.buffer_bytes.fetch_add(info.size, Ordering::AcqRel);
        let allocation = BufferAllocation {
            pool: self.clone(),
            buffer,
            size: info.size,
            usage,
            memory: Some(memory),
        };

        if let Some(memory) = &allocation.memory {
            unsafe { device.bind_buffer_memory(buffer, memory.memory(), memory.offset())? };
        }
        if usage.is_host_visible() && !allocation.is_mapped() {
            warn!("Buffer with host visible usage {:?} did not receive a memory mapping", usage);
        }

        Ok(Arc::new(allocation))
    }
}
