#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use vkb::{AppBuilder, BufferResource, Context, Error, GPURequirements, ImageResource, MemoryPool, MemoryUsage, SyncPoint};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        let _ = pretty_env_logger::try_init();
    });
}

/// Creates a headless context ready for automated tests.
pub fn make_context() -> Result<Context> {
    init_logger();
    let settings = AppBuilder::new()
        .name("vkb test framework")
        .version((0, 0, 1))
        .validation(false)
        .gpu(GPURequirements {
            dedicated: false,
            min_video_memory: 0,
            queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
        })
        .build();
    Context::new(&settings)
}

#[derive(Debug, Default)]
pub struct MockState {
    next_handle: AtomicU64,
    pub image_allocations: AtomicUsize,
    pub buffer_allocations: AtomicUsize,
    pub live_images: AtomicUsize,
    pub live_buffers: AtomicUsize,
    pub fail: AtomicBool,
}

/// Memory pool that hands out fake handles. Counts allocations so tests can check materialization.
#[derive(Debug, Clone, Default)]
pub struct MockPool {
    pub state: Arc<MockState>,
}

pub struct MockImage {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub info: vk::ImageCreateInfo,
    pub usage: MemoryUsage,
    state: Arc<MockState>,
}

pub struct MockBuffer {
    pub buffer: vk::Buffer,
    pub size: vk::DeviceSize,
    pub usage: MemoryUsage,
    state: Arc<MockState>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following allocation fail.
    pub fn fail_allocations(&self) {
        self.state.fail.store(true, Ordering::SeqCst);
    }

    pub fn image_allocations(&self) -> usize {
        self.state.image_allocations.load(Ordering::SeqCst)
    }

    pub fn buffer_allocations(&self) -> usize {
        self.state.buffer_allocations.load(Ordering::SeqCst)
    }

    pub fn live_images(&self) -> usize {
        self.state.live_images.load(Ordering::SeqCst)
    }

    pub fn live_buffers(&self) -> usize {
        self.state.live_buffers.load(Ordering::SeqCst)
    }

    fn next_handle(&self) -> u64 {
        self.state.next_handle.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl MemoryPool for MockPool {
    type Image = MockImage;
    type Buffer = MockBuffer;

    fn allocate_image(&self, info: &vk::ImageCreateInfo, usage: MemoryUsage) -> Result<Arc<MockImage>> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(Error::VkError(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY).into());
        }
        self.state.image_allocations.fetch_add(1, Ordering::SeqCst);
        self.state.live_images.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockImage {
            image: vk::Image::from_raw(self.next_handle()),
            view: vk::ImageView::from_raw(self.next_handle()),
            info: *info,
            usage,
            state: self.state.clone(),
        }))
    }

    fn allocate_buffer(&self, info: &vk::BufferCreateInfo, usage: MemoryUsage) -> Result<Arc<MockBuffer>> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(Error::VkError(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY).into());
        }
        self.state.buffer_allocations.fetch_add(1, Ordering::SeqCst);
        self.state.live_buffers.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockBuffer {
            buffer: vk::Buffer::from_raw(self.next_handle()),
            size: info.size,
            usage,
            state: self.state.clone(),
        }))
    }
}

impl ImageResource for MockImage {
    fn image(&self) -> vk::Image {
        self.image
    }

    fn view(&self) -> vk::ImageView {
        self.view
    }

    fn is_valid(&self) -> bool {
        true
    }
}

impl BufferResource for MockBuffer {
    fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    fn size(&self) -> vk::DeviceSize {
        self.size
    }

    fn is_valid(&self) -> bool {
        true
    }
}

impl Drop for MockImage {
    fn drop(&mut self) {
        self.state.live_images.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.state.live_buffers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A sync point that is signaled by hand.
#[derive(Debug, Default)]
pub struct Latch {
    signaled: AtomicBool,
}

impl Latch {
    pub fn new(signaled: bool) -> Arc<Self> {
        Arc::new(Self {
            signaled: AtomicBool::new(signaled),
        })
    }

    pub fn signal(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }
}

impl SyncPoint for Latch {
    fn wait_until(&self, _timeout: u64) -> Result<bool> {
        Ok(self.is_signaled())
    }

    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}
