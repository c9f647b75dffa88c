//! Exposes the device context, which bundles everything needed to record and submit work.

use std::sync::Arc;

use anyhow::Result;

use crate::core::debug::DebugMessenger;
use crate::{AppSettings, DefaultMemoryPool, Device, Instance, PhysicalDevice, Queue};

/// Owns the Vulkan instance, the selected physical device, the logical device with its queue, and
/// the device-wide memory pool. Create one per application and hand it to every
/// [`TaskGraph`](crate::TaskGraph).
///
/// Fields are dropped in declaration order: cleanup callbacks run first, the instance goes last.
///
/// # Example
/// ```no_run
/// # use vkb::*;
/// let settings = AppBuilder::new()
///     .name("headless")
///     .validation(true)
///     .build();
/// let mut context = Context::new(&settings)?;
/// context.add_cleanup_callback(|| println!("tearing down"));
/// println!("running on {:?}", context.physical_device().properties().device_type);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Context {
    #[derivative(Debug = "ignore")]
    cleanup_callbacks: Vec<Box<dyn FnOnce() + Send>>,
    memory_pool: DefaultMemoryPool,
    graphics_queue: Queue,
    physical_device: PhysicalDevice,
    device: Device,
    #[derivative(Debug = "ignore")]
    debug_messenger: Option<DebugMessenger>,
    #[derivative(Debug = "ignore")]
    instance: Arc<Instance>,
}

impl Context {
    /// Initialize Vulkan and create a device with a single queue and a memory pool.
    /// # Errors
    /// * Fails if the Vulkan library cannot be loaded.
    /// * Fails with [`Error::NoGPU`](crate::Error::NoGPU) if no device satisfies the GPU requirements.
    /// * Fails if creating the device or the allocator fails.
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let instance = Arc::new(Instance::new(settings)?);
        let debug_messenger = if instance.validation_enabled() {
            Some(DebugMessenger::new(&instance)?)
        } else {
            None
        };

        let physical_device = PhysicalDevice::select(&instance, settings)?;
        let device = Device::new(instance.clone(), &physical_device)?;
        let queue_flags = physical_device
            .queue_families()
            .get(physical_device.queue_family_index() as usize)
            .map(|family| family.queue_flags)
            .unwrap_or(settings.gpu_requirements.queue_flags);
        let graphics_queue = Queue::new(device.clone(), 0, queue_flags)?;
        let memory_pool = DefaultMemoryPool::new(&instance, &device, &physical_device)?;
        info!("Created device context for '{}'", settings.name);

        Ok(Context {
            cleanup_callbacks: Vec::new(),
            memory_pool,
            graphics_queue,
            physical_device,
            device,
            debug_messenger,
            instance,
        })
    }

    /// Register a callback that runs when the context is dropped, while the device is still alive.
    /// Callbacks run in reverse registration order.
    pub fn add_cleanup_callback(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.cleanup_callbacks.push(Box::new(callback));
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    /// The queue task graphs submit to.
    pub fn graphics_queue(&self) -> &Queue {
        &self.graphics_queue
    }

    /// The device-wide memory pool.
    pub fn memory_pool(&self) -> &DefaultMemoryPool {
        &self.memory_pool
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Whether the validation layer and debug messenger are active.
    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(err) = self.device.wait_idle() {
            error!("Failed to wait for device idle during teardown: {}", err);
        }
        while let Some(callback) = self.cleanup_callbacks.pop() {
            callback();
        }
    }
}
