use std::ops::Deref;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::{Instance, PhysicalDevice};

#[derive(Derivative)]
#[derivative(Debug)]
struct DeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    queue_family_index: u32,
    properties: vk::PhysicalDeviceProperties,
    // Keeps the instance alive for as long as any device handle exists.
    #[derivative(Debug = "ignore")]
    _instance: Arc<Instance>,
}

/// Wrapper around a `VkDevice`. The device provides access to almost the entire
/// Vulkan API. Internal state is wrapped in an `Arc<DeviceInner>`, so this is safe
/// to clone
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Create a new Vulkan device with a single queue from the queue family picked during
    /// physical device selection.
    pub fn new(instance: Arc<Instance>, physical_device: &PhysicalDevice) -> Result<Self> {
        let priorities = [1.0f32];
        let queue_family_index = physical_device.queue_family_index();
        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&priorities)
            .build();

        let mut extensions = Vec::new();
        if physical_device.supports_memory_budget() {
            extensions.push(vk::ExtMemoryBudgetFn::name().as_ptr());
            info!("Enabling device extension {:?}", vk::ExtMemoryBudgetFn::name());
        }

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extensions)
            .build();

        // SAFETY: Vulkan API call. We have a valid reference to a PhysicalDevice, so handle() is valid.
        let handle = unsafe { instance.create_device(physical_device.handle(), &info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDevice {:p}", handle.handle());

        Ok(Device {
            inner: Arc::new(DeviceInner {
                handle,
                queue_family_index,
                properties: *physical_device.properties(),
                _instance: instance,
            }),
        })
    }

    /// Wait for the device to be completely idle.
    /// This should not be used as a synchronization measure, except on exit.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { Ok(self.inner.handle.device_wait_idle()?) }
    }

    /// Get unsafe access to the underlying VkDevice handle
    /// # Safety
    /// * The caller should not call `vkDestroyDevice` on this.
    /// * This handle is valid as long as there is a copy of `self` alive.
    pub unsafe fn handle(&self) -> ash::Device {
        self.inner.handle.clone()
    }

    /// Get the queue family the device queue was created from.
    pub fn queue_family_index(&self) -> u32 {
        self.inner.queue_family_index
    }

    /// Get the device properties
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.inner.properties
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.inner.handle
    }
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDevice {:p}", self.handle.handle());
        unsafe {
            self.handle.destroy_device(None);
        }
    }
}
