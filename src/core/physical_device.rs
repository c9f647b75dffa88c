use std::ffi::CStr;

use anyhow::Result;
use ash::vk;

use crate::util::string::fixed_name;
use crate::{AppSettings, Error, Instance};

/// A physical device abstracts away an actual device, like a graphics card or integrated graphics card.
#[derive(Default, Debug)]
pub struct PhysicalDevice {
    /// Handle to the [`VkPhysicalDevice`](vk::PhysicalDevice).
    handle: vk::PhysicalDevice,
    /// [`VkPhysicalDeviceProperties`](vk::PhysicalDeviceProperties) structure with properties of this physical device.
    properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types exposed by the device.
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// List of [`VkQueueFamilyProperties`](vk::QueueFamilyProperties) with properties of each queue family on the device.
    queue_families: Vec<vk::QueueFamilyProperties>,
    /// Family the device queue will be created from.
    queue_family_index: u32,
    /// Whether `VK_EXT_memory_budget` is available and will be enabled on the device.
    memory_budget: bool,
}

/// Scores a device type. Devices closer to the front of the list are preferred.
fn type_preference(ty: vk::PhysicalDeviceType) -> u32 {
    const ORDER: [vk::PhysicalDeviceType; 5] = [
        vk::PhysicalDeviceType::DISCRETE_GPU,
        vk::PhysicalDeviceType::INTEGRATED_GPU,
        vk::PhysicalDeviceType::VIRTUAL_GPU,
        vk::PhysicalDeviceType::CPU,
        vk::PhysicalDeviceType::OTHER,
    ];
    ORDER
        .iter()
        .position(|&candidate| candidate == ty)
        .map(|index| (ORDER.len() - index) as u32)
        .unwrap_or(0)
}

impl PhysicalDevice {
    /// Selects the best available physical device from the given requirements.
    /// Devices that do not meet the requirements are rejected, the remaining ones are ranked
    /// by device type (discrete, integrated, virtual, cpu, other).
    pub fn select(instance: &Instance, settings: &AppSettings) -> Result<Self> {
        let devices = unsafe { instance.enumerate_physical_devices()? };
        if devices.is_empty() {
            return Err(anyhow::Error::from(Error::NoGPU));
        }

        let requirements = &settings.gpu_requirements;
        let physical_device = devices
            .iter()
            .filter_map(|&device| -> Option<PhysicalDevice> {
                let properties = unsafe { instance.get_physical_device_properties(device) };
                let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
                let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

                if requirements.dedicated && properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
                    return None;
                }
                if requirements.min_video_memory > total_video_memory(&memory_properties) {
                    return None;
                }
                let queue_family_index = queue_families
                    .iter()
                    .position(|family| family.queue_count > 0 && effective_flags(family.queue_flags).contains(requirements.queue_flags))?;
                // Querying the budget goes through vkGetPhysicalDeviceMemoryProperties2, which needs Vulkan 1.1.
                let memory_budget = settings.api_version >= (1, 1)
                    && properties.api_version >= vk::API_VERSION_1_1
                    && supports_extension(instance, device, vk::ExtMemoryBudgetFn::name());

                Some(PhysicalDevice {
                    handle: device,
                    properties,
                    memory_properties,
                    queue_families,
                    queue_family_index: queue_family_index as u32,
                    memory_budget,
                })
            })
            .max_by_key(|device| type_preference(device.properties.device_type))
            .ok_or_else(|| anyhow::Error::from(Error::NoGPU))?;

        let name = fixed_name(&physical_device.properties.device_name);
        info!(
            "Picked physical device {:?} ({:?}), driver version {:?}.",
            name, physical_device.properties.device_type, physical_device.properties.driver_version
        );
        info!(
            "Device has {} bytes of available video memory, of which {} are device local.",
            total_video_memory(&physical_device.memory_properties),
            total_device_memory(&physical_device.memory_properties)
        );
        Ok(physical_device)
    }

    /// Get all queue families available on this device
    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        self.queue_families.as_slice()
    }

    /// Get the family index the device queue is created from.
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Get unsafe access to the physical device handle
    /// # Safety
    /// Any vulkan calls that modify the system's state may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    /// Get the device properties
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// Get the memory heaps and types of this device
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// Whether per-heap usage and budget can be queried on this device.
    pub fn supports_memory_budget(&self) -> bool {
        self.memory_budget
    }
}

fn supports_extension(instance: &Instance, device: vk::PhysicalDevice, name: &CStr) -> bool {
    match unsafe { instance.enumerate_device_extension_properties(device) } {
        Ok(extensions) => extensions.iter().any(|extension| fixed_name(&extension.extension_name) == name),
        Err(err) => {
            warn!("Could not enumerate device extensions: {}", err);
            false
        }
    }
}

// Graphics and compute queues always support transfer operations, even when they do not report it.
fn effective_flags(flags: vk::QueueFlags) -> vk::QueueFlags {
    if flags.intersects(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE) {
        flags | vk::QueueFlags::TRANSFER
    } else {
        flags
    }
}

fn total_video_memory(memory: &vk::PhysicalDeviceMemoryProperties) -> usize {
    memory.memory_heaps[..memory.memory_heap_count as usize]
        .iter()
        .map(|heap| heap.size as usize)
        .sum()
}

fn total_device_memory(memory: &vk::PhysicalDeviceMemoryProperties) -> usize {
    memory.memory_heaps[..memory.memory_heap_count as usize]
        .iter()
        .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|heap| heap.size as usize)
        .sum()
}
