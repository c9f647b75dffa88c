//! Exposes all structs needed to store initialization parameters.

use ash::vk;

/// Minimum requirements for the GPU. This will be used to determine what physical device is selected.
/// # Example
/// ```
/// # use vkb::*;
/// let requirements = GPURequirements {
///     dedicated: false,
///     min_video_memory: 256 * 1024 * 1024,
///     ..Default::default()
/// };
/// assert!(requirements.queue_flags.contains(vk::QueueFlags::GRAPHICS));
/// ```
#[derive(Debug, Clone)]
pub struct GPURequirements {
    /// Whether a dedicated GPU is required. Setting this to true will discard integrated GPUs.
    pub dedicated: bool,
    /// Minimum amount of video memory required, in bytes. Note that this might count shared memory if RAM is shared.
    pub min_video_memory: usize,
    /// Capabilities the single device queue must support. Task graphs submit to this queue.
    pub queue_flags: vk::QueueFlags,
}

impl Default for GPURequirements {
    fn default() -> Self {
        Self {
            dedicated: false,
            min_video_memory: 0,
            queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
        }
    }
}

/// Application settings used to initialize the vkb context.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Application name. Possibly displayed in debugging tools.
    pub name: String,
    /// Application version.
    pub version: (u32, u32, u32),
    /// Vulkan API version to request from the instance.
    pub api_version: (u32, u32),
    /// Enable Vulkan validation layers for additional debug output. Ignored if the layers are not installed.
    pub enable_validation: bool,
    /// Minimum requirements the selected physical device should have.
    pub gpu_requirements: GPURequirements,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppBuilder::new().build()
    }
}

/// Application settings used to initialize the vkb context.
#[derive(Debug)]
pub struct AppBuilder {
    inner: AppSettings,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Create a new application builder with default settings
    pub fn new() -> Self {
        AppBuilder {
            inner: AppSettings {
                name: String::from("vkb application"),
                version: (0, 0, 1),
                api_version: (1, 2),
                enable_validation: false,
                gpu_requirements: GPURequirements::default(),
            },
        }
    }

    /// Set the application name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Set the application version
    pub fn version(mut self, ver: impl Into<(u32, u32, u32)>) -> Self {
        self.inner.version = ver.into();
        self
    }

    /// Set the requested Vulkan API version. Defaults to 1.2.
    pub fn api_version(mut self, major: u32, minor: u32) -> Self {
        self.inner.api_version = (major, minor);
        self
    }

    /// Enable validation layers
    pub fn validation(mut self, val: bool) -> Self {
        self.inner.enable_validation = val;
        self
    }

    /// Set the GPU requirements used to select a physical device
    pub fn gpu(mut self, gpu: GPURequirements) -> Self {
        self.inner.gpu_requirements = gpu;
        self
    }

    /// Build the resulting application settings.
    pub fn build(self) -> AppSettings {
        self.inner
    }
}
