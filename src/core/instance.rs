//! Exposes the Vulkan instance, which represents the loaded Vulkan library

use std::ffi::CString;
use std::ops::Deref;
use std::str::FromStr;

use anyhow::Result;
use ash;
use ash::vk;

use crate::AppSettings;
use crate::util::string::{as_ptrs, fixed_name};

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Represents the loaded vulkan instance.
/// You need to create this to initialize the Vulkan API. This is used
/// to create the device from.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Instance {
    #[derivative(Debug = "ignore")]
    entry: ash::Entry,
    #[derivative(Debug = "ignore")]
    instance: ash::Instance,
    validation: bool,
}

impl Instance {
    /// Initializes the Vulkan API.
    /// # Errors
    /// * Can fail if the Vulkan loader was not found. Check for valid Vulkan drivers.
    /// * Can fail if the requested API version is not supported by the loader.
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };
        let validation = settings.enable_validation && validation_layer_available(&entry);
        if settings.enable_validation && !validation {
            warn!("Validation was requested, but {} is not installed. Continuing without it.", VALIDATION_LAYER);
        }
        let instance = create_vk_instance(&entry, settings, validation)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkInstance {:p}", instance.handle());
        Ok(Instance {
            entry,
            instance,
            validation,
        })
    }

    /// Get unsafe access to the vulkan entry point.
    /// # Safety
    /// Any vulkan calls that modify the system's state may put the system in an undefined state.
    pub unsafe fn loader(&self) -> &ash::Entry {
        &self.entry
    }

    /// Whether the validation layers were actually enabled on this instance.
    pub fn validation_enabled(&self) -> bool {
        self.validation
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkInstance {:p}", self.instance.handle());
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

impl Deref for Instance {
    type Target = ash::Instance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

fn validation_layer_available(entry: &ash::Entry) -> bool {
    entry
        .enumerate_instance_layer_properties()
        .map(|layers| {
            layers
                .iter()
                .any(|layer| fixed_name(&layer.layer_name).to_bytes() == VALIDATION_LAYER.as_bytes())
        })
        .unwrap_or(false)
}

fn create_vk_instance(entry: &ash::Entry, settings: &AppSettings, validation: bool) -> Result<ash::Instance> {
    let app_name = CString::new(settings.name.clone())?;
    let engine_name = CString::new("vkb")?;
    let (major, minor, patch) = settings.version;
    let app_info = vk::ApplicationInfo {
        api_version: vk::make_api_version(0, settings.api_version.0, settings.api_version.1, 0),
        p_application_name: app_name.as_ptr(),
        application_version: vk::make_api_version(0, major, minor, patch),
        p_engine_name: engine_name.as_ptr(),
        engine_version: vk::make_api_version(
            0,
            u32::from_str(env!("CARGO_PKG_VERSION_MAJOR")).unwrap_or_default(),
            u32::from_str(env!("CARGO_PKG_VERSION_MINOR")).unwrap_or_default(),
            u32::from_str(env!("CARGO_PKG_VERSION_PATCH")).unwrap_or_default(),
        ),
        ..Default::default()
    };

    let mut layers = Vec::<CString>::new();
    let mut extensions = Vec::<CString>::new();

    if validation {
        layers.push(CString::new(VALIDATION_LAYER)?);
        extensions.push(CString::from(ash::extensions::ext::DebugUtils::name()));
    }

    info!("Enabled instance layers:");
    for layer in &layers {
        info!("{:?}", layer);
    }
    info!("Enabled instance extensions:");
    for ext in &extensions {
        info!("{:?}", ext);
    }

    let layers_raw = as_ptrs(layers.as_slice());
    let extensions_raw = as_ptrs(extensions.as_slice());

    let instance_info = vk::InstanceCreateInfo::builder()
        .application_info(&app_info)
        .enabled_layer_names(layers_raw.as_slice())
        .enabled_extension_names(extensions_raw.as_slice())
        .build();

    Ok(unsafe { entry.create_instance(&instance_info, None)? })
}
