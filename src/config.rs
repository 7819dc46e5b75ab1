//! Engine-wide constants and the configuration handed to [`Instance::new`].
//!
//! [`Instance::new`]: crate::instance::Instance::new

use std::{ffi::CStr, fmt};

use ash::{extensions::khr, vk};

pub const ENGINE_NAME: &str = "Pulsar";
pub const ENGINE_VERSION: Version = Version::new(0, 0, 1);
pub const API_VERSION: u32 = vk::API_VERSION_1_0;

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Device extensions every selected physical device must expose.
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [khr::Swapchain::name()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn to_vk(self) -> u32 {
        vk::make_api_version(0, self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: Version,
}

impl Default for ApplicationInfo {
    fn default() -> Self {
        Self {
            name: "Vulkan".to_owned(),
            version: Version::new(1, 0, 0),
        }
    }
}

/// Receives every message the validation layers emit.
pub type MessageCallback =
    Box<dyn Fn(vk::DebugUtilsMessageSeverityFlagsEXT, &str) + Send + Sync + 'static>;

pub struct InstanceConfig {
    pub application: ApplicationInfo,
    /// Enables `VK_LAYER_KHRONOS_validation` and the debug messenger.
    pub validation: bool,
    /// Sink for validation messages. Messages go to the `log` facade when unset.
    pub message_callback: Option<MessageCallback>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            application: ApplicationInfo::default(),
            validation: cfg!(debug_assertions),
            message_callback: None,
        }
    }
}

impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("application", &self.application)
            .field("validation", &self.validation)
            .field("message_callback", &self.message_callback.is_some())
            .finish()
    }
}
