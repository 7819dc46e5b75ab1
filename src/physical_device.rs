use std::collections::BTreeSet;

use ash::vk;

use crate::{config, Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct QueueFamily {
    pub index: u32,
    pub properties: vk::QueueFamilyProperties,
}

#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_families: Vec<QueueFamily>,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub extensions: Vec<String>,
}

impl PhysicalDevice {
    /// True when every extension in [`config::required_device_extensions`] is exposed.
    pub fn extensions_supported(&self) -> bool {
        let mut missing: BTreeSet<&str> = config::required_device_extensions()
            .iter()
            .filter_map(|name| name.to_str().ok())
            .collect();
        for extension in &self.extensions {
            missing.remove(extension.as_str());
        }
        missing.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Distinct family indices, in ascending order. Empty until complete.
    pub fn unique(&self) -> Vec<u32> {
        match (self.graphics, self.present) {
            (Some(graphics), Some(present)) => BTreeSet::from([graphics, present])
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Something a physical device can present to, normally a [`Surface`].
///
/// [`Surface`]: crate::surface::Surface
pub trait PresentationTarget {
    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool>;

    fn swapchain_support(&self, physical_device: vk::PhysicalDevice) -> Result<SwapchainSupport>;
}

pub fn find_queue_families(
    physical_device: &PhysicalDevice,
    target: &impl PresentationTarget,
) -> Result<QueueFamilyIndices> {
    let mut indices = QueueFamilyIndices::default();
    for queue_family in &physical_device.queue_families {
        if indices.is_complete() {
            break;
        }
        if indices.graphics.is_none()
            && queue_family
                .properties
                .queue_flags
                .contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics = Some(queue_family.index);
        }
        if indices.present.is_none()
            && target.supports_present(physical_device.handle, queue_family.index)?
        {
            indices.present = Some(queue_family.index);
        }
    }
    Ok(indices)
}

pub fn query_swapchain_support(
    physical_device: &PhysicalDevice,
    target: &impl PresentationTarget,
) -> Result<SwapchainSupport> {
    target.swapchain_support(physical_device.handle)
}

/// Scores a device for presenting to `target`. Zero means unusable.
pub fn rate_device(
    physical_device: &PhysicalDevice,
    target: &impl PresentationTarget,
) -> Result<u32> {
    if !find_queue_families(physical_device, target)?.is_complete() {
        return Ok(0);
    }
    if !physical_device.extensions_supported() {
        return Ok(0);
    }
    let support = query_swapchain_support(physical_device, target)?;
    if support.formats.is_empty() || support.present_modes.is_empty() {
        return Ok(0);
    }

    let properties = &physical_device.properties;
    let type_bonus = match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 32,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        _ => 0,
    };
    Ok(type_bonus + properties.limits.max_image_dimension2_d / 1024)
}

/// Picks the highest-rated device. The earliest enumerated device wins a tie.
pub fn select_physical_device(
    physical_devices: Vec<PhysicalDevice>,
    target: &impl PresentationTarget,
) -> Result<PhysicalDevice> {
    if physical_devices.is_empty() {
        return Err(Error::NoVulkanDevice);
    }

    let mut best: Option<(u32, PhysicalDevice)> = None;
    for physical_device in physical_devices {
        let score = rate_device(&physical_device, target)?;
        log::debug!("Device {:?} rated {}", physical_device.name, score);
        if score == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((score, physical_device));
        }
    }

    best.map(|(_, physical_device)| physical_device)
        .ok_or(Error::NoSuitableDevice)
}
