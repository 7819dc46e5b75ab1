use std::{ffi::CString, sync::Arc};

use ash::vk;

use crate::{
    config,
    instance::Instance,
    physical_device::{self, PhysicalDevice, QueueFamilyIndices, SwapchainSupport},
    surface::Surface,
    Error, Result,
};

#[derive(Debug, Clone, Copy)]
pub struct Queue {
    pub handle: vk::Queue,
    pub family_index: u32,
}

pub struct Device {
    pub handle: ash::Device,
    pub instance: Arc<Instance>,
    pub surface: Arc<Surface>,
    pub physical_device: PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub graphics_queue: Queue,
    pub present_queue: Queue,
}

impl Device {
    /// Picks the best physical device for `surface` and opens it.
    pub fn new(instance: Arc<Instance>, surface: Arc<Surface>) -> Result<Self> {
        let physical_device =
            physical_device::select_physical_device(instance.physical_devices()?, &*surface)?;
        log::info!("Selected physical device {:?}", physical_device.name);

        let queue_families = physical_device::find_queue_families(&physical_device, &*surface)?;
        let (Some(graphics_family), Some(present_family)) =
            (queue_families.graphics, queue_families.present)
        else {
            return Err(Error::IncompleteQueueFamilies);
        };

        let queue_priorities = [1.0];
        let queue_create_infos: Vec<_> = queue_families
            .unique()
            .into_iter()
            .map(|queue_family_index| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(queue_family_index)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();
        let enabled_extension_names: Vec<_> = config::required_device_extensions()
            .iter()
            .map(|name| name.as_ptr())
            .collect();
        // Device layers are ignored by current loaders but still honoured by old ones.
        let validation_layer = CString::new(config::VALIDATION_LAYER)?;
        let enabled_layer_names = if instance.validation {
            vec![validation_layer.as_ptr()]
        } else {
            Vec::new()
        };
        let enabled_features = vk::PhysicalDeviceFeatures::default();

        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&enabled_extension_names)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_features(&enabled_features);

        let handle = unsafe {
            instance
                .handle
                .create_device(physical_device.handle, &create_info, None)?
        };
        let graphics_queue = Queue {
            handle: unsafe { handle.get_device_queue(graphics_family, 0) },
            family_index: graphics_family,
        };
        let present_queue = Queue {
            handle: unsafe { handle.get_device_queue(present_family, 0) },
            family_index: present_family,
        };

        log::info!("Initialized logical device successfully");
        Ok(Self {
            handle,
            instance,
            surface,
            physical_device,
            queue_families,
            graphics_queue,
            present_queue,
        })
    }

    pub fn find_queue_families(&self) -> Result<QueueFamilyIndices> {
        physical_device::find_queue_families(&self.physical_device, &*self.surface)
    }

    pub fn swapchain_support(&self) -> Result<SwapchainSupport> {
        physical_device::query_swapchain_support(&self.physical_device, &*self.surface)
    }

    pub fn rate(&self) -> Result<u32> {
        physical_device::rate_device(&self.physical_device, &*self.surface)
    }

    pub fn extensions_supported(&self) -> bool {
        self.physical_device.extensions_supported()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { self.handle.destroy_device(None) };
    }
}
