use std::sync::Arc;

use ash::vk;

use crate::{device::Device, swapchain::Swapchain, Result};

/// One color view per swapchain image.
pub struct ImageViews {
    pub handles: Vec<vk::ImageView>,
    pub device: Arc<Device>,
}

impl ImageViews {
    pub fn new(device: &Arc<Device>, swapchain: &Swapchain) -> Result<Self> {
        // Views are pushed as they are created so an early return releases them.
        let mut image_views = Self {
            handles: Vec::with_capacity(swapchain.images.len()),
            device: device.clone(),
        };
        for &image in &swapchain.images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(swapchain.surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(
                    vk::ImageSubresourceRange::builder()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1)
                        .build(),
                );
            let handle = unsafe { device.handle.create_image_view(&create_info, None)? };
            image_views.handles.push(handle);
        }
        log::info!("Created {} swapchain image views", image_views.handles.len());
        Ok(image_views)
    }
}

impl Drop for ImageViews {
    fn drop(&mut self) {
        for image_view in self.handles.drain(..) {
            unsafe { self.device.handle.destroy_image_view(image_view, None) };
        }
    }
}
