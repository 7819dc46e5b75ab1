use std::sync::Arc;

use ash::{extensions::khr, vk};

use crate::{
    device::Device, physical_device::QueueFamilyIndices, window::Window, Error, Result,
};

pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub functions: khr::Swapchain,
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub images: Vec<vk::Image>,
    pub extent: vk::Extent2D,
    pub device: Arc<Device>,
}

impl Swapchain {
    pub fn new(device: &Arc<Device>, window: &Window) -> Result<Self> {
        let functions = khr::Swapchain::new(&device.instance.handle, &device.handle);
        let support = device.swapchain_support()?;

        let surface_format =
            select_surface_format(&support.formats).ok_or(Error::NoSurfaceFormat)?;
        let present_mode =
            select_present_mode(&support.present_modes).ok_or(Error::NoPresentMode)?;
        let extent = select_extent(&support.capabilities, window.framebuffer_extent());
        let min_image_count = select_image_count(&support.capabilities);

        let (image_sharing_mode, queue_family_indices) =
            select_sharing(&device.find_queue_families()?);

        let handle = unsafe {
            functions.create_swapchain(
                &vk::SwapchainCreateInfoKHR::builder()
                    .surface(device.surface.handle)
                    .min_image_count(min_image_count)
                    .image_format(surface_format.format)
                    .image_color_space(surface_format.color_space)
                    .image_extent(extent)
                    .image_array_layers(1)
                    .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                    .image_sharing_mode(image_sharing_mode)
                    .queue_family_indices(&queue_family_indices)
                    .pre_transform(support.capabilities.current_transform)
                    .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                    .present_mode(present_mode)
                    .clipped(true)
                    .old_swapchain(vk::SwapchainKHR::null()),
                None,
            )?
        };

        let images = match unsafe { functions.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(error) => {
                unsafe { functions.destroy_swapchain(handle, None) };
                return Err(error.into());
            }
        };

        log::info!(
            "Created swapchain: {} images, {:?} {:?}, {}x{}, {:?}",
            images.len(),
            surface_format.format,
            surface_format.color_space,
            extent.width,
            extent.height,
            present_mode
        );
        Ok(Self {
            handle,
            functions,
            surface_format,
            present_mode,
            images,
            extent,
            device: device.clone(),
        })
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe { self.functions.destroy_swapchain(self.handle, None) };
    }
}

/// Prefers sRGB BGRA8, otherwise whatever the surface lists first.
pub fn select_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|surface_format| {
            surface_format.format == vk::Format::B8G8R8A8_SRGB
                && surface_format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// Prefers FIFO, otherwise whatever the surface lists first.
pub fn select_present_mode(present_modes: &[vk::PresentModeKHR]) -> Option<vk::PresentModeKHR> {
    present_modes
        .iter()
        .copied()
        .find(|&present_mode| present_mode == vk::PresentModeKHR::FIFO)
        .or_else(|| present_modes.first().copied())
}

pub fn select_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);
    vk::Extent2D {
        width: framebuffer.width.max(min.width).min(max.width),
        height: framebuffer.height.max(min.height).min(max.height),
    }
}

/// One more image than the minimum, unless the surface caps it. A maximum of zero means no cap.
pub fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count.saturating_add(1);
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

/// Images are shared between the graphics and present families only when they differ.
pub fn select_sharing(queue_families: &QueueFamilyIndices) -> (vk::SharingMode, Vec<u32>) {
    let indices = queue_families.unique();
    if indices.len() > 1 {
        (vk::SharingMode::CONCURRENT, indices)
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn key(surface_format: Option<vk::SurfaceFormatKHR>) -> Option<(vk::Format, vk::ColorSpaceKHR)> {
        surface_format.map(|f| (f.format, f.color_space))
    }

    fn size(extent: vk::Extent2D) -> (u32, u32) {
        (extent.width, extent.height)
    }

    #[test]
    fn surface_format_prefers_srgb_bgra_anywhere_in_list() {
        let srgb = format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        let unorm = format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        let hdr = format(
            vk::Format::A2B10G10R10_UNORM_PACK32,
            vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        );

        assert_eq!(key(select_surface_format(&[srgb])), key(Some(srgb)));
        assert_eq!(key(select_surface_format(&[unorm, hdr, srgb])), key(Some(srgb)));
        assert_eq!(key(select_surface_format(&[srgb, unorm])), key(Some(srgb)));
    }

    #[test]
    fn surface_format_falls_back_to_first() {
        let unorm = format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        let wrong_space = format(
            vk::Format::B8G8R8A8_SRGB,
            vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
        );

        assert_eq!(key(select_surface_format(&[unorm, wrong_space])), key(Some(unorm)));
        assert_eq!(key(select_surface_format(&[wrong_space, unorm])), key(Some(wrong_space)));
        assert!(select_surface_format(&[]).is_none());
    }

    #[test]
    fn present_mode_prefers_fifo() {
        use vk::PresentModeKHR as Mode;

        assert_eq!(
            select_present_mode(&[Mode::MAILBOX, Mode::IMMEDIATE, Mode::FIFO]),
            Some(Mode::FIFO)
        );
        assert_eq!(
            select_present_mode(&[Mode::MAILBOX, Mode::IMMEDIATE]),
            Some(Mode::MAILBOX)
        );
        assert_eq!(select_present_mode(&[]), None);
    }

    #[test]
    fn extent_uses_current_extent_when_fixed() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: extent(1280, 720),
            min_image_extent: extent(1, 1),
            max_image_extent: extent(4096, 4096),
            ..Default::default()
        };
        assert_eq!(size(select_extent(&capabilities, extent(800, 600))), (1280, 720));
    }

    #[test]
    fn extent_clamps_framebuffer_when_surface_defers() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: extent(u32::MAX, u32::MAX),
            min_image_extent: extent(200, 200),
            max_image_extent: extent(1920, 1080),
            ..Default::default()
        };
        assert_eq!(size(select_extent(&capabilities, extent(800, 600))), (800, 600));
        assert_eq!(size(select_extent(&capabilities, extent(4000, 100))), (1920, 200));
        assert_eq!(size(select_extent(&capabilities, extent(0, 5000))), (200, 1080));
    }

    #[test]
    fn image_count_is_min_plus_one_within_max() {
        let mut capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(select_image_count(&capabilities), 3);

        capabilities.max_image_count = 8;
        assert_eq!(select_image_count(&capabilities), 3);

        capabilities.max_image_count = 2;
        assert_eq!(select_image_count(&capabilities), 2);
    }

    #[test]
    fn image_count_saturates_at_u32_max() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: u32::MAX,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(select_image_count(&capabilities), u32::MAX);
    }

    #[test]
    fn sharing_is_concurrent_across_distinct_families() {
        let queue_families = QueueFamilyIndices {
            graphics: Some(1),
            present: Some(0),
        };
        assert_eq!(
            select_sharing(&queue_families),
            (vk::SharingMode::CONCURRENT, vec![0, 1])
        );
    }

    #[test]
    fn sharing_is_exclusive_for_a_single_family() {
        let queue_families = QueueFamilyIndices {
            graphics: Some(2),
            present: Some(2),
        };
        assert_eq!(
            select_sharing(&queue_families),
            (vk::SharingMode::EXCLUSIVE, Vec::new())
        );
    }
}
