use std::{ffi::c_void, ptr, sync::Arc};

use ash::{extensions::khr, vk};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

use crate::{
    instance::Instance,
    physical_device::{PresentationTarget, SwapchainSupport},
    window::Window,
    Error, Result,
};

pub struct Surface {
    pub handle: vk::SurfaceKHR,
    pub functions: khr::Surface,
    pub instance: Arc<Instance>,
    pub window: Arc<Window>,
}

impl Surface {
    pub fn new(instance: &Arc<Instance>, window: &Arc<Window>) -> Result<Self> {
        let entry = &instance.entry;
        let handle = match (
            window.display_handle()?.as_raw(),
            window.window_handle()?.as_raw(),
        ) {
            (_, RawWindowHandle::Win32(window_handle)) => {
                let hinstance = window_handle
                    .hinstance
                    .map_or(ptr::null(), |hinstance| hinstance.get() as *const c_void);
                let hwnd = window_handle.hwnd.get() as *const c_void;
                unsafe {
                    khr::Win32Surface::new(entry, &instance.handle).create_win32_surface(
                        &vk::Win32SurfaceCreateInfoKHR::builder()
                            .hinstance(hinstance)
                            .hwnd(hwnd),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window_handle)) => {
                let dpy = display
                    .display
                    .map_or(ptr::null_mut(), |display| display.as_ptr());
                unsafe {
                    khr::XlibSurface::new(entry, &instance.handle).create_xlib_surface(
                        &vk::XlibSurfaceCreateInfoKHR::builder()
                            .dpy(dpy.cast())
                            .window(window_handle.window),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(window_handle)) => {
                let connection = display
                    .connection
                    .map_or(ptr::null_mut(), |connection| connection.as_ptr());
                unsafe {
                    khr::XcbSurface::new(entry, &instance.handle).create_xcb_surface(
                        &vk::XcbSurfaceCreateInfoKHR::builder()
                            .connection(connection.cast())
                            .window(window_handle.window.get()),
                        None,
                    )?
                }
            }
            (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window_handle)) => unsafe {
                khr::WaylandSurface::new(entry, &instance.handle).create_wayland_surface(
                    &vk::WaylandSurfaceCreateInfoKHR::builder()
                        .display(display.display.as_ptr().cast())
                        .surface(window_handle.surface.as_ptr().cast()),
                    None,
                )?
            },
            (_, other) => return Err(Error::UnsupportedPlatform(format!("{other:?}"))),
        };
        let functions = khr::Surface::new(entry, &instance.handle);

        log::info!("Created window surface");
        Ok(Self {
            handle,
            functions,
            instance: instance.clone(),
            window: window.clone(),
        })
    }
}

impl PresentationTarget for Surface {
    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool> {
        Ok(unsafe {
            self.functions.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.handle,
            )?
        })
    }

    fn swapchain_support(&self, physical_device: vk::PhysicalDevice) -> Result<SwapchainSupport> {
        unsafe {
            Ok(SwapchainSupport {
                capabilities: self
                    .functions
                    .get_physical_device_surface_capabilities(physical_device, self.handle)?,
                formats: self
                    .functions
                    .get_physical_device_surface_formats(physical_device, self.handle)?,
                present_modes: self
                    .functions
                    .get_physical_device_surface_present_modes(physical_device, self.handle)?,
            })
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.functions.destroy_surface(self.handle, None) };
    }
}
