use ash::vk;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use winit::{
    dpi::PhysicalSize,
    event::{Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use crate::Result;

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Pulsar".to_owned(),
            width: 800,
            height: 600,
        }
    }
}

/// A native window without a client API, ready for a Vulkan surface.
pub struct Window {
    inner: winit::window::Window,
}

impl Window {
    pub fn new<T: 'static>(
        event_loop: &EventLoopWindowTarget<T>,
        config: &WindowConfig,
    ) -> Result<Self> {
        let inner = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .build(event_loop)?;
        log::info!(
            "Created {}x{} window {:?}",
            config.width,
            config.height,
            config.title
        );
        Ok(Self { inner })
    }

    pub fn title(&self) -> String {
        self.inner.title()
    }

    pub fn set_title(&self, title: &str) {
        self.inner.set_title(title);
    }

    pub fn width(&self) -> u32 {
        self.inner.inner_size().width
    }

    pub fn height(&self) -> u32 {
        self.inner.inner_size().height
    }

    pub fn set_width(&self, width: u32) {
        let _ = self
            .inner
            .request_inner_size(PhysicalSize::new(width, self.height()));
    }

    pub fn set_height(&self, height: u32) {
        let _ = self
            .inner
            .request_inner_size(PhysicalSize::new(self.width(), height));
    }

    /// Drawable size in pixels, which is what the swapchain extent is derived from.
    pub fn framebuffer_extent(&self) -> vk::Extent2D {
        let size = self.inner.inner_size();
        vk::Extent2D {
            width: size.width,
            height: size.height,
        }
    }

    pub fn id(&self) -> winit::window::WindowId {
        self.inner.id()
    }
}

impl HasWindowHandle for Window {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.inner.window_handle()
    }
}

impl HasDisplayHandle for Window {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.inner.display_handle()
    }
}

/// Polls events until `window` is asked to close or Escape is pressed.
pub fn run_until_closed(event_loop: EventLoop<()>, window: &Window) -> Result<()> {
    let id = window.id();
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            window_id,
            event: WindowEvent::CloseRequested,
        }
        | Event::WindowEvent {
            window_id,
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                },
        } if window_id == id => {
            log::info!("Close requested");
            elwt.exit();
        }
        _ => (),
    })?;
    Ok(())
}
