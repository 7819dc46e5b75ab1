use std::sync::Arc;

use pulsar::{
    config::InstanceConfig,
    device::Device,
    image_views::ImageViews,
    instance::Instance,
    pipeline::Pipeline,
    surface::Surface,
    swapchain::Swapchain,
    window::{self, Window, WindowConfig},
};
use winit::event_loop::EventLoop;

const VERTEX_SHADER: &str = include_str!("../../shaders/triangle.vert");
const FRAGMENT_SHADER: &str = include_str!("../../shaders/triangle.frag");

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(Window::new(&event_loop, &WindowConfig::default())?);
    let instance = Arc::new(Instance::new(InstanceConfig::default(), &*window)?);
    let surface = Arc::new(Surface::new(&instance, &window)?);
    let device = Arc::new(Device::new(instance.clone(), surface.clone())?);
    let swapchain = Swapchain::new(&device, &window)?;
    let _image_views = ImageViews::new(&device, &swapchain)?;
    let _pipeline = Pipeline::new(&device, &swapchain, VERTEX_SHADER, FRAGMENT_SHADER)?;

    window::run_until_closed(event_loop, &window)?;

    Ok(())
}
