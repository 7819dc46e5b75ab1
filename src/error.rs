use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),
    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
    #[error("validation layers requested but not available")]
    ValidationLayersUnsupported,
    #[error("no physical device with Vulkan support")]
    NoVulkanDevice,
    #[error("no suitable physical device found")]
    NoSuitableDevice,
    #[error("selected device lacks a graphics or present queue family")]
    IncompleteQueueFamilies,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface reports no supported present modes")]
    NoPresentMode,
    #[error("unsupported window system: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window handle unavailable: {0}")]
    Handle(#[from] raw_window_handle::HandleError),
    #[error("failed to initialize the shader compiler")]
    ShaderCompilerUnavailable,
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(#[from] shaderc::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Nul(#[from] std::ffi::NulError),
}

pub type Result<T> = std::result::Result<T, Error>;
