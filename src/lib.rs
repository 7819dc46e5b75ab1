pub mod config;
pub mod device;
pub mod error;
pub mod image_views;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod window;

pub use error::{Error, Result};
