use std::{
    borrow::Cow,
    ffi::{c_void, CStr, CString},
    panic::{self, AssertUnwindSafe},
};

use ash::{
    extensions::{ext, khr},
    vk,
};
use raw_window_handle::{HasDisplayHandle, RawDisplayHandle};

use crate::{
    config::{self, InstanceConfig, MessageCallback},
    physical_device::{PhysicalDevice, QueueFamily},
    Error, Result,
};

/// Where validation messages end up. Boxed so its address survives moves of [`Instance`].
struct MessageSink {
    callback: Option<MessageCallback>,
}

impl MessageSink {
    fn dispatch(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT, message: &str) {
        match &self.callback {
            Some(callback) => callback(severity, message),
            None => {
                let level = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
                    log::Level::Error
                } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
                    log::Level::Warn
                } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
                    log::Level::Info
                } else {
                    log::Level::Trace
                };
                log::log!(target: "vulkan", level, "{message}");
            }
        }
    }
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || p_user_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message = if callback_data.p_message.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };
    let sink = &*(p_user_data as *const MessageSink);
    // Unwinding out of an `extern "system"` function aborts the process.
    let dispatched = panic::catch_unwind(AssertUnwindSafe(|| {
        sink.dispatch(message_severity, &message);
    }));
    if dispatched.is_err() {
        log::error!(target: "vulkan", "message callback panicked on: {message}");
    }
    vk::FALSE
}

struct DebugMessenger {
    functions: ext::DebugUtils,
    handle: vk::DebugUtilsMessengerEXT,
}

pub struct Instance {
    pub entry: ash::Entry,
    pub handle: ash::Instance,
    pub validation: bool,
    debug_messenger: Option<DebugMessenger>,
    _sink: Box<MessageSink>,
}

impl Instance {
    /// Creates the instance with the surface extensions `display` needs.
    pub fn new(config: InstanceConfig, display: &impl HasDisplayHandle) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        if log::log_enabled!(log::Level::Debug) {
            let available = entry.enumerate_instance_extension_properties(None)?;
            log::debug!("{} instance extensions supported", available.len());
            for extension in &available {
                log::debug!("  {}", c_chars_to_string(&extension.extension_name));
            }
        }

        if config.validation && !validation_layer_supported(&entry)? {
            return Err(Error::ValidationLayersUnsupported);
        }

        let sink = Box::new(MessageSink {
            callback: config.message_callback,
        });

        let handle = {
            let application_name = CString::new(config.application.name.as_str())?;
            let engine_name = CString::new(config::ENGINE_NAME)?;
            let application_info = vk::ApplicationInfo::builder()
                .application_name(&application_name)
                .application_version(config.application.version.to_vk())
                .engine_name(&engine_name)
                .engine_version(config::ENGINE_VERSION.to_vk())
                .api_version(config::API_VERSION);

            let validation_layer = CString::new(config::VALIDATION_LAYER)?;
            let enabled_layer_names = if config.validation {
                vec![validation_layer.as_ptr()]
            } else {
                Vec::new()
            };

            let mut extensions = surface_extensions(display.display_handle()?.as_raw())?;
            if config.validation {
                extensions.push(ext::DebugUtils::name());
            }
            let enabled_extension_names: Vec<_> =
                extensions.iter().map(|name| name.as_ptr()).collect();

            let mut debug_info = debug_messenger_create_info(&sink);
            let mut create_info = vk::InstanceCreateInfo::builder()
                .application_info(&application_info)
                .enabled_layer_names(&enabled_layer_names)
                .enabled_extension_names(&enabled_extension_names);
            if config.validation {
                create_info = create_info.push_next(&mut debug_info);
            }

            unsafe { entry.create_instance(&create_info, None)? }
        };

        let mut instance = Self {
            entry,
            handle,
            validation: config.validation,
            debug_messenger: None,
            _sink: sink,
        };
        if instance.validation {
            // A failure here drops `instance`, which destroys the handle.
            let functions = ext::DebugUtils::new(&instance.entry, &instance.handle);
            let messenger = unsafe {
                functions.create_debug_utils_messenger(
                    &debug_messenger_create_info(&instance._sink),
                    None,
                )?
            };
            instance.debug_messenger = Some(DebugMessenger {
                functions,
                handle: messenger,
            });
        }

        log::info!(
            "Created Vulkan instance for {} {} (validation: {})",
            config.application.name,
            config.application.version,
            instance.validation
        );
        Ok(instance)
    }

    pub fn physical_devices(&self) -> Result<Vec<PhysicalDevice>> {
        let physical_devices = unsafe { self.handle.enumerate_physical_devices()? };
        physical_devices
            .iter()
            .map(|&physical_device| -> Result<PhysicalDevice> {
                let properties =
                    unsafe { self.handle.get_physical_device_properties(physical_device) };
                let name = c_chars_to_string(&properties.device_name);
                let queue_families = unsafe {
                    self.handle
                        .get_physical_device_queue_family_properties(physical_device)
                }
                .into_iter()
                .enumerate()
                .map(|(index, properties)| QueueFamily {
                    index: index as u32,
                    properties,
                })
                .collect();
                let memory_properties = unsafe {
                    self.handle
                        .get_physical_device_memory_properties(physical_device)
                };
                let extensions = unsafe {
                    self.handle
                        .enumerate_device_extension_properties(physical_device)?
                }
                .iter()
                .map(|extension| c_chars_to_string(&extension.extension_name))
                .collect();
                Ok(PhysicalDevice {
                    handle: physical_device,
                    name,
                    properties,
                    queue_families,
                    memory_properties,
                    extensions,
                })
            })
            .collect()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            if let Some(messenger) = self.debug_messenger.take() {
                messenger
                    .functions
                    .destroy_debug_utils_messenger(messenger.handle, None);
            }
            self.handle.destroy_instance(None);
        }
    }
}

fn debug_messenger_create_info(
    sink: &MessageSink,
) -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .user_data(sink as *const MessageSink as *mut c_void)
}

fn validation_layer_supported(entry: &ash::Entry) -> Result<bool> {
    let layers = entry.enumerate_instance_layer_properties()?;
    Ok(layers
        .iter()
        .any(|layer| c_chars_to_string(&layer.layer_name) == config::VALIDATION_LAYER))
}

/// Instance extensions needed to create a surface on `display`.
pub fn surface_extensions(display: RawDisplayHandle) -> Result<Vec<&'static CStr>> {
    let platform = match display {
        RawDisplayHandle::Windows(_) => khr::Win32Surface::name(),
        RawDisplayHandle::Xlib(_) => khr::XlibSurface::name(),
        RawDisplayHandle::Xcb(_) => khr::XcbSurface::name(),
        RawDisplayHandle::Wayland(_) => khr::WaylandSurface::name(),
        other => return Err(Error::UnsupportedPlatform(format!("{other:?}"))),
    };
    Ok(vec![khr::Surface::name(), platform])
}

pub(crate) fn c_chars_to_string(chars: &[std::os::raw::c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use std::{
        ptr::NonNull,
        sync::{Arc, Mutex},
    };

    use log::{Level, LevelFilter, Log, Metadata, Record};
    use raw_window_handle::{AppKitDisplayHandle, WaylandDisplayHandle, WindowsDisplayHandle};

    use super::*;

    struct Capture(Mutex<Vec<(Level, String)>>);

    impl Log for Capture {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if record.target() == "vulkan" {
                self.0
                    .lock()
                    .unwrap()
                    .push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    fn captured_level(message: &str) -> Option<Level> {
        CAPTURE
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|(_, text)| text.contains(message))
            .map(|&(level, _)| level)
    }

    fn install_capture() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(LevelFilter::Trace);
    }

    #[test]
    fn sink_without_callback_logs_by_severity() {
        install_capture();
        let sink = MessageSink { callback: None };

        sink.dispatch(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR, "sink error 7f3a");
        sink.dispatch(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING, "sink warning 7f3a");
        sink.dispatch(vk::DebugUtilsMessageSeverityFlagsEXT::INFO, "sink info 7f3a");
        sink.dispatch(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE, "sink verbose 7f3a");

        assert_eq!(captured_level("sink error 7f3a"), Some(Level::Error));
        assert_eq!(captured_level("sink warning 7f3a"), Some(Level::Warn));
        assert_eq!(captured_level("sink info 7f3a"), Some(Level::Info));
        assert_eq!(captured_level("sink verbose 7f3a"), Some(Level::Trace));
    }

    #[test]
    fn panicking_callback_does_not_unwind_into_the_driver() {
        install_capture();
        let sink = MessageSink {
            callback: Some(Box::new(|_, _| panic!("callback blew up"))),
        };
        let message = CString::new("message before panic 91c2").unwrap();
        let data = vk::DebugUtilsMessengerCallbackDataEXT {
            p_message: message.as_ptr(),
            ..Default::default()
        };

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                &data,
                &sink as *const MessageSink as *mut c_void,
            )
        };

        assert_eq!(result, vk::FALSE);
        assert_eq!(captured_level("message before panic 91c2"), Some(Level::Error));
    }

    #[test]
    fn sink_forwards_to_callback() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let captured = received.clone();
        let sink = MessageSink {
            callback: Some(Box::new(move |severity, message| {
                captured
                    .lock()
                    .unwrap()
                    .push((severity, message.to_owned()));
            })),
        };

        sink.dispatch(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING, "layer says hi");

        assert_eq!(
            *received.lock().unwrap(),
            vec![(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                "layer says hi".to_owned()
            )]
        );
    }

    #[test]
    fn callback_reads_message_through_user_data() {
        let received = Arc::new(Mutex::new(String::new()));
        let captured = received.clone();
        let sink = MessageSink {
            callback: Some(Box::new(move |_, message| {
                captured.lock().unwrap().push_str(message);
            })),
        };
        let message = CString::new("validation error").unwrap();
        let data = vk::DebugUtilsMessengerCallbackDataEXT {
            p_message: message.as_ptr(),
            ..Default::default()
        };

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &data,
                &sink as *const MessageSink as *mut c_void,
            )
        };

        assert_eq!(result, vk::FALSE);
        assert_eq!(*received.lock().unwrap(), "validation error");
    }

    #[test]
    fn surface_extensions_follow_the_display() {
        let windows = surface_extensions(RawDisplayHandle::Windows(WindowsDisplayHandle::new()))
            .unwrap();
        assert_eq!(windows, vec![khr::Surface::name(), khr::Win32Surface::name()]);

        let mut display = 0u8;
        let wayland = surface_extensions(RawDisplayHandle::Wayland(WaylandDisplayHandle::new(
            NonNull::from(&mut display).cast(),
        )))
        .unwrap();
        assert_eq!(wayland[1], khr::WaylandSurface::name());
    }

    #[test]
    fn surface_extensions_reject_appkit() {
        let result = surface_extensions(RawDisplayHandle::AppKit(AppKitDisplayHandle::new()));
        assert!(matches!(result, Err(Error::UnsupportedPlatform(_))));
    }

    #[test]
    fn c_chars_stop_at_nul() {
        let mut chars = [0 as std::os::raw::c_char; 8];
        for (slot, byte) in chars.iter_mut().zip(b"GPU") {
            *slot = *byte as std::os::raw::c_char;
        }
        assert_eq!(c_chars_to_string(&chars), "GPU");
    }
}
