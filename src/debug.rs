//! Validation layer message routing
//!
//! Messages from the debug utils messenger are forwarded to the `log`
//! crate so they interleave with the harness's own diagnostics

use ash::vk;

use std::ffi::{c_void, CStr};

/// Callback registered with the debug utils messenger
///
/// # Safety
///
/// Called by the loader with valid callback data for the duration of the
/// call; the pointers must not be retained
pub unsafe extern "system" fn vulkan_debug_utils_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() || (*callback_data).p_message.is_null() {
        "<no message>".to_owned()
    } else {
        CStr::from_ptr((*callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[{:?}] {}", message_type, message);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!("[{:?}] {}", message_type, message);
    } else {
        log::debug!("[{:?}] {}", message_type, message);
    }

    vk::FALSE
}
