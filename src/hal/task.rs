//! FreeRTOS tasks running a boxed Rust closure.
//!
//! `esp_idf_svc::hal::task::create` takes a C entry point and a raw
//! argument; the closure travels through that argument.

use alloc::boxed::Box;
use core::ffi::{c_void, CStr};
use core::ptr;

use esp_idf_svc::hal::task;
use esp_idf_svc::sys::vTaskDelete;

use crate::error::EchoError;

type Entry = Box<dyn FnOnce() + Send + 'static>;

/// Spawn `entry` as a FreeRTOS task on either core.
pub fn spawn<F>(name: &'static CStr, stack_bytes: usize, priority: u8, entry: F) -> Result<(), EchoError>
where
    F: FnOnce() + Send + 'static,
{
    let arg = Box::into_raw(Box::new(Box::new(entry) as Entry)) as *mut c_void;

    // SAFETY: `trampoline` takes ownership of `arg` exactly once.
    let created = unsafe { task::create(trampoline, name, stack_bytes, arg, priority, None) };

    if created.is_err() {
        // SAFETY: The task was not created, so we still own `arg`
        drop(unsafe { Box::from_raw(arg as *mut Entry) });
        return Err(EchoError::TaskCreate);
    }
    Ok(())
}

extern "C" fn trampoline(arg: *mut c_void) {
    // SAFETY: `arg` came from Box::into_raw in spawn()
    let entry = unsafe { Box::from_raw(arg as *mut Entry) };
    entry();
    unsafe { vTaskDelete(ptr::null_mut()) };
}
