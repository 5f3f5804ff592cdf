//! FreeRTOS binary semaphores as [`BinarySignal`]s.

use core::ptr;

use esp_idf_svc::hal::interrupt;
use esp_idf_svc::sys::{
    configTICK_RATE_HZ, xQueueGenericCreate, xQueueGenericSend, xQueueGiveFromISR,
    xQueueSemaphoreTake, BaseType_t, QueueHandle_t, TickType_t,
};

use crate::error::EchoError;
use crate::signal::{Acquire, BinarySignal, Timeout};

/// `queueQUEUE_TYPE_BINARY_SEMAPHORE`
const QUEUE_TYPE_BINARY_SEMAPHORE: u8 = 3;
/// `queueSEND_TO_BACK`
const SEND_TO_BACK: BaseType_t = 0;
/// `portMAX_DELAY`
const MAX_DELAY: TickType_t = TickType_t::MAX;

/// Binary semaphore created empty.
pub struct FreeRtosSignal {
    handle: QueueHandle_t,
}

// SAFETY: FreeRTOS queue calls are thread and ISR safe.
unsafe impl Send for FreeRtosSignal {}
unsafe impl Sync for FreeRtosSignal {}

impl FreeRtosSignal {
    pub fn new() -> Result<Self, EchoError> {
        let handle = unsafe { xQueueGenericCreate(1, 0, QUEUE_TYPE_BINARY_SEMAPHORE) };
        if handle.is_null() {
            return Err(EchoError::SignalCreate);
        }
        Ok(Self { handle })
    }

    fn ticks(timeout: Timeout) -> TickType_t {
        match timeout {
            Timeout::Forever => MAX_DELAY,
            Timeout::Millis(ms) => {
                let ticks = ms as u64 * configTICK_RATE_HZ as u64 / 1000;
                (ticks.max(1)).min(MAX_DELAY as u64 - 1) as TickType_t
            }
        }
    }
}

impl BinarySignal for FreeRtosSignal {
    fn release(&self) {
        // Already released: the give fails and the signal stays at one
        unsafe {
            xQueueGenericSend(self.handle, ptr::null(), 0, SEND_TO_BACK);
        }
    }

    fn release_from_isr(&self) {
        let mut woken: BaseType_t = 0;
        unsafe {
            xQueueGiveFromISR(self.handle, &mut woken);
        }
        if woken != 0 {
            interrupt::do_yield();
        }
    }

    fn acquire(&self, timeout: Timeout) -> Acquire {
        let taken = unsafe { xQueueSemaphoreTake(self.handle, Self::ticks(timeout)) };
        if taken != 0 {
            Acquire::Signaled
        } else {
            Acquire::TimedOut
        }
    }
}
