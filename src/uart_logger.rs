//! UART log output.
//!
//! Drains [`ISR_LOG_STREAM`](crate::ISR_LOG_STREAM) and
//! [`TASK_LOG_STREAM`](crate::TASK_LOG_STREAM) and writes each entry to a
//! TX-only UART. Requires an external USB-UART adapter on the log pin.
//!
//! ```text
//! ESP32-S3 GPIO6 (UART1 TX) ──▶ USB-UART RX ──▶ PC serial monitor
//! ```

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream, SliceWriter};

/// Interval between dropped-line reports.
pub const DROP_REPORT_INTERVAL_US: i64 = 10_000_000;

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

/// Format log entry as `[timestamp_us] LEVEL: message\n`.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = SliceWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    );
    writer.pos
}

/// Format a dropped-lines report, or nothing if no stream dropped anything.
pub fn format_drop_report<const N: usize>(
    isr: &LogStream<N>,
    task: &LogStream<N>,
    buf: &mut [u8],
) -> usize {
    let isr_dropped = isr.take_dropped();
    let task_dropped = task.take_dropped();
    if isr_dropped == 0 && task_dropped == 0 {
        return 0;
    }
    let mut writer = SliceWriter { buf, pos: 0 };
    let _ = write!(writer, "[WARN] Dropped: ISR={}, TASK={}\n", isr_dropped, task_dropped);
    writer.pos
}

/// Drain both streams once into `sink`, ISR lines first.
///
/// Returns true if anything was written.
pub fn drain_once<const N: usize>(
    isr: &LogStream<N>,
    task: &LogStream<N>,
    mut sink: impl FnMut(&[u8]),
) -> bool {
    let mut format_buf = [0u8; 160];
    let mut work_done = false;

    for stream in [isr, task] {
        while let Some(entry) = stream.drain() {
            let len = format_log_entry(&entry, &mut format_buf);
            sink(&format_buf[..len]);
            work_done = true;
        }
    }

    work_done
}

#[cfg(target_os = "espidf")]
pub use device::*;

#[cfg(target_os = "espidf")]
mod device {
    use super::*;
    use crate::{ISR_LOG_STREAM, TASK_LOG_STREAM};
    use esp_idf_svc::hal::gpio;
    use esp_idf_svc::hal::peripheral::Peripheral;
    use esp_idf_svc::hal::uart::{self, UartTxDriver};

    /// Initialize UART1 TX-only for logging output.
    pub fn init_uart_logger<'d>(
        uart: impl Peripheral<P = uart::UART1> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        config: &UartLoggerConfig,
    ) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
        let uart_config = uart::config::Config::default()
            .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

        UartTxDriver::new(
            uart,
            tx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &uart_config,
        )
    }

    /// Log drain loop. Runs in the lowest priority context, never returns.
    pub fn uart_logger_task(uart: &mut UartTxDriver<'_>) -> ! {
        let mut report_buf = [0u8; 64];
        let mut last_dropped_report = 0i64;

        loop {
            let work_done = drain_once(&ISR_LOG_STREAM, &TASK_LOG_STREAM, |line| {
                let _ = uart.write(line);
            });

            let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
            if now - last_dropped_report > DROP_REPORT_INTERVAL_US {
                let len = format_drop_report(&ISR_LOG_STREAM, &TASK_LOG_STREAM, &mut report_buf);
                if len > 0 {
                    let _ = uart.write(&report_buf[..len]);
                }
                last_dropped_report = now;
            }

            if !work_done {
                unsafe {
                    esp_idf_svc::sys::vTaskDelay(10);
                }
            }
        }
    }
}
