//! VoiceEcho firmware entry point.
//!
//! Wires the static pipeline state to the ESP32-S3 peripherals:
//! 1. Validate config, create the three binary signals
//! 2. Build the sampling timer (ADC) and playback clock (LEDC + timer)
//! 3. Spawn RecordTask and PlayTask
//! 4. Drain logs to UART1 forever

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
extern crate alloc;

#[cfg(target_os = "espidf")]
mod firmware {
    use alloc::boxed::Box;

    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::timer::{TIMER00, TIMER01};
    use esp_idf_svc::sys as esp_idf_sys;

    use voice_echo::hal::{
        now_us, spawn, AdcSampleSource, EspPlaybackClock, FreeRtosSignal, IsrTimer, LedcOutput,
        SamplingTimer,
    };
    use voice_echo::uart_logger::{init_uart_logger, uart_logger_task, UartLoggerConfig};
    use voice_echo::{
        rt_error, rt_info, AudioSystem, CycleStats, EchoConfig, EchoError, FaultState,
        Oversampling, PlayTask, PlaybackDriver, RecordTask, SamplingDriver, Signals, TaskContext,
        ISR_LOG_STREAM, TASK_LOG_STREAM,
    };

    const TASK_STACK_BYTES: usize = 4096;
    const TASK_PRIORITY: u8 = 5;

    // Static allocations
    static SYSTEM: AudioSystem = AudioSystem::new();
    static FAULT_STATE: FaultState = FaultState::new();
    static STATS: CycleStats = CycleStats::new();
    static CONFIG: EchoConfig = EchoConfig::DEFAULT;

    fn leak<T>(value: T) -> &'static T {
        Box::leak(Box::new(value))
    }

    fn idle_forever() -> ! {
        loop {
            unsafe {
                esp_idf_sys::vTaskDelay(1000);
            }
        }
    }

    fn start(sample_timer: TIMER00, play_timer: TIMER01) -> Result<(), EchoError> {
        CONFIG.validate_for(SYSTEM.capacity())?;

        let signals = Signals {
            record_done: leak(FreeRtosSignal::new()?),
            play_init: leak(FreeRtosSignal::new()?),
            play_done: leak(FreeRtosSignal::new()?),
        };

        // Capture path: timer ISR → ADC → detector/filter → buffer
        let source = AdcSampleSource::new(CONFIG.pins.audio_in, CONFIG.adc_shift)?;
        let mut sampler =
            SamplingDriver::new(&SYSTEM, source, &CONFIG, signals.record_done, &ISR_LOG_STREAM);
        let sample_isr = IsrTimer::new(sample_timer)?;
        let halt = sample_isr.isr_stop();
        sample_isr.subscribe(move || {
            if !sampler.on_tick(now_us()).keeps_running() {
                halt.stop_from_isr();
            }
        })?;
        let sampling = SamplingTimer::new(sample_isr);

        // Playback path: timer ISR at rate × oversampling → LEDC duty
        let pwm = LedcOutput::configure(CONFIG.pins.audio_out, CONFIG.playback_rate_hz())?;
        let oversampling = Oversampling::new(CONFIG.oversampling)?;
        let mut player = PlaybackDriver::new(
            &SYSTEM,
            pwm,
            oversampling,
            CONFIG.tail,
            signals.play_done,
            &ISR_LOG_STREAM,
        );
        let play_isr = IsrTimer::new(play_timer)?;
        play_isr.subscribe(move || {
            player.on_wrap(now_us());
        })?;
        let playback = leak(EspPlaybackClock::new(play_isr, pwm, CONFIG.playback_rate_hz()));

        let ctx = TaskContext {
            system: &SYSTEM,
            config: &CONFIG,
            stats: &STATS,
            fault: &FAULT_STATE,
            log: &TASK_LOG_STREAM,
            clock: now_us,
        };

        let play = PlayTask::new(ctx, playback, signals.play_init);
        spawn(c"play", TASK_STACK_BYTES, TASK_PRIORITY, move || {
            play.run();
        })?;

        let record = RecordTask::new(ctx, sampling, playback, signals);
        spawn(c"record", TASK_STACK_BYTES, TASK_PRIORITY, move || {
            record.run();
        })?;

        Ok(())
    }

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let Ok(peripherals) = Peripherals::take() else {
            idle_forever();
        };

        let uart = init_uart_logger(
            peripherals.uart1,
            peripherals.pins.gpio6,
            &UartLoggerConfig::default(),
        );

        rt_info!(TASK_LOG_STREAM, now_us(), "{}", env!("VERSION_STRING"));
        if let Err(e) = start(peripherals.timer00, peripherals.timer01) {
            rt_error!(TASK_LOG_STREAM, now_us(), "Startup failed: {}", e);
        }

        match uart {
            Ok(mut uart) => uart_logger_task(&mut uart),
            Err(_) => idle_forever(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    let config = voice_echo::EchoConfig::DEFAULT;
    println!("{}", env!("VERSION_STRING"));
    println!(
        "Firmware target only. Host build: {} Hz x {} s capture, {} Hz playback clock.",
        config.sample_rate_hz,
        config.record_seconds,
        config.playback_rate_hz()
    );
}
