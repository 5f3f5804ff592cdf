//! LEDC PWM output with 8-bit duty.
//!
//! The duty register is written from the playback ISR through raw
//! `ledc_set_duty` + `ledc_update_duty`, so the handle is a plain `Copy`
//! value shared by the ISR closure and the playback clock.

use esp_idf_svc::sys::{
    esp, ledc_channel_config, ledc_channel_config_t, ledc_channel_t,
    ledc_channel_t_LEDC_CHANNEL_0, ledc_intr_type_t_LEDC_INTR_DISABLE, ledc_mode_t,
    ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_set_duty, ledc_stop, ledc_timer_bit_t_LEDC_TIMER_8_BIT,
    ledc_timer_config, ledc_timer_config_t, ledc_timer_t_LEDC_TIMER_0, ledc_update_duty,
};

use super::PwmLevel;
use crate::error::EchoError;

/// Configured LEDC channel.
#[derive(Clone, Copy)]
pub struct LedcOutput {
    mode: ledc_mode_t,
    channel: ledc_channel_t,
}

impl LedcOutput {
    /// Configure timer 0 / channel 0 at `carrier_hz` with 8-bit resolution.
    pub fn configure(gpio: i32, carrier_hz: u32) -> Result<Self, EchoError> {
        let mode = ledc_mode_t_LEDC_LOW_SPEED_MODE;
        let channel = ledc_channel_t_LEDC_CHANNEL_0;

        let timer_cfg = ledc_timer_config_t {
            speed_mode: mode,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            timer_num: ledc_timer_t_LEDC_TIMER_0,
            freq_hz: carrier_hz,
            ..Default::default()
        };
        esp!(unsafe { ledc_timer_config(&timer_cfg) }).map_err(|_| EchoError::PwmInit)?;

        let channel_cfg = ledc_channel_config_t {
            gpio_num: gpio,
            speed_mode: mode,
            channel,
            intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        esp!(unsafe { ledc_channel_config(&channel_cfg) }).map_err(|_| EchoError::PwmInit)?;

        Ok(Self { mode, channel })
    }

    /// Drive the pin low and stop the channel output.
    pub fn stop(&self) {
        unsafe {
            ledc_stop(self.mode, self.channel, 0);
        }
    }
}

impl PwmLevel for LedcOutput {
    #[inline]
    fn set_level(&mut self, level: u8) {
        // ledc_update_duty also re-enables output after ledc_stop
        unsafe {
            ledc_set_duty(self.mode, self.channel, level as u32);
            ledc_update_duty(self.mode, self.channel);
        }
    }
}
