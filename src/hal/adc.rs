//! ADC oneshot input for the sampling ISR.
//!
//! Uses `adc_oneshot_read_isr`, the ISR-safe read path. Raw 12-bit counts
//! are shifted down to the 8-bit scale the detector and filter work in.

use core::ptr;

use esp_idf_svc::sys::{
    adc_atten_t_ADC_ATTEN_DB_12, adc_bitwidth_t_ADC_BITWIDTH_12, adc_channel_t,
    adc_oneshot_chan_cfg_t, adc_oneshot_config_channel, adc_oneshot_io_to_channel,
    adc_oneshot_new_unit, adc_oneshot_read_isr, adc_oneshot_unit_handle_t,
    adc_oneshot_unit_init_cfg_t, adc_unit_t, esp, ESP_OK,
};

use super::SampleSource;
use crate::error::EchoError;

/// One ADC channel read once per sampling tick.
pub struct AdcSampleSource {
    unit: adc_oneshot_unit_handle_t,
    channel: adc_channel_t,
    shift: u8,
    /// Returned again if a read fails.
    last: u16,
}

// SAFETY: The unit handle is only used by the sampling ISR after setup.
unsafe impl Send for AdcSampleSource {}

impl AdcSampleSource {
    /// Configure the ADC channel behind `gpio`.
    pub fn new(gpio: i32, shift: u8) -> Result<Self, EchoError> {
        let mut unit_id: adc_unit_t = 0;
        let mut channel: adc_channel_t = 0;
        esp!(unsafe { adc_oneshot_io_to_channel(gpio, &mut unit_id, &mut channel) })
            .map_err(|_| EchoError::AdcInit)?;

        let unit_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = ptr::null_mut();
        esp!(unsafe { adc_oneshot_new_unit(&unit_cfg, &mut unit) })?;

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        esp!(unsafe { adc_oneshot_config_channel(unit, channel, &chan_cfg) })?;

        Ok(Self {
            unit,
            channel,
            shift,
            last: 0,
        })
    }
}

impl SampleSource for AdcSampleSource {
    #[inline]
    fn read(&mut self) -> u16 {
        let mut raw: i32 = 0;
        // SAFETY: Handle and channel were configured in new()
        let err = unsafe { adc_oneshot_read_isr(self.unit, self.channel, &mut raw) };
        if err == ESP_OK as i32 {
            self.last = (raw.max(0) as u16) >> self.shift;
        }
        self.last
    }
}
