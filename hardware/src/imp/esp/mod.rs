use std::ffi::CStr;

use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::rmt::CHANNEL0;
use esp_idf_hal::sys::EspError;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use crate::{HardwareError, StripConfig, WifiConfig};

mod mqtt;
mod strip;
mod wifi;

pub use mqtt::{connect_mqtt, MqttClient, MqttEvents};
pub use strip::LedStrip;
pub use wifi::Station;

/// Concrete device handle on ESP-IDF.
///
/// Owns the peripherals the firmware uses. Each one is handed out once.
pub struct Device {
    modem: Option<Modem>,
    rmt_channel: Option<CHANNEL0>,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
}

impl Device {
    /// Take peripherals, the default event loop and NVS. NVS is erased and
    /// re-initialised when it is full or was written by a newer IDF.
    pub fn init() -> Result<Self, HardwareError> {
        let peripherals = Peripherals::take().map_err(map_system_err)?;
        let sysloop = EspSystemEventLoop::take().map_err(map_system_err)?;
        let nvs = EspDefaultNvsPartition::take().map_err(map_system_err)?;

        Ok(Self {
            modem: Some(peripherals.modem),
            rmt_channel: Some(peripherals.rmt.channel0),
            sysloop,
            nvs,
        })
    }

    pub fn configure_led(&mut self, config: &StripConfig) -> Result<LedStrip, HardwareError> {
        let channel = self
            .rmt_channel
            .take()
            .ok_or(HardwareError::Other("RMT channel already taken"))?;

        LedStrip::new(channel, config)
    }

    pub fn wifi_init_sta(&mut self, config: &WifiConfig) -> Result<Station, HardwareError> {
        let modem = self
            .modem
            .take()
            .ok_or(HardwareError::Other("modem already taken"))?;

        Station::new(modem, self.sysloop.clone(), self.nvs.clone(), config)
    }
}

pub fn free_heap_bytes() -> u32 {
    // SAFETY: reads a heap counter; no arguments and no preconditions
    unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
}

pub fn idf_version() -> String {
    // SAFETY: IDF returns a pointer to a static NUL-terminated string
    let version = unsafe { CStr::from_ptr(esp_idf_svc::sys::esp_get_idf_version()) };
    version.to_string_lossy().into_owned()
}

fn map_system_err(err: EspError) -> HardwareError {
    // We log the detailed error; the enum just carries a coarse category.
    log::error!("system init error: {:?}", err);
    HardwareError::Other("system init error")
}
