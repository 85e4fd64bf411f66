//! Board support for the LED strip client.
//!
//! On `target_os = "espidf"` this drives the real RMT peripheral, Wi-Fi
//! radio and ESP-MQTT client. Everywhere else the same API is backed by an
//! in-memory simulation so the application runs and tests on a host.

use led_core::wifi::AuthThreshold;
use led_core::LedModel;
use thiserror::Error;

mod imp;

pub use imp::{
    connect_mqtt, free_heap_bytes, idf_version, Device, LedStrip, MqttClient, MqttEvents,
    Station,
};
#[cfg(not(target_os = "espidf"))]
pub use imp::{Published, SessionMonitor, StripMonitor};

/// APB clock feeding the RMT peripheral.
pub const RMT_SOURCE_CLOCK_HZ: u32 = 80_000_000;

const MAX_SSID_LEN: usize = 32;
const MAX_PASSWORD_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Wi-Fi failure: {0}")]
    Wifi(&'static str),
    #[error("LED strip failure: {0}")]
    Strip(&'static str),
    #[error("MQTT failure: {0}")]
    Mqtt(&'static str),
    #[error("invalid configuration: {0}")]
    Config(&'static str),
    #[error("{0}")]
    Other(&'static str),
}

impl From<HardwareError> for led_core::Error {
    fn from(err: HardwareError) -> Self {
        led_core::Error::Driver(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    pub auth_threshold: AuthThreshold,
    pub max_retry: u32,
}

impl WifiConfig {
    pub fn new(
        ssid: &str,
        password: &str,
        auth_threshold: AuthThreshold,
        max_retry: u32,
    ) -> Result<Self, HardwareError> {
        if ssid.is_empty() || ssid.len() > MAX_SSID_LEN {
            return Err(HardwareError::Config("SSID must be 1..=32 bytes"));
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(HardwareError::Config("Password too long"));
        }

        Ok(Self {
            ssid: ssid.to_string(),
            password: password.to_string(),
            auth_threshold,
            max_retry,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StripConfig {
    /// GPIO wired to the strip's data line.
    pub gpio: i32,
    pub led_count: usize,
    pub model: LedModel,
    pub resolution_hz: u32,
}

impl StripConfig {
    pub fn new(
        gpio: i32,
        led_count: usize,
        model: LedModel,
        resolution_hz: u32,
    ) -> Result<Self, HardwareError> {
        if gpio < 0 {
            return Err(HardwareError::Config("LED GPIO must be non-negative"));
        }
        if led_count == 0 {
            return Err(HardwareError::Config("LED count must be at least 1"));
        }
        if resolution_hz == 0 || resolution_hz > RMT_SOURCE_CLOCK_HZ {
            return Err(HardwareError::Config("RMT resolution out of range"));
        }

        Ok(Self {
            gpio,
            led_count,
            model,
            resolution_hz,
        })
    }

    /// Divider from the APB clock that comes closest to `resolution_hz`
    /// without exceeding it.
    pub fn clock_divider(&self) -> u8 {
        let div = RMT_SOURCE_CLOCK_HZ.div_ceil(self.resolution_hz);
        div.clamp(1, u8::MAX as u32) as u8
    }
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_url: String,
    pub client_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wifi_config_checks_lengths() {
        assert!(WifiConfig::new("home", "secret", AuthThreshold::Wpa2Psk, 5).is_ok());
        assert!(WifiConfig::new("", "secret", AuthThreshold::Wpa2Psk, 5).is_err());
        assert!(WifiConfig::new(&"s".repeat(33), "", AuthThreshold::Open, 5).is_err());
        assert!(WifiConfig::new("home", &"p".repeat(65), AuthThreshold::Wpa2Psk, 5).is_err());
    }

    #[test]
    fn strip_config_validates() {
        assert!(StripConfig::new(22, 12, LedModel::Ws2812, 10_000_000).is_ok());
        assert!(StripConfig::new(-1, 12, LedModel::Ws2812, 10_000_000).is_err());
        assert!(StripConfig::new(22, 0, LedModel::Ws2812, 10_000_000).is_err());
        assert!(StripConfig::new(22, 12, LedModel::Ws2812, 0).is_err());
    }

    #[test]
    fn clock_divider_from_resolution() {
        let div = |hz| StripConfig::new(22, 1, LedModel::Ws2812, hz).unwrap().clock_divider();
        assert_eq!(div(10_000_000), 8);
        assert_eq!(div(40_000_000), 2);
        assert_eq!(div(80_000_000), 1);
        assert_eq!(div(3_000_000), 27);
        assert_eq!(div(1_000), 255);
    }

    #[test]
    fn hardware_error_maps_into_core_error() {
        let err: led_core::Error = HardwareError::Strip("rmt busy").into();
        assert_eq!(err, led_core::Error::Driver("LED strip failure: rmt busy".into()));
    }
}
