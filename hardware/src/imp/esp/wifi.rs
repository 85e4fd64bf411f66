use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_hal::sys::EspError;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use heapless::String;
use led_core::wifi::{AuthThreshold, StationDriver};
use log::info;

use crate::{HardwareError, WifiConfig};

/// Wi-Fi radio configured in station mode.
pub struct Station {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl Station {
    pub(super) fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        config: &WifiConfig,
    ) -> Result<Self, HardwareError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(map_wifi_err)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(map_wifi_err)?;

        init_wifi_personal(&mut wifi, config)?;
        info!("wifi_init_sta finished.");

        Ok(Self { wifi })
    }
}

impl StationDriver for Station {
    fn start(&mut self) -> led_core::Result<()> {
        self.wifi.start().map_err(map_wifi_err)?;
        Ok(())
    }

    fn connect(&mut self) -> led_core::Result<()> {
        self.wifi.connect().map_err(map_wifi_err)?;
        Ok(())
    }

    fn wait_for_ip(&mut self) -> led_core::Result<Ipv4Addr> {
        self.wifi.wait_netif_up().map_err(map_wifi_err)?;

        let info = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(map_wifi_err)?;

        if info.ip.is_unspecified() {
            return Err(HardwareError::Wifi("netif up without an address").into());
        }
        Ok(info.ip)
    }

    fn is_connected(&self) -> led_core::Result<bool> {
        Ok(self.wifi.is_connected().map_err(map_wifi_err)?)
    }
}

fn map_wifi_err(err: EspError) -> HardwareError {
    // We log the detailed error; the enum just carries a coarse category.
    log::error!("Wi-Fi error: {:?}", err);
    HardwareError::Wifi("Wi-Fi error")
}

fn auth_method(threshold: AuthThreshold) -> AuthMethod {
    match threshold {
        AuthThreshold::Open => AuthMethod::None,
        AuthThreshold::Wep => AuthMethod::WEP,
        AuthThreshold::WpaPsk => AuthMethod::WPA,
        AuthThreshold::Wpa2Psk => AuthMethod::WPA2Personal,
        AuthThreshold::WpaWpa2Psk => AuthMethod::WPAWPA2Personal,
        AuthThreshold::Wpa3Psk => AuthMethod::WPA3Personal,
        AuthThreshold::Wpa2Wpa3Psk => AuthMethod::WPA2WPA3Personal,
        AuthThreshold::WapiPsk => AuthMethod::WAPIPersonal,
    }
}

fn init_wifi_personal(
    wifi: &mut BlockingWifi<EspWifi<'static>>,
    config: &WifiConfig,
) -> Result<(), HardwareError> {
    let mut ssid = String::<32>::new();
    ssid.push_str(&config.ssid)
        .map_err(|_| HardwareError::Config("SSID too long"))?;

    let mut password = String::<64>::new();
    password.push_str(&config.password)
        .map_err(|_| HardwareError::Config("Password too long"))?;

    let client = ClientConfiguration {
        ssid,
        password,
        auth_method: auth_method(config.auth_threshold),
        ..Default::default()
    };

    wifi.set_configuration(&Configuration::Client(client))
        .map_err(map_wifi_err)
}
