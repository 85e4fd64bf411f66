//! Compile-time configuration loaded via `toml-cfg` from `cfg.toml`.

use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Duration;

use hardware::{MqttConfig, StripConfig, WifiConfig};
use led_core::wifi::AuthThreshold;
use led_core::{LedModel, Topics};

use crate::AppError;

/// Broker URL placeholder that asks for the real URL on the console.
pub const BROKER_URL_FROM_STDIN: &str = "FROM_STDIN";
const MAX_BROKER_URL_LEN: usize = 128;
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[toml_cfg::toml_config]
pub struct Settings {
    #[default("test-ssid")]
    pub wifi_ssid: &'static str,
    #[default("test-pass")]
    pub wifi_password: &'static str,
    #[default(5)]
    pub wifi_max_retry: u32,
    #[default("wpa2_psk")]
    pub wifi_auth_threshold: &'static str,
    #[default("mqtt://192.168.1.10")]
    pub broker_url: &'static str,
    #[default("")]
    pub mqtt_client_id: &'static str,
    #[default("test")]
    pub topic_main: &'static str,
    #[default("leds")]
    pub topic_led: &'static str,
    #[default("state")]
    pub topic_led_state: &'static str,
    #[default("command")]
    pub topic_led_command: &'static str,
    #[default(22)]
    pub led_gpio: i32,
    #[default(12)]
    pub led_count: usize,
    #[default("ws2812")]
    pub led_model: &'static str,
    #[default(10_000_000)]
    pub led_rmt_res_hz: u32,
}

impl Settings {
    pub fn topics(&self) -> Topics {
        Topics::new(
            self.topic_main,
            self.topic_led,
            self.topic_led_state,
            self.topic_led_command,
        )
    }

    pub fn led_model(&self) -> Result<LedModel, AppError> {
        Ok(self.led_model.parse()?)
    }

    pub fn strip_config(&self) -> Result<StripConfig, AppError> {
        Ok(StripConfig::new(
            self.led_gpio,
            self.led_count,
            self.led_model()?,
            self.led_rmt_res_hz,
        )?)
    }

    pub fn wifi_config(&self) -> Result<WifiConfig, AppError> {
        let auth: AuthThreshold = self.wifi_auth_threshold.parse()?;
        Ok(WifiConfig::new(
            self.wifi_ssid,
            self.wifi_password,
            auth,
            self.wifi_max_retry,
        )?)
    }

    pub fn mqtt_config(&self, input: impl Read) -> Result<MqttConfig, AppError> {
        let client_id = Some(self.mqtt_client_id)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(MqttConfig {
            broker_url: resolve_broker_url(self.broker_url, input)?,
            client_id,
        })
    }
}

/// Returns `configured` unless it is [`BROKER_URL_FROM_STDIN`], in which case
/// one line is read from `input`. Only printable ASCII is kept and the URL is
/// capped at 128 characters.
///
/// The ESP console does not block when no UART driver is installed, so an
/// idle `input` is polled until the line is complete.
pub fn resolve_broker_url(configured: &str, mut input: impl Read) -> Result<String, AppError> {
    if configured != BROKER_URL_FROM_STDIN {
        return Ok(configured.to_string());
    }

    println!("Please enter url of mqtt broker");
    let mut url = String::new();
    let mut byte = [0u8; 1];

    while url.len() < MAX_BROKER_URL_LEN {
        match input.read(&mut byte) {
            Ok(0) => thread::sleep(INPUT_POLL_INTERVAL),
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => {
                let c = char::from(byte[0]);
                if c.is_ascii() && !c.is_ascii_control() {
                    url.push(c);
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(INPUT_POLL_INTERVAL),
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(AppError::Config(format!("reading broker url: {err}"))),
        }
    }

    if url.is_empty() {
        return Err(AppError::Config("empty broker url".into()));
    }

    println!("Broker url: {url}");
    Ok(url)
}
