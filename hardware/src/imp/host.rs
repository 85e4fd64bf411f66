//! Host-side fakes for desktop runs and unit tests.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use led_core::wifi::StationDriver;
use led_core::{Error, MqttEvent, MqttLink, PixelStrip, QoS, Rgb};
use log::{debug, info};

use crate::{HardwareError, MqttConfig, StripConfig, WifiConfig};

#[derive(Debug, Default)]
pub struct Device {
    led_taken: bool,
    wifi_taken: bool,
}

impl Device {
    pub fn init() -> Result<Self, HardwareError> {
        debug!("simulated device init");
        Ok(Self::default())
    }

    pub fn configure_led(&mut self, config: &StripConfig) -> Result<LedStrip, HardwareError> {
        if std::mem::replace(&mut self.led_taken, true) {
            return Err(HardwareError::Other("RMT channel already taken"));
        }
        info!(
            "simulated {} strip with {} LEDs on GPIO{}",
            config.model, config.led_count, config.gpio
        );
        Ok(LedStrip::new(config.led_count))
    }

    pub fn wifi_init_sta(&mut self, config: &WifiConfig) -> Result<Station, HardwareError> {
        if std::mem::replace(&mut self.wifi_taken, true) {
            return Err(HardwareError::Other("modem already taken"));
        }
        debug!("simulated Wi-Fi init: ssid='{}'", config.ssid);
        Ok(Station::default())
    }
}

/// Frame buffer plus the last frame "sent" to the LEDs.
#[derive(Debug)]
pub struct LedStrip {
    pixels: Vec<Rgb>,
    shown: StripMonitor,
}

impl LedStrip {
    pub fn new(led_count: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; led_count],
            shown: StripMonitor(Arc::new(Mutex::new(Latched {
                pixels: vec![Rgb::BLACK; led_count],
                refreshes: 0,
            }))),
        }
    }

    /// What the LEDs currently show.
    pub fn latched(&self) -> Vec<Rgb> {
        self.shown.latched()
    }

    pub fn refreshes(&self) -> usize {
        self.shown.refreshes()
    }

    /// Handle that keeps watching the LEDs after the strip moves to a task.
    pub fn monitor(&self) -> StripMonitor {
        self.shown.clone()
    }
}

#[derive(Debug)]
struct Latched {
    pixels: Vec<Rgb>,
    refreshes: usize,
}

#[derive(Debug, Clone)]
pub struct StripMonitor(Arc<Mutex<Latched>>);

impl StripMonitor {
    fn lock(&self) -> MutexGuard<'_, Latched> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn latched(&self) -> Vec<Rgb> {
        self.lock().pixels.clone()
    }

    pub fn refreshes(&self) -> usize {
        self.lock().refreshes
    }
}

impl PixelStrip for LedStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> led_core::Result<()> {
        let count = self.pixels.len();
        let px = self
            .pixels
            .get_mut(index)
            .ok_or(Error::PixelOutOfRange { index, count })?;
        *px = color;
        Ok(())
    }

    fn clear(&mut self) -> led_core::Result<()> {
        self.pixels.fill(Rgb::BLACK);
        Ok(())
    }

    fn refresh(&mut self) -> led_core::Result<()> {
        let mut shown = self.shown.lock();
        shown.pixels.clone_from(&self.pixels);
        shown.refreshes += 1;
        debug!("simulated strip refresh: {:?}", shown.pixels);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Station {
    started: bool,
    connected: bool,
}

impl StationDriver for Station {
    fn start(&mut self) -> led_core::Result<()> {
        self.started = true;
        Ok(())
    }

    fn connect(&mut self) -> led_core::Result<()> {
        if !self.started {
            return Err(HardwareError::Wifi("station not started").into());
        }
        self.connected = true;
        Ok(())
    }

    fn wait_for_ip(&mut self) -> led_core::Result<Ipv4Addr> {
        Ok(Ipv4Addr::LOCALHOST)
    }

    fn is_connected(&self) -> led_core::Result<bool> {
        Ok(self.connected)
    }
}

/// Logs what would go to the broker and keeps a copy for inspection.
#[derive(Debug, Default)]
pub struct MqttClient {
    next_id: u32,
    session: SessionMonitor,
}

impl MqttClient {
    /// Handle that keeps watching the session after the client moves to a task.
    pub fn monitor(&self) -> SessionMonitor {
        self.session.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct SessionLog {
    subscriptions: Vec<String>,
    published: Vec<Published>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionMonitor(Arc<Mutex<SessionLog>>);

impl SessionMonitor {
    fn lock(&self) -> MutexGuard<'_, SessionLog> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }
}

impl MqttLink for MqttClient {
    fn subscribe(&mut self, topic: &str, qos: QoS) -> led_core::Result<u32> {
        self.next_id += 1;
        info!("mqtt(sim): subscribe '{topic}' {qos:?} -> msg_id={}", self.next_id);
        self.session.lock().subscriptions.push(topic.to_string());
        Ok(self.next_id)
    }

    fn enqueue(
        &mut self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: &[u8],
    ) -> led_core::Result<u32> {
        self.next_id += 1;
        info!(
            "mqtt(sim): publish '{topic}' len={} {qos:?} retain={retain}",
            payload.len()
        );
        debug!("mqtt(sim): {}", String::from_utf8_lossy(payload));
        self.session.lock().published.push(Published {
            topic: topic.to_string(),
            qos,
            retain,
            payload: payload.to_vec(),
        });
        Ok(self.next_id)
    }
}

/// Reports a connect, then turns each `<topic> <payload>` line of input
/// into a received message.
pub struct MqttEvents {
    pending: VecDeque<MqttEvent>,
    input: Box<dyn BufRead + Send>,
}

impl MqttEvents {
    pub fn from_reader(input: Box<dyn BufRead + Send>) -> Self {
        Self {
            pending: VecDeque::from([
                MqttEvent::BeforeConnect,
                MqttEvent::Connected {
                    session_present: false,
                },
            ]),
            input,
        }
    }

    pub fn next(&mut self) -> Option<MqttEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let (topic, data) = line.split_once(' ').unwrap_or((line, ""));
                    return Some(MqttEvent::Received {
                        topic: topic.to_string(),
                        data: data.trim().as_bytes().to_vec(),
                    });
                }
                Err(err) => return Some(MqttEvent::Error(err.to_string())),
            }
        }
    }
}

pub fn connect_mqtt(config: &MqttConfig) -> Result<(MqttClient, MqttEvents), HardwareError> {
    info!("simulated MQTT session for {}", config.broker_url);
    let input = Box::new(io::BufReader::new(io::stdin()));
    Ok((MqttClient::default(), MqttEvents::from_reader(input)))
}

pub fn free_heap_bytes() -> u32 {
    0
}

pub fn idf_version() -> String {
    "host".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strip_latches_on_refresh_only() {
        let mut strip = LedStrip::new(3);
        strip.set_pixel(1, Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(strip.latched()[1], Rgb::BLACK);

        strip.refresh().unwrap();
        assert_eq!(strip.latched()[1], Rgb::new(1, 2, 3));

        strip.clear().unwrap();
        assert_eq!(strip.latched()[1], Rgb::new(1, 2, 3));
        strip.refresh().unwrap();
        assert!(strip.latched().iter().all(Rgb::is_black));
        assert_eq!(strip.refreshes(), 2);
    }

    #[test]
    fn monitors_outlive_the_moved_handles() {
        let mut strip = LedStrip::new(2);
        let shown = strip.monitor();
        let mut client = MqttClient::default();
        let session = client.monitor();

        std::thread::spawn(move || {
            strip.set_pixel(0, Rgb::new(9, 0, 0)).unwrap();
            strip.refresh().unwrap();
            client.subscribe("a/b", QoS::ExactlyOnce).unwrap();
            client.enqueue("a/c", QoS::AtMostOnce, true, b"x").unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(shown.latched(), [Rgb::new(9, 0, 0), Rgb::BLACK]);
        assert_eq!(shown.refreshes(), 1);
        assert_eq!(session.subscriptions(), ["a/b"]);
        assert_eq!(
            session.published(),
            [Published {
                topic: "a/c".into(),
                qos: QoS::AtMostOnce,
                retain: true,
                payload: b"x".to_vec(),
            }]
        );
    }

    #[test]
    fn strip_rejects_out_of_range() {
        let mut strip = LedStrip::new(2);
        assert_eq!(
            strip.set_pixel(2, Rgb::BLACK),
            Err(Error::PixelOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn device_hands_out_each_peripheral_once() {
        let mut device = Device::init().unwrap();
        let strip_cfg = StripConfig::new(22, 4, led_core::LedModel::Ws2812, 10_000_000).unwrap();
        let wifi_cfg =
            WifiConfig::new("home", "secret", led_core::wifi::AuthThreshold::Wpa2Psk, 5).unwrap();

        assert_eq!(device.configure_led(&strip_cfg).unwrap().len(), 4);
        assert!(device.configure_led(&strip_cfg).is_err());
        assert!(device.wifi_init_sta(&wifi_cfg).is_ok());
        assert!(device.wifi_init_sta(&wifi_cfg).is_err());
    }

    #[test]
    fn station_needs_start_before_connect() {
        let mut station = Station::default();
        assert!(station.connect().is_err());
        station.start().unwrap();
        station.connect().unwrap();
        assert!(station.is_connected().unwrap());
    }

    #[test]
    fn events_from_input_lines() {
        let input = Cursor::new(
            "test/leds/command/all {\"red\":1,\"green\":2,\"blue\":3}\n\n test/leds/command/0\n",
        );
        let mut events = MqttEvents::from_reader(Box::new(input));

        assert_eq!(events.next(), Some(MqttEvent::BeforeConnect));
        assert_eq!(
            events.next(),
            Some(MqttEvent::Connected {
                session_present: false
            })
        );
        assert_eq!(
            events.next(),
            Some(MqttEvent::Received {
                topic: "test/leds/command/all".into(),
                data: br#"{"red":1,"green":2,"blue":3}"#.to_vec(),
            })
        );
        assert_eq!(
            events.next(),
            Some(MqttEvent::Received {
                topic: "test/leds/command/0".into(),
                data: Vec::new(),
            })
        );
        assert_eq!(events.next(), None);
    }
}
