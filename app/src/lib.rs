use std::io;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use hardware::{Device, HardwareError, LedStrip, MqttClient, MqttEvents, Station};
use led_core::wifi::{bring_up, RetryPolicy, StationOutcome};
use led_core::{LedController, MqttEvent, PixelStrip};
use log::{error, info};
use thiserror::Error;

use crate::settings::Settings;
use crate::tasks::{
    led::LedTask,
    mqtt_rx::MqttRxTask,
    task::{start_all, AppTask},
    wifi::WifiTask,
};

mod messages;
pub mod settings;
mod tasks;

const HEAP_REPORT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),
    #[error("{0}")]
    Core(#[from] led_core::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("task spawn failed: {0}")]
    Spawn(#[from] io::Error),
}

pub fn run() -> Result<(), AppError> {
    let settings = &settings::SETTINGS;

    let mut device = Device::init()?;

    let mut strip = device.configure_led(&settings.strip_config()?)?;
    strip.clear()?;
    strip.refresh()?;

    info!("[APP] Startup..");
    info!("[APP] Free memory: {} bytes", hardware::free_heap_bytes());
    info!("[APP] IDF version: {}", hardware::idf_version());

    let (station, outcome) = wifi_init_sta(&mut device, settings)?;
    match outcome {
        StationOutcome::Connected(ip) => {
            info!("connected to ap SSID:{} ip:{ip}", settings.wifi_ssid);
        }
        StationOutcome::Failed { attempts } => {
            // The MQTT client keeps retrying the broker on its own.
            error!(
                "failed to connect to SSID:{} after {attempts} attempts",
                settings.wifi_ssid
            );
        }
    }

    let wifi_task: Box<dyn AppTask> = Box::new(WifiTask::new(
        station,
        RetryPolicy::new(settings.wifi_max_retry),
    ));
    start_all(vec![wifi_task])?;

    mqtt_app_start(strip, settings)?;

    loop {
        thread::sleep(HEAP_REPORT_INTERVAL);
        info!("[APP] Free memory: {} bytes", hardware::free_heap_bytes());
    }
}

/// Put the radio in station mode and block until it has an address or the
/// retry budget is spent. Dropping the returned station stops the radio.
pub fn wifi_init_sta(
    device: &mut Device,
    settings: &Settings,
) -> Result<(Station, StationOutcome), AppError> {
    let config = settings.wifi_config()?;
    let mut station = device.wifi_init_sta(&config)?;
    let mut policy = RetryPolicy::new(config.max_retry);

    let outcome = bring_up(&mut station, &mut policy)?;
    Ok((station, outcome))
}

/// Start the broker session for `led_strip` and hand both to the LED task.
/// Broker URL, topics and LED model come from `settings`.
pub fn mqtt_app_start(led_strip: LedStrip, settings: &Settings) -> Result<(), AppError> {
    let mqtt_config = settings.mqtt_config(io::stdin().lock())?;
    let (client, events) = hardware::connect_mqtt(&mqtt_config)?;

    start_led_tasks(led_strip, client, events, settings)
}

fn start_led_tasks(
    led_strip: LedStrip,
    client: MqttClient,
    events: MqttEvents,
    settings: &Settings,
) -> Result<(), AppError> {
    let controller = LedController::new(led_strip, client, settings.topics(), settings.led_model()?);

    let (event_tx, event_rx) = channel::<MqttEvent>();

    let tasks: Vec<Box<dyn AppTask>> = vec![
        Box::new(LedTask::new(controller, event_rx)),
        Box::new(MqttRxTask::new(events, event_tx)),
    ];

    start_all(tasks)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;
    use std::time::Instant;

    use hardware::{Published, SessionMonitor};
    use led_core::wifi::StationDriver;
    use led_core::{Rgb, Target};

    use crate::settings::SETTINGS;

    fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn on_topic(session: &SessionMonitor, topic: &str) -> Vec<Published> {
        session
            .published()
            .into_iter()
            .filter(|p| p.topic == topic)
            .collect()
    }

    #[test]
    fn wifi_init_sta_connects_and_takes_the_modem_once() {
        let mut device = Device::init().unwrap();

        let (station, outcome) = wifi_init_sta(&mut device, &SETTINGS).unwrap();
        assert_eq!(outcome, StationOutcome::Connected(Ipv4Addr::LOCALHOST));
        assert!(station.is_connected().unwrap());

        let again = wifi_init_sta(&mut device, &SETTINGS);
        assert!(matches!(again, Err(AppError::Hardware(_))));
    }

    #[test]
    fn led_tasks_announce_once_and_drive_the_given_strip() {
        let settings = &SETTINGS;
        let topics = settings.topics();
        let mut device = Device::init().unwrap();
        let strip = device.configure_led(&settings.strip_config().unwrap()).unwrap();
        let shown = strip.monitor();
        let led_count = strip.len();

        let client = MqttClient::default();
        let session = client.monitor();

        let command = format!(
            "{} {{\"red\":255,\"green\":16,\"blue\":0}}\n",
            topics.command_for(Target::Pixel(0))
        );
        let events = MqttEvents::from_reader(Box::new(Cursor::new(command)));

        start_led_tasks(strip, client, events, settings).unwrap();
        wait_until("state after the command", || {
            on_topic(&session, topics.state()).len() == 2
        });

        let count = on_topic(&session, &topics.count());
        assert_eq!(count.len(), 1);
        assert_eq!(count[0].payload, led_count.to_string().into_bytes());
        assert!(count[0].retain);

        let led_type = on_topic(&session, &topics.led_type());
        assert_eq!(led_type.len(), 1);
        assert_eq!(led_type[0].payload, settings.led_model().unwrap().name().as_bytes());

        assert_eq!(session.subscriptions().len(), led_count + 1);

        let latched = shown.latched();
        assert_eq!(latched[0], Rgb::new(255, 16, 0));
        assert!(latched[1..].iter().all(Rgb::is_black));
        assert_eq!(shown.refreshes(), 1);
    }

    #[test]
    fn led_tasks_without_commands_publish_state_once() {
        let settings = &SETTINGS;
        let topics = settings.topics();
        let strip = LedStrip::new(3);
        let shown = strip.monitor();
        let client = MqttClient::default();
        let session = client.monitor();
        let events = MqttEvents::from_reader(Box::new(Cursor::new("")));

        start_led_tasks(strip, client, events, settings).unwrap();
        wait_until("command subscriptions", || session.subscriptions().len() == 4);

        assert_eq!(on_topic(&session, &topics.count()).len(), 1);
        assert_eq!(on_topic(&session, &topics.led_type()).len(), 1);
        let state = on_topic(&session, topics.state());
        assert_eq!(state.len(), 1);
        assert!(state[0].retain);
        assert_eq!(shown.refreshes(), 0);
    }
}
