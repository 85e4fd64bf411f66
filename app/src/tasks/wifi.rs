use std::thread;
use std::time::Duration;

use hardware::Station;
use led_core::wifi::{reconnect, RetryPolicy, StationDriver, StationOutcome};
use log::{debug, error, info, warn};

use crate::tasks::task::{AppTask, TaskMeta};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const STACK_SIZE: usize = 4 * 1024;

/// Watches the association and reconnects with the boot-time retry budget.
pub struct WifiTask {
    station: Station,
    policy: RetryPolicy,
}

impl WifiTask {
    pub fn new(station: Station, policy: RetryPolicy) -> Self {
        Self { station, policy }
    }

    fn run(mut self) {
        loop {
            thread::sleep(POLL_INTERVAL);

            match self.station.is_connected() {
                Ok(true) => debug!("wifi: link up"),
                Ok(false) => {
                    info!("wifi: link lost, reconnecting");
                    match reconnect(&mut self.station, &mut self.policy) {
                        Ok(StationOutcome::Connected(ip)) => info!("wifi: got ip {ip}"),
                        Ok(outcome @ StationOutcome::Failed { .. }) => {
                            error!("wifi: {outcome}; giving up");
                            return;
                        }
                        Err(err) => warn!("wifi: reconnect error: {err}"),
                    }
                }
                Err(err) => warn!("wifi: status query failed: {err}"),
            }
        }
    }
}

impl AppTask for WifiTask {
    fn meta(&self) -> TaskMeta {
        TaskMeta {
            name: "wifi",
            stack_bytes: Some(STACK_SIZE),
        }
    }

    fn into_runner(self: Box<Self>) -> Box<dyn FnOnce() + Send + 'static> {
        Box::new(move || self.run())
    }
}
