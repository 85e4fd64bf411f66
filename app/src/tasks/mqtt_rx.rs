use hardware::MqttEvents;
use log::{info, warn};

use crate::messages::MqttEventSender;
use crate::tasks::task::{AppTask, TaskMeta};

const STACK_SIZE: usize = 6 * 1024;

/// Drains the broker connection and forwards events to the LED task.
pub struct MqttRxTask {
    events: MqttEvents,
    event_tx: MqttEventSender,
}

impl MqttRxTask {
    pub fn new(events: MqttEvents, event_tx: MqttEventSender) -> Self {
        Self { events, event_tx }
    }

    fn run(mut self) {
        while let Some(event) = self.events.next() {
            if self.event_tx.send(event).is_err() {
                warn!("mqtt_rx: event channel closed; exiting");
                return;
            }
        }
        info!("mqtt_rx: connection ended");
    }
}

impl AppTask for MqttRxTask {
    fn meta(&self) -> TaskMeta {
        TaskMeta {
            name: "mqtt_rx",
            stack_bytes: Some(STACK_SIZE),
        }
    }

    fn into_runner(self: Box<Self>) -> Box<dyn FnOnce() + Send + 'static> {
        Box::new(move || self.run())
    }
}
