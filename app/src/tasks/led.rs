use hardware::{LedStrip, MqttClient};
use led_core::LedController;
use log::{error, info, warn};

use crate::messages::MqttEventReceiver;
use crate::tasks::task::{AppTask, TaskMeta};

// serde_json formatting of the state document lives on this stack
const STACK_SIZE: usize = 8 * 1024;

/// Owns the strip and the MQTT client; applies commands in arrival order.
pub struct LedTask {
    controller: LedController<LedStrip, MqttClient>,
    event_rx: MqttEventReceiver,
}

impl LedTask {
    pub fn new(
        controller: LedController<LedStrip, MqttClient>,
        event_rx: MqttEventReceiver,
    ) -> Self {
        Self {
            controller,
            event_rx,
        }
    }

    fn run(mut self) {
        if let Err(err) = self.controller.start() {
            error!("led: initial announcement failed: {err}");
        }

        while let Ok(event) = self.event_rx.recv() {
            if let Err(err) = self.controller.handle_event(event) {
                warn!("led: command rejected: {err}");
            }
        }
        info!("led: event channel closed; exiting");
    }
}

impl AppTask for LedTask {
    fn meta(&self) -> TaskMeta {
        TaskMeta {
            name: "led",
            stack_bytes: Some(STACK_SIZE),
        }
    }

    fn into_runner(self: Box<Self>) -> Box<dyn FnOnce() + Send + 'static> {
        Box::new(move || self.run())
    }
}
