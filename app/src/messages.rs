use std::sync::mpsc::{Receiver, Sender};

use led_core::MqttEvent;

pub type MqttEventSender = Sender<MqttEvent>;
pub type MqttEventReceiver = Receiver<MqttEvent>;
