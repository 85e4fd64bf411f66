//! Target-independent logic for the LED strip MQTT client.
//!
//! Nothing in here touches hardware. The `hardware` crate implements
//! [`PixelStrip`], [`MqttLink`] and [`wifi::StationDriver`] for the ESP and
//! host targets; the `app` crate wires them into a [`LedController`].

use thiserror::Error;

mod color;
mod controller;
mod model;
mod mqtt;
mod state;
mod strip;
mod topic;
pub mod wifi;

pub use color::{ColorCommand, Rgb};
pub use controller::LedController;
pub use model::{encode_grb, BitTiming, LedModel};
pub use mqtt::{MqttEvent, MqttLink, QoS};
pub use state::StripState;
pub use strip::PixelStrip;
pub use topic::{Target, Topics};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    #[error("LED index {index} out of range for a strip of {count}")]
    PixelOutOfRange { index: usize, count: usize },
    #[error("unknown setting value: {0}")]
    UnknownSetting(String),
    #[error("driver error: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, Error>;
