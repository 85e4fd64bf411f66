pub mod led;
pub mod mqtt_rx;
pub mod task;
pub mod wifi;
