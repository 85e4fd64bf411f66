#[cfg(target_os = "espidf")]
mod esp;
#[cfg(not(target_os = "espidf"))]
mod host;

#[cfg(target_os = "espidf")]
pub use esp::{
    connect_mqtt, free_heap_bytes, idf_version, Device, LedStrip, MqttClient, MqttEvents,
    Station,
};
#[cfg(not(target_os = "espidf"))]
pub use host::{
    connect_mqtt, free_heap_bytes, idf_version, Device, LedStrip, MqttClient, MqttEvents,
    Published, SessionMonitor, Station, StripMonitor,
};
