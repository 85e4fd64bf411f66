use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// Broker session events, detached from the client library's borrowed types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttEvent {
    BeforeConnect,
    Connected { session_present: bool },
    Disconnected,
    Subscribed(u32),
    Unsubscribed(u32),
    Published(u32),
    Deleted(u32),
    Received { topic: String, data: Vec<u8> },
    Error(String),
}

/// Outgoing half of a broker session.
pub trait MqttLink {
    /// Returns the message id.
    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<u32>;

    /// Queue a publish in the client outbox; works before the session is up.
    fn enqueue(&mut self, topic: &str, qos: QoS, retain: bool, payload: &[u8]) -> Result<u32>;
}
