use esp_idf_hal::sys::EspError;
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration,
    QoS as EspQoS,
};
use led_core::{MqttEvent, MqttLink, QoS};
use log::info;

use crate::{HardwareError, MqttConfig};

/// Outgoing half of the ESP-MQTT session.
pub struct MqttClient {
    client: EspMqttClient<'static>,
}

/// Incoming half; must be drained or the client stalls.
pub struct MqttEvents {
    connection: EspMqttConnection,
}

pub fn connect_mqtt(config: &MqttConfig) -> Result<(MqttClient, MqttEvents), HardwareError> {
    let conf = MqttClientConfiguration {
        client_id: config.client_id.as_deref(),
        ..Default::default()
    };

    let (client, connection) =
        EspMqttClient::new(&config.broker_url, &conf).map_err(map_mqtt_err)?;
    info!("MQTT client started for {}", config.broker_url);

    Ok((MqttClient { client }, MqttEvents { connection }))
}

impl MqttLink for MqttClient {
    fn subscribe(&mut self, topic: &str, qos: QoS) -> led_core::Result<u32> {
        Ok(self.client.subscribe(topic, esp_qos(qos)).map_err(map_mqtt_err)?)
    }

    fn enqueue(
        &mut self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: &[u8],
    ) -> led_core::Result<u32> {
        Ok(self
            .client
            .enqueue(topic, esp_qos(qos), retain, payload)
            .map_err(map_mqtt_err)?)
    }
}

impl MqttEvents {
    /// Blocks for the next event; `None` once the client is gone.
    pub fn next(&mut self) -> Option<MqttEvent> {
        match self.connection.next() {
            Ok(event) => Some(translate(event.payload())),
            Err(err) => {
                info!("MQTT connection closed: {err}");
                None
            }
        }
    }
}

fn translate(payload: EventPayload<'_, EspError>) -> MqttEvent {
    match payload {
        EventPayload::BeforeConnect => MqttEvent::BeforeConnect,
        EventPayload::Connected(session_present) => MqttEvent::Connected { session_present },
        EventPayload::Disconnected => MqttEvent::Disconnected,
        EventPayload::Subscribed(id) => MqttEvent::Subscribed(id),
        EventPayload::Unsubscribed(id) => MqttEvent::Unsubscribed(id),
        EventPayload::Published(id) => MqttEvent::Published(id),
        EventPayload::Deleted(id) => MqttEvent::Deleted(id),
        EventPayload::Received {
            topic,
            data,
            details: Details::Complete,
            ..
        } => MqttEvent::Received {
            topic: topic.unwrap_or_default().to_string(),
            data: data.to_vec(),
        },
        // Command payloads are a few dozen bytes; a chunked one is not ours.
        EventPayload::Received { topic, data, .. } => MqttEvent::Error(format!(
            "dropped chunked message on {} ({} bytes)",
            topic.unwrap_or("<continuation>"),
            data.len()
        )),
        EventPayload::Error(err) => MqttEvent::Error(format!("{err}")),
        #[allow(unreachable_patterns)]
        _ => MqttEvent::Error("unhandled MQTT event".into()),
    }
}

fn esp_qos(qos: QoS) -> EspQoS {
    match qos {
        QoS::AtMostOnce => EspQoS::AtMostOnce,
        QoS::AtLeastOnce => EspQoS::AtLeastOnce,
        QoS::ExactlyOnce => EspQoS::ExactlyOnce,
    }
}

fn map_mqtt_err(err: EspError) -> HardwareError {
    log::error!("MQTT error: {:?}", err);
    HardwareError::Mqtt("mqtt error")
}
