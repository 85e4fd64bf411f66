use log::{debug, error, info};

use crate::{
    ColorCommand, Error, LedModel, MqttEvent, MqttLink, PixelStrip, QoS, Result, Rgb,
    StripState, Target, Topics,
};

const COMMAND_QOS: QoS = QoS::ExactlyOnce;
const PUBLISH_QOS: QoS = QoS::ExactlyOnce;

/// Applies MQTT colour commands to a strip and reports the strip state back.
pub struct LedController<S, L> {
    strip: S,
    link: L,
    topics: Topics,
    model: LedModel,
    state: StripState,
}

impl<S: PixelStrip, L: MqttLink> LedController<S, L> {
    pub fn new(strip: S, link: L, topics: Topics, model: LedModel) -> Self {
        let state = StripState::new(strip.len());
        Self {
            strip,
            link,
            topics,
            model,
            state,
        }
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn state(&self) -> &StripState {
        &self.state
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Announce the strip and its (blank) state. Publishes go to the client
    /// outbox, so this does not wait for the broker.
    pub fn start(&mut self) -> Result<()> {
        let count = self.state.len().to_string();
        self.link
            .enqueue(&self.topics.count(), PUBLISH_QOS, true, count.as_bytes())?;
        self.link
            .enqueue(&self.topics.led_type(), PUBLISH_QOS, true, self.model.name().as_bytes())?;

        self.state.reset();
        self.publish_state()
    }

    pub fn handle_event(&mut self, event: MqttEvent) -> Result<()> {
        match event {
            MqttEvent::Connected { session_present } => {
                info!("MQTT connected (session present: {session_present})");
                self.subscribe_commands()
            }
            MqttEvent::Received { topic, data } => {
                info!("TOPIC={topic}");
                info!("DATA={}", String::from_utf8_lossy(&data));
                self.on_message(&topic, &data)
            }
            MqttEvent::Disconnected => {
                info!("MQTT disconnected");
                Ok(())
            }
            MqttEvent::Subscribed(id) => {
                info!("MQTT subscribed, msg_id={id}");
                Ok(())
            }
            MqttEvent::Unsubscribed(id) => {
                info!("MQTT unsubscribed, msg_id={id}");
                Ok(())
            }
            MqttEvent::Published(id) => {
                info!("MQTT published, msg_id={id}");
                Ok(())
            }
            MqttEvent::Deleted(id) => {
                info!("MQTT outbox dropped msg_id={id}");
                Ok(())
            }
            MqttEvent::BeforeConnect => {
                info!("MQTT connecting");
                Ok(())
            }
            MqttEvent::Error(reason) => {
                error!("MQTT error: {reason}");
                Ok(())
            }
        }
    }

    fn subscribe_commands(&mut self) -> Result<()> {
        for topic in self.topics.subscriptions(self.state.len()) {
            let id = self.link.subscribe(&topic, COMMAND_QOS)?;
            debug!("subscribe {topic} -> msg_id={id}");
        }
        Ok(())
    }

    fn on_message(&mut self, topic: &str, data: &[u8]) -> Result<()> {
        let Some(target) = self.topics.parse_target(topic)? else {
            debug!("ignoring message on {topic}");
            return Ok(());
        };

        let color = ColorCommand::parse(data)?;
        info!(
            "color: red={} green={} blue={}",
            color.red, color.green, color.blue
        );

        self.apply(target, color)?;
        self.publish_state()
    }

    fn apply(&mut self, target: Target, color: Rgb) -> Result<()> {
        match target {
            Target::All if color.is_black() => {
                info!("all LEDs: clearing");
                self.strip.clear()?;
                self.strip.refresh()?;
                self.state.reset();
            }
            Target::All => {
                info!("all LEDs: setting color");
                for i in 0..self.state.len() {
                    self.strip.set_pixel(i, color)?;
                }
                self.strip.refresh()?;
                self.state.fill(color);
            }
            Target::Pixel(index) => {
                let count = self.state.len();
                if index >= count {
                    return Err(Error::PixelOutOfRange { index, count });
                }
                info!("LED number: {index}");
                self.strip.set_pixel(index, color)?;
                self.strip.refresh()?;
                self.state.set(index, color)?;
            }
        }
        Ok(())
    }

    fn publish_state(&mut self) -> Result<()> {
        let json = self.state.to_json()?;
        self.link
            .enqueue(self.topics.state(), PUBLISH_QOS, true, json.as_bytes())?;
        Ok(())
    }
}
