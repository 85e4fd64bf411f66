use crate::{Error, Result};

const ALL_SEGMENT: &str = "all";

/// Which LEDs a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Pixel(usize),
}

/// Topic layout under `<main>/<led>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    led: String,
    state: String,
    command: String,
}

impl Topics {
    pub fn new(main: &str, led: &str, state: &str, command: &str) -> Self {
        let led = format!("{main}/{led}");
        Self {
            state: format!("{led}/{state}"),
            command: format!("{led}/{command}"),
            led,
        }
    }

    pub fn led(&self) -> &str {
        &self.led
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn count(&self) -> String {
        format!("{}/count", self.led)
    }

    pub fn led_type(&self) -> String {
        format!("{}/type", self.led)
    }

    pub fn command_for(&self, target: Target) -> String {
        match target {
            Target::All => format!("{}/{ALL_SEGMENT}", self.command),
            Target::Pixel(index) => format!("{}/{index}", self.command),
        }
    }

    /// Every command topic for a strip of `count` LEDs, per-LED first.
    pub fn subscriptions(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(Target::Pixel)
            .chain(std::iter::once(Target::All))
            .map(|target| self.command_for(target))
            .collect()
    }

    /// `Ok(None)` for topics outside the command tree.
    pub fn parse_target(&self, topic: &str) -> Result<Option<Target>> {
        let Some(segment) = topic
            .strip_prefix(self.command.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(None);
        };

        if segment == ALL_SEGMENT {
            return Ok(Some(Target::All));
        }

        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidTopic(topic.to_string()));
        }

        segment
            .parse::<usize>()
            .map(|index| Some(Target::Pixel(index)))
            .map_err(|_| Error::InvalidTopic(topic.to_string()))
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::new("test", "leds", "state", "command")
    }
}
