use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { red: 0, green: 0, blue: 0 };

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Colour carried by a command payload, e.g. `{"red":255,"green":0,"blue":16}`.
///
/// Members are matched case-sensitively and must be JSON numbers. Anything
/// else in the object is ignored.
#[derive(Debug, Deserialize)]
pub struct ColorCommand {
    red: f64,
    green: f64,
    blue: f64,
}

impl ColorCommand {
    pub fn parse(payload: &[u8]) -> Result<Rgb> {
        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|err| Error::InvalidPayload(err.to_string()))?;

        // serde would also accept `[r, g, b]` for a struct
        if !value.is_object() {
            return Err(Error::InvalidPayload("expected a JSON object".into()));
        }

        let cmd: ColorCommand = serde_json::from_value(value)
            .map_err(|err| Error::InvalidPayload(err.to_string()))?;

        Ok(Rgb {
            red: channel(cmd.red),
            green: channel(cmd.green),
            blue: channel(cmd.blue),
        })
    }
}

// Truncates toward zero, then saturates into a byte.
fn channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_members() {
        let rgb = ColorCommand::parse(br#"{"red": 255, "green": 16, "blue": 0}"#).unwrap();
        assert_eq!(rgb, Rgb::new(255, 16, 0));
        assert!(!rgb.is_black());
    }

    #[test]
    fn ignores_extra_members() {
        let rgb = ColorCommand::parse(br#"{"red":1,"green":2,"blue":3,"brightness":9}"#).unwrap();
        assert_eq!(rgb, Rgb::new(1, 2, 3));
    }

    #[test]
    fn clamps_and_truncates() {
        let rgb = ColorCommand::parse(br#"{"red":300,"green":-4,"blue":12.9}"#).unwrap();
        assert_eq!(rgb, Rgb::new(255, 0, 12));
    }

    #[test]
    fn rejects_string_member() {
        let err = ColorCommand::parse(br#"{"red":"255","green":0,"blue":0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn rejects_missing_member_and_garbage() {
        assert!(ColorCommand::parse(br#"{"red":1,"green":2}"#).is_err());
        assert!(ColorCommand::parse(br#"{"Red":1,"green":2,"blue":3}"#).is_err());
        assert!(ColorCommand::parse(b"not json").is_err());
        assert!(ColorCommand::parse(b"").is_err());
        assert!(ColorCommand::parse(b"[1,2,3]").is_err());
    }
}
