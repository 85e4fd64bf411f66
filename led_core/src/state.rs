use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Error, Result, Rgb};

/// Last colour written to each LED, as reported on the state topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripState {
    pixels: Vec<Rgb>,
}

impl StripState {
    pub fn new(count: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; count],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    pub fn set(&mut self, index: usize, color: Rgb) -> Result<()> {
        let count = self.pixels.len();
        let px = self
            .pixels
            .get_mut(index)
            .ok_or(Error::PixelOutOfRange { index, count })?;
        *px = color;
        Ok(())
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn reset(&mut self) {
        self.fill(Rgb::BLACK);
    }

    /// `{"0": {"red": .., "green": .., "blue": ..}, "1": ...}` in index order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| Error::InvalidPayload(err.to_string()))
    }
}

impl Serialize for StripState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pixels.len()))?;
        for (i, px) in self.pixels.iter().enumerate() {
            map.serialize_entry(&i.to_string(), px)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_black() {
        let state = StripState::new(4);
        assert_eq!(state.len(), 4);
        assert!(state.pixels().iter().all(Rgb::is_black));
    }

    #[test]
    fn set_checks_range() {
        let mut state = StripState::new(2);
        state.set(1, Rgb::new(9, 8, 7)).unwrap();
        assert_eq!(state.get(1), Some(Rgb::new(9, 8, 7)));
        assert_eq!(
            state.set(2, Rgb::BLACK),
            Err(Error::PixelOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn json_keys_follow_index_order() {
        let mut state = StripState::new(12);
        state.set(10, Rgb::new(1, 2, 3)).unwrap();
        let json = state.to_json().unwrap();

        let pos = |key: &str| json.find(&format!("\"{key}\"")).unwrap();
        assert!(pos("1") < pos("2"));
        assert!(pos("9") < pos("10"));
        assert!(pos("10") < pos("11"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["10"]["red"], 1);
        assert_eq!(value["10"]["green"], 2);
        assert_eq!(value["10"]["blue"], 3);
        assert_eq!(value["0"]["red"], 0);
        assert_eq!(value.as_object().unwrap().len(), 12);
    }

    #[test]
    fn fill_and_reset() {
        let mut state = StripState::new(3);
        state.fill(Rgb::new(5, 5, 5));
        assert_eq!(state.get(2), Some(Rgb::new(5, 5, 5)));
        state.reset();
        assert_eq!(state.get(2), Some(Rgb::BLACK));
    }
}
