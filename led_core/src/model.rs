use std::fmt;
use std::str::FromStr;

use crate::{Error, Rgb};

/// Supported addressable LED chips. Both take GRB data, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedModel {
    Ws2812,
    Sk6812,
}

/// High/low times for one data bit, plus the latch (reset) time, in ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    pub t0h_ns: u64,
    pub t0l_ns: u64,
    pub t1h_ns: u64,
    pub t1l_ns: u64,
    pub reset_ns: u64,
}

impl LedModel {
    /// Value published on the `type` topic.
    pub fn name(&self) -> &'static str {
        match self {
            LedModel::Ws2812 => "WS2812",
            LedModel::Sk6812 => "SK6812",
        }
    }

    pub fn timing(&self) -> BitTiming {
        match self {
            LedModel::Ws2812 => BitTiming {
                t0h_ns: 350,
                t0l_ns: 800,
                t1h_ns: 700,
                t1l_ns: 600,
                reset_ns: 280_000,
            },
            LedModel::Sk6812 => BitTiming {
                t0h_ns: 300,
                t0l_ns: 900,
                t1h_ns: 600,
                t1l_ns: 600,
                reset_ns: 280_000,
            },
        }
    }
}

impl FromStr for LedModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ws2812" => Ok(LedModel::Ws2812),
            "sk6812" => Ok(LedModel::Sk6812),
            other => Err(Error::UnknownSetting(format!("led model '{other}'"))),
        }
    }
}

impl fmt::Display for LedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Frame bytes in wire order: G, R, B per pixel.
pub fn encode_grb(pixels: &[Rgb]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 3);
    for px in pixels {
        out.extend_from_slice(&[px.green, px.red, px.blue]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_names() {
        assert_eq!("ws2812".parse::<LedModel>().unwrap(), LedModel::Ws2812);
        assert_eq!("SK6812".parse::<LedModel>().unwrap(), LedModel::Sk6812);
        assert!("apa102".parse::<LedModel>().is_err());
        assert_eq!(LedModel::Ws2812.to_string(), "WS2812");
    }

    #[test]
    fn bit_periods_fit_800khz() {
        for model in [LedModel::Ws2812, LedModel::Sk6812] {
            let t = model.timing();
            assert!(t.t0h_ns < t.t1h_ns);
            assert!((1_100..=1_300).contains(&(t.t0h_ns + t.t0l_ns)));
            assert!((1_100..=1_300).contains(&(t.t1h_ns + t.t1l_ns)));
        }
    }

    #[test]
    fn encodes_grb_order() {
        let bytes = encode_grb(&[Rgb::new(1, 2, 3), Rgb::new(0xaa, 0xbb, 0xcc)]);
        assert_eq!(bytes, vec![2, 1, 3, 0xbb, 0xaa, 0xcc]);
    }
}
