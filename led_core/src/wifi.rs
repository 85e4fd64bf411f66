//! Station-mode connection policy.
//!
//! The radio driver is behind [`StationDriver`]; this module only decides
//! when to try again and when to give up.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use log::{info, warn};

use crate::{Error, Result};

/// Weakest access point security the station accepts while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthThreshold {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa3Psk,
    Wpa2Wpa3Psk,
    WapiPsk,
}

impl FromStr for AuthThreshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let threshold = match s.to_ascii_lowercase().as_str() {
            "open" => AuthThreshold::Open,
            "wep" => AuthThreshold::Wep,
            "wpa_psk" => AuthThreshold::WpaPsk,
            "wpa2_psk" => AuthThreshold::Wpa2Psk,
            "wpa_wpa2_psk" => AuthThreshold::WpaWpa2Psk,
            "wpa3_psk" => AuthThreshold::Wpa3Psk,
            "wpa2_wpa3_psk" => AuthThreshold::Wpa2Wpa3Psk,
            "wapi_psk" => AuthThreshold::WapiPsk,
            other => return Err(Error::UnknownSetting(format!("auth threshold '{other}'"))),
        };
        Ok(threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    GiveUp,
}

/// Counts reconnect attempts since the last successful association.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retries: 0,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn on_disconnect(&mut self) -> RetryDecision {
        if self.retries < self.max_retries {
            self.retries += 1;
            RetryDecision::Retry
        } else {
            RetryDecision::GiveUp
        }
    }

    pub fn reset(&mut self) {
        self.retries = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationOutcome {
    Connected(Ipv4Addr),
    Failed { attempts: u32 },
}

impl fmt::Display for StationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationOutcome::Connected(ip) => write!(f, "connected, got ip {ip}"),
            StationOutcome::Failed { attempts } => {
                write!(f, "failed after {attempts} attempts")
            }
        }
    }
}

pub trait StationDriver {
    fn start(&mut self) -> Result<()>;

    /// Associate with the configured access point.
    fn connect(&mut self) -> Result<()>;

    /// Block until DHCP hands out an address.
    fn wait_for_ip(&mut self) -> Result<Ipv4Addr>;

    fn is_connected(&self) -> Result<bool>;
}

/// Start the radio, then connect with [`reconnect`].
pub fn bring_up<D: StationDriver>(
    driver: &mut D,
    policy: &mut RetryPolicy,
) -> Result<StationOutcome> {
    driver.start()?;
    info!("station started");
    reconnect(driver, policy)
}

pub fn reconnect<D: StationDriver>(
    driver: &mut D,
    policy: &mut RetryPolicy,
) -> Result<StationOutcome> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match driver.connect().and_then(|_| driver.wait_for_ip()) {
            Ok(ip) => {
                policy.reset();
                return Ok(StationOutcome::Connected(ip));
            }
            Err(err) => {
                warn!("connect to the AP failed: {err}");
                match policy.on_disconnect() {
                    RetryDecision::Retry => info!("retry to connect to the AP"),
                    RetryDecision::GiveUp => return Ok(StationOutcome::Failed { attempts }),
                }
            }
        }
    }
}
