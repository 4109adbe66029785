use serde::Deserialize;

use crate::id::DESTINATION_BROADCAST;

/// Priority the unit's own commands are seen with on the bus.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Addressing fields of outbound command frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct Addressing {
    pub priority: u8,
    /// Overwritten with the claimed address when frames go through the
    /// client.
    pub source: u8,
    pub destination: u8,
}

impl Default for Addressing {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            source: 0,
            destination: DESTINATION_BROADCAST,
        }
    }
}

/// Settings for talking to one unit.
///
/// ```
/// # use nmea2000_media::Config;
/// let config: Config = serde_json::from_str(r#"{ "name": 4660, "device": 10 }"#).unwrap();
/// assert_eq!(config.device, Some(10));
/// assert_eq!(config.addressing().destination, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct Config {
    /// Our ISO NAME, used to claim an address.
    pub name: u64,
    pub priority: u8,
    /// Bus address of the unit. Status from other sources is ignored and
    /// commands are addressed to it; `None` accepts anyone and broadcasts.
    pub device: Option<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: 0,
            priority: DEFAULT_PRIORITY,
            device: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn addressing(&self) -> Addressing {
        Addressing {
            priority: self.priority,
            source: 0,
            destination: self.device.unwrap_or(DESTINATION_BROADCAST),
        }
    }

    /// Whether status from `source` concerns us.
    #[must_use]
    pub fn accepts(&self, source: u8) -> bool {
        self.device.is_none_or(|device| device == source)
    }
}
