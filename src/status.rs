//! The status document the decoder produces.
//!
//! Every field is optional and skipped when unset, so one document carries
//! just what a single sub-message changed. Clients merge successive
//! documents by key.

use alloc::{string::String, vec::Vec};

use serde::Serialize;

use crate::state::ZONE_COUNT;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusDocument {
    pub device: DeviceStatus,
}

impl StatusDocument {
    /// Nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio: Option<RadioStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone0: Option<ZoneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone1: Option<ZoneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone2: Option<ZoneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux0: Option<AuxStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux1: Option<AuxStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaStatus>,
}

impl DeviceStatus {
    pub fn source(&mut self) -> &mut SourceStatus {
        self.source.get_or_insert_with(Default::default)
    }

    pub fn input(&mut self) -> &mut InputStatus {
        self.input.get_or_insert_with(Default::default)
    }

    pub fn track(&mut self) -> &mut TrackStatus {
        self.track.get_or_insert_with(Default::default)
    }

    pub fn radio(&mut self) -> &mut RadioStatus {
        self.radio.get_or_insert_with(Default::default)
    }

    pub fn tone(&mut self) -> &mut ToneStatus {
        self.tone.get_or_insert_with(Default::default)
    }

    pub fn media(&mut self) -> &mut MediaStatus {
        self.media.get_or_insert_with(Default::default)
    }

    /// # Panics
    ///
    /// Panics if `zone` is not below [`ZONE_COUNT`]; the decoder validates
    /// zone indices before calling this.
    pub fn zone(&mut self, zone: usize) -> &mut ZoneStatus {
        debug_assert!(zone < ZONE_COUNT);
        let slot = match zone {
            0 => &mut self.zone0,
            1 => &mut self.zone1,
            _ => &mut self.zone2,
        };
        slot.get_or_insert_with(Default::default)
    }

    pub fn aux(&mut self, index: usize) -> &mut AuxStatus {
        let slot = match index {
            0 => &mut self.aux0,
            _ => &mut self.aux1,
        };
        slot.get_or_insert_with(Default::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessionid: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub id: u8,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourceid: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<u32>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsedtime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadioStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// kHz on AM, MHz otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subwoofer: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuxStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<i8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToneStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midrange: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treble: Option<i8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folderid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foldersessionid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foldername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foldertype: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rootfolder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Vec<ListingItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingItem {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use serde_json::json;

    use super::StatusDocument;

    #[test]
    fn empty_document() {
        let doc = StatusDocument::default();

        assert!(doc.is_empty());
        assert_eq!(doc.to_value().unwrap(), json!({ "device": {} }));
    }

    #[test]
    fn only_written_keys_are_rendered() {
        let mut doc = StatusDocument::default();
        doc.device.zone(1).volume = Some(12);
        doc.device.track().name = Some(String::from("Harbour Lights"));

        assert!(!doc.is_empty());
        assert_eq!(
            doc.to_value().unwrap(),
            json!({
                "device": {
                    "track": { "name": "Harbour Lights" },
                    "zone1": { "volume": 12 }
                }
            })
        );
    }
}
