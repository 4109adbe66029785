//! Command documents and the controls they resolve to.
//!
//! A command document uses the same keys as the status document, read the
//! other way round: `{"device": {"zone0": {"volume": 9}}}` sets a volume.
//! Keys outside the vocabulary are ignored.

use alloc::string::{String, ToString};

use serde::Deserialize;

use crate::{
    catalog::{self, Port},
    encode::EncodeError,
    state::{SessionState, MAX_VOLUME},
};

/// Folder id the unit uses for the top of a catalog.
pub const ROOT_FOLDER: u32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommandDocument {
    #[serde(default)]
    pub device: DeviceCommand,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceCommand {
    pub power: Option<bool>,
    pub mute: Option<bool>,
    pub source: Option<String>,
    pub play: Option<bool>,
    pub next: Option<bool>,
    pub previous: Option<bool>,
    pub preset: Option<u8>,
    pub repeat: Option<bool>,
    pub shuffle: Option<bool>,
    pub zone0: Option<ZoneCommand>,
    pub zone1: Option<ZoneCommand>,
    pub zone2: Option<ZoneCommand>,
    pub tone: Option<ToneCommand>,
    pub media: Option<MediaCommand>,
    pub refresh: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoneCommand {
    pub volume: Option<u8>,
}

/// Bands left out keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToneCommand {
    pub bass: Option<i8>,
    pub midrange: Option<i8>,
    pub treble: Option<i8>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaCommand {
    pub request: Option<BrowseOp>,
    pub folderid: Option<u32>,
    pub ack: Option<bool>,
    pub confirm: Option<bool>,
    pub recordsreceived: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum BrowseOp {
    Initial = 0,
    Current = 1,
    Next = 2,
    Previous = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    Play = 1,
    Pause = 2,
    Next = 4,
    Previous = 6,
}

/// One control, resolved against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Power(bool),
    Mute(bool),
    Source(Port),
    Transport {
        port: Port,
        action: Transport,
    },
    /// Step the tuner one channel from `frequency`.
    TunerStep {
        port: Port,
        up: bool,
        frequency: u32,
    },
    Preset {
        port: Port,
        preset: u8,
    },
    Repeat {
        port: Port,
        on: bool,
    },
    Shuffle {
        port: Port,
        on: bool,
    },
    Volume {
        zone: u8,
        level: u8,
    },
    Tone {
        bass: i8,
        midrange: i8,
        treble: i8,
    },
    BrowseRequest {
        port: Port,
        op: BrowseOp,
        folder: u32,
    },
    BrowseAck {
        port: Port,
        folder_session: u32,
    },
    BrowseConfirm {
        folder: u32,
        records: u32,
    },
    RequestStatus,
}

fn session(state: &SessionState) -> Result<Port, EncodeError> {
    if state.current_session_port.is_known() {
        Ok(state.current_session_port)
    } else {
        Err(EncodeError::NoSession)
    }
}

fn skip(state: &SessionState, forward: bool) -> Result<Command, EncodeError> {
    let port = session(state)?;

    if port.is_tuner() {
        Ok(Command::TunerStep {
            port,
            up: forward,
            frequency: state.radio.frequency.ok_or(EncodeError::NoFrequency)?,
        })
    } else {
        Ok(Command::Transport {
            port,
            action: if forward {
                Transport::Next
            } else {
                Transport::Previous
            },
        })
    }
}

impl Command {
    /// Pick the one control a document asks for.
    ///
    /// Documents setting several controls honor only the first of: power,
    /// mute, source, play, next, previous, preset, repeat, shuffle, zone0..2
    /// volume, tone, media request, media ack, media confirm, refresh.
    pub fn from_document(doc: &CommandDocument, state: &SessionState) -> Result<Self, EncodeError> {
        let d = &doc.device;

        if let Some(on) = d.power {
            return Ok(Self::Power(on));
        }

        if let Some(muted) = d.mute {
            return Ok(Self::Mute(muted));
        }

        if let Some(name) = &d.source {
            return catalog::resolve(state, name)
                .map(Self::Source)
                .ok_or_else(|| EncodeError::UnknownSource(name.to_string()));
        }

        if let Some(play) = d.play {
            return Ok(Self::Transport {
                port: session(state)?,
                action: if play { Transport::Play } else { Transport::Pause },
            });
        }

        if d.next == Some(true) {
            return skip(state, true);
        }

        if d.previous == Some(true) {
            return skip(state, false);
        }

        if let Some(preset) = d.preset {
            return Ok(Self::Preset {
                port: session(state)?,
                preset,
            });
        }

        if let Some(on) = d.repeat {
            return Ok(Self::Repeat {
                port: session(state)?,
                on,
            });
        }

        if let Some(on) = d.shuffle {
            return Ok(Self::Shuffle {
                port: session(state)?,
                on,
            });
        }

        for (zone, cmd) in [&d.zone0, &d.zone1, &d.zone2].into_iter().enumerate() {
            if let Some(level) = cmd.as_ref().and_then(|z| z.volume) {
                if level > MAX_VOLUME {
                    return Err(EncodeError::OutOfRange {
                        field: "volume",
                        value: level.into(),
                    });
                }

                return Ok(Self::Volume {
                    zone: zone as u8,
                    level,
                });
            }
        }

        if let Some(tone) = &d.tone {
            if tone.bass.is_some() || tone.midrange.is_some() || tone.treble.is_some() {
                let current = &state.tone;
                return Ok(Self::Tone {
                    bass: tone.bass.or(current.bass).unwrap_or(0),
                    midrange: tone.midrange.or(current.midrange).unwrap_or(0),
                    treble: tone.treble.or(current.treble).unwrap_or(0),
                });
            }
        }

        if let Some(media) = &d.media {
            if let Some(op) = media.request {
                let folder = match op {
                    BrowseOp::Initial => media.folderid.unwrap_or(ROOT_FOLDER),
                    _ => media
                        .folderid
                        .or(state.folder.folder_id)
                        .unwrap_or(ROOT_FOLDER),
                };

                return Ok(Self::BrowseRequest {
                    port: session(state)?,
                    op,
                    folder,
                });
            }

            if media.ack == Some(true) {
                return Ok(Self::BrowseAck {
                    port: session(state)?,
                    folder_session: state.folder.session_id.ok_or(EncodeError::NoFolder)?,
                });
            }

            if media.confirm == Some(true) {
                return Ok(Self::BrowseConfirm {
                    folder: media
                        .folderid
                        .or(state.folder.folder_id)
                        .ok_or(EncodeError::NoFolder)?,
                    records: media
                        .recordsreceived
                        .unwrap_or(state.folder.pending.len() as u32),
                });
            }
        }

        if d.refresh == Some(true) {
            return Ok(Self::RequestStatus);
        }

        Err(EncodeError::NoControl)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{from_value, json};

    use super::{BrowseOp, Command, CommandDocument, Transport};
    use crate::{catalog::Port, encode::EncodeError, state::SessionState};

    fn resolve(value: serde_json::Value, state: &SessionState) -> Result<Command, EncodeError> {
        let doc: CommandDocument = from_value(value).unwrap();
        Command::from_document(&doc, state)
    }

    fn playing(port: Port) -> SessionState {
        let mut state = SessionState::new();
        state.current_session_port = port;
        state
    }

    #[test]
    fn unknown_keys_are_no_control() {
        let state = SessionState::new();

        assert_eq!(resolve(json!({ "device": { "foo": 1 } }), &state), Err(EncodeError::NoControl));
        assert_eq!(resolve(json!({}), &state), Err(EncodeError::NoControl));
        assert_eq!(
            resolve(json!({ "device": { "next": false, "zone1": {} } }), &state),
            Err(EncodeError::NoControl)
        );
    }

    #[test]
    fn power_outranks_everything() {
        let state = SessionState::new();

        assert_eq!(
            resolve(
                json!({ "device": { "zone0": { "volume": 3 }, "mute": true, "power": false } }),
                &state
            ),
            Ok(Command::Power(false))
        );
        assert_eq!(
            resolve(json!({ "device": { "zone2": { "volume": 3 }, "mute": true } }), &state),
            Ok(Command::Mute(true))
        );
    }

    #[test]
    fn first_zone_with_a_volume_wins() {
        let state = SessionState::new();

        assert_eq!(
            resolve(json!({ "device": { "zone2": { "volume": 4 }, "zone1": { "volume": 7 } } }), &state),
            Ok(Command::Volume { zone: 1, level: 7 })
        );
        assert_eq!(
            resolve(json!({ "device": { "zone0": { "volume": 25 } } }), &state),
            Err(EncodeError::OutOfRange {
                field: "volume",
                value: 25
            })
        );
    }

    #[test]
    fn sources_resolve_through_catalog() {
        let mut state = SessionState::new();

        assert_eq!(
            resolve(json!({ "device": { "source": "FM" } }), &state),
            Ok(Command::Source(Port::FM))
        );

        state.usb_class_mapping = Port::MTP;
        assert_eq!(
            resolve(json!({ "device": { "source": "usb" } }), &state),
            Ok(Command::Source(Port::MTP))
        );

        assert_eq!(
            resolve(json!({ "device": { "source": "cassette" } }), &state),
            Err(EncodeError::UnknownSource("cassette".into()))
        );
    }

    #[test]
    fn next_steps_the_tuner() {
        let mut state = playing(Port::FM);

        assert_eq!(
            resolve(json!({ "device": { "next": true } }), &state),
            Err(EncodeError::NoFrequency)
        );

        state.radio.frequency = Some(97_500_000);
        assert_eq!(
            resolve(json!({ "device": { "previous": true } }), &state),
            Ok(Command::TunerStep {
                port: Port::FM,
                up: false,
                frequency: 97_500_000
            })
        );
    }

    #[test]
    fn next_skips_media() {
        let state = playing(Port::USB);

        assert_eq!(
            resolve(json!({ "device": { "next": true } }), &state),
            Ok(Command::Transport {
                port: Port::USB,
                action: Transport::Next
            })
        );
        assert_eq!(
            resolve(json!({ "device": { "play": false } }), &state),
            Ok(Command::Transport {
                port: Port::USB,
                action: Transport::Pause
            })
        );
    }

    #[test]
    fn transport_needs_a_session() {
        let state = SessionState::new();

        assert_eq!(
            resolve(json!({ "device": { "play": true } }), &state),
            Err(EncodeError::NoSession)
        );
    }

    #[test]
    fn tone_keeps_missing_bands() {
        let mut state = SessionState::new();
        state.tone.midrange = Some(-4);

        assert_eq!(
            resolve(json!({ "device": { "tone": { "bass": 2 } } }), &state),
            Ok(Command::Tone {
                bass: 2,
                midrange: -4,
                treble: 0
            })
        );
    }

    #[test]
    fn browse_controls() {
        let mut state = playing(Port::USB);

        assert_eq!(
            resolve(json!({ "device": { "media": { "request": "initial" } } }), &state),
            Ok(Command::BrowseRequest {
                port: Port::USB,
                op: BrowseOp::Initial,
                folder: 0
            })
        );
        assert_eq!(
            resolve(json!({ "device": { "media": { "ack": true } } }), &state),
            Err(EncodeError::NoFolder)
        );

        state.folder.folder_id = Some(12);
        state.folder.session_id = Some(0x55);
        assert_eq!(
            resolve(json!({ "device": { "media": { "request": "next" } } }), &state),
            Ok(Command::BrowseRequest {
                port: Port::USB,
                op: BrowseOp::Next,
                folder: 12
            })
        );
        assert_eq!(
            resolve(json!({ "device": { "media": { "ack": true } } }), &state),
            Ok(Command::BrowseAck {
                port: Port::USB,
                folder_session: 0x55
            })
        );
        assert_eq!(
            resolve(
                json!({ "device": { "media": { "confirm": true, "folderid": 3, "recordsreceived": 8 } } }),
                &state
            ),
            Ok(Command::BrowseConfirm {
                folder: 3,
                records: 8
            })
        );
    }
}
