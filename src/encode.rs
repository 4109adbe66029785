//! Turns commands into the ordered fast packet fragments the unit expects.
//!
//! Every command is a fixed template: manufacturer tag, command id, a zero
//! byte and the parameters. The fragments must reach the unit in the order
//! they are produced; it has nothing but the frame counter to go by.

use alloc::string::String;

use serde::Deserialize;

use crate::{
    buf::{BufMut, Truncated},
    command::{Command, CommandDocument},
    config::Addressing,
    fast_packet::{self, FastPacket},
    state::SessionState,
    well_known::{MANUFACTURER_TAG, MEDIA_COMMAND_PGN},
    Id, NmeaFrame,
};

/// The longest command template.
pub const MAX_COMMAND_LEN: usize = 16;

/// Fragments needed for the longest command.
pub const MAX_FRAGMENTS: usize = fast_packet::frame_count(MAX_COMMAND_LEN);

/// Sequence counter of every command group, so the first fragment starts
/// with `0xa0`.
pub const SEQUENCE_GROUP: u8 = 5;

pub type Payload = heapless::Vec<u8, MAX_COMMAND_LEN>;
pub type Fragments = heapless::Vec<FastPacket, MAX_FRAGMENTS>;
pub type Frames = heapless::Vec<NmeaFrame, MAX_FRAGMENTS>;

mod id {
    pub const STATUS_REQUEST: u8 = 0x01;
    pub const SOURCE: u8 = 0x02;
    pub const TRANSPORT: u8 = 0x03;
    pub const TUNER_STEP: u8 = 0x05;
    pub const PRESET: u8 = 0x07;
    pub const REPEAT: u8 = 0x0a;
    pub const SHUFFLE: u8 = 0x0b;
    pub const BROWSE_REQUEST: u8 = 0x0f;
    pub const BROWSE_ACK: u8 = 0x10;
    pub const MUTE: u8 = 0x11;
    pub const BROWSE_CONFIRM: u8 = 0x12;
    pub const TONE: u8 = 0x16;
    pub const ZONE_VOLUME: u8 = 0x18;
    pub const POWER: u8 = 0x1c;
}

/// Constant in every tone command the unit accepts.
const TONE_SELECT: u8 = 0x03;

const ON: u8 = 0x01;
const OFF: u8 = 0x02;

const TUNE_UP: u8 = 0x01;
const TUNE_DOWN: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("command document is malformed")]
    Malformed,
    #[error("command document has no recognized control")]
    NoControl,
    #[error("unknown source {0:?}")]
    UnknownSource(String),
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("no session is active")]
    NoSession,
    #[error("the tuned frequency is unknown")]
    NoFrequency,
    #[error("no folder is being browsed")]
    NoFolder,
    #[error("command does not fit its buffer")]
    TooLong,
}

impl From<Truncated> for EncodeError {
    fn from(_: Truncated) -> Self {
        Self::TooLong
    }
}

fn on_off(on: bool) -> u8 {
    if on {
        ON
    } else {
        OFF
    }
}

impl Command {
    /// Write the command's byte template.
    pub fn to_payload(&self) -> Result<Payload, EncodeError> {
        let mut buf = Payload::new();
        buf.put_slice(&MANUFACTURER_TAG)?;

        match *self {
            Self::RequestStatus => {
                buf.put_slice(&[id::STATUS_REQUEST, 0x00])?;
            }
            Self::Source(port) => {
                buf.put_slice(&[id::SOURCE, 0x00, port.0])?;
            }
            Self::Transport { port, action } => {
                buf.put_slice(&[id::TRANSPORT, 0x00, port.0, action as u8])?;
            }
            Self::TunerStep {
                port,
                up,
                frequency,
            } => {
                let dir = if up { TUNE_UP } else { TUNE_DOWN };
                buf.put_slice(&[id::TUNER_STEP, 0x00, port.0, dir])?;
                buf.put_u32(frequency)?;
            }
            Self::Preset { port, preset } => {
                buf.put_slice(&[id::PRESET, 0x00, port.0, preset])?;
            }
            Self::Repeat { port, on } => {
                buf.put_slice(&[id::REPEAT, 0x00, port.0, on_off(on)])?;
            }
            Self::Shuffle { port, on } => {
                buf.put_slice(&[id::SHUFFLE, 0x00, port.0, on_off(on)])?;
            }
            Self::BrowseRequest { port, op, folder } => {
                buf.put_slice(&[id::BROWSE_REQUEST, 0x00, port.0, op as u8])?;
                buf.put_u32(folder)?;
            }
            Self::BrowseAck {
                port,
                folder_session,
            } => {
                buf.put_slice(&[id::BROWSE_ACK, 0x00, port.0])?;
                buf.put_u32(folder_session)?;
            }
            Self::Mute(muted) => {
                buf.put_slice(&[id::MUTE, 0x00, on_off(muted)])?;
            }
            Self::BrowseConfirm { folder, records } => {
                buf.put_slice(&[id::BROWSE_CONFIRM, 0x00])?;
                buf.put_u32(folder)?;
                buf.put_u32(records)?;
            }
            Self::Tone {
                bass,
                midrange,
                treble,
            } => {
                buf.put_slice(&[id::TONE, 0x00, TONE_SELECT])?;
                buf.put_i8(bass)?;
                buf.put_i8(midrange)?;
                buf.put_i8(treble)?;
            }
            Self::Volume { zone, level } => {
                buf.put_slice(&[id::ZONE_VOLUME, 0x00, zone, level])?;
            }
            Self::Power(on) => {
                buf.put_slice(&[id::POWER, 0x00, on_off(on)])?;
            }
        }

        Ok(buf)
    }
}

/// Split a payload into fast packet fragments: `a0 <len>` and six bytes,
/// then `a1`, `a2`, ... with seven bytes each, the last one padded with
/// `0xff`.
pub fn fragment(payload: &[u8]) -> Result<Fragments, EncodeError> {
    let mut fragments = Fragments::new();

    for packet in fast_packet::Iter::new(payload, SEQUENCE_GROUP) {
        fragments.push(packet).map_err(|_| EncodeError::TooLong)?;
    }

    Ok(fragments)
}

/// Encode a command document into fragments. Exactly one control is
/// honored; see [`Command::from_document`] for the order.
pub fn encode(doc: &CommandDocument, state: &SessionState) -> Result<Fragments, EncodeError> {
    let command = Command::from_document(doc, state)?;
    let payload = command.to_payload()?;

    #[cfg(feature = "defmt")]
    defmt::debug!("encoded {} as {=[u8]:x}", command, &payload[..]);

    fragment(&payload)
}

/// Like [`encode`], reading the document from JSON.
pub fn encode_value(value: &serde_json::Value, state: &SessionState) -> Result<Fragments, EncodeError> {
    let doc = CommandDocument::deserialize(value).map_err(|_| EncodeError::Malformed)?;
    encode(&doc, state)
}

/// Address fragments as command frames, preserving their order.
#[must_use]
pub fn to_frames(fragments: &[FastPacket], addressing: Addressing) -> Frames {
    let id = Id::new(
        addressing.priority,
        MEDIA_COMMAND_PGN,
        addressing.source,
        addressing.destination,
    );

    fragments
        .iter()
        .take(MAX_FRAGMENTS)
        .map(|packet| NmeaFrame::from_fast_packet(id, packet))
        .collect()
}
