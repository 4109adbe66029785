//! Turns reassembled status payloads into [`StatusDocument`]s.
//!
//! A payload starts with the two-byte manufacturer tag, the sub-message id
//! and a reserved byte. The rest depends entirely on the id. Each confirmed
//! id has a typed handler that first parses the whole body, then applies it
//! to the [`SessionState`]; a truncated body therefore fails without touching
//! the state.

use alloc::{string::String, vec::Vec};

use crate::{
    buf::{Buf, Truncated},
    catalog::{self, Port},
    state::{FolderKind, ListingEntry, SessionState, TrackFlags, AUX_COUNT, ZONE_COUNT},
    status::{DeviceStatus, ListingItem, SourceEntry, StatusDocument},
};

/// Tag, sub-message id and reserved byte.
pub const HEADER_LEN: usize = 4;

/// Offset of the sub-message id.
pub const SUB_MESSAGE_ID: usize = 2;

/// Ids the unit sends whose layout is not understood. They are dropped just
/// like ids that were never seen, but listed so nobody mistakes them for
/// unhandled ones.
pub const RESERVED: [u8; 9] = [1, 6, 13, 18, 21, 28, 30, 34, 54];

const AM_BAND_START_KHZ: f64 = 520.0;
const AM_BAND_SPAN_KHZ: f64 = 1100.0;
const FM_BAND_START_MHZ: f64 = 87.0;
const FM_BAND_SPAN_MHZ: f64 = 22.0;

/// Placeholder progress for sources without a real play position.
const NO_PROGRESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    #[error("payload of {0} bytes has no sub-message id")]
    TooShort(usize),
    #[error("sub-message {id} is truncated")]
    Truncated { id: u8 },
    #[error("sub-message {id} has an out-of-range {field}")]
    OutOfRange { id: u8, field: &'static str },
}

enum FieldError {
    Truncated,
    OutOfRange(&'static str),
}

impl From<Truncated> for FieldError {
    fn from(_: Truncated) -> Self {
        Self::Truncated
    }
}

impl FieldError {
    fn with_id(self, id: u8) -> DecodeError {
        match self {
            Self::Truncated => DecodeError::Truncated { id },
            Self::OutOfRange(field) => DecodeError::OutOfRange { id, field },
        }
    }
}

/// A confirmed sub-message.
trait Handler: Sized {
    const ID: u8;

    /// Parse the body that follows the header.
    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError>;

    /// Update the session and write whatever changed into `doc`. Writing
    /// nothing is how a handler rejects a stale message.
    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus);
}

type HandlerFn = fn(&[u8], &mut SessionState, &mut DeviceStatus) -> Result<(), DecodeError>;

fn run<H: Handler>(
    mut body: &[u8],
    state: &mut SessionState,
    doc: &mut DeviceStatus,
) -> Result<(), DecodeError> {
    let msg = H::parse(&mut body).map_err(|e| e.with_id(H::ID))?;
    msg.apply(state, doc);
    Ok(())
}

const HANDLERS: [(u8, HandlerFn); 18] = [
    (SourceInfo::ID, run::<SourceInfo>),
    (SourceCount::ID, run::<SourceCount>),
    (TrackInfo::ID, run::<TrackInfo>),
    (TrackName::ID, run::<TrackName>),
    (Elapsed::ID, run::<Elapsed>),
    (Tuner::ID, run::<Tuner>),
    (FolderSelection::ID, run::<FolderSelection>),
    (FolderCount::ID, run::<FolderCount>),
    (FolderItem::ID, run::<FolderItem>),
    (AuxGain::ID, run::<AuxGain>),
    (Mute::ID, run::<Mute>),
    (Balance::ID, run::<Balance>),
    (Subwoofer::ID, run::<Subwoofer>),
    (Tone::ID, run::<Tone>),
    (Volume::ID, run::<Volume>),
    (Power::ID, run::<Power>),
    (UnitName::ID, run::<UnitName>),
    (ZoneName::ID, run::<ZoneName>),
];

/// Whether `id` has a handler.
#[must_use]
pub fn is_confirmed(id: u8) -> bool {
    HANDLERS.iter().any(|(i, _)| *i == id)
}

/// Decode one reassembled payload.
///
/// Returns `Ok(None)` when there is nothing to report: the sub-message is
/// unknown or reserved, or a correlation check rejected it. In both cases the
/// state is left as it was.
pub fn decode(
    payload: &[u8],
    state: &mut SessionState,
) -> Result<Option<StatusDocument>, DecodeError> {
    let Some(&id) = payload.get(SUB_MESSAGE_ID) else {
        return Err(DecodeError::TooShort(payload.len()));
    };

    let Some((_, handler)) = HANDLERS.iter().find(|(i, _)| *i == id) else {
        #[cfg(feature = "defmt")]
        defmt::trace!("ignoring sub-message {}", id);
        return Ok(None);
    };

    let body = payload
        .get(HEADER_LEN..)
        .ok_or(DecodeError::Truncated { id })?;

    let mut doc = StatusDocument::default();
    handler(body, state, &mut doc.device)?;

    if doc.is_empty() {
        #[cfg(feature = "defmt")]
        defmt::debug!("sub-message {} rejected", id);
        Ok(None)
    } else {
        Ok(Some(doc))
    }
}

fn zone_index(zone: u8) -> Result<usize, FieldError> {
    let zone = zone as usize;
    if zone < ZONE_COUNT {
        Ok(zone)
    } else {
        Err(FieldError::OutOfRange("zone"))
    }
}

fn seconds(ms: u32) -> f64 {
    ms as f64 / 1000.0
}

fn render_session(state: &mut SessionState, doc: &mut DeviceStatus, port: Port) {
    let name = catalog::render(state, port);
    let source = doc.source();
    source.name = Some(name);
    source.sessionid = Some(port.0);
}

fn enumerate_sources(state: &SessionState, doc: &mut DeviceStatus) {
    if state.catalog_complete() {
        doc.sources = Some(
            state
                .source_catalog
                .iter()
                .map(|(port, name)| SourceEntry {
                    id: port.0,
                    name: name.clone(),
                })
                .collect(),
        );
    }
}

fn enumerate_listing(state: &SessionState, doc: &mut DeviceStatus) {
    if state.folder.listing_complete() {
        let listing: Vec<ListingItem> = state
            .folder
            .pending
            .iter()
            .map(|(id, entry)| ListingItem {
                id: *id,
                name: entry.name.clone(),
                kind: entry.kind.as_str(),
            })
            .collect();
        doc.media().listing = Some(listing);
    }
}

struct SourceInfo {
    source: Port,
    session: Port,
    status: u8,
    name: String,
}

impl SourceInfo {
    const INSERTED: u8 = 1 << 0;
    const SELECTED: u8 = 1 << 1;
}

impl Handler for SourceInfo {
    const ID: u8 = 2;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        let source = Port(buf.get_u8()?);
        let session = Port(buf.get_u8()?);
        let _source_type = buf.get_u8()?;
        let status = buf.get_u8()?;
        let name = buf.get_lstring()?;

        Ok(Self {
            source,
            session,
            status,
            name,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        let inserted = self.status & Self::INSERTED != 0;

        state.current_session_port = self.session;
        if self.status & Self::SELECTED != 0 {
            state.current_source_port = self.source;
        }
        if inserted {
            state.source_catalog.insert(self.source, self.name.clone());
        }

        let input = doc.input();
        input.name = Some(self.name);
        input.sourceid = Some(self.source.0);
        input.inserted = Some(inserted);
        input.count = state.total_sources;

        render_session(state, doc, self.session);
        enumerate_sources(state, doc);
    }
}

struct SourceCount(u8);

impl Handler for SourceCount {
    const ID: u8 = 3;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(buf.get_u8()?))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.total_sources = Some(self.0);
        doc.input().count = Some(self.0);
        enumerate_sources(state, doc);
    }
}

struct TrackInfo {
    session: Port,
    flags: TrackFlags,
    id: u32,
    total: u32,
    length: u32,
}

impl Handler for TrackInfo {
    const ID: u8 = 4;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            flags: TrackFlags(buf.get_u8()?),
            id: buf.get_u32()?,
            total: buf.get_u32()?,
            length: buf.get_u32()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.current_session_port = self.session;

        let track = &mut state.track;
        if track.id != Some(self.id) {
            track.name.clear();
            track.elapsed = None;
        }
        track.id = Some(self.id);
        track.flags = self.flags;
        track.total = Some(self.total);
        track.length = Some(self.length);

        let on = !self.flags.is_off();
        state.power = Some(on);
        doc.power = Some(on);

        if on {
            let out = doc.track();
            out.playing = Some(self.flags.playing());
            out.paused = Some(self.flags.paused());
            out.repeat = Some(self.flags.repeat());
            out.shuffle = Some(self.flags.shuffle());
        }

        let out = doc.track();
        out.number = Some(self.id);
        out.tracks = Some(self.total);
        out.length = Some(seconds(self.length));

        render_session(state, doc, self.session);
    }
}

struct TrackName {
    session: Port,
    id: u32,
    name: String,
}

impl Handler for TrackName {
    const ID: u8 = 5;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            id: buf.get_u32()?,
            name: buf.get_lstring()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if state.track.id != Some(self.id) {
            // answer to an older track
            return;
        }

        state.track.name.clone_from(&self.name);
        doc.track().name = Some(self.name);
        render_session(state, doc, self.session);
    }
}

struct Elapsed {
    session: Port,
    elapsed: u32,
}

impl Handler for Elapsed {
    const ID: u8 = 9;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            elapsed: buf.get_u32()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if self.session.is_usb_class() {
            state.track.elapsed = Some(self.elapsed);

            let out = doc.track();
            out.elapsedtime = Some(seconds(self.elapsed));
            out.length = state.track.length.map(seconds);
        } else {
            let out = doc.track();
            out.elapsedtime = Some(NO_PROGRESS);
            out.length = Some(NO_PROGRESS);
        }

        render_session(state, doc, self.session);
    }
}

struct Tuner {
    session: Port,
    frequency: u32,
    station: String,
}

impl Handler for Tuner {
    const ID: u8 = 11;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            frequency: buf.get_u32()?,
            station: buf.get_lstring()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.radio.frequency = Some(self.frequency);
        state.radio.station.clone_from(&self.station);

        let frequency = if self.session == Port::AM {
            self.frequency as f64 / 1e3
        } else {
            self.frequency as f64 / 1e6
        };

        let radio = doc.radio();
        radio.frequency = Some(frequency);
        radio.name = Some(self.station);

        // Position within the band, so a generic progress bar shows where
        // the tuner is.
        let band = match self.session {
            Port::AM => Some((AM_BAND_START_KHZ, AM_BAND_SPAN_KHZ)),
            Port::FM => Some((FM_BAND_START_MHZ, FM_BAND_SPAN_MHZ)),
            _ => None,
        };
        if let Some((start, span)) = band {
            let track = doc.track();
            track.elapsedtime = Some(frequency - start);
            track.length = Some(span);
        }

        render_session(state, doc, self.session);
    }
}

struct FolderSelection {
    session: Port,
    folder_id: u32,
    kind: FolderKind,
    folder_session: u32,
}

impl Handler for FolderSelection {
    const ID: u8 = 15;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            folder_id: buf.get_u32()?,
            kind: FolderKind::from(buf.get_u8()?),
            folder_session: buf.get_u32()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if self.session != state.current_session_port {
            return;
        }

        let folder = &mut state.folder;
        if folder.session_id != Some(self.folder_session) || folder.folder_id != Some(self.folder_id)
        {
            folder.pending.clear();
            folder.count = None;
        }
        folder.folder_id = Some(self.folder_id);
        folder.kind = Some(self.kind);
        folder.session_id = Some(self.folder_session);

        let media = doc.media();
        media.folderid = Some(self.folder_id);
        media.foldertype = Some(self.kind.as_str());
        media.foldersessionid = Some(self.folder_session);
        media.rootfolder = Some(self.kind == FolderKind::Root);
    }
}

struct FolderCount {
    session: Port,
    count: u32,
    folder_session: u32,
}

impl Handler for FolderCount {
    const ID: u8 = 16;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            count: buf.get_u32()?,
            folder_session: buf.get_u32()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if self.session != state.current_session_port {
            return;
        }

        let folder = &mut state.folder;
        if folder.session_id.is_some_and(|current| current != self.folder_session) {
            return;
        }
        folder.session_id = Some(self.folder_session);
        folder.count = Some(self.count);

        let media = doc.media();
        media.count = Some(self.count);
        media.foldersessionid = Some(self.folder_session);

        enumerate_listing(state, doc);
    }
}

struct FolderItem {
    session: Port,
    folder_session: u32,
    item_id: u32,
    kind: FolderKind,
    name: String,
}

impl Handler for FolderItem {
    const ID: u8 = 17;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            session: Port(buf.get_u8()?),
            folder_session: buf.get_u32()?,
            item_id: buf.get_u32()?,
            kind: FolderKind::from(buf.get_u8()?),
            name: buf.get_lstring()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if self.session != state.current_session_port
            || state.folder.session_id != Some(self.folder_session)
        {
            return;
        }

        state.folder.pending.insert(
            self.item_id,
            ListingEntry {
                name: self.name.clone(),
                kind: self.kind,
            },
        );

        let media = doc.media();
        media.folderid = Some(self.item_id);
        media.foldername = Some(self.name);
        media.foldertype = Some(self.kind.as_str());

        enumerate_listing(state, doc);
    }
}

struct AuxGain {
    index: usize,
    gain: i8,
}

impl Handler for AuxGain {
    const ID: u8 = 19;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        let index = buf.get_u8()? as usize;
        if index >= AUX_COUNT {
            return Err(FieldError::OutOfRange("aux index"));
        }

        Ok(Self {
            index,
            gain: buf.get_i8()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.aux_gain[self.index] = Some(self.gain);
        doc.aux(self.index).gain = Some(self.gain);
    }
}

/// `None` for a state byte we do not know.
fn on_off(value: u8) -> Option<bool> {
    match value {
        0x01 => Some(true),
        0x02 => Some(false),
        _ => None,
    }
}

struct Mute(Option<bool>);

impl Handler for Mute {
    const ID: u8 = 23;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(on_off(buf.get_u8()?)))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if let Some(muted) = self.0 {
            state.muted = Some(muted);
            doc.mute = Some(muted);
        }
    }
}

struct Balance {
    zone: usize,
    balance: i8,
}

impl Handler for Balance {
    const ID: u8 = 24;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            zone: zone_index(buf.get_u8()?)?,
            balance: buf.get_i8()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.zones[self.zone].balance = Some(self.balance);
        doc.zone(self.zone).balance = Some(self.balance);
    }
}

struct Subwoofer([u8; ZONE_COUNT]);

impl Handler for Subwoofer {
    const ID: u8 = 26;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(buf.get_array()?))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        for (zone, level) in self.0.into_iter().enumerate() {
            state.zones[zone].subwoofer = Some(level);
            doc.zone(zone).subwoofer = Some(level);
        }
    }
}

struct Tone {
    bass: i8,
    midrange: i8,
    treble: i8,
}

impl Handler for Tone {
    const ID: u8 = 27;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            bass: buf.get_i8()?,
            midrange: buf.get_i8()?,
            treble: buf.get_i8()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.tone.bass = Some(self.bass);
        state.tone.midrange = Some(self.midrange);
        state.tone.treble = Some(self.treble);

        let tone = doc.tone();
        tone.bass = Some(self.bass);
        tone.midrange = Some(self.midrange);
        tone.treble = Some(self.treble);
    }
}

struct Volume([u8; ZONE_COUNT]);

impl Handler for Volume {
    const ID: u8 = 29;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(buf.get_array()?))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        for (zone, volume) in self.0.into_iter().enumerate() {
            state.zones[zone].volume = Some(volume);
            doc.zone(zone).volume = Some(volume);
        }
    }
}

struct Power(Option<bool>);

impl Handler for Power {
    const ID: u8 = 32;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(on_off(buf.get_u8()?)))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        if let Some(on) = self.0 {
            state.power = Some(on);
            doc.power = Some(on);
        }
    }
}

struct UnitName(String);

impl Handler for UnitName {
    const ID: u8 = 33;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self(buf.get_lstring()?))
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.device_name.clone_from(&self.0);
        doc.name = Some(self.0);
    }
}

struct ZoneName {
    zone: usize,
    name: String,
}

impl Handler for ZoneName {
    const ID: u8 = 45;

    fn parse(buf: &mut &[u8]) -> Result<Self, FieldError> {
        Ok(Self {
            zone: zone_index(buf.get_u8()?)?,
            name: buf.get_lstring()?,
        })
    }

    fn apply(self, state: &mut SessionState, doc: &mut DeviceStatus) {
        state.zones[self.zone].name.clone_from(&self.name);
        doc.zone(self.zone).name = Some(self.name);
    }
}
