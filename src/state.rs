//! What we currently believe about the unit.
//!
//! Updates arrive in no particular order, so every field is last write wins.
//! Nothing here waits for a complete snapshot; the only gating is the
//! session and folder-session correlation done by the decoder.

use alloc::{collections::BTreeMap, string::String};

use crate::catalog::Port;

/// Number of audio zones the unit reports.
pub const ZONE_COUNT: usize = 3;

/// Number of auxiliary inputs with their own gain.
pub const AUX_COUNT: usize = 2;

/// Highest zone volume the unit accepts.
pub const MAX_VOLUME: u8 = 24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneState {
    pub name: String,
    pub volume: Option<u8>,
    pub subwoofer: Option<u8>,
    pub balance: Option<i8>,
}

impl ZoneState {
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            volume: None,
            subwoofer: None,
            balance: None,
        }
    }
}

/// Tone settings shared by all zones. Balance is per zone and lives in
/// [`ZoneState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneState {
    pub bass: Option<i8>,
    pub midrange: Option<i8>,
    pub treble: Option<i8>,
}

/// Bit field reported with the track status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackFlags(pub u8);

impl TrackFlags {
    pub const PLAYING: u8 = 1 << 0;
    pub const PAUSED: u8 = 1 << 1;
    pub const REPEAT: u8 = 1 << 5;
    pub const SHUFFLE: u8 = 1 << 6;

    /// An all-zero status means the unit is powered off.
    #[inline]
    #[must_use]
    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn playing(self) -> bool {
        self.0 & Self::PLAYING != 0
    }

    #[inline]
    #[must_use]
    pub const fn paused(self) -> bool {
        self.0 & Self::PAUSED != 0 && !self.playing()
    }

    #[inline]
    #[must_use]
    pub const fn repeat(self) -> bool {
        self.0 & Self::REPEAT != 0
    }

    #[inline]
    #[must_use]
    pub const fn shuffle(self) -> bool {
        self.0 & Self::SHUFFLE != 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackState {
    pub id: Option<u32>,
    pub name: String,
    pub flags: TrackFlags,
    pub total: Option<u32>,
    /// Milliseconds.
    pub length: Option<u32>,
    /// Milliseconds.
    pub elapsed: Option<u32>,
}

impl TrackState {
    pub const fn new() -> Self {
        Self {
            id: None,
            name: String::new(),
            flags: TrackFlags(0),
            total: None,
            length: None,
            elapsed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioState {
    /// Device units: Hz. The port decides how it is presented.
    pub frequency: Option<u32>,
    pub station: String,
}

impl RadioState {
    pub const fn new() -> Self {
        Self {
            frequency: None,
            station: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FolderKind {
    Root,
    Normal,
    Device,
    Virtual,
    Track,
    Unknown(u8),
}

impl From<u8> for FolderKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Root,
            1 => Self::Normal,
            2 => Self::Device,
            3 => Self::Virtual,
            4 => Self::Track,
            n => Self::Unknown(n),
        }
    }
}

impl FolderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Normal => "folder",
            Self::Device => "device",
            Self::Virtual => "virtual",
            Self::Track => "track",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// A named entry of the folder being listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: FolderKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderBrowseState {
    pub folder_id: Option<u32>,
    pub kind: Option<FolderKind>,
    /// Correlation token the unit hands out with every folder selection.
    pub session_id: Option<u32>,
    pub count: Option<u32>,
    /// Names received so far for the current listing, by item id.
    pub pending: BTreeMap<u32, ListingEntry>,
}

impl FolderBrowseState {
    pub const fn new() -> Self {
        Self {
            folder_id: None,
            kind: None,
            session_id: None,
            count: None,
            pending: BTreeMap::new(),
        }
    }

    /// True once every announced entry of the listing has a name.
    #[must_use]
    pub fn listing_complete(&self) -> bool {
        self.count
            .is_some_and(|count| self.pending.len() as u32 >= count)
    }
}

/// One instance per controlled unit, created with everything unknown and
/// mutated in place by the decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// The input that is physically selected.
    pub current_source_port: Port,
    /// The session the unit is currently reporting status for.
    pub current_session_port: Port,
    /// The physical port the `usb` alias refers to.
    pub usb_class_mapping: Port,
    /// Display names reported by the unit, by port.
    pub source_catalog: BTreeMap<Port, String>,
    pub total_sources: Option<u8>,
    pub zones: [ZoneState; ZONE_COUNT],
    pub aux_gain: [Option<i8>; AUX_COUNT],
    pub tone: ToneState,
    pub track: TrackState,
    pub radio: RadioState,
    pub folder: FolderBrowseState,
    pub device_name: String,
    pub power: Option<bool>,
    pub muted: Option<bool>,
}

impl SessionState {
    pub const fn new() -> Self {
        Self {
            current_source_port: Port::UNKNOWN,
            current_session_port: Port::UNKNOWN,
            usb_class_mapping: Port::UNKNOWN,
            source_catalog: BTreeMap::new(),
            total_sources: None,
            zones: [ZoneState::new(), ZoneState::new(), ZoneState::new()],
            aux_gain: [None; AUX_COUNT],
            tone: ToneState {
                bass: None,
                midrange: None,
                treble: None,
            },
            track: TrackState::new(),
            radio: RadioState::new(),
            folder: FolderBrowseState::new(),
            device_name: String::new(),
            power: None,
            muted: None,
        }
    }

    /// The source catalog holds every source the unit announced.
    #[must_use]
    pub fn catalog_complete(&self) -> bool {
        self.total_sources
            .is_some_and(|total| total > 0 && self.source_catalog.len() >= total as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::{FolderKind, SessionState, TrackFlags};
    use crate::catalog::Port;

    #[test]
    fn starts_unknown() {
        let state = SessionState::new();

        assert_eq!(state, SessionState::default());
        assert_eq!(state.current_session_port, Port::UNKNOWN);
        assert!(!state.catalog_complete());
        assert!(!state.folder.listing_complete());
    }

    #[test]
    fn track_flags() {
        let flags = TrackFlags(TrackFlags::PLAYING | TrackFlags::SHUFFLE);

        assert!(flags.playing());
        assert!(!flags.paused());
        assert!(flags.shuffle());
        assert!(!flags.repeat());
        assert!(TrackFlags(0).is_off());
        assert!(TrackFlags(TrackFlags::PAUSED).paused());
    }

    #[test]
    fn folder_kinds() {
        assert_eq!(FolderKind::from(0), FolderKind::Root);
        assert_eq!(FolderKind::from(4), FolderKind::Track);
        assert_eq!(FolderKind::from(9), FolderKind::Unknown(9));
        assert_eq!(FolderKind::from(3).as_str(), "virtual");
    }

    #[test]
    fn empty_folder_listing_is_complete() {
        let mut state = SessionState::new();
        assert!(!state.folder.listing_complete());

        state.folder.count = Some(0);
        assert!(state.folder.listing_complete());
    }
}
