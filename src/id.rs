use embedded_can::ExtendedId;

/// A NMEA 2000 message identifier. According to N2K specification, this is a
/// 29-bit extended CAN ID with a 3-bit priority, a 18-bit parameter group
/// number (PGN), and an 8-bit source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id(ExtendedId);

enum Format {
    /// Addressed: the low PGN byte carries the destination.
    Pdu1,
    /// Broadcast.
    Pdu2,
}

impl Format {
    #[inline]
    #[must_use]
    fn from_pgn(pgn: u32) -> Self {
        if pdu_format(pgn) < 240 {
            Self::Pdu1
        } else {
            Self::Pdu2
        }
    }
}

pub const DESTINATION_BROADCAST: u8 = 0xff;

/// The PF field, with the data page bit masked off.
#[inline]
const fn pdu_format(pgn: u32) -> u32 {
    (pgn >> 8) & 0xff
}

impl Id {
    #[inline]
    #[must_use]
    pub const fn new(priority: u8, pgn: u32, source: u8, destination: u8) -> Self {
        debug_assert!(priority <= 7, "Priority must be in the range 0-7");
        debug_assert!(pgn <= 0x3ffff, "PGN must be less than 0x3ffff (18 bits");

        let id = if pdu_format(pgn) < 240 {
            // PDU1
            debug_assert!(pgn & 0xff == 0, "lowest byte of PGN has to be 0 for PDU1");
            (priority as u32 & 0x7) << 26
                | (pgn & 0x3ff00) << 8
                | (destination as u32) << 8
                | source as u32
        } else {
            // PDU2
            //
            // The priority is in bits 26-28, the PGN in bits 8-25, and the source
            // address in bits 0-7.
            (priority as u32 & 0x7) << 26 | (pgn & 0x3ffff) << 8 | source as u32
        };

        match ExtendedId::new(id) {
            Some(id) => Self(id),
            None => Self(ExtendedId::MAX),
        }
    }

    /// Create a new identifier from an extended CAN ID.
    #[inline]
    #[must_use]
    pub const fn from_can_id(can_id: ExtendedId) -> Self {
        Self(can_id)
    }

    #[inline]
    #[must_use]
    pub const fn as_can_id(self) -> ExtendedId {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn priority(self) -> u8 {
        (self.0.as_raw() >> 26) as u8 & 0x7
    }

    #[inline]
    #[must_use]
    pub fn pgn(self) -> u32 {
        match self.format() {
            Format::Pdu1 => (self.0.as_raw() >> 8) & 0x3ff00,
            Format::Pdu2 => (self.0.as_raw() >> 8) & 0x3ffff,
        }
    }

    #[inline]
    #[must_use]
    pub fn source(self) -> u8 {
        self.0.as_raw() as u8
    }

    #[inline]
    pub fn set_source(&mut self, source: u8) {
        let raw = (self.0.as_raw() & 0x1fff_ff00) | source as u32;
        if let Some(id) = ExtendedId::new(raw) {
            self.0 = id;
        }
    }

    #[inline]
    #[must_use]
    fn format(self) -> Format {
        Format::from_pgn(self.0.as_raw() >> 8)
    }

    #[inline]
    #[must_use]
    pub fn destination(self) -> u8 {
        match self.format() {
            Format::Pdu1 => (self.0.as_raw() >> 8) as u8,
            Format::Pdu2 => DESTINATION_BROADCAST, // implied global
        }
    }
}

impl From<ExtendedId> for Id {
    fn from(id: ExtendedId) -> Self {
        Self::from_can_id(id)
    }
}

impl From<Id> for embedded_can::Id {
    fn from(id: Id) -> Self {
        Self::Extended(id.as_can_id())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Id {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Id({:x})", self.0.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::{Id, DESTINATION_BROADCAST};
    use crate::well_known::{MEDIA_COMMAND_PGN, MEDIA_STATUS_PGN};

    #[test]
    fn addressed_command_id() {
        let id = Id::new(3, MEDIA_COMMAND_PGN, 0x20, 0x0a);

        assert_eq!(id.priority(), 3);
        assert_eq!(id.pgn(), MEDIA_COMMAND_PGN);
        assert_eq!(id.source(), 0x20);
        assert_eq!(id.destination(), 0x0a);
    }

    #[test]
    fn broadcast_status_id() {
        let mut id = Id::new(7, MEDIA_STATUS_PGN, 0x0a, 0x33);
        id.set_source(0x11);

        assert_eq!(id.pgn(), MEDIA_STATUS_PGN);
        assert_eq!(id.source(), 0x11);
        assert_eq!(id.destination(), DESTINATION_BROADCAST);
    }
}
