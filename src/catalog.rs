//! Port identifiers and their canonical source names.
//!
//! The unit numbers its inputs with small integers. Three of them (USB, MTP
//! and iPod) are different physical kinds of the same thing, so clients see
//! them as a single `usb` source; [`SessionState::usb_class_mapping`] remembers
//! which physical port that alias currently refers to.

use alloc::string::String;

use crate::state::SessionState;

/// A source port as numbered by the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Port(pub u8);

impl Port {
    pub const AM: Port = Port(0);
    pub const FM: Port = Port(1);
    pub const SIRIUSXM: Port = Port(2);
    pub const AUX1: Port = Port(3);
    pub const AUX2: Port = Port(4);
    pub const USB: Port = Port(5);
    pub const IPOD: Port = Port(6);
    pub const MTP: Port = Port(7);
    pub const BLUETOOTH: Port = Port(8);
    pub const DAB: Port = Port(9);

    /// Nothing has been reported yet.
    pub const UNKNOWN: Port = Port(0xff);

    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.0 != Self::UNKNOWN.0
    }

    #[inline]
    #[must_use]
    pub const fn is_usb_class(self) -> bool {
        matches!(self, Self::USB | Self::IPOD | Self::MTP)
    }

    #[inline]
    #[must_use]
    pub const fn is_tuner(self) -> bool {
        matches!(self, Self::AM | Self::FM)
    }

    /// The canonical name of this port, if it has one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        CATALOG
            .iter()
            .find(|(port, _)| *port == self)
            .map(|(_, name)| *name)
    }

    /// Look up a port by canonical name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(port, _)| *port)
    }
}

impl Default for Port {
    fn default() -> Self {
        Port::UNKNOWN
    }
}

impl From<u8> for Port {
    fn from(value: u8) -> Self {
        Port(value)
    }
}

/// Name of the logical source the USB class collapses onto.
pub const USB_ALIAS: &str = "usb";

const CATALOG: [(Port, &str); 10] = [
    (Port::AM, "am"),
    (Port::FM, "fm"),
    (Port::SIRIUSXM, "siriusxm"),
    (Port::AUX1, "aux1"),
    (Port::AUX2, "aux2"),
    (Port::USB, USB_ALIAS),
    (Port::IPOD, "ipod"),
    (Port::MTP, "mtp"),
    (Port::BLUETOOTH, "bluetooth"),
    (Port::DAB, "dab"),
];

/// Render a port as the name clients see.
///
/// USB-class ports always render as [`USB_ALIAS`] and update the session's
/// `usb_class_mapping`. Other ports use their canonical name, then whatever
/// the unit called them, then `"unknown"`.
pub fn render(state: &mut SessionState, port: Port) -> String {
    if port.is_usb_class() {
        state.usb_class_mapping = port;
        return String::from(USB_ALIAS);
    }

    port.name()
        .or_else(|| state.source_catalog.get(&port).map(String::as_str))
        .unwrap_or("unknown")
        .into()
}

/// Resolve a source name from a command document to a port.
///
/// `"usb"` resolves to whichever physical port the alias last referred to.
/// Names the unit reported for its sources are accepted as a fallback.
#[must_use]
pub fn resolve(state: &SessionState, name: &str) -> Option<Port> {
    if name.eq_ignore_ascii_case(USB_ALIAS) {
        return Some(if state.usb_class_mapping.is_usb_class() {
            state.usb_class_mapping
        } else {
            Port::USB
        });
    }

    Port::from_name(name).or_else(|| {
        state
            .source_catalog
            .iter()
            .find(|(_, display)| display.eq_ignore_ascii_case(name))
            .map(|(port, _)| *port)
    })
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{render, resolve, Port};
    use crate::state::SessionState;

    #[test]
    fn names_are_bidirectional() {
        for id in 0..10 {
            let port = Port(id);
            let name = port.name().unwrap();
            assert_eq!(Port::from_name(name), Some(port));
        }

        assert_eq!(Port::from_name("Bluetooth"), Some(Port::BLUETOOTH));
        assert_eq!(Port(42).name(), None);
    }

    #[test]
    fn usb_class_renders_as_usb() {
        let mut state = SessionState::new();

        assert_eq!(render(&mut state, Port::MTP), "usb");
        assert_eq!(state.usb_class_mapping, Port::MTP);

        assert_eq!(render(&mut state, Port::FM), "fm");
        assert_eq!(state.usb_class_mapping, Port::MTP);
    }

    #[test]
    fn unknown_port_uses_reported_name() {
        let mut state = SessionState::new();
        state.source_catalog.insert(Port(12), String::from("Deck"));

        assert_eq!(render(&mut state, Port(12)), "Deck");
        assert_eq!(render(&mut state, Port(13)), "unknown");
    }

    #[test]
    fn usb_resolves_through_mapping() {
        let mut state = SessionState::new();
        assert_eq!(resolve(&state, "usb"), Some(Port::USB));

        state.usb_class_mapping = Port::IPOD;
        assert_eq!(resolve(&state, "USB"), Some(Port::IPOD));
    }

    #[test]
    fn resolves_reported_names() {
        let mut state = SessionState::new();
        state.source_catalog.insert(Port::AUX1, String::from("Cockpit"));

        assert_eq!(resolve(&state, "cockpit"), Some(Port::AUX1));
        assert_eq!(resolve(&state, "aux2"), Some(Port::AUX2));
        assert_eq!(resolve(&state, "cassette"), None);
    }
}
