use generic_array::typenum;

use crate::{Buf, BufMut, Message};

/// Proprietary, addressed, fast packet. Media commands are sent on this PGN.
pub const MEDIA_COMMAND_PGN: u32 = 126_720;

/// Proprietary, broadcast, fast packet. The unit pushes its status on this PGN.
pub const MEDIA_STATUS_PGN: u32 = 130_820;

/// Manufacturer code 419 with the marine industry group, as it appears in the
/// first two bytes of every media payload.
pub const MANUFACTURER_TAG: [u8; 2] = [0xa3, 0x99];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceName(pub u64);

impl From<u64> for DeviceName {
    fn from(value: u64) -> Self {
        DeviceName(value)
    }
}

pub struct IsoAddressClaim {
    pub name: DeviceName,
}

impl Message for IsoAddressClaim {
    const PGN: u32 = 60928;

    type EncodedLen = typenum::U8;

    type DecodeError = crate::buf::Truncated;

    fn encode(&self, mut buf: &mut [u8]) {
        // the buffer is exactly `EncodedLen` long
        let _ = buf.put_u64(self.name.0);
    }

    fn decode(mut data: &[u8]) -> Result<Self, Self::DecodeError> {
        Ok(Self {
            name: DeviceName(data.get_u64()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceName, IsoAddressClaim};
    use crate::{Id, Message, NmeaFrame};

    #[test]
    fn address_claim_round_trips_name() {
        let claim = IsoAddressClaim {
            name: DeviceName(0xdead_beef_0000_1234),
        };
        let frame = NmeaFrame::from_message(Id::new(6, IsoAddressClaim::PGN, 1, 0xff), &claim);

        assert_eq!(frame.data.len(), 8);
        assert_eq!(frame.data[0], 0x34);
        assert_eq!(
            IsoAddressClaim::decode(&frame.data).map(|c| c.name),
            Ok(DeviceName(0xdead_beef_0000_1234))
        );
    }

    #[test]
    fn short_address_claim() {
        assert!(IsoAddressClaim::decode(&[1, 2, 3]).is_err());
    }
}
