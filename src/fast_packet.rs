//! Because the maximum size of a frame is 8 bytes, NMEA 2000 splits larger
//! messages into multiple frames, so-called Fast Packets. The first byte of
//! each frame holds a 3-bit sequence counter and a 5-bit frame counter. The
//! first frame also contains the length of the total message transmitted
//! ([`FastPacket::total_len`]), followed by 6 bytes of data; every following
//! frame carries 7. The last frame is padded with `0xff`.

/// The largest message a fast packet group can carry: 6 + 31 * 7 bytes.
pub const MAX_PAYLOAD_LEN: usize = 223;

/// Data bytes in the first frame of a group.
pub const FIRST_FRAME_DATA: usize = 6;

/// Data bytes in every continuation frame.
pub const FRAME_DATA: usize = 7;

const PADDING: u8 = 0xff;

/// See the [module-level documentation](self) for more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FastPacket(pub [u8; 8]);

impl FastPacket {
    /// Build a packet from received frame data. Short frames are padded.
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let mut packet = [PADDING; 8];
        let len = data.len().min(8);
        packet[..len].copy_from_slice(&data[..len]);
        Self(packet)
    }

    /// The frame counter within the group, starting from 0.
    #[inline]
    #[must_use]
    pub const fn frame_no(&self) -> u8 {
        self.0[0] & 0b1_1111
    }

    /// The sequence counter of the group. All frames of the same group can be
    /// combined to form the original message.
    #[inline]
    #[must_use]
    pub const fn group_no(&self) -> u8 {
        self.0[0] >> 5
    }

    #[inline]
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.frame_no() == 0
    }

    #[inline]
    #[must_use]
    pub const fn total_len(&self) -> Option<u8> {
        if self.is_first() {
            Some(self.0[1])
        } else {
            None
        }
    }

    /// The data contained in the frame.
    ///
    /// If this is the last frame of the group, the returned slice might be
    /// padded, so you should save the value of  [`FastPacket::total_len`] at
    /// the beginning of the group and only use the first `total_len` bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        if self.is_first() {
            &self.0[2..]
        } else {
            &self.0[1..]
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        if self.is_first() {
            &mut self.0[2..]
        } else {
            &mut self.0[1..]
        }
    }
}

/// A reader for fast packets that combines the frames of a group into a
/// single payload of whatever length the first frame announces.
#[derive(Debug, Default)]
pub struct Reader {
    buf: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
    total_len: usize,
    group_no: Option<u8>,
    next_frame_no: u8,
}

impl Reader {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            total_len: 0,
            group_no: None,
            next_frame_no: 0,
        }
    }

    /// Drop any partially assembled group.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.total_len = 0;
        self.group_no = None;
        self.next_frame_no = 0;
    }

    /// Reads a fast packet and returns the assembled payload once all frames
    /// of the group have been received.
    ///
    /// A first frame always starts a new group. Continuation frames that do
    /// not belong to the current group, or arrive out of order, abandon it.
    pub fn read(&mut self, packet: &FastPacket) -> Option<&[u8]> {
        if let Some(total_len) = packet.total_len() {
            self.reset();
            self.group_no = Some(packet.group_no());
            self.total_len = total_len as usize;
        } else if self.group_no != Some(packet.group_no())
            || packet.frame_no() != self.next_frame_no
        {
            // out of order or a stray continuation
            self.reset();
            return None;
        }

        let data_len = packet.data().len().min(self.total_len - self.buf.len());
        if self.buf.extend_from_slice(&packet.data()[..data_len]).is_err() {
            self.reset();
            return None;
        }
        self.next_frame_no = packet.frame_no().wrapping_add(1);

        if self.buf.len() == self.total_len {
            self.group_no = None;
            Some(self.buf.as_slice())
        } else {
            None
        }
    }
}

/// Generates fast packets from a byte slice.
pub struct Iter<'a> {
    buf: &'a [u8],
    group_no: u8,
    frame_no: u8,
}

impl<'a> Iter<'a> {
    /// Creates a new iterator over the given data.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the data is longer than [`MAX_PAYLOAD_LEN`].
    pub fn new(buf: &'a [u8], group_no: u8) -> Self {
        debug_assert!(buf.len() <= MAX_PAYLOAD_LEN, "data too big");
        debug_assert!(group_no < 8, "group_no too big");

        Self {
            buf,
            group_no: group_no & 0b111,
            frame_no: 0,
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = FastPacket;

    fn next(&mut self) -> Option<Self::Item> {
        if (self.buf.is_empty() && self.frame_no != 0) || self.frame_no > 0b1_1111 {
            // EOF
            return None;
        }

        let mut packet = FastPacket([PADDING; 8]);
        packet.0[0] = (self.group_no << 5) | self.frame_no;

        if packet.is_first() {
            packet.0[1] = self.buf.len() as u8;
        }

        let dest = packet.data_mut();
        let len = self.buf.len().min(dest.len());
        let (head, tail) = self.buf.split_at(len);
        dest[..len].copy_from_slice(head);
        self.buf = tail;

        self.frame_no += 1;

        Some(packet)
    }
}

/// The number of frames needed to carry `len` bytes.
#[must_use]
pub const fn frame_count(len: usize) -> usize {
    if len <= FIRST_FRAME_DATA {
        1
    } else {
        1 + (len - FIRST_FRAME_DATA).div_ceil(FRAME_DATA)
    }
}

#[cfg(test)]
mod tests {
    use super::{frame_count, FastPacket, Iter, Reader};

    #[test]
    fn read_fast_packets() {
        let p1 = FastPacket([0b0010_0000, 10, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x00]);
        let p2 = FastPacket([0b0010_0001, 0x42, 0x42, 0x42, 0x42, 0xff, 0xff, 0xff]);

        let mut reader = Reader::new();

        assert_eq!(reader.read(&p1), None);
        assert_eq!(
            reader.read(&p2),
            Some(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x42, 0x42, 0x42, 0x42][..])
        );
    }

    #[test]
    fn out_of_order_frame_drops_group() {
        let p1 = FastPacket([0xa0, 14, 1, 2, 3, 4, 5, 6]);
        let p3 = FastPacket([0xa2, 14, 15, 16, 17, 18, 19, 20]);

        let mut reader = Reader::new();

        assert_eq!(reader.read(&p1), None);
        assert_eq!(reader.read(&p3), None);
        assert_eq!(reader.read(&FastPacket([0xa1, 7, 8, 9, 10, 11, 12, 13])), None);
    }

    #[test]
    fn stray_continuation_is_ignored() {
        let mut reader = Reader::new();

        assert_eq!(reader.read(&FastPacket([0x41, 1, 2, 3, 4, 5, 6, 7])), None);
    }

    #[test]
    fn single_frame_payload() {
        let data = [0xa3, 0x99, 0x18, 0x00, 0x00, 0x09];
        let packets: heapless::Vec<FastPacket, 4> = Iter::new(&data, 5).collect();

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].0, [0xa0, 0x06, 0xa3, 0x99, 0x18, 0x00, 0x00, 0x09]);
    }

    #[test]
    fn last_frame_is_padded() {
        let data = [0xa3, 0x99, 0x16, 0x00, 0x03, 0x08, 0x05, 0x03];
        let packets: heapless::Vec<FastPacket, 4> = Iter::new(&data, 5).collect();

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].0, [0xa0, 0x08, 0xa3, 0x99, 0x16, 0x00, 0x03, 0x08]);
        assert_eq!(packets[1].0, [0xa1, 0x05, 0x03, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn generated_packets_reassemble() {
        let data: [u8; 20] = core::array::from_fn(|i| i as u8);
        let mut reader = Reader::new();
        let mut out = None;

        for packet in Iter::new(&data, 3) {
            out = reader.read(&packet).map(|p| p.len());
        }

        assert_eq!(out, Some(20));
        assert_eq!(frame_count(20), 3);
        assert_eq!(frame_count(6), 1);
        assert_eq!(frame_count(13), 2);
    }
}
