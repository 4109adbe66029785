use alloc::string::String;

/// A read or write ran past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("buffer too short")]
pub struct Truncated;

/// Bounds-checked little-endian field reader. Every getter consumes the bytes
/// it reads and fails with [`Truncated`] instead of panicking when the buffer
/// is too short.
pub trait Buf {
    fn remaining(&self) -> usize;

    fn get_slice(&mut self, len: usize) -> Result<&[u8], Truncated>;

    #[inline]
    fn get_array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut out = [0; N];
        out.copy_from_slice(self.get_slice(N)?);
        Ok(out)
    }

    #[inline]
    fn get_u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.get_array::<1>()?[0])
    }

    /// The unit sends signed quantities as plain bytes; they are two's
    /// complement once they reach the presentation layer.
    #[inline]
    fn get_i8(&mut self) -> Result<i8, Truncated> {
        Ok(self.get_u8()? as i8)
    }

    #[inline]
    fn get_u16(&mut self) -> Result<u16, Truncated> {
        Ok(u16::from_le_bytes(self.get_array()?))
    }

    #[inline]
    fn get_u32(&mut self) -> Result<u32, Truncated> {
        Ok(u32::from_le_bytes(self.get_array()?))
    }

    #[inline]
    fn get_u64(&mut self) -> Result<u64, Truncated> {
        Ok(u64::from_le_bytes(self.get_array()?))
    }

    /// Get a length-prefixed string: one length byte followed by that many
    /// bytes. Trailing NULs are dropped and invalid UTF-8 is replaced.
    fn get_lstring(&mut self) -> Result<String, Truncated> {
        let len = self.get_u8()? as usize;
        let bytes = self.get_slice(len)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);

        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

impl Buf for &[u8] {
    #[inline]
    fn remaining(&self) -> usize {
        self.len()
    }

    #[inline]
    fn get_slice(&mut self, len: usize) -> Result<&[u8], Truncated> {
        if self.len() < len {
            return Err(Truncated);
        }

        let (head, tail) = self.split_at(len);
        *self = tail;
        Ok(head)
    }
}

pub trait BufMut {
    fn put_slice(&mut self, src: &[u8]) -> Result<(), Truncated>;

    #[inline]
    fn put_u8(&mut self, value: u8) -> Result<(), Truncated> {
        self.put_slice(&[value])
    }

    #[inline]
    fn put_i8(&mut self, value: i8) -> Result<(), Truncated> {
        self.put_slice(&[value as u8])
    }

    #[inline]
    fn put_u16(&mut self, value: u16) -> Result<(), Truncated> {
        self.put_slice(&value.to_le_bytes())
    }

    #[inline]
    fn put_u32(&mut self, value: u32) -> Result<(), Truncated> {
        self.put_slice(&value.to_le_bytes())
    }

    #[inline]
    fn put_u64(&mut self, value: u64) -> Result<(), Truncated> {
        self.put_slice(&value.to_le_bytes())
    }
}

impl BufMut for &mut [u8] {
    #[inline]
    fn put_slice(&mut self, src: &[u8]) -> Result<(), Truncated> {
        if self.len() < src.len() {
            return Err(Truncated);
        }

        let (head, tail) = core::mem::take(self).split_at_mut(src.len());
        head.copy_from_slice(src);
        *self = tail;
        Ok(())
    }
}

impl<const N: usize> BufMut for heapless::Vec<u8, N> {
    #[inline]
    fn put_slice(&mut self, src: &[u8]) -> Result<(), Truncated> {
        self.extend_from_slice(src).map_err(|_| Truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::{Buf, BufMut, Truncated};

    #[test]
    fn reads_little_endian() {
        let mut buf = &[0x01, 0xe8, 0x03, 0x00, 0x00, 0xff][..];

        assert_eq!(buf.get_u8(), Ok(1));
        assert_eq!(buf.get_u32(), Ok(1000));
        assert_eq!(buf.get_i8(), Ok(-1));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn short_read_leaves_buffer() {
        let mut buf = &[0x01, 0x02][..];

        assert_eq!(buf.get_u32(), Err(Truncated));
        assert_eq!(buf.remaining(), 2);
    }

    #[test]
    fn lstring_trims_nuls() {
        let mut buf = &[5, b'A', b'U', b'X', 0, 0, 0x42][..];

        assert_eq!(buf.get_lstring().as_deref(), Ok("AUX"));
        assert_eq!(buf.get_u8(), Ok(0x42));
    }

    #[test]
    fn lstring_length_overruns() {
        let mut buf = &[9, b'F', b'M'][..];

        assert_eq!(buf.get_lstring(), Err(Truncated));
    }

    #[test]
    fn put_into_slice() {
        let mut storage = [0u8; 5];
        let mut buf = &mut storage[..];

        buf.put_u8(0x1c).unwrap();
        buf.put_u32(0x0102_0304).unwrap();
        assert_eq!(buf.put_u8(0), Err(Truncated));
        assert_eq!(storage, [0x1c, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn put_into_vec_overflows() {
        let mut buf = heapless::Vec::<u8, 2>::new();

        buf.put_u16(0xbeef).unwrap();
        assert_eq!(buf.put_u8(1), Err(Truncated));
        assert_eq!(&buf[..], &[0xef, 0xbe]);
    }
}
