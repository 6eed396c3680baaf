//! Big-endian typed reads over a framed buffer with bounds checks.
//!
//! Every read advances an internal cursor; running past the end of the
//! buffer returns `ReaderError::Truncated` rather than panicking, so the
//! composite IO expander (which reaches into the thick of the wire format)
//! never needs `unwrap` on a slice index.

use crate::error::ReaderError;

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize) -> Result<(), ReaderError> {
        if self.remaining() < n {
            Err(ReaderError::Truncated {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    pub fn peek(&self, n: usize) -> Result<&'a [u8], ReaderError> {
        self.need(n)?;
        Ok(&self.buf[self.pos..self.pos + n])
    }

    pub fn advance(&mut self, n: usize) -> Result<(), ReaderError> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        let slice = self.peek(n)?;
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReaderError> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ReaderError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, ReaderError> {
        Ok(i16::from_be_bytes(self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ReaderError> {
        Ok(i32::from_be_bytes(self.read_array::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        Ok(u64::from_be_bytes(self.read_array::<8>()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, ReaderError> {
        Ok(i64::from_be_bytes(self.read_array::<8>()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0xff];
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u16().unwrap(), 0x0102);
        assert_eq!(r.read_u16().unwrap(), 0x0304);
        assert_eq!(r.read_i8().unwrap(), -1);
    }

    #[test]
    fn truncated_on_short_buffer() {
        let buf = [0x01];
        let mut r = ByteReader::new(&buf);
        assert_eq!(
            r.read_u16(),
            Err(ReaderError::Truncated {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn peek_does_not_advance() {
        let buf = [0xaa, 0xbb];
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.peek(1).unwrap(), &[0xaa]);
        assert_eq!(r.read_u8().unwrap(), 0xaa);
        assert_eq!(r.read_u8().unwrap(), 0xbb);
    }
}
