//! Big-endian pack/unpack of fixed-width integers and IEEE-754 floats.
//!
//! All multi-byte fields in a C37.118.2 frame are big-endian on the wire
//! (spec §4.1). [`Reader`] walks a byte slice field-by-field, surfacing
//! [`PmuError::Truncated`] the moment a declared width doesn't fit, instead
//! of letting a short buffer panic on indexing. [`Writer`] is the
//! encode-side mirror, built on `bytes::BytesMut` the way `mbus-rs`'s frame
//! packer accumulates bytes before handing them to the transport.

use bytes::BytesMut;

use crate::error::PmuError;

/// A cursor over a byte slice that reads big-endian fields.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PmuError> {
        if self.remaining() < n {
            return Err(PmuError::Truncated {
                needed: n,
                have: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, PmuError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, PmuError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, PmuError> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> Result<u32, PmuError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32, PmuError> {
        Ok(self.u32()? as i32)
    }

    pub fn f32(&mut self) -> Result<f32, PmuError> {
        Ok(f32::from_bits(self.u32()?))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], PmuError> {
        self.take(n)
    }

    /// Reads a fixed-width, space-padded ASCII field and trims trailing spaces.
    pub fn ascii_fixed(&mut self, n: usize) -> Result<String, PmuError> {
        let raw = self.take(n)?;
        Ok(String::from_utf8_lossy(raw).trim_end().to_string())
    }
}

/// An append-only big-endian byte writer backed by `BytesMut`.
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.extend_from_slice(&[v]);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.u16(v as u16);
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.u32(v as u32);
    }

    pub fn f32(&mut self, v: f32) {
        self.u32(v.to_bits());
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    /// Writes a value as fixed-width ASCII, space-padded or truncated to fit.
    pub fn ascii_fixed(&mut self, s: &str, n: usize) {
        let mut field = vec![b' '; n];
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(n);
        field[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.buf.extend_from_slice(&field);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
