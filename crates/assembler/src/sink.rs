//! A growable, positioned output buffer for the assembler.
//!
//! [`orthrus_core::data::DataCursor`] assumes a fixed-size backing slice, which fits reading the
//! assembly listing but not writing the image: the driver writes a zero-filled header-and-tables
//! placeholder, seeks back to backpatch individual fixup records, and then *appends* the code,
//! data, and optional debug sections past the placeholder's end. [`Sink`] keeps the same
//! positioned, endian-aware read/write shape as `DataCursor` but grows on write past the current
//! end instead of erroring.

use orthrus_core::data::Endian;

use crate::error::{Result, WriteSnafu};

/// Output sink for an assembled image. Writes past the current end grow the buffer; writes within
/// bounds overwrite in place, which is how header backpatching works.
#[derive(Debug, Default)]
pub struct Sink {
    data: Vec<u8>,
    pos: usize,
    endian: Endian,
}

impl Sink {
    #[must_use]
    pub fn new(endian: Endian) -> Self {
        Self { data: Vec::new(), pos: 0, endian }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    #[must_use]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Reserves `len` zero-filled bytes from the current position onward, growing the buffer as
    /// needed. Used to write the placeholder header-and-tables region (driver step 5).
    pub fn reserve_zeroed(&mut self, len: usize) {
        let end = self.pos + len;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.pos = end;
    }

    /// Truncates the sink back to zero length, used on the compact-overflow restart path.
    pub fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }

    /// Returns the written bytes, consuming the sink.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn ensure_room(&mut self, additional: usize) {
        let end = self.pos + additional;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_room(bytes.len());
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_u16(value as u16)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_u32(value as u32)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let bytes = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_u64(value as u64)
    }

    /// Overwrites `len` bytes at an absolute position without disturbing the current position,
    /// erroring if the region doesn't already exist (backpatch must only touch the placeholder).
    pub fn write_at(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        if pos + bytes.len() > self.data.len() {
            return WriteSnafu.fail();
        }
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_past_placeholder() {
        let mut sink = Sink::new(Endian::Little);
        sink.reserve_zeroed(4);
        sink.write_u32(0xdead_beef).unwrap();
        assert_eq!(sink.len(), 8);
        sink.write_at(0, &[1, 2, 3, 4]).unwrap();
        assert_eq!(sink.into_inner(), vec![1, 2, 3, 4, 0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn backpatch_out_of_bounds_errors() {
        let mut sink = Sink::new(Endian::Little);
        sink.reserve_zeroed(4);
        assert!(sink.write_at(2, &[0, 0, 0, 0]).is_err());
    }
}
