//! Bounds-checked cursor over a seekable stream.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{Result, SpcError};

pub struct SpcCursor<R: Read + Seek> {
    inner: R,
    pos:   u64,
    len:   u64,
}

impl<R: Read + Seek> SpcCursor<R> {
    /// Wrap `inner`, measure its length and rewind to offset 0.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, pos: 0, len })
    }

    #[inline] pub fn position(&self)  -> u64 { self.pos }
    #[inline] pub fn len(&self)       -> u64 { self.len }
    #[inline] pub fn is_empty(&self)  -> bool { self.len == 0 }
    #[inline] pub fn remaining(&self) -> u64 { self.len.saturating_sub(self.pos) }

    /// Fail with a range error unless `n` more bytes are available.
    pub fn ensure(&self, field: &'static str, n: u64) -> Result<()> {
        if n > self.remaining() {
            return Err(SpcError::Range {
                offset:    self.pos,
                field,
                expected:  n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_into(&mut self, field: &'static str, buf: &mut [u8]) -> Result<()> {
        self.ensure(field, buf.len() as u64)?;
        match self.inner.read_exact(buf) {
            Ok(()) => {}
            // The stream shrank underneath us; report it like any other overrun.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SpcError::Range {
                    offset:    self.pos,
                    field,
                    expected:  buf.len() as u64,
                    available: 0,
                });
            }
            Err(e) => return Err(e.into()),
        }
        self.pos += buf.len() as u64;
        Ok(())
    }

    pub fn read_bytes(&mut self, field: &'static str, n: u64) -> Result<Vec<u8>> {
        self.ensure(field, n)?;
        let mut buf = vec![0u8; n as usize];
        self.read_into(field, &mut buf)?;
        Ok(buf)
    }

    /// Move to an absolute offset inside the stream.
    pub fn jump_to(&mut self, field: &'static str, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(SpcError::Range {
                offset,
                field,
                expected:  offset,
                available: self.len,
            });
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    #[test]
    fn test_reads_advance_position() {
        let mut c = SpcCursor::new(Cursor::new(vec![1u8, 2, 3, 4, 5])).unwrap();
        assert_eq!(c.len(), 5);
        assert_eq!(c.read_bytes("a", 2).unwrap(), vec![1, 2]);
        assert_eq!(c.position(), 2);
        assert_eq!(c.remaining(), 3);
    }

    #[test]
    fn test_overrun_is_range_error_without_moving() {
        let mut c = SpcCursor::new(Cursor::new(vec![0u8; 4])).unwrap();
        c.read_bytes("head", 3).unwrap();
        match c.read_bytes("tail", 2).unwrap_err() {
            SpcError::Range { offset, field, expected, available } => {
                assert_eq!((offset, field, expected, available), (3, "tail", 2, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(c.position(), 3);
    }

    #[test]
    fn test_jump_outside_stream() {
        let mut c = SpcCursor::new(Cursor::new(vec![0u8; 8])).unwrap();
        assert!(c.jump_to("log", 8).is_ok());
        assert_eq!(c.jump_to("log", 9).unwrap_err().kind(), ErrorKind::Range);
    }
}
