//! Trailing log block: free-text acquisition metadata.
//!
//! Layout at `log_block_offset`: a 64-byte header (five `u32` sizes and
//! offsets, then reserved space), an optional binary area, then the text.
//! The text spans `block_size - text_offset` bytes starting at
//! `log_block_offset + text_offset`.

use std::io::{Read, Seek};

use crate::cursor::SpcCursor;
use crate::error::{Result, SpcError};
use crate::options::DecodeLimits;
use crate::schema::{self, LOG_HEADER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeader {
    pub block_size:  u32,
    pub memory_size: u32,
    pub text_offset: u32,
    pub binary_size: u32,
    pub disk_size:   u32,
}

impl LogHeader {
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Ok(Self {
            block_size:  schema::LOG_BLOCK_SIZE.read_int(buf)? as u32,
            memory_size: schema::LOG_MEMORY_SIZE.read_int(buf)? as u32,
            text_offset: schema::LOG_TEXT_OFFSET.read_int(buf)? as u32,
            binary_size: schema::LOG_BINARY_SIZE.read_int(buf)? as u32,
            disk_size:   schema::LOG_DISK_SIZE.read_int(buf)? as u32,
        })
    }

    /// Length of the text payload.
    pub fn text_len(&self, block_offset: u64) -> Result<u64> {
        self.block_size.checked_sub(self.text_offset)
            .map(u64::from)
            .ok_or(SpcError::Range {
                offset:    block_offset + 8,
                field:     "log_text_offset",
                expected:  self.text_offset as u64,
                available: self.block_size as u64,
            })
    }
}

/// Read the log text of the block at `offset`.
///
/// Callers treat any error from here as "no log": the text is auxiliary.
pub fn read_log_text<R: Read + Seek>(
    cursor: &mut SpcCursor<R>,
    offset: u64,
    limits: &DecodeLimits,
) -> Result<String> {
    if offset >= cursor.len() {
        return Err(SpcError::Range {
            offset,
            field:     "log_block_offset",
            expected:  LOG_HEADER_SIZE as u64,
            available: 0,
        });
    }
    cursor.jump_to("log_block_offset", offset)?;
    let mut buf = [0u8; LOG_HEADER_SIZE];
    cursor.read_into("log_header", &mut buf)?;
    let header = LogHeader::from_bytes(&buf)?;

    let len = header.text_len(offset)?;
    if len > limits.max_log_bytes {
        return Err(SpcError::resource("log_text", format!(
            "{len} bytes exceeds the limit of {}", limits.max_log_bytes)));
    }
    cursor.jump_to("log_text_offset", offset + header.text_offset as u64)?;
    let text = cursor.read_bytes("log_text", len)?;

    let end = text.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    Ok(String::from_utf8_lossy(&text[..end]).into_owned())
}
