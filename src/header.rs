//! Main header parsing, driven by the [`HeaderSchema`] the version byte selects.

use std::io::{Read, Seek};

use serde::Serialize;

use crate::cursor::SpcCursor;
use crate::error::{Result, SpcError};
use crate::format::FileTypeFlags;
use crate::schema::{FormatVariant, HeaderSchema, FLOAT_SENTINEL, SUBHEADER_SIZE, VERSION_OFFSET};
use crate::subfile::{SubfileHeader, YWidth};

#[derive(Debug, Clone, Serialize)]
pub struct SpcHeader {
    pub variant:          FormatVariant,
    pub flags:            FileTypeFlags,
    pub exponent:         i8,
    pub num_points:       u32,
    pub first_x:          f64,
    pub last_x:           f64,
    pub num_subfiles:     u32,
    /// 0 when the file has no log block.
    pub log_block_offset: u32,
    pub x_type:           u8,
    pub y_type:           u8,
    pub z_type:           u8,
    pub memo:             String,
    /// Subfile 0's subheader when the variant embeds it in the main header.
    #[serde(skip)]
    pub embedded_subheader: Option<SubfileHeader>,
}

impl SpcHeader {
    /// Read and parse the main header at the start of the stream.
    pub fn read<R: Read + Seek>(cursor: &mut SpcCursor<R>) -> Result<(Self, &'static HeaderSchema)> {
        let file_len = cursor.len();
        if file_len <= VERSION_OFFSET as u64 {
            return Err(short_header(VERSION_OFFSET + 1, file_len));
        }
        let mut lead = [0u8; VERSION_OFFSET + 1];
        cursor.read_into("main_header", &mut lead)?;
        let schema = HeaderSchema::for_version(lead[VERSION_OFFSET])?;

        if (schema.header_size as u64) > file_len {
            return Err(short_header(schema.header_size, file_len));
        }
        let mut buf = vec![0u8; schema.header_size];
        buf[..lead.len()].copy_from_slice(&lead);
        cursor.read_into("main_header", &mut buf[lead.len()..])?;

        let header = Self::from_bytes(&buf, schema, file_len)?;
        log::debug!(target: "spcio",
            "header: {:?} flags=0x{:02X} exp={} points={} subfiles={} x=[{}, {}] log@{}",
            header.variant, header.flags.0, header.exponent, header.num_points,
            header.num_subfiles, header.first_x, header.last_x, header.log_block_offset);
        Ok((header, schema))
    }

    /// Parse a complete header buffer.  `file_len` is needed only for legacy
    /// multi-spectrum files, whose subfile count is implied by their size.
    pub fn from_bytes(buf: &[u8], schema: &HeaderSchema, file_len: u64) -> Result<Self> {
        if buf.len() < schema.header_size {
            return Err(short_header(schema.header_size, buf.len() as u64));
        }
        let flags = FileTypeFlags(schema.flags.read_int(buf)? as u8);
        let exponent = narrow_exponent(schema.exponent.read_int(buf)?, schema.exponent.offset)?;
        let num_points = read_point_count(buf, schema)?;

        let first_x = finite(schema.first_x.read_float(buf)?, schema.first_x.offset, schema.first_x.name)?;
        let last_x = finite(schema.last_x.read_float(buf)?, schema.last_x.offset, schema.last_x.name)?;

        let log_block_offset = match schema.log_offset {
            Some(f) => f.read_int(buf)? as u32,
            None    => 0,
        };
        let z_type = match schema.z_type {
            Some(f) => f.read_int(buf)? as u8,
            None    => 0,
        };
        let embedded_subheader = match schema.embedded_subheader {
            Some(at) => Some(SubfileHeader::from_bytes(&buf[at..at + SUBHEADER_SIZE])?),
            None     => None,
        };

        let num_subfiles = if !flags.multi() {
            1
        } else if let Some(f) = schema.num_subfiles {
            f.read_int(buf)? as u32
        } else {
            if num_points == 0 {
                return Err(SpcError::data(schema.num_points.offset as u64, schema.num_points.name,
                    "point count is zero"));
            }
            derive_subfile_count(schema, flags, num_points, file_len)?
        };

        Ok(Self {
            variant: schema.variant,
            flags,
            exponent,
            num_points,
            first_x,
            last_x,
            num_subfiles,
            log_block_offset,
            x_type: schema.x_type.read_int(buf)? as u8,
            y_type: schema.y_type.read_int(buf)? as u8,
            z_type,
            memo: schema.memo.read_text(buf)?,
            embedded_subheader,
        })
    }
}

fn short_header(expected: usize, available: u64) -> SpcError {
    SpcError::format(0, "main_header", format!(
        "header needs {expected} bytes, {available} available"))
}

fn finite(v: f64, offset: usize, field: &'static str) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SpcError::data(offset as u64, field, format!("non-finite value {v}")))
    }
}

/// Legacy files store the exponent as a 16-bit word; `128` there is the same
/// float marker as `0x80` in a byte.
fn narrow_exponent(raw: i64, offset: usize) -> Result<i8> {
    if raw == 128 {
        return Ok(FLOAT_SENTINEL);
    }
    i8::try_from(raw).map_err(|_| SpcError::data(offset as u64, "exponent",
        format!("exponent {raw} does not fit in a signed byte")))
}

/// Integer count, or (legacy) a float that must hold a whole number.
fn read_point_count(buf: &[u8], schema: &HeaderSchema) -> Result<u32> {
    let f = schema.num_points;
    let raw = f.read_float(buf)?;
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > u32::MAX as f64 {
        return Err(SpcError::data(f.offset as u64, f.name, format!("invalid point count {raw}")));
    }
    Ok(raw as u32)
}

/// Legacy layout: `header | Y0 | (subheader | Yk)*`, subfile 0's subheader
/// living inside the header.
fn derive_subfile_count(schema: &HeaderSchema, flags: FileTypeFlags, num_points: u32, file_len: u64) -> Result<u32> {
    let y_bytes = num_points as u64 * YWidth::from_flag(flags.y_16bit()).bytes();
    let stride = SUBHEADER_SIZE as u64 + y_bytes;
    let body = file_len.saturating_sub(schema.header_size as u64);
    if y_bytes == 0 || body < y_bytes || (body - y_bytes) % stride != 0 {
        return Err(SpcError::format(schema.header_size as u64, "num_subfiles", format!(
            "{body} data bytes are not a whole number of {num_points}-point subfiles")));
    }
    let count = 1 + (body - y_bytes) / stride;
    u32::try_from(count).map_err(|_| SpcError::format(
        schema.header_size as u64, "num_subfiles", format!("derived subfile count {count} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{LEGACY_SCHEMA, MODERN_SCHEMA};

    fn modern(flags: u8, exp: i8, points: u32, first: f64, last: f64, subs: u32) -> Vec<u8> {
        let mut b = vec![0u8; 512];
        b[0] = flags;
        b[1] = 0x4B;
        b[3] = exp as u8;
        b[4..8].copy_from_slice(&points.to_le_bytes());
        b[8..16].copy_from_slice(&first.to_le_bytes());
        b[16..24].copy_from_slice(&last.to_le_bytes());
        b[24..28].copy_from_slice(&subs.to_le_bytes());
        b
    }

    #[test]
    fn test_modern_fields() {
        let mut b = modern(0x04, 3, 100, 400.0, 700.0, 7);
        b[88..93].copy_from_slice(b"hello");
        b[248..252].copy_from_slice(&1000u32.to_le_bytes());
        let h = SpcHeader::from_bytes(&b, &MODERN_SCHEMA, 4096).unwrap();
        assert_eq!(h.variant, FormatVariant::Modern);
        assert_eq!(h.exponent, 3);
        assert_eq!(h.num_points, 100);
        assert_eq!((h.first_x, h.last_x), (400.0, 700.0));
        assert_eq!(h.num_subfiles, 7);
        assert_eq!(h.log_block_offset, 1000);
        assert_eq!(h.memo, "hello");
        assert!(h.embedded_subheader.is_none());
    }

    #[test]
    fn test_single_file_ignores_subfile_field() {
        let b = modern(0x00, 0, 10, 0.0, 1.0, 99);
        assert_eq!(SpcHeader::from_bytes(&b, &MODERN_SCHEMA, 4096).unwrap().num_subfiles, 1);
    }

    #[test]
    fn test_non_finite_range_rejected() {
        let b = modern(0x00, 0, 10, f64::NAN, 1.0, 1);
        assert_eq!(SpcHeader::from_bytes(&b, &MODERN_SCHEMA, 4096).unwrap_err().kind(), ErrorKind::Data);
    }

    #[test]
    fn test_short_buffer_is_format_error() {
        let b = vec![0u8; 100];
        assert_eq!(SpcHeader::from_bytes(&b, &MODERN_SCHEMA, 100).unwrap_err().kind(), ErrorKind::Format);
    }

    fn legacy(flags: u8, exp: i16, points: f32) -> Vec<u8> {
        let mut b = vec![0u8; 256];
        b[0] = flags;
        b[1] = 0x4D;
        b[2..4].copy_from_slice(&exp.to_le_bytes());
        b[4..8].copy_from_slice(&points.to_le_bytes());
        b[8..12].copy_from_slice(&1.0f32.to_le_bytes());
        b[12..16].copy_from_slice(&2.0f32.to_le_bytes());
        b
    }

    #[test]
    fn test_legacy_fields() {
        let h = SpcHeader::from_bytes(&legacy(0x00, 128, 16.0), &LEGACY_SCHEMA, 256 + 64).unwrap();
        assert_eq!(h.variant, FormatVariant::Legacy);
        assert_eq!(h.exponent, FLOAT_SENTINEL);
        assert_eq!(h.num_points, 16);
        assert_eq!((h.first_x, h.last_x), (1.0, 2.0));
        assert_eq!(h.log_block_offset, 0);
        assert!(h.embedded_subheader.is_some());
    }

    #[test]
    fn test_legacy_point_count_must_be_whole() {
        let err = SpcHeader::from_bytes(&legacy(0x00, 0, 2.5), &LEGACY_SCHEMA, 512).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        let err = SpcHeader::from_bytes(&legacy(0x00, 300, 2.0), &LEGACY_SCHEMA, 512).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_legacy_multi_count_derived() {
        // 4 points * 4 bytes: header | 16 | (32 + 16) * 2
        let len = 256 + 16 + 2 * 48;
        let h = SpcHeader::from_bytes(&legacy(0x04, 0, 4.0), &LEGACY_SCHEMA, len).unwrap();
        assert_eq!(h.num_subfiles, 3);
        let err = SpcHeader::from_bytes(&legacy(0x04, 0, 4.0), &LEGACY_SCHEMA, len + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_legacy_multi_zero_points_is_data_error() {
        let err = SpcHeader::from_bytes(&legacy(0x04, 0, 0.0), &LEGACY_SCHEMA, 256 + 64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        match err {
            SpcError::Data { offset, field, .. } => assert_eq!((offset, field), (4, "num_points")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
