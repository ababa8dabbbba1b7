//! Declarative on-disk layouts.
//!
//! Each header variant is described as data: a table of named fields with a
//! byte offset and a primitive kind.  The header parser never hard-codes an
//! offset; it asks the schema.  Adding a variant means adding a table, not a
//! code path.
//!
//! # Endianness
//! Every field in every supported variant is little-endian.  The legacy
//! variant differs only in where fields live, how wide they are, and how
//! 32-bit Y words order their 16-bit halves (see [`WordOrder`]).

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::{Result, SpcError};

// ── Version markers ──────────────────────────────────────────────────────────

/// Modern format, little-endian.
pub const VERSION_MODERN:     u8 = 0x4B;
/// Modern format written by big-endian (Motorola) hosts.
pub const VERSION_MODERN_BE:  u8 = 0x4C;
/// Legacy ("old") format.
pub const VERSION_LEGACY:     u8 = 0x4D;

/// Offset of the version byte; identical in every variant.
pub const VERSION_OFFSET:     usize = 1;

pub const MODERN_HEADER_SIZE: usize = 512;
pub const LEGACY_HEADER_SIZE: usize = 256;
pub const SUBHEADER_SIZE:     usize = 32;
pub const LOG_HEADER_SIZE:    usize = 64;

/// Exponent value marking a block as IEEE floats rather than scaled integers.
pub const FLOAT_SENTINEL:     i8 = -128;

// ── Field descriptors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I8,
    I16,
    U16,
    U32,
    F32,
    F64,
    /// Fixed-width byte string, NUL padded.
    Text(usize),
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8   => 1,
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::F64                  => 8,
            FieldKind::Text(n)              => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name:   &'static str,
    pub offset: usize,
    pub kind:   FieldKind,
}

const fn field(name: &'static str, offset: usize, kind: FieldKind) -> Field {
    Field { name, offset, kind }
}

impl Field {
    fn slice<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8]> {
        let end = self.offset + self.kind.width();
        buf.get(self.offset..end).ok_or_else(|| SpcError::Range {
            offset:    self.offset as u64,
            field:     self.name,
            expected:  self.kind.width() as u64,
            available: buf.len().saturating_sub(self.offset) as u64,
        })
    }

    /// Read an integer-kinded field, widened to `i64`.
    pub fn read_int(&self, buf: &[u8]) -> Result<i64> {
        let b = self.slice(buf)?;
        Ok(match self.kind {
            FieldKind::U8  => b[0] as i64,
            FieldKind::I8  => b[0] as i8 as i64,
            FieldKind::I16 => LittleEndian::read_i16(b) as i64,
            FieldKind::U16 => LittleEndian::read_u16(b) as i64,
            FieldKind::U32 => LittleEndian::read_u32(b) as i64,
            FieldKind::F32 | FieldKind::F64 | FieldKind::Text(_) => {
                return Err(SpcError::format(
                    self.offset as u64, self.name, "field is not an integer"));
            }
        })
    }

    /// Read a numeric field as `f64`.  Integer kinds are converted exactly.
    pub fn read_float(&self, buf: &[u8]) -> Result<f64> {
        match self.kind {
            FieldKind::F32 => Ok(LittleEndian::read_f32(self.slice(buf)?) as f64),
            FieldKind::F64 => Ok(LittleEndian::read_f64(self.slice(buf)?)),
            _              => Ok(self.read_int(buf)? as f64),
        }
    }

    /// Read a text field up to its first NUL.
    pub fn read_text(&self, buf: &[u8]) -> Result<String> {
        let b = self.slice(buf)?;
        let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
        Ok(String::from_utf8_lossy(&b[..end]).trim_end().to_owned())
    }
}

// ── Variants ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatVariant {
    Modern,
    Legacy,
}

/// Order of the two 16-bit halves inside a stored 32-bit Y word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    /// Plain little-endian.
    LittleEndian,
    /// Little-endian halves, high half first (legacy files).
    SwappedHalves,
}

impl WordOrder {
    #[inline]
    pub fn read_u32(self, b: &[u8]) -> u32 {
        match self {
            WordOrder::LittleEndian  => LittleEndian::read_u32(b),
            WordOrder::SwappedHalves => {
                ((b[1] as u32) << 24) | ((b[0] as u32) << 16) | ((b[3] as u32) << 8) | b[2] as u32
            }
        }
    }
}

/// Complete main-header layout for one variant.
#[derive(Debug, Clone, Copy)]
pub struct HeaderSchema {
    pub variant:      FormatVariant,
    pub header_size:  usize,
    pub flags:        Field,
    pub exponent:     Field,
    pub num_points:   Field,
    pub first_x:      Field,
    pub last_x:       Field,
    /// Absent in legacy files; the count is derived from the file length.
    pub num_subfiles: Option<Field>,
    pub x_type:       Field,
    pub y_type:       Field,
    pub z_type:       Option<Field>,
    pub memo:         Field,
    /// Absent in legacy files.
    pub log_offset:   Option<Field>,
    pub word_order:   WordOrder,
    /// Offset of subfile 0's subheader when it is embedded in the main header.
    pub embedded_subheader: Option<usize>,
    /// Whether explicit X arrays can occur in this variant.
    pub supports_x_values:  bool,
}

pub const MODERN_SCHEMA: HeaderSchema = HeaderSchema {
    variant:      FormatVariant::Modern,
    header_size:  MODERN_HEADER_SIZE,
    flags:        field("file_type_flags", 0, FieldKind::U8),
    exponent:     field("exponent", 3, FieldKind::I8),
    num_points:   field("num_points", 4, FieldKind::U32),
    first_x:      field("first_x", 8, FieldKind::F64),
    last_x:       field("last_x", 16, FieldKind::F64),
    num_subfiles: Some(field("num_subfiles", 24, FieldKind::U32)),
    x_type:       field("x_type", 28, FieldKind::U8),
    y_type:       field("y_type", 29, FieldKind::U8),
    z_type:       Some(field("z_type", 30, FieldKind::U8)),
    memo:         field("memo", 88, FieldKind::Text(130)),
    log_offset:   Some(field("log_block_offset", 248, FieldKind::U32)),
    word_order:   WordOrder::LittleEndian,
    embedded_subheader: None,
    supports_x_values:  true,
};

pub const LEGACY_SCHEMA: HeaderSchema = HeaderSchema {
    variant:      FormatVariant::Legacy,
    header_size:  LEGACY_HEADER_SIZE,
    flags:        field("file_type_flags", 0, FieldKind::U8),
    exponent:     field("exponent", 2, FieldKind::I16),
    num_points:   field("num_points", 4, FieldKind::F32),
    first_x:      field("first_x", 8, FieldKind::F32),
    last_x:       field("last_x", 12, FieldKind::F32),
    num_subfiles: None,
    x_type:       field("x_type", 16, FieldKind::U8),
    y_type:       field("y_type", 17, FieldKind::U8),
    z_type:       None,
    memo:         field("memo", 64, FieldKind::Text(130)),
    log_offset:   None,
    word_order:   WordOrder::SwappedHalves,
    embedded_subheader: Some(224),
    supports_x_values:  false,
};

impl HeaderSchema {
    /// Select the layout for a version byte.  Table lookup only; no guessing.
    pub fn for_version(version: u8) -> Result<&'static HeaderSchema> {
        match version {
            VERSION_MODERN    => Ok(&MODERN_SCHEMA),
            VERSION_LEGACY    => Ok(&LEGACY_SCHEMA),
            VERSION_MODERN_BE => Err(SpcError::format(
                VERSION_OFFSET as u64, "version", "big-endian SPC files are not supported")),
            other => Err(SpcError::format(
                VERSION_OFFSET as u64, "version", format!("unknown version byte 0x{other:02X}"))),
        }
    }
}

// ── Subfile header layout ────────────────────────────────────────────────────

pub const SUB_FLAGS:      Field = field("subfile_flags", 0, FieldKind::U8);
pub const SUB_EXPONENT:   Field = field("subfile_exponent", 1, FieldKind::I8);
pub const SUB_INDEX:      Field = field("subfile_index", 2, FieldKind::U16);
pub const SUB_Z_START:    Field = field("z_start", 4, FieldKind::F32);
pub const SUB_Z_END:      Field = field("z_end", 8, FieldKind::F32);
pub const SUB_NOISE:      Field = field("noise", 12, FieldKind::F32);
pub const SUB_NUM_POINTS: Field = field("subfile_num_points", 16, FieldKind::U32);
pub const SUB_SCANS:      Field = field("coadded_scans", 20, FieldKind::U32);
pub const SUB_W_VALUE:    Field = field("w_value", 24, FieldKind::F32);

// ── Log header layout ────────────────────────────────────────────────────────

pub const LOG_BLOCK_SIZE:  Field = field("log_block_size", 0, FieldKind::U32);
pub const LOG_MEMORY_SIZE: Field = field("log_memory_size", 4, FieldKind::U32);
pub const LOG_TEXT_OFFSET: Field = field("log_text_offset", 8, FieldKind::U32);
pub const LOG_BINARY_SIZE: Field = field("log_binary_size", 12, FieldKind::U32);
pub const LOG_DISK_SIZE:   Field = field("log_disk_size", 16, FieldKind::U32);
