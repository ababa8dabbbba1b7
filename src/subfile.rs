//! Per-spectrum decoding: subheader, point count, X axis, Y rescaling.
//!
//! # Y encodings
//! A Y block is either raw IEEE singles (exponent == [`FLOAT_SENTINEL`]) or
//! scaled integers.  Scaled integers are sign-extended and divided by
//! `2^(word_bits - exponent)`, where `word_bits` is 16 or 32 to match the
//! stored word.  A 16-bit block carrying the sentinel holds plain unscaled
//! integers.

use std::io::{Read, Seek};
use std::ops::RangeInclusive;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::cursor::SpcCursor;
use crate::error::{Result, SpcError};
use crate::event::{DecodeEvent, Events};
use crate::format::Layout;
use crate::options::DecodeLimits;
use crate::schema::{self, WordOrder, FLOAT_SENTINEL, SUBHEADER_SIZE};

/// Exponents outside this range are rejected for integer blocks.
pub const EXPONENT_RANGE: RangeInclusive<i8> = -64..=64;

// ── Subfile header ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubfileHeader {
    pub flags:         u8,
    pub exponent:      i8,
    pub index:         u16,
    pub z_start:       f32,
    pub z_end:         f32,
    pub noise:         f32,
    /// Point count override; only used by the XYXY layout.
    pub num_points:    u32,
    pub coadded_scans: u32,
    pub w_value:       f32,
}

impl SubfileHeader {
    /// Parse a 32-byte subheader.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Ok(Self {
            flags:         schema::SUB_FLAGS.read_int(buf)? as u8,
            exponent:      schema::SUB_EXPONENT.read_int(buf)? as i8,
            index:         schema::SUB_INDEX.read_int(buf)? as u16,
            z_start:       schema::SUB_Z_START.read_float(buf)? as f32,
            z_end:         schema::SUB_Z_END.read_float(buf)? as f32,
            noise:         schema::SUB_NOISE.read_float(buf)? as f32,
            num_points:    schema::SUB_NUM_POINTS.read_int(buf)? as u32,
            coadded_scans: schema::SUB_SCANS.read_int(buf)? as u32,
            w_value:       schema::SUB_W_VALUE.read_float(buf)? as f32,
        })
    }

    /// Stand-in for single-spectrum files, which carry no subheader.
    pub fn synthesized(exponent: i8, num_points: u32) -> Self {
        Self {
            flags: 0,
            exponent,
            index: 0,
            z_start: 0.0,
            z_end: 0.0,
            noise: 0.0,
            num_points,
            coadded_scans: 0,
            w_value: 0.0,
        }
    }

    pub fn read<R: Read + Seek>(cursor: &mut SpcCursor<R>) -> Result<Self> {
        let mut buf = [0u8; SUBHEADER_SIZE];
        cursor.read_into("subfile_header", &mut buf)?;
        Self::from_bytes(&buf)
    }
}

// ── Spectrum ─────────────────────────────────────────────────────────────────

/// One decoded spectrum.  `x.len() == y.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub x:       Vec<f64>,
    pub y:       Vec<f64>,
    pub z_start: f32,
    pub z_end:   f32,
}

impl Spectrum {
    pub fn len(&self) -> usize { self.y.len() }
    pub fn is_empty(&self) -> bool { self.y.is_empty() }
}

// ── X axis ───────────────────────────────────────────────────────────────────

/// Evenly spaced axis from `first` to `last` with `n` points.
pub fn linear_axis(first: f64, last: f64, n: u32) -> Vec<f64> {
    if n <= 1 {
        return vec![first; n as usize];
    }
    let step = (last - first) / (n - 1) as f64;
    (0..n).map(|k| first + k as f64 * step).collect()
}

/// Read `n` little-endian `f32` X values.
pub fn read_x_values<R: Read + Seek>(cursor: &mut SpcCursor<R>, field: &'static str, n: u32) -> Result<Vec<f64>> {
    let bytes = cursor.read_bytes(field, n as u64 * 4)?;
    Ok(bytes.chunks_exact(4).map(|c| LittleEndian::read_f32(c) as f64).collect())
}

// ── Y scaling ────────────────────────────────────────────────────────────────

/// Width of one stored Y word in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YWidth {
    Bits16,
    Bits32,
}

impl YWidth {
    pub fn from_flag(y_16bit: bool) -> Self {
        if y_16bit { YWidth::Bits16 } else { YWidth::Bits32 }
    }
    pub fn bytes(self) -> u64 {
        match self { YWidth::Bits16 => 2, YWidth::Bits32 => 4 }
    }
    pub fn bits(self) -> i32 {
        match self { YWidth::Bits16 => 16, YWidth::Bits32 => 32 }
    }
}

/// Divisor `2^(word_bits - exponent)` for integer blocks.
pub fn scale_divisor(width: YWidth, exponent: i8, offset: u64) -> Result<f64> {
    if !EXPONENT_RANGE.contains(&exponent) {
        return Err(SpcError::data(offset, "exponent", format!(
            "exponent {exponent} outside safe range {}..={}",
            EXPONENT_RANGE.start(), EXPONENT_RANGE.end())));
    }
    let divisor = 2f64.powi(width.bits() - exponent as i32);
    if divisor == 0.0 || !divisor.is_finite() {
        return Err(SpcError::data(offset, "exponent", format!("exponent {exponent} gives divisor {divisor}")));
    }
    Ok(divisor)
}

/// Decode a raw Y block into finite `f64` values.
///
/// `base_offset` is the stream offset of `raw[0]`, used for error reports.
pub fn decode_y(raw: &[u8], width: YWidth, exponent: i8, order: WordOrder, base_offset: u64) -> Result<Vec<f64>> {
    let step = width.bytes() as usize;
    let mut out = Vec::with_capacity(raw.len() / step);

    if exponent == FLOAT_SENTINEL {
        if width == YWidth::Bits16 {
            out.extend(raw.chunks_exact(2).map(|w| LittleEndian::read_i16(w) as f64));
            return Ok(out);
        }
        for (k, word) in raw.chunks_exact(4).enumerate() {
            let v = f32::from_bits(order.read_u32(word)) as f64;
            out.push(check_finite(v, base_offset + (k * 4) as u64)?);
        }
        return Ok(out);
    }

    let divisor = scale_divisor(width, exponent, base_offset)?;
    match width {
        YWidth::Bits16 => {
            for (k, word) in raw.chunks_exact(2).enumerate() {
                let v = LittleEndian::read_i16(word) as f64 / divisor;
                out.push(check_finite(v, base_offset + (k * 2) as u64)?);
            }
        }
        YWidth::Bits32 => {
            for (k, word) in raw.chunks_exact(4).enumerate() {
                let v = order.read_u32(word) as i32 as f64 / divisor;
                out.push(check_finite(v, base_offset + (k * 4) as u64)?);
            }
        }
    }
    Ok(out)
}

#[inline]
fn check_finite(v: f64, offset: u64) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SpcError::data(offset, "y_values", format!("non-finite value {v}")))
    }
}

// ── Subfile decoder ──────────────────────────────────────────────────────────

/// File-wide facts every subfile decode needs.
pub struct SubfileContext<'a> {
    pub layout:        Layout,
    pub width:         YWidth,
    pub word_order:    WordOrder,
    pub global_points: u32,
    /// X axis shared by every spectrum (all layouts except XYXY).
    pub shared_x:      Option<&'a [f64]>,
    pub limits:        &'a DecodeLimits,
}

/// Decode subfile `index` whose subheader has already been read (or
/// synthesized).  The cursor must sit at the start of its X/Y data.
pub fn decode_subfile<R: Read + Seek>(
    cursor: &mut SpcCursor<R>,
    ctx:    &SubfileContext<'_>,
    index:  u32,
    sub:    &SubfileHeader,
    events: &mut Events<'_>,
) -> Result<Spectrum> {
    let points = if ctx.layout == Layout::XYXY {
        ctx.limits.check_points(cursor.position(), "subfile_num_points", sub.num_points)?;
        sub.num_points
    } else {
        ctx.global_points
    };

    let x = match ctx.shared_x {
        Some(shared) if ctx.layout != Layout::XYXY => shared.to_vec(),
        _ => {
            let offset = cursor.position();
            let x = read_x_values(cursor, "x_values", points)?;
            events.emit(DecodeEvent::XRead { index, offset, points });
            x
        }
    };

    let offset = cursor.position();
    let raw = cursor.read_bytes("y_values", points as u64 * ctx.width.bytes())?;
    let y = decode_y(&raw, ctx.width, sub.exponent, ctx.word_order, offset)?;
    events.emit(DecodeEvent::YRead { index, offset, points, exponent: sub.exponent });

    debug_assert_eq!(x.len(), y.len());
    Ok(Spectrum { x, y, z_start: sub.z_start, z_end: sub.z_end })
}
