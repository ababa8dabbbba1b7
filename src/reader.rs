//! Decode orchestration and the public entry points.
//!
//! ```no_run
//! use spcio::DecodeOptions;
//!
//! let file = spcio::decode_path("sample.spc", &DecodeOptions::default())?;
//! for s in &file.spectra {
//!     println!("{} points, z = {}..{}", s.len(), s.z_start, s.z_end);
//! }
//! # Ok::<(), spcio::SpcError>(())
//! ```
//!
//! # Sequence
//! Header → layout classification → count validation → shared X (if any) →
//! one subfile at a time in index order → optional log block.  Any hard
//! error aborts the whole decode; there are no partial results.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use serde::Serialize;

use crate::cursor::SpcCursor;
use crate::error::{Result, SpcError};
use crate::event::{DecodeEvent, EventFn, Events};
use crate::format::{classify, Cardinality, Layout};
use crate::header::SpcHeader;
use crate::log_block::read_log_text;
use crate::options::DecodeOptions;
use crate::schema::SUBHEADER_SIZE;
use crate::subfile::{
    decode_subfile, linear_axis, read_x_values, Spectrum, SubfileContext, SubfileHeader, YWidth,
};

// ── SpcFile ──────────────────────────────────────────────────────────────────

/// Everything decoded from one SPC file.
#[derive(Debug, Clone, Serialize)]
pub struct SpcFile {
    pub header:      SpcHeader,
    pub layout:      Layout,
    pub cardinality: Cardinality,
    /// In subfile order.
    pub spectra:     Vec<Spectrum>,
    /// Empty when the file has no (readable) log block.
    pub log_text:    String,
}

impl SpcFile {
    pub fn is_multifile(&self) -> bool { self.cardinality == Cardinality::Multi }
    /// True for every layout with explicit X values (XY, XYY, XYXY).
    pub fn is_xy(&self)        -> bool { self.layout != Layout::YOnly }
    pub fn is_xyxy(&self)      -> bool { self.layout == Layout::XYXY }
    pub fn y_in_16bit(&self)   -> bool { self.header.flags.y_16bit() }
    pub fn num_points(&self)   -> u32  { self.header.num_points }
    pub fn num_subfiles(&self) -> u32  { self.header.num_subfiles }
    pub fn first_x(&self)      -> f64  { self.header.first_x }
    pub fn last_x(&self)       -> f64  { self.header.last_x }
    pub fn log_text(&self)     -> &str { &self.log_text }
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Decode a stream with default options.
pub fn decode<R: Read + Seek>(reader: R) -> Result<SpcFile> {
    decode_inner(reader, &DecodeOptions::default(), Events::none())
}

pub fn decode_bytes(bytes: &[u8]) -> Result<SpcFile> {
    decode(Cursor::new(bytes))
}

/// Open `path` and decode it.  An unopenable file is a resource error.
pub fn decode_path<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<SpcFile> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SpcError::resource(
        "open", format!("cannot open {}: {e}", path.display())))?;
    decode_inner(BufReader::new(file), options, Events::none())
}

/// Decode with explicit options and an optional event callback.
pub fn decode_with<R, F>(reader: R, options: &DecodeOptions, events: Option<&mut F>) -> Result<SpcFile>
where
    R: Read + Seek,
    F: FnMut(&DecodeEvent),
{
    let events = Events::new(events.map(|f| f as &mut EventFn<'_>));
    decode_inner(reader, options, events)
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

fn decode_inner<R: Read + Seek>(reader: R, options: &DecodeOptions, mut events: Events<'_>) -> Result<SpcFile> {
    let limits = &options.limits;
    let mut cursor = SpcCursor::new(reader)?;
    limits.check_file_size(cursor.len())?;

    let (header, schema) = SpcHeader::read(&mut cursor)?;
    let (layout, cardinality) = classify(header.flags)?;
    if layout != Layout::YOnly && !schema.supports_x_values {
        return Err(SpcError::format(0, "file_type_flags", format!(
            "{:?} files cannot hold explicit X values", header.variant)));
    }

    limits.check_subfiles(schema.num_subfiles.map_or(0, |f| f.offset as u64), header.num_subfiles)?;
    if layout != Layout::XYXY {
        limits.check_points(schema.num_points.offset as u64, "num_points", header.num_points)?;
    }

    events.emit(DecodeEvent::HeaderParsed {
        variant:      header.variant,
        layout,
        cardinality,
        num_points:   header.num_points,
        num_subfiles: header.num_subfiles,
    });

    let width = YWidth::from_flag(header.flags.y_16bit());
    let multi = cardinality == Cardinality::Multi;

    check_declared_size(&cursor, &header, layout, multi, width, schema.embedded_subheader.is_some())?;

    let shared_x = match layout {
        Layout::YOnly => Some(linear_axis(header.first_x, header.last_x, header.num_points)),
        Layout::XY | Layout::XYY => {
            let offset = cursor.position();
            let x = read_x_values(&mut cursor, "shared_x_values", header.num_points)?;
            events.emit(DecodeEvent::SharedXRead { offset, points: header.num_points });
            Some(x)
        }
        Layout::XYXY => None,
    };

    let ctx = SubfileContext {
        layout,
        width,
        word_order:    schema.word_order,
        global_points: header.num_points,
        shared_x:      shared_x.as_deref(),
        limits,
    };

    let mut spectra = Vec::with_capacity(header.num_subfiles as usize);
    for index in 0..header.num_subfiles {
        let offset = cursor.position();
        let sub = match (multi, index, header.embedded_subheader) {
            (false, _, _)        => SubfileHeader::synthesized(header.exponent, header.num_points),
            (true, 0, Some(sub)) => sub,
            (true, _, _)         => SubfileHeader::read(&mut cursor)?,
        };
        events.emit(DecodeEvent::SubfileHeaderRead { index, offset, exponent: sub.exponent });

        let spectrum = decode_subfile(&mut cursor, &ctx, index, &sub, &mut events)?;
        events.emit(DecodeEvent::SubfileComplete { index, points: spectrum.len() as u32 });
        spectra.push(spectrum);
    }
    events.emit(DecodeEvent::AllSubfilesComplete { count: header.num_subfiles });

    let log_text = if options.read_log && header.log_block_offset != 0 {
        let offset = header.log_block_offset as u64;
        match read_log_text(&mut cursor, offset, limits) {
            Ok(text) => {
                events.emit(DecodeEvent::LogRead { offset, bytes: text.len() });
                text
            }
            Err(e) => {
                log::warn!(target: "spcio", "log block at {offset} skipped: {e}");
                events.emit(DecodeEvent::LogSkipped { reason: e.to_string() });
                String::new()
            }
        }
    } else {
        String::new()
    };

    events.emit(DecodeEvent::Done);
    log::debug!(target: "spcio", "decoded {} spectra ({:?}, {:?})", spectra.len(), layout, cardinality);

    Ok(SpcFile { header, layout, cardinality, spectra, log_text })
}

/// Reject files whose declared structure cannot fit in the stream before
/// allocating anything proportional to it.  XYXY counts live in the
/// subheaders, so only the subheaders themselves can be checked up front.
fn check_declared_size<R: Read + Seek>(
    cursor:   &SpcCursor<R>,
    header:   &SpcHeader,
    layout:   Layout,
    multi:    bool,
    width:    YWidth,
    embedded: bool,
) -> Result<()> {
    let n = header.num_subfiles as u64;
    let sub_count = match (multi, embedded) {
        (false, _)    => 0,
        (true, true)  => n - 1,
        (true, false) => n,
    };
    let points = header.num_points as u64;
    let y_bytes = n.saturating_mul(points).saturating_mul(width.bytes());
    let data = match layout {
        Layout::YOnly            => y_bytes,
        Layout::XY | Layout::XYY => y_bytes.saturating_add(points * 4),
        Layout::XYXY             => 0,
    };
    let needed = (sub_count * SUBHEADER_SIZE as u64).saturating_add(data);
    cursor.ensure("subfile_data", needed)
}
