use serde::Serialize;

use crate::error::{Result, SpcError};

/// Y words are 16-bit integers.
pub const FLAG_Y16:        u8 = 0x01;
/// Enables the fexper extension in old software (informational).
pub const FLAG_CGRAM:      u8 = 0x02;
/// More than one spectrum.
pub const FLAG_MULTI:      u8 = 0x04;
/// Z values randomly ordered (informational).
pub const FLAG_RANDOM_Z:   u8 = 0x08;
/// Z values ordered but unevenly spaced (informational).
pub const FLAG_ORDERED_Z:  u8 = 0x10;
/// Axis labels stored as text (informational).
pub const FLAG_AXIS_TEXT:  u8 = 0x20;
/// Every subfile carries its own X array.
pub const FLAG_XYXY:       u8 = 0x40;
/// Explicit X values precede the Y data.
pub const FLAG_X_VALUES:   u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    /// Y only; X synthesized from the first/last range.
    YOnly,
    /// One explicit X array, one spectrum.
    XY,
    /// One explicit X array shared by several spectra.
    XYY,
    /// An explicit X array per spectrum.
    XYXY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    Single,
    Multi,
}

/// Typed view of the file-type flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileTypeFlags(pub u8);

impl FileTypeFlags {
    #[inline] pub fn y_16bit(self)      -> bool { self.0 & FLAG_Y16 != 0 }
    #[inline] pub fn multi(self)        -> bool { self.0 & FLAG_MULTI != 0 }
    #[inline] pub fn per_subfile_x(self) -> bool { self.0 & FLAG_XYXY != 0 }
    #[inline] pub fn x_values(self)     -> bool { self.0 & FLAG_X_VALUES != 0 }
    #[inline] pub fn random_z(self)     -> bool { self.0 & FLAG_RANDOM_Z != 0 }
    #[inline] pub fn ordered_z(self)    -> bool { self.0 & FLAG_ORDERED_Z != 0 }
    #[inline] pub fn axis_text(self)    -> bool { self.0 & FLAG_AXIS_TEXT != 0 }
}

/// Map flags to a `(Layout, Cardinality)` pair.
///
/// Only the explicit-X, per-subfile-X and multi bits take part; the other
/// bits are informational.  Per-subfile X requires both explicit X and the
/// multi bit, since only subheaders can carry per-spectrum point counts.
pub fn classify(flags: FileTypeFlags) -> Result<(Layout, Cardinality)> {
    let cardinality = if flags.multi() { Cardinality::Multi } else { Cardinality::Single };
    let layout = match (flags.x_values(), flags.per_subfile_x(), cardinality) {
        (false, false, _)                  => Layout::YOnly,
        (true,  false, Cardinality::Single) => Layout::XY,
        (true,  false, Cardinality::Multi)  => Layout::XYY,
        (true,  true,  Cardinality::Multi)  => Layout::XYXY,
        (false, true,  _) => {
            return Err(SpcError::format(0, "file_type_flags", format!(
                "flags 0x{:02X}: per-subfile X without explicit X values", flags.0)));
        }
        (true, true, Cardinality::Single) => {
            return Err(SpcError::format(0, "file_type_flags", format!(
                "flags 0x{:02X}: per-subfile X requires a multi-spectrum file", flags.0)));
        }
    };
    Ok((layout, cardinality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn c(bits: u8) -> Result<(Layout, Cardinality)> {
        classify(FileTypeFlags(bits))
    }

    #[test]
    fn test_layout_table() {
        assert_eq!(c(0).unwrap(), (Layout::YOnly, Cardinality::Single));
        assert_eq!(c(FLAG_MULTI).unwrap(), (Layout::YOnly, Cardinality::Multi));
        assert_eq!(c(FLAG_X_VALUES).unwrap(), (Layout::XY, Cardinality::Single));
        assert_eq!(c(FLAG_X_VALUES | FLAG_MULTI).unwrap(), (Layout::XYY, Cardinality::Multi));
        assert_eq!(c(FLAG_X_VALUES | FLAG_XYXY | FLAG_MULTI).unwrap(), (Layout::XYXY, Cardinality::Multi));
    }

    #[test]
    fn test_informational_bits_ignored() {
        let noise = FLAG_CGRAM | FLAG_RANDOM_Z | FLAG_ORDERED_Z | FLAG_AXIS_TEXT | FLAG_Y16;
        assert_eq!(c(noise).unwrap(), (Layout::YOnly, Cardinality::Single));
        assert_eq!(c(noise | FLAG_X_VALUES | FLAG_MULTI).unwrap(), (Layout::XYY, Cardinality::Multi));
    }

    #[test]
    fn test_invalid_combinations() {
        assert_eq!(c(FLAG_XYXY).unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(c(FLAG_XYXY | FLAG_MULTI).unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(c(FLAG_XYXY | FLAG_X_VALUES).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_flag_accessors() {
        let f = FileTypeFlags(0xC5);
        assert!(f.y_16bit() && f.multi() && f.per_subfile_x() && f.x_values());
        assert!(!f.random_z() && !f.ordered_z() && !f.axis_text());
    }
}
