use crate::error::{Result, SpcError};

pub const DEFAULT_MAX_POINTS:    u32   = 10_000_000;
pub const DEFAULT_MAX_SUBFILES:  u32   = 100_000;
pub const DEFAULT_MAX_LOG_BYTES: u64   = 1024 * 1024;
pub const DEFAULT_MAX_FILE_SIZE: u64   = 1024 * 1024 * 1024;

/// Safety ceilings checked before any allocation proportional to a declared
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_points:    u32,
    pub max_subfiles:  u32,
    pub max_log_bytes: u64,
    pub max_file_size: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_points:    DEFAULT_MAX_POINTS,
            max_subfiles:  DEFAULT_MAX_SUBFILES,
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DecodeLimits {
    /// Zero is a data error; anything over the ceiling is refused before
    /// allocation.
    pub(crate) fn check_points(&self, offset: u64, field: &'static str, n: u32) -> Result<()> {
        if n == 0 {
            return Err(SpcError::data(offset, field, "point count is zero"));
        }
        if n > self.max_points {
            return Err(SpcError::resource(
                field,
                format!("{n} points exceeds the limit of {}", self.max_points),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_subfiles(&self, offset: u64, n: u32) -> Result<()> {
        if n == 0 {
            return Err(SpcError::data(offset, "num_subfiles", "subfile count is zero"));
        }
        if n > self.max_subfiles {
            return Err(SpcError::resource(
                "num_subfiles",
                format!("{n} subfiles exceeds the limit of {}", self.max_subfiles),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_file_size(&self, len: u64) -> Result<()> {
        if len > self.max_file_size {
            return Err(SpcError::resource(
                "file_size",
                format!("{len} bytes exceeds the limit of {}", self.max_file_size),
            ));
        }
        Ok(())
    }
}

/// Configuration for [`crate::reader::decode_with`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub limits:   DecodeLimits,
    /// When false the trailing log block is never read and `log_text` is empty.
    pub read_log: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            limits:   DecodeLimits::default(),
            read_log: true,
        }
    }
}
