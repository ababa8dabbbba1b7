use std::io;
use thiserror::Error;

/// Coarse classification of an [`SpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Header too short, bad flag combination, unknown variant.
    Format,
    /// Read or seek past the end of the stream, offset outside the file.
    Range,
    /// Non-finite value, exponent out of range, zero count.
    Data,
    /// Stream cannot be opened, configured limits exceeded, I/O failure.
    Resource,
}

#[derive(Error, Debug)]
pub enum SpcError {
    #[error("format error at offset {offset} ({field}): {reason}")]
    Format {
        offset: u64,
        field:  &'static str,
        reason: String,
    },
    #[error("range error at offset {offset} ({field}): need {expected} bytes, {available} available")]
    Range {
        offset:    u64,
        field:     &'static str,
        expected:  u64,
        available: u64,
    },
    #[error("data error at offset {offset} ({field}): {reason}")]
    Data {
        offset: u64,
        field:  &'static str,
        reason: String,
    },
    #[error("resource error ({field}): {reason}")]
    Resource {
        field:  &'static str,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpcError::Format { .. }   => ErrorKind::Format,
            SpcError::Range { .. }    => ErrorKind::Range,
            SpcError::Data { .. }     => ErrorKind::Data,
            SpcError::Resource { .. } => ErrorKind::Resource,
            SpcError::Io(_)           => ErrorKind::Resource,
        }
    }

    pub(crate) fn format(offset: u64, field: &'static str, reason: impl Into<String>) -> Self {
        SpcError::Format { offset, field, reason: reason.into() }
    }

    pub(crate) fn data(offset: u64, field: &'static str, reason: impl Into<String>) -> Self {
        SpcError::Data { offset, field, reason: reason.into() }
    }

    pub(crate) fn resource(field: &'static str, reason: impl Into<String>) -> Self {
        SpcError::Resource { field, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SpcError>;
