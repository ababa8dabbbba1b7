//! Structured decode events.
//!
//! The decoder never prints.  Each state transition is sent to the `log`
//! facade at `trace` level and, when the caller supplied one, to an event
//! callback passed to [`crate::reader::decode_with`].

use crate::format::{Cardinality, Layout};
use crate::schema::FormatVariant;

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    HeaderParsed {
        variant:      FormatVariant,
        layout:       Layout,
        cardinality:  Cardinality,
        num_points:   u32,
        num_subfiles: u32,
    },
    /// Shared X array read before the subfile loop.
    SharedXRead { offset: u64, points: u32 },
    SubfileHeaderRead { index: u32, offset: u64, exponent: i8 },
    XRead { index: u32, offset: u64, points: u32 },
    YRead { index: u32, offset: u64, points: u32, exponent: i8 },
    SubfileComplete { index: u32, points: u32 },
    AllSubfilesComplete { count: u32 },
    LogRead { offset: u64, bytes: usize },
    /// The log block was present but unreadable; decoding continued.
    LogSkipped { reason: String },
    Done,
}

pub type EventFn<'a> = dyn FnMut(&DecodeEvent) + 'a;

pub(crate) struct Events<'a> {
    sink: Option<&'a mut EventFn<'a>>,
}

impl<'a> Events<'a> {
    pub(crate) fn new(sink: Option<&'a mut EventFn<'a>>) -> Self {
        Self { sink }
    }

    pub(crate) fn none() -> Self {
        Self { sink: None }
    }

    pub(crate) fn emit(&mut self, event: DecodeEvent) {
        log::trace!(target: "spcio", "{event:?}");
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(&event);
        }
    }
}
