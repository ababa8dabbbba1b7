pub mod error;
pub mod options;
pub mod schema;
pub mod format;
pub mod cursor;
pub mod event;
pub mod header;
pub mod subfile;
pub mod log_block;
pub mod reader;
pub mod batch;
pub mod export;

pub use error::{ErrorKind, SpcError};
pub use options::{DecodeLimits, DecodeOptions};
pub use format::{Cardinality, Layout};
pub use event::DecodeEvent;
pub use header::SpcHeader;
pub use subfile::{Spectrum, SubfileHeader};
pub use reader::{decode, decode_bytes, decode_path, decode_with, SpcFile};
