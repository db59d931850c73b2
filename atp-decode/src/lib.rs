//! Sans-I/O decoder for Automatic Train Protection (ATP) recording unit
//! (RU) and man-machine interface (MMI) binary trace files.
//!
//! The library never touches the filesystem: callers hand it a byte
//! slice (typically the full contents of a trace file, memory-mapped
//! or read up front) and iterate the resulting [`dispatch::DecodeEvent`]
//! stream. All decode failures are structured [`error::DecodeError`]
//! values rather than panics; the dispatcher resynchronises past
//! malformed frames on its own.

pub mod btm;
pub mod bytes;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod header;
pub mod mmi;
pub mod record;

pub use dispatch::{decode_all, decode_all_with_options, decode_to_vec, decode_to_vec_with_options};
pub use dispatch::{DecodeEvent, DecodeOptions, Decoder, Stats};
pub use error::DecodeError;
pub use header::Header;
pub use record::Record;
