//! Snapshot persistence.
//!
//! Every population and the reward ledger persist as one JSON document.
//! Writes go through a temporary sibling and a rename; reads treat a
//! missing file as "no state yet" and report unparsable content as
//! [`ArchetypeError::CorruptSnapshot`](crate::error::ArchetypeError::CorruptSnapshot)
//! so callers can fall back to empty state.

mod atomic;
mod store;

pub use self::atomic::{read_json, read_json_or_warn, temp_path, write_json_atomic};
pub use self::store::{sanitize_stream_name, StreamStorage, MAX_STREAM_NAME_LEN};
