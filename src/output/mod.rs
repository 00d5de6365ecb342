//! Result output
//!
//! PageRecord data model, the single-writer JSONL appender, and the resume
//! scan that rebuilds dedup state from prior output.

mod record;
mod recovery;
mod writer;

pub use record::{PageRecord, RecordStatus};
pub use recovery::scan_completed;
pub use writer::{resolve_destination, spawn_writer, RecordWriter, RECORDS_FILE_NAME};
