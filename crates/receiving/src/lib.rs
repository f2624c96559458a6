//! Receiving domain module (boxes delivered by suppliers).
//!
//! This crate turns the lines of a supplier delivery file into box records.
//! It is deterministic domain logic: no file handles, no storage, no runtime.
//! Callers feed it one line at a time and decide what to do with the result.

pub mod aggregator;
pub mod box_record;
pub mod parser;

pub use aggregator::{AggregatorState, BoxAggregator, Discard, DropReason, Step};
pub use box_record::{BoxRecord, Content};
pub use parser::{
    BoxHeader, ContentLine, HEADER_MARKER, LINE_MARKER, ParsedLine, parse_content, parse_header,
    parse_line,
};
