//! Record sink boundary.
//!
//! Finished boxes leave the ingestion pipeline through [`RecordSink`]. The
//! pipeline makes no assumption about what sits behind it; the in-memory store
//! is the default used by the daemon and by tests.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryBoxStore;
pub use r#trait::{RecordSink, SinkError};
