use std::sync::Arc;

use thiserror::Error;

use boxer_receiving::BoxRecord;

/// Record sink operation error.
///
/// The pipeline logs these and moves on to the next box; a failed submit
/// never aborts ingestion of the file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// A box with the same identifier was already accepted.
    #[error("duplicate box identifier: {0}")]
    Duplicate(String),

    /// The sink cannot accept records right now.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Accepts completed boxes.
///
/// Implementations are shared by every in-flight ingestion, so `submit` is
/// called concurrently from several tasks. Any serialization it needs is the
/// implementation's own business.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one finished box.
    async fn submit(&self, record: BoxRecord) -> Result<(), SinkError>;
}

#[async_trait::async_trait]
impl<S> RecordSink for Arc<S>
where
    S: RecordSink + ?Sized,
{
    async fn submit(&self, record: BoxRecord) -> Result<(), SinkError> {
        (**self).submit(record).await
    }
}
